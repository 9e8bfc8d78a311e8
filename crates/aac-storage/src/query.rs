// SPDX-License-Identifier: MIT

//! Execution of parameterized named queries (spec §4.9) against the store.
//! Rows are mapped generically into `serde_json::Value` objects so the
//! Telemetry & Query API can stay agnostic of any particular query's shape.

use crate::error::StorageError;
use crate::store::Store;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::ToSql;
use serde_json::{Map, Value};
use std::collections::HashMap;

fn json_to_sql(value: &Value) -> Result<SqlValue, StorageError> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::Real(f)
            } else {
                return Err(StorageError::InvalidParameter("number out of range".to_string()));
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => {
            return Err(StorageError::InvalidParameter(
                "array/object query parameters are not supported".to_string(),
            ))
        }
    })
}

fn column_to_json(value: ValueRef) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Run `sql` with named parameters (e.g. `:work_item_id`) bound from
/// `params`, returning each row as a JSON object keyed by column name.
pub fn run_named_query(store: &Store, sql: &str, params: &HashMap<String, Value>) -> Result<Vec<Value>, StorageError> {
    let conn = store.conn.lock();
    let mut stmt = conn.prepare(sql)?;
    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut bound: Vec<(String, SqlValue)> = Vec::with_capacity(params.len());
    for (name, value) in params {
        bound.push((format!(":{name}"), json_to_sql(value)?));
    }
    let bound_refs: Vec<(&str, &dyn ToSql)> = bound.iter().map(|(n, v)| (n.as_str(), v as &dyn ToSql)).collect();

    let mut rows = stmt.query(&bound_refs[..])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut obj = Map::new();
        for (idx, name) in column_names.iter().enumerate() {
            obj.insert(name.clone(), column_to_json(row.get_ref(idx)?));
        }
        out.push(Value::Object(obj));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
