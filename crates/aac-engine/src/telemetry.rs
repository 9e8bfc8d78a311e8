// SPDX-License-Identifier: MIT

//! Telemetry & Query API: read-only views across all stores, plus
//! parameterized named queries and export (spec §4.9).

use crate::error::EngineError;
use aac_config::Snapshot;
use aac_core::{AssignmentEvent, Session, WorkItem, WorkItemStatus};
use aac_storage::{run_named_query, EventLog, Queue, Registry, Store};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Maximum rows a single `list_work_items` page may return, regardless of
/// the caller's requested `limit`.
pub const MAX_PAGE_LIMIT: i64 = 500;
const DEFAULT_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// One page of results plus the offset to request for the next page, if any.
#[derive(Debug, Clone)]
pub struct QueryPage<T> {
    pub items: Vec<T>,
    pub next_offset: Option<i64>,
}

struct CachedQuery {
    cached_at_ms: i64,
    rows: Vec<serde_json::Value>,
}

/// Read-only facade over the Queue Store and Session Registry, plus cached
/// named-query execution (spec §4.9: "read-only across all stores").
pub struct Telemetry<'a> {
    store: &'a Store,
    query_cache: Mutex<HashMap<String, CachedQuery>>,
}

impl<'a> Telemetry<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store, query_cache: Mutex::new(HashMap::new()) }
    }

    /// Pending/assigned/in_progress/... counts by status, for dashboards.
    pub fn queue_stats(&self) -> Result<HashMap<String, i64>, EngineError> {
        Ok(Queue::new(self.store).counts_by_status()?.into_iter().collect())
    }

    pub fn list_sessions(&self) -> Result<Vec<Session>, EngineError> {
        Ok(Registry::new(self.store).list()?)
    }

    pub fn get_session(&self, name: &str) -> Result<Session, EngineError> {
        Ok(Registry::new(self.store).get(name)?)
    }

    /// A single WorkItem plus its full AssignmentEvent history.
    pub fn item_detail(&self, work_item_id: &str) -> Result<(WorkItem, Vec<AssignmentEvent>), EngineError> {
        let item = Queue::new(self.store).get(work_item_id)?;
        let history = EventLog::new(self.store).history_for(work_item_id)?;
        Ok((item, history))
    }

    /// Page through WorkItems of a given status (or all), newest-status
    /// ordering first, capped at [`MAX_PAGE_LIMIT`] regardless of request.
    pub fn list_work_items(
        &self,
        status: Option<WorkItemStatus>,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<QueryPage<WorkItem>, EngineError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let fetched = Queue::new(self.store).list(status, Some(offset + limit + 1))?;
        let page: Vec<WorkItem> = fetched.iter().skip(offset as usize).take(limit as usize).cloned().collect();
        let next_offset = if fetched.len() as i64 > offset + limit { Some(offset + limit) } else { None };
        Ok(QueryPage { items: page, next_offset })
    }

    /// Run a configured named query, honoring its `cache_ttl_seconds` (spec
    /// §6: "queries.<ext>" query templates).
    pub fn run_query(
        &self,
        snapshot: &Snapshot,
        name: &str,
        params: &HashMap<String, serde_json::Value>,
        now_ms: i64,
    ) -> Result<Vec<serde_json::Value>, EngineError> {
        let template = snapshot.query_templates.get(name).ok_or_else(|| EngineError::UnknownQuery(name.to_string()))?;
        template.validate_params(params).map_err(EngineError::InvalidQueryParams)?;

        if template.cache_ttl_seconds > 0 {
            let cache = self.query_cache.lock();
            if let Some(cached) = cache.get(name) {
                if now_ms.saturating_sub(cached.cached_at_ms) < template.cache_ttl_seconds as i64 * 1000 {
                    return Ok(cached.rows.clone());
                }
            }
        }

        let rows = run_named_query(self.store, &template.sql, params)?;

        if template.cache_ttl_seconds > 0 {
            self.query_cache.lock().insert(name.to_string(), CachedQuery { cached_at_ms: now_ms, rows: rows.clone() });
        }

        Ok(rows)
    }

    /// Render query rows as JSON or CSV for operator export (spec §6's
    /// query/export surface).
    pub fn export(rows: &[serde_json::Value], format: ExportFormat) -> Result<String, EngineError> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(rows).map_err(aac_storage::StorageError::from)?),
            ExportFormat::Csv => Self::export_csv(rows),
        }
    }

    fn export_csv(rows: &[serde_json::Value]) -> Result<String, EngineError> {
        let mut columns: Vec<String> = Vec::new();
        for row in rows {
            if let serde_json::Value::Object(map) = row {
                for key in map.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        let header_err = |e: csv::Error| EngineError::InvalidQueryParams(format!("csv export failed: {e}"));
        writer.write_record(&columns).map_err(header_err)?;
        for row in rows {
            let serde_json::Value::Object(map) = row else { continue };
            let record: Vec<String> = columns.iter().map(|c| map.get(c).map(value_to_cell).unwrap_or_default()).collect();
            writer.write_record(&record).map_err(header_err)?;
        }
        let bytes = writer.into_inner().map_err(|e| EngineError::InvalidQueryParams(format!("csv export failed: {e}")))?;
        String::from_utf8(bytes).map_err(|e| EngineError::InvalidQueryParams(format!("csv export produced invalid utf8: {e}")))
    }
}

fn value_to_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
