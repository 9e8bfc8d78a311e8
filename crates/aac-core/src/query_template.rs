// SPDX-License-Identifier: MIT

//! QueryTemplate: parameterized named queries for the Telemetry & Query API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub name: String,
    pub description: String,
    pub sql: String,
    #[serde(default)]
    pub params: Vec<QueryParamSpec>,
    #[serde(default)]
    pub cache_ttl_seconds: u32,
}

impl QueryTemplate {
    /// Validate that a set of supplied parameter names satisfies `required`
    /// params and that unknown names aren't passed.
    pub fn validate_params(
        &self,
        supplied: &std::collections::HashMap<String, serde_json::Value>,
    ) -> Result<(), String> {
        for spec in &self.params {
            if spec.required && spec.default.is_none() && !supplied.contains_key(&spec.name) {
                return Err(format!("missing required parameter '{}'", spec.name));
            }
        }
        for key in supplied.keys() {
            if !self.params.iter().any(|p| &p.name == key) {
                return Err(format!("unknown parameter '{key}'"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "query_template_tests.rs"]
mod tests;
