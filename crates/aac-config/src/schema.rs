// SPDX-License-Identifier: MIT

//! Typed shapes of the three configuration files (spec §6), deserialized
//! from the deep-merged JSON value produced by the loader.

use aac_core::{QueryTemplate, RoutingRule, SlaTarget};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct SlaRulesFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub sla_targets: HashMap<String, SlaTarget>,
    #[serde(default)]
    pub escalation_rules: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackRule {
    pub condition: String,
    pub action: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingRulesFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub environment_routing: HashMap<String, RawRoutingRule>,
    #[serde(default)]
    pub excluded_sessions: Vec<String>,
    #[serde(default)]
    pub supported_providers: Vec<String>,
    #[serde(default)]
    pub fallback_rules: Vec<FallbackRule>,
}

/// Shape of one `environment_routing` entry, matching the bit-level contract
/// of spec §6 exactly (field names, optional port_range).
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoutingRule {
    #[serde(default)]
    pub requires_env: bool,
    #[serde(default)]
    pub preferred_sessions: Vec<String>,
    #[serde(default)]
    pub port_range: Option<(u16, u16)>,
    #[serde(default)]
    pub auto_create_env: bool,
    #[serde(default)]
    pub merge_via_pr: bool,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub timeout_minutes: Option<u32>,
}

impl RawRoutingRule {
    pub fn into_rule(self, task_type: String, excluded: &[String]) -> RoutingRule {
        RoutingRule {
            task_type,
            requires_environment: self.requires_env,
            preferred_sessions: self.preferred_sessions,
            excluded_sessions: excluded.to_vec(),
            priority_bias: self.priority,
            timeout_override_minutes: self.timeout_minutes,
            auto_create_environment: self.auto_create_env,
            port_range: self.port_range,
            allow_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueriesFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub queries: HashMap<String, RawQueryTemplate>,
    #[serde(default)]
    pub indexes: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQueryTemplate {
    pub description: String,
    pub sql: String,
    #[serde(default)]
    pub params: Vec<aac_core::query_template::QueryParamSpec>,
    #[serde(default)]
    pub cache_ttl: u32,
}

impl RawQueryTemplate {
    pub fn into_template(self, name: String) -> QueryTemplate {
        QueryTemplate {
            name,
            description: self.description,
            sql: self.sql,
            params: self.params,
            cache_ttl_seconds: self.cache_ttl,
        }
    }
}

fn default_version() -> u32 {
    1
}
