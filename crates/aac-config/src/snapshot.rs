// SPDX-License-Identifier: MIT

//! Immutable configuration snapshot (spec §4.1).

use crate::error::ConfigError;
use crate::loader::load_layered;
use crate::schema::{QueriesFile, RoutingRulesFile, SlaRulesFile};
use aac_core::{QueryTemplate, RoutingRule, SlaTarget};
use std::collections::HashMap;
use std::path::Path;

/// A fallback rule from `routing_rules.<ext>` (spec §6). Interpretation of
/// `condition`/`action` is a concern of the Routing Engine; the snapshot
/// only carries the raw data.
#[derive(Debug, Clone)]
pub struct FallbackRule {
    pub condition: String,
    pub action: String,
    pub extra: HashMap<String, serde_json::Value>,
}

/// A published, immutable view of all configuration data (spec §4.1).
/// Cheap to clone: callers hold a value copy, never a reference into
/// mutable state.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub routing_rules: HashMap<String, RoutingRule>,
    pub sla_targets: HashMap<String, SlaTarget>,
    pub query_templates: HashMap<String, QueryTemplate>,
    pub excluded_sessions: Vec<String>,
    pub supported_providers: Vec<String>,
    pub fallback_rules: Vec<FallbackRule>,
}

impl Snapshot {
    /// Look up the routing rule for a task_type, falling back to `"default"`
    /// per spec §4.2 (`enqueue`'s task_type fallback).
    pub fn routing_rule_for(&self, task_type: &str) -> Option<&RoutingRule> {
        self.routing_rules
            .get(task_type)
            .or_else(|| self.routing_rules.get("default"))
    }

    /// Look up the SLA target for a task_type, falling back to `"default"`.
    pub fn sla_for(&self, task_type: &str) -> SlaTarget {
        self.sla_targets
            .get(task_type)
            .or_else(|| self.sla_targets.get("default"))
            .copied()
            .unwrap_or_default()
    }

    /// A task_type is known if it has a routing rule or there is a default.
    pub fn is_known_task_type(&self, task_type: &str) -> bool {
        self.routing_rules.contains_key(task_type) || self.routing_rules.contains_key("default")
    }
}

pub(crate) fn build_snapshot(config_dir: &Path, environment: Option<&str>) -> Result<Snapshot, ConfigError> {
    let sla_value = load_layered(config_dir, "sla_rules", environment)?;
    let routing_value = load_layered(config_dir, "routing_rules", environment)?;
    let queries_value = load_layered(config_dir, "queries", environment)?;

    let sla_file: SlaRulesFile = if sla_value.is_null() {
        SlaRulesFile {
            version: 1,
            sla_targets: HashMap::new(),
            escalation_rules: Vec::new(),
        }
    } else {
        serde_json::from_value(sla_value).map_err(|e| ConfigError::Schema {
            path: config_dir.join("base/sla_rules.*"),
            message: e.to_string(),
        })?
    };

    let routing_file: RoutingRulesFile = if routing_value.is_null() {
        RoutingRulesFile {
            version: 1,
            environment_routing: HashMap::new(),
            excluded_sessions: Vec::new(),
            supported_providers: Vec::new(),
            fallback_rules: Vec::new(),
        }
    } else {
        serde_json::from_value(routing_value).map_err(|e| ConfigError::Schema {
            path: config_dir.join("base/routing_rules.*"),
            message: e.to_string(),
        })?
    };

    let queries_file: QueriesFile = if queries_value.is_null() {
        QueriesFile {
            version: 1,
            queries: HashMap::new(),
            indexes: Vec::new(),
        }
    } else {
        serde_json::from_value(queries_value).map_err(|e| ConfigError::Schema {
            path: config_dir.join("base/queries.*"),
            message: e.to_string(),
        })?
    };

    let excluded = routing_file.excluded_sessions.clone();
    let routing_rules = routing_file
        .environment_routing
        .into_iter()
        .map(|(task_type, raw)| {
            let rule = raw.into_rule(task_type.clone(), &excluded);
            (task_type, rule)
        })
        .collect();

    let query_templates = queries_file
        .queries
        .into_iter()
        .map(|(name, raw)| {
            let template = raw.into_template(name.clone());
            (name, template)
        })
        .collect();

    let fallback_rules = routing_file
        .fallback_rules
        .into_iter()
        .map(|r| FallbackRule {
            condition: r.condition,
            action: r.action,
            extra: r.extra,
        })
        .collect();

    Ok(Snapshot {
        routing_rules,
        sla_targets: sla_file.sla_targets,
        query_templates,
        excluded_sessions: excluded,
        supported_providers: routing_file.supported_providers,
        fallback_rules,
    })
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
