// SPDX-License-Identifier: MIT

//! RoutingRule: per-task_type routing policy, loaded from configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRule {
    pub task_type: String,
    #[serde(default)]
    pub requires_environment: bool,
    #[serde(default)]
    pub preferred_sessions: Vec<String>,
    #[serde(default)]
    pub excluded_sessions: Vec<String>,
    #[serde(default)]
    pub priority_bias: i8,
    #[serde(default)]
    pub timeout_override_minutes: Option<u32>,
    #[serde(default)]
    pub auto_create_environment: bool,
    #[serde(default)]
    pub port_range: Option<(u16, u16)>,
    /// Whether sessions not in `preferred_sessions` may still be selected
    /// when no preferred session is eligible.
    #[serde(default = "default_true")]
    pub allow_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl RoutingRule {
    pub fn default_for(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            requires_environment: false,
            preferred_sessions: Vec::new(),
            excluded_sessions: Vec::new(),
            priority_bias: 0,
            timeout_override_minutes: None,
            auto_create_environment: false,
            port_range: None,
            allow_fallback: true,
        }
    }

    /// Preference rank of a session name: lower is better, `None` if the
    /// session doesn't appear in `preferred_sessions` (spec §4.5 step 3c).
    pub fn preference_rank(&self, session_name: &str) -> Option<usize> {
        self.preferred_sessions
            .iter()
            .position(|s| s == session_name)
    }

    pub fn is_excluded(&self, session_name: &str) -> bool {
        self.excluded_sessions.iter().any(|s| s == session_name)
    }
}

#[cfg(test)]
#[path = "routing_rule_tests.rs"]
mod tests;
