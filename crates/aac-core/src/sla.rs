// SPDX-License-Identifier: MIT

//! SlaTarget: per-task_type SLA, loaded from configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaTarget {
    pub target_minutes: u32,
    pub warning_percent: u8,
    pub critical_percent: u8,
}

impl SlaTarget {
    pub const DEFAULT: SlaTarget = SlaTarget {
        target_minutes: 30,
        warning_percent: 75,
        critical_percent: 100,
    };

    /// The deadline multiplier applied to `target_minutes` to produce an
    /// effective timeout when a WorkItem has no explicit override (spec
    /// §4.7: "SlaTarget(task_type).target_minutes × configured critical
    /// multiplier").
    pub fn effective_timeout_minutes(&self, critical_multiplier: f64) -> u32 {
        ((self.target_minutes as f64) * critical_multiplier).round() as u32
    }
}

impl Default for SlaTarget {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
#[path = "sla_tests.rs"]
mod tests;
