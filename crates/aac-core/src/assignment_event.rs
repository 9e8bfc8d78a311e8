// SPDX-License-Identifier: MIT

//! AssignmentEvent: append-only audit log entries (spec §3).

use serde::{Deserialize, Serialize};

pub use crate::id::AssignmentEventId;

/// The action recorded by an AssignmentEvent. The sequence of actions for a
/// given work item must match the state DAG in spec §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentAction {
    Queued,
    Selected,
    Delivered,
    ObservedProgress,
    Completed,
    Failed,
    TimedOut,
    Retried,
    Cancelled,
    Reassigned,
}

impl std::fmt::Display for AssignmentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssignmentAction::Queued => "queued",
            AssignmentAction::Selected => "selected",
            AssignmentAction::Delivered => "delivered",
            AssignmentAction::ObservedProgress => "observed_progress",
            AssignmentAction::Completed => "completed",
            AssignmentAction::Failed => "failed",
            AssignmentAction::TimedOut => "timed_out",
            AssignmentAction::Retried => "retried",
            AssignmentAction::Cancelled => "cancelled",
            AssignmentAction::Reassigned => "reassigned",
        };
        write!(f, "{s}")
    }
}

/// A single append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEvent {
    pub id: AssignmentEventId,
    pub work_item_id: String,
    pub session_name: Option<String>,
    pub action: AssignmentAction,
    pub timestamp_ms: i64,
    pub details: serde_json::Value,
}

impl AssignmentEvent {
    pub fn new(
        id: AssignmentEventId,
        work_item_id: impl Into<String>,
        session_name: Option<String>,
        action: AssignmentAction,
        timestamp_ms: i64,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id,
            work_item_id: work_item_id.into(),
            session_name,
            action,
            timestamp_ms,
            details,
        }
    }
}

#[cfg(test)]
#[path = "assignment_event_tests.rs"]
mod tests;
