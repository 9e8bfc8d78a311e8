// SPDX-License-Identifier: MIT

//! WorkItem: a queued unit of work ("prompt") and its lifecycle state machine.

use serde::{Deserialize, Serialize};

pub use crate::id::WorkItemId;

/// Default number of retries before a WorkItem is terminally failed.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Status of a WorkItem, forming the DAG in spec §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl WorkItemStatus {
    /// Terminal statuses are immutable except for the `archived` flip.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkItemStatus::Completed
                | WorkItemStatus::Failed
                | WorkItemStatus::Cancelled
                | WorkItemStatus::Expired
        )
    }
}

impl std::fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkItemStatus::Pending => "pending",
            WorkItemStatus::Assigned => "assigned",
            WorkItemStatus::InProgress => "in_progress",
            WorkItemStatus::Completed => "completed",
            WorkItemStatus::Failed => "failed",
            WorkItemStatus::Cancelled => "cancelled",
            WorkItemStatus::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// Parameters accepted by `Queue::enqueue`.
#[derive(Debug, Clone)]
pub struct WorkItemConfig {
    pub payload: String,
    pub source: String,
    pub priority: u8,
    pub task_type: String,
    pub target_session: Option<String>,
    pub target_provider: Option<String>,
    pub timeout_minutes: Option<u32>,
    pub max_retries: u32,
}

impl WorkItemConfig {
    pub fn new(payload: impl Into<String>, source: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            source: source.into(),
            priority: 0,
            task_type: task_type.into(),
            target_session: None,
            target_provider: None,
            timeout_minutes: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_target_session(mut self, session: impl Into<String>) -> Self {
        self.target_session = Some(session.into());
        self
    }

    pub fn with_target_provider(mut self, provider: impl Into<String>) -> Self {
        self.target_provider = Some(provider.into());
        self
    }

    pub fn with_timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }
}

/// A queued unit of work, a.k.a. "prompt" (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub payload: String,
    pub source: String,
    pub priority: u8,
    pub status: WorkItemStatus,
    pub task_type: String,
    pub target_session: Option<String>,
    pub target_provider: Option<String>,
    pub assigned_session: Option<String>,
    pub created_at_ms: i64,
    pub assigned_at_ms: Option<i64>,
    pub completed_at_ms: Option<i64>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub timeout_minutes: Option<u32>,
    pub last_error: Option<String>,
    pub archived: bool,
    pub archived_at_ms: Option<i64>,
}

impl WorkItem {
    /// Construct a new pending WorkItem. `effective_timeout_minutes` is the
    /// resolved override-or-SLA value so that `effective_timeout()` never
    /// has to reach back into configuration.
    pub fn new(id: WorkItemId, config: WorkItemConfig, created_at_ms: i64) -> Self {
        Self {
            id,
            payload: config.payload,
            source: config.source,
            priority: config.priority,
            status: WorkItemStatus::Pending,
            task_type: config.task_type,
            target_session: config.target_session,
            target_provider: config.target_provider,
            assigned_session: None,
            created_at_ms,
            assigned_at_ms: None,
            completed_at_ms: None,
            retry_count: 0,
            max_retries: config.max_retries,
            timeout_minutes: config.timeout_minutes,
            last_error: None,
            archived: false,
            archived_at_ms: None,
        }
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
