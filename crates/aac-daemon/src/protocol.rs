// SPDX-License-Identifier: MIT

//! IPC protocol between `aac` (CLI) and `aacd` (daemon): the request/response
//! enums exchanged over the wire format in [`crate::wire`] (spec §6's CLI
//! surface: enqueue/list/get/cancel/retry/sessions/stats/config reload/query).

use aac_core::{AssignmentEvent, Session, WorkItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request from CLI to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    Ping,

    /// Admit a new work item (spec §4.3 Intake).
    Enqueue {
        payload: String,
        source: String,
        #[serde(default)]
        priority: u8,
        task_type: String,
        #[serde(default)]
        target_session: Option<String>,
        #[serde(default)]
        target_provider: Option<String>,
        #[serde(default)]
        timeout_minutes: Option<u32>,
    },

    /// Page through work items, optionally filtered by status.
    List {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        limit: Option<i64>,
        #[serde(default)]
        offset: Option<i64>,
    },

    /// Fetch one work item plus its full event history.
    Get { id: String },

    Cancel { id: String },

    /// Force a retryable item back to `pending` immediately.
    Retry { id: String },

    Sessions {
        #[serde(default)]
        status: Option<String>,
    },

    Stats,

    ConfigReload,

    /// Run a named query template with bound parameters, optionally
    /// rendering the result via `format` instead of returning raw rows.
    Query {
        name: String,
        #[serde(default)]
        params: HashMap<String, serde_json::Value>,
        #[serde(default)]
        format: Option<ExportFormat>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl From<ExportFormat> for aac_engine::ExportFormat {
    fn from(value: ExportFormat) -> Self {
        match value {
            ExportFormat::Json => aac_engine::ExportFormat::Json,
            ExportFormat::Csv => aac_engine::ExportFormat::Csv,
        }
    }
}

/// Response from daemon to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Pong,

    WorkItem {
        item: WorkItem,
    },

    /// A work item plus its append-only event history (`Get`'s response).
    WorkItemDetail {
        item: WorkItem,
        events: Vec<AssignmentEvent>,
    },

    WorkItems {
        items: Vec<WorkItem>,
        next_offset: Option<i64>,
    },

    Sessions {
        sessions: Vec<Session>,
    },

    Stats {
        queue_counts: HashMap<String, i64>,
        session_count: usize,
    },

    ConfigReloaded {
        routing_rules: usize,
        sla_targets: usize,
        query_templates: usize,
    },

    /// Raw query rows as JSON, or a rendered export when the request asked
    /// for one.
    QueryResult {
        rows: Vec<serde_json::Value>,
        #[serde(default)]
        rendered: Option<String>,
    },

    /// An error response, tagged with the exit code the CLI should use
    /// (spec §6: 0 ok, 1 not found, 2 invalid argument, 3 invalid config,
    /// 4 store unavailable, 5 conflict).
    Error {
        message: String,
        code: u8,
    },
}

pub const EXIT_OK: u8 = 0;
pub const EXIT_NOT_FOUND: u8 = 1;
pub const EXIT_INVALID_ARGUMENT: u8 = 2;
pub const EXIT_INVALID_CONFIG: u8 = 3;
pub const EXIT_STORE_UNAVAILABLE: u8 = 4;
pub const EXIT_CONFLICT: u8 = 5;

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
