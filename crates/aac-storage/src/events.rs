// SPDX-License-Identifier: MIT

//! Append-only assignment event log (spec §3, §4.9).

use crate::error::StorageError;
use crate::store::Store;
use aac_core::{AssignmentAction, AssignmentEvent, AssignmentEventId};
use rusqlite::{params, Row};

fn parse_action(s: &str) -> AssignmentAction {
    match s {
        "queued" => AssignmentAction::Queued,
        "selected" => AssignmentAction::Selected,
        "delivered" => AssignmentAction::Delivered,
        "observed_progress" => AssignmentAction::ObservedProgress,
        "completed" => AssignmentAction::Completed,
        "failed" => AssignmentAction::Failed,
        "timed_out" => AssignmentAction::TimedOut,
        "retried" => AssignmentAction::Retried,
        "cancelled" => AssignmentAction::Cancelled,
        _ => AssignmentAction::Reassigned,
    }
}

fn row_to_event(row: &Row) -> rusqlite::Result<AssignmentEvent> {
    let details_json: String = row.get("details")?;
    let action_str: String = row.get("action")?;
    Ok(AssignmentEvent {
        id: AssignmentEventId::from(row.get::<_, String>("id")?),
        work_item_id: row.get("work_item_id")?,
        session_name: row.get("session_name")?,
        action: parse_action(&action_str),
        timestamp_ms: row.get("created_at")?,
        details: serde_json::from_str(&details_json).unwrap_or(serde_json::Value::Null),
    })
}

/// Append-only log writer/reader (spec §3: "assignment_events").
pub struct EventLog<'a> {
    store: &'a Store,
}

impl<'a> EventLog<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn append(&self, event: &AssignmentEvent) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        conn.execute(
            "INSERT INTO assignment_events (id, work_item_id, session_name, action, created_at, details)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                event.id.as_str(),
                event.work_item_id,
                event.session_name,
                event.action.to_string(),
                event.timestamp_ms,
                serde_json::to_string(&event.details)?,
            ],
        )?;
        Ok(())
    }

    /// The full audit trail for one work item, oldest first (spec §4.9's
    /// per-item AssignmentEvent history).
    pub fn history_for(&self, work_item_id: &str) -> Result<Vec<AssignmentEvent>, StorageError> {
        let conn = self.store.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT * FROM assignment_events WHERE work_item_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![work_item_id], row_to_event)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
