// SPDX-License-Identifier: MIT

//! Queue Store: durable work item CRUD and state transitions (spec §4.3).

use crate::error::StorageError;
use crate::store::Store;
use aac_core::{WorkItem, WorkItemConfig, WorkItemId, WorkItemStatus};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_work_item(row: &Row) -> rusqlite::Result<WorkItem> {
    let status: String = row.get("status")?;
    let status = parse_status(&status);
    Ok(WorkItem {
        id: WorkItemId::from(row.get::<_, String>("id")?),
        payload: row.get("payload")?,
        source: row.get("source")?,
        priority: row.get::<_, i64>("priority")? as u8,
        status,
        task_type: row.get("task_type")?,
        target_session: row.get("target_session")?,
        target_provider: row.get("target_provider")?,
        assigned_session: row.get("assigned_session")?,
        created_at_ms: row.get("created_at")?,
        assigned_at_ms: row.get("assigned_at")?,
        completed_at_ms: row.get("completed_at")?,
        retry_count: row.get::<_, i64>("retry_count")? as u32,
        max_retries: row.get::<_, i64>("max_retries")? as u32,
        timeout_minutes: row.get::<_, Option<i64>>("timeout_minutes")?.map(|v| v as u32),
        last_error: row.get("last_error")?,
        archived: row.get::<_, i64>("archived")? != 0,
        archived_at_ms: row.get("archived_at")?,
    })
}

fn status_str(status: WorkItemStatus) -> &'static str {
    match status {
        WorkItemStatus::Pending => "pending",
        WorkItemStatus::Assigned => "assigned",
        WorkItemStatus::InProgress => "in_progress",
        WorkItemStatus::Completed => "completed",
        WorkItemStatus::Failed => "failed",
        WorkItemStatus::Cancelled => "cancelled",
        WorkItemStatus::Expired => "expired",
    }
}

fn parse_status(s: &str) -> WorkItemStatus {
    match s {
        "pending" => WorkItemStatus::Pending,
        "assigned" => WorkItemStatus::Assigned,
        "in_progress" => WorkItemStatus::InProgress,
        "completed" => WorkItemStatus::Completed,
        "failed" => WorkItemStatus::Failed,
        "cancelled" => WorkItemStatus::Cancelled,
        _ => WorkItemStatus::Expired,
    }
}

/// Queue Store: the durable priority queue of work items (spec §4.3).
pub struct Queue<'a> {
    store: &'a Store,
}

impl<'a> Queue<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn enqueue(&self, id: WorkItemId, config: WorkItemConfig, now_ms: i64) -> Result<WorkItem, StorageError> {
        let item = WorkItem::new(id, config, now_ms);
        let conn = self.store.conn.lock();
        conn.execute(
            "INSERT INTO work_items (
                id, payload, source, priority, status, target_session, target_provider,
                assigned_session, task_type, created_at, assigned_at, completed_at,
                retry_count, max_retries, timeout_minutes, archived, archived_at, last_error
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18)",
            params![
                item.id.as_str(),
                item.payload,
                item.source,
                item.priority as i64,
                status_str(item.status),
                item.target_session,
                item.target_provider,
                item.assigned_session,
                item.task_type,
                item.created_at_ms,
                item.assigned_at_ms,
                item.completed_at_ms,
                item.retry_count as i64,
                item.max_retries as i64,
                item.timeout_minutes.map(|v| v as i64),
                item.archived as i64,
                item.archived_at_ms,
                item.last_error,
            ],
        )?;
        Ok(item)
    }

    pub fn get(&self, id: &str) -> Result<WorkItem, StorageError> {
        let conn = self.store.conn.lock();
        conn.query_row("SELECT * FROM work_items WHERE id = ?1", params![id], row_to_work_item)
            .optional()?
            .ok_or_else(|| StorageError::WorkItemNotFound(id.to_string()))
    }

    /// All non-archived items ordered by `(status, priority DESC, created_at ASC)`,
    /// optionally filtered to one status.
    pub fn list(&self, status: Option<WorkItemStatus>, limit: Option<i64>) -> Result<Vec<WorkItem>, StorageError> {
        let conn = self.store.conn.lock();
        let limit = limit.unwrap_or(i64::MAX);
        let mut items = Vec::new();
        if let Some(status) = status {
            let mut stmt = conn.prepare(
                "SELECT * FROM work_items WHERE status = ?1 AND archived = 0
                 ORDER BY priority DESC, created_at ASC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![status_str(status), limit], row_to_work_item)?;
            for row in rows {
                items.push(row?);
            }
        } else {
            let mut stmt = conn.prepare(
                "SELECT * FROM work_items WHERE archived = 0
                 ORDER BY status, priority DESC, created_at ASC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], row_to_work_item)?;
            for row in rows {
                items.push(row?);
            }
        }
        Ok(items)
    }

    /// The highest-priority, oldest pending item eligible for a given
    /// task_type, if any (read-only candidate lookup; binding happens via
    /// `mark_assigned`'s CAS).
    pub fn next_pending(&self, task_type: Option<&str>) -> Result<Option<WorkItem>, StorageError> {
        let conn = self.store.conn.lock();
        let result = if let Some(task_type) = task_type {
            conn.query_row(
                "SELECT * FROM work_items WHERE status = 'pending' AND task_type = ?1 AND archived = 0
                 ORDER BY priority DESC, created_at ASC LIMIT 1",
                params![task_type],
                row_to_work_item,
            )
            .optional()?
        } else {
            conn.query_row(
                "SELECT * FROM work_items WHERE status = 'pending' AND archived = 0
                 ORDER BY priority DESC, created_at ASC LIMIT 1",
                [],
                row_to_work_item,
            )
            .optional()?
        };
        Ok(result)
    }

    /// Compare-and-swap transition from `pending` to `assigned`, binding the
    /// session. Returns `Ok(false)` if another dispatcher already claimed it
    /// (spec §5: "no double-claim under concurrency").
    pub fn mark_assigned(&self, id: &str, session_name: &str, now_ms: i64) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE work_items SET status = 'assigned', assigned_session = ?1, assigned_at = ?2
             WHERE id = ?3 AND status = 'pending'",
            params![session_name, now_ms, id],
        )?;
        Ok(updated == 1)
    }

    pub fn mark_in_progress(&self, id: &str) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE work_items SET status = 'in_progress' WHERE id = ?1 AND status = 'assigned'",
            params![id],
        )?;
        Ok(updated == 1)
    }

    pub fn mark_completed(&self, id: &str, now_ms: i64) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE work_items SET status = 'completed', completed_at = ?1
             WHERE id = ?2 AND status IN ('assigned', 'in_progress')",
            params![now_ms, id],
        )?;
        Ok(updated == 1)
    }

    /// Mark terminally failed (retries exhausted or non-retryable).
    pub fn mark_failed(&self, id: &str, error: &str, now_ms: i64) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE work_items SET status = 'failed', completed_at = ?1, last_error = ?2
             WHERE id = ?3 AND status IN ('assigned', 'in_progress')",
            params![now_ms, error, id],
        )?;
        Ok(updated == 1)
    }

    /// Return an item to `pending` for another attempt, incrementing
    /// `retry_count` and releasing its session binding (spec §4.6).
    pub fn retry(&self, id: &str, error: &str) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE work_items SET status = 'pending', assigned_session = NULL, assigned_at = NULL,
                retry_count = retry_count + 1, last_error = ?1
             WHERE id = ?2 AND status IN ('assigned', 'in_progress')",
            params![error, id],
        )?;
        Ok(updated == 1)
    }

    pub fn cancel(&self, id: &str, now_ms: i64) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE work_items SET status = 'cancelled', completed_at = ?1
             WHERE id = ?2 AND status NOT IN ('completed', 'failed', 'cancelled', 'expired')",
            params![now_ms, id],
        )?;
        Ok(updated == 1)
    }

    pub fn expire(&self, id: &str, now_ms: i64) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE work_items SET status = 'expired', completed_at = ?1, assigned_session = NULL
             WHERE id = ?2 AND status IN ('assigned', 'in_progress')",
            params![now_ms, id],
        )?;
        Ok(updated == 1)
    }

    pub fn set_archived(&self, id: &str, now_ms: i64) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE work_items SET archived = 1, archived_at = ?1 WHERE id = ?2 AND archived = 0",
            params![now_ms, id],
        )?;
        Ok(updated == 1)
    }

    /// Pending-item counts grouped by task_type, for the Telemetry API's
    /// `queue_depth` query.
    pub fn counts_by_status(&self) -> Result<Vec<(String, i64)>, StorageError> {
        let conn = self.store.conn.lock();
        let mut stmt = conn.prepare("SELECT status, count(*) FROM work_items GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
