// SPDX-License-Identifier: MIT

//! Schema DDL and migration bookkeeping (spec §6).

use crate::error::StorageError;
use rusqlite::Connection;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS work_items (
    id                  TEXT PRIMARY KEY,
    payload             TEXT NOT NULL,
    source              TEXT NOT NULL,
    priority            INTEGER NOT NULL,
    status              TEXT NOT NULL,
    target_session      TEXT,
    target_provider     TEXT,
    assigned_session    TEXT,
    task_type           TEXT NOT NULL,
    created_at          INTEGER NOT NULL,
    assigned_at         INTEGER,
    completed_at        INTEGER,
    retry_count         INTEGER NOT NULL DEFAULT 0,
    max_retries         INTEGER NOT NULL DEFAULT 3,
    timeout_minutes     INTEGER,
    archived            INTEGER NOT NULL DEFAULT 0,
    archived_at         INTEGER,
    last_error          TEXT
);

CREATE INDEX IF NOT EXISTS idx_work_items_status_priority
    ON work_items (status, priority DESC, created_at ASC);
CREATE INDEX IF NOT EXISTS idx_work_items_task_type_status
    ON work_items (task_type, status);
CREATE INDEX IF NOT EXISTS idx_work_items_archived
    ON work_items (archived);

CREATE TABLE IF NOT EXISTS assignment_events (
    id              TEXT PRIMARY KEY,
    work_item_id    TEXT NOT NULL REFERENCES work_items(id),
    session_name    TEXT,
    action          TEXT NOT NULL,
    created_at      INTEGER NOT NULL,
    details         TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_assignment_events_item_created
    ON assignment_events (work_item_id, created_at);

CREATE TABLE IF NOT EXISTS sessions (
    name                TEXT PRIMARY KEY,
    status              TEXT NOT NULL,
    last_activity       INTEGER NOT NULL,
    current_work_id     TEXT REFERENCES work_items(id),
    working_dir         TEXT NOT NULL,
    is_claude           INTEGER NOT NULL DEFAULT 0,
    last_output         TEXT,
    updated_at          INTEGER NOT NULL,
    provider            TEXT NOT NULL DEFAULT 'unknown',
    specialty           TEXT NOT NULL DEFAULT '[]',
    stability_score     REAL NOT NULL DEFAULT 1.0,
    circuit_state       TEXT NOT NULL DEFAULT 'closed',
    total_completed     INTEGER NOT NULL DEFAULT 0,
    total_failed        INTEGER NOT NULL DEFAULT 0,
    protected           INTEGER NOT NULL DEFAULT 0,
    consecutive_failures INTEGER NOT NULL DEFAULT 0,
    circuit_opened_at   INTEGER
);

CREATE INDEX IF NOT EXISTS idx_sessions_status_activity
    ON sessions (status, last_activity);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

/// Apply all migrations up to [`CURRENT_SCHEMA_VERSION`]. Idempotent: safe to
/// call on every startup.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(SCHEMA_V1)?;

    let current: Option<i64> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .ok();

    match current {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
        }
        Some(v) if v < CURRENT_SCHEMA_VERSION => {
            conn.execute(
                "UPDATE schema_version SET version = ?1",
                [CURRENT_SCHEMA_VERSION],
            )?;
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
