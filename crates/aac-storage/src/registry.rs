// SPDX-License-Identifier: MIT

//! Session Registry: durable inventory of known sessions (spec §4.4).

use crate::error::StorageError;
use crate::store::Store;
use aac_core::{CircuitState, Provider, Session, SessionStatus};
use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;

fn status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "idle",
        SessionStatus::Busy => "busy",
        SessionStatus::WaitingInput => "waiting_input",
        SessionStatus::Unknown => "unknown",
        SessionStatus::Offline => "offline",
    }
}

fn parse_status(s: &str) -> SessionStatus {
    match s {
        "idle" => SessionStatus::Idle,
        "busy" => SessionStatus::Busy,
        "waiting_input" => SessionStatus::WaitingInput,
        "offline" => SessionStatus::Offline,
        _ => SessionStatus::Unknown,
    }
}

fn circuit_str(state: CircuitState) -> &'static str {
    match state {
        CircuitState::Closed => "closed",
        CircuitState::Open => "open",
        CircuitState::HalfOpen => "half_open",
    }
}

fn parse_circuit(s: &str) -> CircuitState {
    match s {
        "open" => CircuitState::Open,
        "half_open" => CircuitState::HalfOpen,
        _ => CircuitState::Closed,
    }
}

fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
    let specialty_json: String = row.get("specialty")?;
    let specialty: Vec<String> = serde_json::from_str(&specialty_json).unwrap_or_default();
    let fingerprint_json: Option<String> = row.get("baseline_fingerprint")?;
    let baseline_fingerprint = fingerprint_json.and_then(|s| serde_json::from_str(&s).ok());

    Ok(Session {
        name: row.get("name")?,
        status: parse_status(&row.get::<_, String>("status")?),
        provider: Provider::from_str(&row.get::<_, String>("provider")?).unwrap_or(Provider::Unknown),
        specialty,
        last_activity_ms: row.get("last_activity")?,
        current_work_id: row.get("current_work_id")?,
        working_directory: row.get("working_dir")?,
        last_captured_output: row.get::<_, Option<String>>("last_output")?.unwrap_or_default(),
        stability_score: row.get("stability_score")?,
        circuit_state: parse_circuit(&row.get::<_, String>("circuit_state")?),
        total_completed: row.get::<_, i64>("total_completed")? as u64,
        total_failed: row.get::<_, i64>("total_failed")? as u64,
        baseline_fingerprint,
        protected: row.get::<_, i64>("protected")? != 0,
        consecutive_failures: row.get::<_, i64>("consecutive_failures")? as u32,
        circuit_opened_at_ms: row.get("circuit_opened_at")?,
    })
}

/// Session Registry (spec §4.4): durable inventory of known sessions, their
/// last-observed state, learned metrics, and protection flags.
pub struct Registry<'a> {
    store: &'a Store,
}

impl<'a> Registry<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert a session if new, otherwise leave existing learned state
    /// untouched (idempotent discovery, spec §4.4).
    pub fn upsert(&self, session: &Session, now_ms: i64) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        let exists: bool = conn
            .query_row("SELECT 1 FROM sessions WHERE name = ?1", params![session.name], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if exists {
            return Ok(());
        }
        conn.execute(
            "INSERT INTO sessions (
                name, status, last_activity, current_work_id, working_dir, is_claude,
                last_output, updated_at, provider, specialty, stability_score, circuit_state,
                total_completed, total_failed, protected, consecutive_failures, circuit_opened_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)",
            params![
                session.name,
                status_str(session.status),
                session.last_activity_ms,
                session.current_work_id,
                session.working_directory,
                (session.provider == Provider::Claude) as i64,
                session.last_captured_output,
                now_ms,
                session.provider.to_string(),
                serde_json::to_string(&session.specialty)?,
                session.stability_score,
                circuit_str(session.circuit_state),
                session.total_completed as i64,
                session.total_failed as i64,
                session.protected as i64,
                session.consecutive_failures as i64,
                session.circuit_opened_at_ms,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Session, StorageError> {
        let conn = self.store.conn.lock();
        conn.query_row("SELECT * FROM sessions WHERE name = ?1", params![name], row_to_session)
            .optional()?
            .ok_or_else(|| StorageError::SessionNotFound(name.to_string()))
    }

    pub fn list(&self) -> Result<Vec<Session>, StorageError> {
        let conn = self.store.conn.lock();
        let mut stmt = conn.prepare("SELECT * FROM sessions ORDER BY name")?;
        let rows = stmt.query_map([], row_to_session)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Apply freshly-probed status/provider/output (spec §4.4, written by
    /// the Session Probe).
    pub fn update_observed_state(
        &self,
        name: &str,
        status: SessionStatus,
        provider: Provider,
        last_output: &str,
        now_ms: i64,
    ) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        conn.execute(
            "UPDATE sessions SET status = ?1, provider = ?2, last_output = ?3,
                last_activity = ?4, updated_at = ?4, is_claude = ?5
             WHERE name = ?6",
            params![
                status_str(status),
                provider.to_string(),
                last_output,
                now_ms,
                (provider == Provider::Claude) as i64,
                name,
            ],
        )?;
        Ok(())
    }

    /// Bind a work item to a session, flipping it to `busy`. Fails the CAS
    /// if the session is already bound (spec invariant: "exactly one
    /// non-terminal work_id may be bound to a session").
    pub fn bind(&self, name: &str, work_item_id: &str, now_ms: i64) -> Result<bool, StorageError> {
        let conn = self.store.conn.lock();
        let updated = conn.execute(
            "UPDATE sessions SET status = 'busy', current_work_id = ?1, last_activity = ?2, updated_at = ?2
             WHERE name = ?3 AND current_work_id IS NULL",
            params![work_item_id, now_ms, name],
        )?;
        Ok(updated == 1)
    }

    /// Release a session's binding, returning it to `idle`. Idempotent: a
    /// session with no binding stays unchanged and this still succeeds.
    pub fn release(&self, name: &str, now_ms: i64) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        conn.execute(
            "UPDATE sessions SET status = 'idle', current_work_id = NULL, last_activity = ?1, updated_at = ?1
             WHERE name = ?2",
            params![now_ms, name],
        )?;
        Ok(())
    }

    /// Record a terminal outcome: bumps `total_completed`/`total_failed` and
    /// the consecutive-failure counter (spec §4.8, the explicit
    /// post-condition called for by the source's ambiguous counter bug).
    pub fn record_outcome(&self, name: &str, succeeded: bool) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        if succeeded {
            conn.execute(
                "UPDATE sessions SET total_completed = total_completed + 1, consecutive_failures = 0
                 WHERE name = ?1",
                params![name],
            )?;
        } else {
            conn.execute(
                "UPDATE sessions SET total_failed = total_failed + 1, consecutive_failures = consecutive_failures + 1
                 WHERE name = ?1",
                params![name],
            )?;
        }
        Ok(())
    }

    pub fn set_circuit(&self, name: &str, state: CircuitState, now_ms: Option<i64>) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        conn.execute(
            "UPDATE sessions SET circuit_state = ?1, circuit_opened_at = ?2 WHERE name = ?3",
            params![circuit_str(state), now_ms, name],
        )?;
        Ok(())
    }

    pub fn set_stability_score(&self, name: &str, score: f64) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        conn.execute("UPDATE sessions SET stability_score = ?1 WHERE name = ?2", params![score, name])?;
        Ok(())
    }

    pub fn set_baseline_fingerprint(&self, name: &str, fingerprint: &[f64]) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        conn.execute(
            "UPDATE sessions SET baseline_fingerprint = ?1 WHERE name = ?2",
            params![serde_json::to_string(fingerprint)?, name],
        )?;
        Ok(())
    }

    /// Transition to `offline` and release any bound work item (spec §4.4
    /// invariant: "a session absent from the multiplexer for longer than a
    /// configurable grace period transitions to offline and its
    /// current_work_id... is released to the queue for retry").
    pub fn mark_offline(&self, name: &str, now_ms: i64) -> Result<Option<String>, StorageError> {
        let conn = self.store.conn.lock();
        let released: Option<String> = conn
            .query_row("SELECT current_work_id FROM sessions WHERE name = ?1", params![name], |row| row.get(0))
            .optional()?
            .flatten();
        conn.execute(
            "UPDATE sessions SET status = 'offline', current_work_id = NULL, last_activity = ?1, updated_at = ?1
             WHERE name = ?2",
            params![now_ms, name],
        )?;
        Ok(released)
    }

    pub fn set_protected(&self, name: &str, protected: bool) -> Result<(), StorageError> {
        let conn = self.store.conn.lock();
        conn.execute("UPDATE sessions SET protected = ?1 WHERE name = ?2", params![protected as i64, name])?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
