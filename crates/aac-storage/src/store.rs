// SPDX-License-Identifier: MIT

//! Store: a handle to the embedded SQL database (spec §6).
//!
//! A single `rusqlite::Connection` guarded by a mutex. SQLite serializes
//! writers anyway; the mutex just keeps the `Connection` object itself
//! `Sync` without reaching for a connection pool this workload doesn't need.

use crate::error::StorageError;
use crate::migration::run_migrations;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

pub struct Store {
    pub(crate) conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database file at `path` and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory store, for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
