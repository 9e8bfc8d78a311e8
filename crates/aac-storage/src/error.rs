// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("work item '{0}' not found")]
    WorkItemNotFound(String),

    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("work item '{id}' is in status '{actual}', expected '{expected}'")]
    UnexpectedStatus {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("session '{0}' is already bound to work item '{1}'")]
    SessionAlreadyBound(String, String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid query parameter: {0}")]
    InvalidParameter(String),
}
