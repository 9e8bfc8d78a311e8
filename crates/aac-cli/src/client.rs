// SPDX-License-Identifier: MIT

//! Daemon client: connects to `aacd`'s Unix socket and exchanges one
//! request/response pair per call.

use aac_daemon::protocol::{Request, Response};
use aac_daemon::wire::{self, WireError};
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (no socket at {0})")]
    DaemonNotRunning(PathBuf),

    #[error("protocol error: {0}")]
    Protocol(#[from] WireError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The Unix socket path the daemon listens on: `$ASSIGNER_DB_PATH` with its
/// extension replaced by `.sock` (mirrors `aacd`'s own derivation).
pub fn socket_path() -> PathBuf {
    let db_path = std::env::var("ASSIGNER_DB_PATH").unwrap_or_else(|_| "./assigner.db".to_string());
    PathBuf::from(db_path).with_extension("sock")
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    pub async fn call(&self, request: Request) -> Result<Response, ClientError> {
        let mut stream = UnixStream::connect(&self.socket_path).await.map_err(|_| ClientError::DaemonNotRunning(self.socket_path.clone()))?;
        let (mut reader, mut writer) = stream.split();
        let bytes = wire::encode(&request)?;
        wire::write_message(&mut writer, &bytes).await?;
        let response_bytes = wire::read_message(&mut reader).await?;
        Ok(wire::decode(&response_bytes)?)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
