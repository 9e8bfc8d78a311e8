// SPDX-License-Identifier: MIT

//! Wire format for the daemon/CLI IPC protocol: a 4-byte big-endian length
//! prefix followed by a JSON payload (spec §6: "a small request/response
//! protocol over a local Unix domain socket").

use crate::protocol::{Request, Response};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,
}

/// Generous upper bound; named-query exports are the largest payloads this
/// protocol ever carries.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, WireError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge { size: json.len(), max: MAX_MESSAGE_SIZE });
    }
    Ok(json)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub async fn read_message<R: tokio::io::AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>, WireError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(WireError::ConnectionClosed),
        Err(e) => return Err(WireError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(writer: &mut W, data: &[u8]) -> Result<(), WireError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, WireError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader)).await.map_err(|_| WireError::Timeout)??;
    decode(&bytes)
}

pub async fn write_response<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: std::time::Duration,
) -> Result<(), WireError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data)).await.map_err(|_| WireError::Timeout)?
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
