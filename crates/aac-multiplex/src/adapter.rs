// SPDX-License-Identifier: MIT

//! The terminal-multiplexer control surface the Session Probe and
//! Dispatcher talk to (spec §3: "a terminal-multiplexer control surface
//! (list windows, capture output, send keystrokes)").

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MultiplexError {
    #[error("window not found: {0}")]
    NotFound(String),
    #[error("command timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// A discovered multiplexer window, identified by its session name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub name: String,
}

/// Control surface for a terminal multiplexer (tmux, etc). Every operation
/// carries its own timeout so a wedged window can't stall the Probe or
/// Dispatcher (spec §4.4/§4.6).
#[async_trait]
pub trait MultiplexAdapter: Send + Sync + 'static {
    async fn list_windows(&self, timeout: std::time::Duration) -> Result<Vec<WindowInfo>, MultiplexError>;

    /// Capture the last `lines` lines of a window's output.
    async fn capture_output(
        &self,
        name: &str,
        lines: u32,
        timeout: std::time::Duration,
    ) -> Result<String, MultiplexError>;

    /// Send literal text (no key-name interpretation) without submitting it.
    async fn send_text(&self, name: &str, text: &str, timeout: std::time::Duration) -> Result<(), MultiplexError>;

    /// Submit the pending input (send the Enter key).
    async fn send_submit(&self, name: &str, timeout: std::time::Duration) -> Result<(), MultiplexError>;
}
