// SPDX-License-Identifier: MIT

//! tmux-backed MultiplexAdapter: shells out to the `tmux` CLI.

use crate::adapter::{MultiplexAdapter, MultiplexError, WindowInfo};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }
}

async fn run(mut cmd: Command, timeout: Duration) -> Result<std::process::Output, MultiplexError> {
    tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| MultiplexError::Timeout(timeout))?
        .map_err(|e| MultiplexError::CommandFailed(e.to_string()))
}

#[async_trait]
impl MultiplexAdapter for TmuxAdapter {
    async fn list_windows(&self, timeout: Duration) -> Result<Vec<WindowInfo>, MultiplexError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["list-sessions", "-F", "#{session_name}"]);
        let output = run(cmd, timeout).await?;
        if !output.status.success() {
            // tmux exits non-zero with no running server; treat as "no windows".
            return Ok(Vec::new());
        }
        let names = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| WindowInfo { name: line.trim().to_string() })
            .filter(|w| !w.name.is_empty())
            .collect();
        Ok(names)
    }

    async fn capture_output(&self, name: &str, lines: u32, timeout: Duration) -> Result<String, MultiplexError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["capture-pane", "-t", name, "-p", "-S", &format!("-{lines}")]);
        let output = run(cmd, timeout).await?;
        if !output.status.success() {
            return Err(MultiplexError::NotFound(name.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn send_text(&self, name: &str, text: &str, timeout: Duration) -> Result<(), MultiplexError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["send-keys", "-t", name, "-l", "--", text]);
        let output = run(cmd, timeout).await?;
        if !output.status.success() {
            return Err(MultiplexError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn send_submit(&self, name: &str, timeout: Duration) -> Result<(), MultiplexError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["send-keys", "-t", name, "Enter"]);
        let output = run(cmd, timeout).await?;
        if !output.status.success() {
            return Err(MultiplexError::NotFound(name.to_string()));
        }
        Ok(())
    }
}
