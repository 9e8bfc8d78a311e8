// SPDX-License-Identifier: MIT

//! In-memory MultiplexAdapter for deterministic tests.

use crate::adapter::{MultiplexAdapter, MultiplexError, WindowInfo};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
struct FakeWindow {
    lines: Vec<String>,
    sent_text: Vec<String>,
    submits: u32,
}

#[derive(Clone, Default)]
pub struct FakeMultiplexAdapter {
    windows: Arc<Mutex<HashMap<String, FakeWindow>>>,
}

impl FakeMultiplexAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_window(&self, name: impl Into<String>) {
        self.windows.lock().entry(name.into()).or_default();
    }

    pub fn remove_window(&self, name: &str) {
        self.windows.lock().remove(name);
    }

    pub fn set_output(&self, name: &str, lines: Vec<String>) {
        self.windows.lock().entry(name.to_string()).or_default().lines = lines;
    }

    pub fn sent_text(&self, name: &str) -> Vec<String> {
        self.windows.lock().get(name).map(|w| w.sent_text.clone()).unwrap_or_default()
    }

    pub fn submit_count(&self, name: &str) -> u32 {
        self.windows.lock().get(name).map(|w| w.submits).unwrap_or(0)
    }
}

#[async_trait]
impl MultiplexAdapter for FakeMultiplexAdapter {
    async fn list_windows(&self, _timeout: Duration) -> Result<Vec<WindowInfo>, MultiplexError> {
        Ok(self.windows.lock().keys().map(|name| WindowInfo { name: name.clone() }).collect())
    }

    async fn capture_output(&self, name: &str, lines: u32, _timeout: Duration) -> Result<String, MultiplexError> {
        let windows = self.windows.lock();
        let window = windows.get(name).ok_or_else(|| MultiplexError::NotFound(name.to_string()))?;
        let start = window.lines.len().saturating_sub(lines as usize);
        Ok(window.lines[start..].join("\n"))
    }

    async fn send_text(&self, name: &str, text: &str, _timeout: Duration) -> Result<(), MultiplexError> {
        let mut windows = self.windows.lock();
        let window = windows.get_mut(name).ok_or_else(|| MultiplexError::NotFound(name.to_string()))?;
        window.sent_text.push(text.to_string());
        Ok(())
    }

    async fn send_submit(&self, name: &str, _timeout: Duration) -> Result<(), MultiplexError> {
        let mut windows = self.windows.lock();
        let window = windows.get_mut(name).ok_or_else(|| MultiplexError::NotFound(name.to_string()))?;
        window.submits += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
