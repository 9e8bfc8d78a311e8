// SPDX-License-Identifier: MIT

//! Session Probe: periodic discovery and classification of live sessions
//! (spec §4.4). The probe is the only source of session state truth; it
//! reports through [`ProbeSink`] rather than writing storage directly, so
//! this crate stays independent of aac-storage.

use crate::adapter::MultiplexAdapter;
use crate::classifier::{classify, Classification, PatternTable};
use aac_core::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Receives probe observations. Implemented by the Session Registry
/// integration in aac-engine.
#[async_trait::async_trait]
pub trait ProbeSink: Send + Sync + 'static {
    async fn observe(&self, session_name: &str, classification: Classification, captured: &str, now_ms: i64);
    async fn mark_offline(&self, session_name: &str, now_ms: i64);
    /// Names of sessions the sink already knows about, so newly discovered
    /// windows can be distinguished from ones going missing.
    async fn known_session_names(&self) -> Vec<String>;
}

pub struct ProbeConfig {
    pub poll_interval: Duration,
    pub capture_lines: u32,
    pub call_timeout: Duration,
    /// T_offline: how long a window may be missing before its session is
    /// marked offline.
    pub offline_after: Duration,
    pub pattern_table: PatternTable,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            capture_lines: 200,
            call_timeout: Duration::from_secs(2),
            offline_after: Duration::from_secs(30),
            pattern_table: PatternTable::default(),
        }
    }
}

/// Tracks, per known session name, the last time its window was observed
/// present — used to detect T_offline expiry.
pub struct SessionProbe<A: MultiplexAdapter, S: ProbeSink, C: Clock> {
    adapter: Arc<A>,
    sink: Arc<S>,
    clock: Arc<C>,
    config: ProbeConfig,
    last_seen_ms: HashMap<String, i64>,
}

impl<A: MultiplexAdapter, S: ProbeSink, C: Clock> SessionProbe<A, S, C> {
    pub fn new(adapter: Arc<A>, sink: Arc<S>, clock: Arc<C>, config: ProbeConfig) -> Self {
        Self {
            adapter,
            sink,
            clock,
            config,
            last_seen_ms: HashMap::new(),
        }
    }

    /// Run the poll loop forever, sleeping `poll_interval` between passes.
    pub async fn run_forever(&mut self) {
        loop {
            self.tick().await;
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Execute one discover-capture-classify pass. Exposed separately from
    /// `run_forever` so tests can drive it deterministically.
    pub async fn tick(&mut self) {
        let now_ms = self.clock.epoch_ms();
        let windows = match self.adapter.list_windows(self.config.call_timeout).await {
            Ok(windows) => windows,
            Err(err) => {
                warn!(error = %err, "session probe failed to list windows");
                return;
            }
        };
        let present: std::collections::HashSet<String> = windows.iter().map(|w| w.name.clone()).collect();

        for window in &windows {
            self.last_seen_ms.insert(window.name.clone(), now_ms);
            match self
                .adapter
                .capture_output(&window.name, self.config.capture_lines, self.config.call_timeout)
                .await
            {
                Ok(captured) => {
                    let classification = classify(&captured, &self.config.pattern_table);
                    debug!(session = %window.name, status = %classification.status, "probe classified session");
                    self.sink.observe(&window.name, classification, &captured, now_ms).await;
                }
                Err(err) => {
                    warn!(session = %window.name, error = %err, "session probe failed to capture output");
                }
            }
        }

        for known in self.sink.known_session_names().await {
            if present.contains(&known) {
                continue;
            }
            let last_seen = *self.last_seen_ms.get(&known).unwrap_or(&now_ms);
            if now_ms.saturating_sub(last_seen) >= self.config.offline_after.as_millis() as i64 {
                self.sink.mark_offline(&known, now_ms).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
