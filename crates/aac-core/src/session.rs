// SPDX-License-Identifier: MIT

//! Session: a long-lived interactive agent instance tracked by the registry.

use serde::{Deserialize, Serialize};

/// Live status of a session, as classified by the Session Probe (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Busy,
    WaitingInput,
    Unknown,
    Offline,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Busy => "busy",
            SessionStatus::WaitingInput => "waiting_input",
            SessionStatus::Unknown => "unknown",
            SessionStatus::Offline => "offline",
        };
        write!(f, "{s}")
    }
}

/// Closed set of recognized agent providers (spec §3, §9 "dynamic dispatch
/// over provider types is replaced by a closed enum set").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Claude,
    Codex,
    Ollama,
    Comet,
    Gemini,
    Grok,
    Unknown,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Provider::Claude => "claude",
            Provider::Codex => "codex",
            Provider::Ollama => "ollama",
            Provider::Comet => "comet",
            Provider::Gemini => "gemini",
            Provider::Grok => "grok",
            Provider::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "claude" => Provider::Claude,
            "codex" => Provider::Codex,
            "ollama" => Provider::Ollama,
            "comet" => Provider::Comet,
            "gemini" => Provider::Gemini,
            "grok" => Provider::Grok,
            _ => Provider::Unknown,
        })
    }
}

/// Per-session circuit breaker state (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl Default for CircuitState {
    fn default() -> Self {
        CircuitState::Closed
    }
}

/// A long-lived interactive agent instance, identified by its multiplexer
/// window name (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub status: SessionStatus,
    pub provider: Provider,
    pub specialty: Vec<String>,
    pub last_activity_ms: i64,
    pub current_work_id: Option<String>,
    pub working_directory: String,
    pub last_captured_output: String,
    pub stability_score: f64,
    pub circuit_state: CircuitState,
    pub total_completed: u64,
    pub total_failed: u64,
    pub baseline_fingerprint: Option<Vec<f64>>,
    pub protected: bool,
    pub consecutive_failures: u32,
    pub circuit_opened_at_ms: Option<i64>,
}

impl Session {
    pub fn new(name: impl Into<String>, working_directory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: SessionStatus::Unknown,
            provider: Provider::Unknown,
            specialty: Vec::new(),
            last_activity_ms: 0,
            current_work_id: None,
            working_directory: working_directory.into(),
            last_captured_output: String::new(),
            stability_score: 1.0,
            circuit_state: CircuitState::Closed,
            total_completed: 0,
            total_failed: 0,
            baseline_fingerprint: None,
            protected: false,
            consecutive_failures: 0,
            circuit_opened_at_ms: None,
        }
    }

    /// Invariant (spec §3): `current_work_id` is non-null iff `status = busy`.
    /// This is a modeling helper used by property tests; the registry is the
    /// sole writer responsible for keeping it true.
    pub fn busy_invariant_holds(&self) -> bool {
        self.current_work_id.is_some() == (self.status == SessionStatus::Busy)
    }

    /// A session is selectable by the Routing Engine iff it is idle or
    /// waiting for input, its circuit is closed or half_open (a half_open
    /// circuit admits exactly one probe dispatch, gated by the same
    /// one-in-flight-per-session binding every other assignment uses), it
    /// isn't protected, and its stability score is at or above the
    /// configured floor (spec §4.5 step 2, §4.8).
    pub fn is_routable(&self, stability_floor: f64) -> bool {
        matches!(self.status, SessionStatus::Idle | SessionStatus::WaitingInput)
            && matches!(self.circuit_state, CircuitState::Closed | CircuitState::HalfOpen)
            && !self.protected
            && self.stability_score >= stability_floor
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
