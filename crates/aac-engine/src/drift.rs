// SPDX-License-Identifier: MIT

//! Drift & Circuit Control: keeps the session fleet self-healing (spec §4.8).

use aac_core::CircuitState;
use aac_storage::{Registry, StorageError};

#[derive(Debug, Clone)]
pub struct DriftConfig {
    /// EMA smoothing factor for the stability score.
    pub alpha: f64,
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Cooldown, in milliseconds, before an open circuit tries half_open.
    pub cooldown_ms: i64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            failure_threshold: 5,
            cooldown_ms: 60_000,
        }
    }
}

pub struct DriftControl;

impl DriftControl {
    /// Update a session's stability score from a fresh drift sample (spec
    /// §4.8: `s ← α·s + (1−α)·(1 − drift_distance)`).
    pub fn apply_drift_sample(
        registry: &Registry,
        session_name: &str,
        previous_score: f64,
        drift_distance: f64,
        config: &DriftConfig,
    ) -> Result<f64, StorageError> {
        let drift_distance = drift_distance.clamp(0.0, 1.0);
        let score = config.alpha * previous_score + (1.0 - config.alpha) * (1.0 - drift_distance);
        registry.set_stability_score(session_name, score)?;
        Ok(score)
    }

    /// Advance the circuit breaker after an outcome. Must be called after
    /// `Registry::record_outcome` so `consecutive_failures` is current.
    pub fn on_outcome(
        registry: &Registry,
        session_name: &str,
        succeeded: bool,
        current_circuit: CircuitState,
        consecutive_failures: u32,
        now_ms: i64,
        config: &DriftConfig,
    ) -> Result<CircuitState, StorageError> {
        let next = match (current_circuit, succeeded) {
            (CircuitState::Closed, true) => CircuitState::Closed,
            (CircuitState::Closed, false) => {
                if consecutive_failures >= config.failure_threshold {
                    CircuitState::Open
                } else {
                    CircuitState::Closed
                }
            }
            (CircuitState::HalfOpen, true) => CircuitState::Closed,
            (CircuitState::HalfOpen, false) => CircuitState::Open,
            (CircuitState::Open, _) => CircuitState::Open,
        };

        if next != current_circuit {
            let opened_at = if next == CircuitState::Open { Some(now_ms) } else { None };
            registry.set_circuit(session_name, next, opened_at)?;
        }
        Ok(next)
    }

    /// Whether an open circuit's cooldown has elapsed and it should move to
    /// half_open on the next probe (spec §4.8: "open → half_open after
    /// cooldown T_open").
    pub fn cooldown_elapsed(circuit_opened_at_ms: Option<i64>, now_ms: i64, config: &DriftConfig) -> bool {
        match circuit_opened_at_ms {
            Some(opened_at) => now_ms.saturating_sub(opened_at) >= config.cooldown_ms,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod tests;
