// SPDX-License-Identifier: MIT

//! Environment variable handling (spec §6: "recognized set").
//!
//! Unknown variables are ignored; a malformed recognized one fails startup
//! with the offending name, never a silent fallback.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("malformed value for environment variable {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Clone)]
pub struct DaemonEnv {
    pub config_dir: PathBuf,
    pub db_path: PathBuf,
    pub probe_interval: Duration,
    pub route_tick: Duration,
    pub delivery_max_attempts: u32,
    pub circuit_failure_threshold: u32,
    pub circuit_open: Duration,
    pub stability_floor: f64,
    pub baseline_samples: u32,
    pub drift_ema_alpha: f64,
}

impl Default for DaemonEnv {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("./config"),
            db_path: PathBuf::from("./assigner.db"),
            probe_interval: Duration::from_millis(3_000),
            route_tick: Duration::from_millis(1_000),
            delivery_max_attempts: 3,
            circuit_failure_threshold: 5,
            circuit_open: Duration::from_secs(60),
            stability_floor: 0.5,
            baseline_samples: 50,
            drift_ema_alpha: 0.9,
        }
    }
}

impl DaemonEnv {
    /// Load from `std::env`, applying defaults for anything unset and
    /// failing on recognized-but-malformed values.
    pub fn from_env() -> Result<Self, EnvError> {
        let mut env = Self::default();

        if let Ok(v) = std::env::var("ASSIGNER_CONFIG_DIR") {
            env.config_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ASSIGNER_DB_PATH") {
            env.db_path = PathBuf::from(v);
        }
        env.probe_interval = parse_ms_var("ASSIGNER_PROBE_INTERVAL_MS", env.probe_interval)?;
        env.route_tick = parse_ms_var("ASSIGNER_ROUTE_TICK_MS", env.route_tick)?;
        env.delivery_max_attempts = parse_u32_var("ASSIGNER_DELIVERY_MAX_ATTEMPTS", env.delivery_max_attempts)?;
        env.circuit_failure_threshold = parse_u32_var("ASSIGNER_CIRCUIT_FAILURE_THRESHOLD", env.circuit_failure_threshold)?;
        env.circuit_open = parse_secs_var("ASSIGNER_CIRCUIT_OPEN_SECONDS", env.circuit_open)?;
        env.stability_floor = parse_f64_var("ASSIGNER_STABILITY_FLOOR", env.stability_floor)?;
        env.baseline_samples = parse_u32_var("ASSIGNER_BASELINE_SAMPLES", env.baseline_samples)?;
        env.drift_ema_alpha = parse_f64_var("ASSIGNER_DRIFT_EMA_ALPHA", env.drift_ema_alpha)?;

        Ok(env)
    }
}

fn parse_ms_var(name: &'static str, default: Duration) -> Result<Duration, EnvError> {
    match std::env::var(name) {
        Ok(v) => v.parse::<u64>().map(Duration::from_millis).map_err(|_| EnvError::Malformed(name)),
        Err(_) => Ok(default),
    }
}

fn parse_secs_var(name: &'static str, default: Duration) -> Result<Duration, EnvError> {
    match std::env::var(name) {
        Ok(v) => v.parse::<u64>().map(Duration::from_secs).map_err(|_| EnvError::Malformed(name)),
        Err(_) => Ok(default),
    }
}

fn parse_u32_var(name: &'static str, default: u32) -> Result<u32, EnvError> {
    match std::env::var(name) {
        Ok(v) => v.parse::<u32>().map_err(|_| EnvError::Malformed(name)),
        Err(_) => Ok(default),
    }
}

fn parse_f64_var(name: &'static str, default: f64) -> Result<f64, EnvError> {
    match std::env::var(name) {
        Ok(v) => v.parse::<f64>().map_err(|_| EnvError::Malformed(name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
