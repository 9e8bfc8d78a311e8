// SPDX-License-Identifier: MIT

//! ConfigService: owns the current Snapshot and publishes reloads (spec §4.1).

use crate::error::ConfigError;
use crate::snapshot::{build_snapshot, Snapshot};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// A handle callers can clone cheaply; the actual snapshot lives behind a
/// `RwLock` so `get_snapshot` never blocks writers longer than a read.
#[derive(Clone)]
pub struct ConfigService {
    inner: Arc<Inner>,
}

struct Inner {
    config_dir: PathBuf,
    environment: Option<String>,
    current: RwLock<Arc<Snapshot>>,
}

impl ConfigService {
    /// Load the initial snapshot from `config_dir`, failing if the base
    /// layer does not parse. `environment` selects the `environments/<env>`
    /// overlay (spec §6); `None` skips that layer entirely.
    pub fn load(config_dir: impl Into<PathBuf>, environment: Option<String>) -> Result<Self, ConfigError> {
        let config_dir = config_dir.into();
        let snapshot = build_snapshot(&config_dir, environment.as_deref())?;
        info!(
            routing_rules = snapshot.routing_rules.len(),
            sla_targets = snapshot.sla_targets.len(),
            query_templates = snapshot.query_templates.len(),
            "configuration loaded"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                config_dir,
                environment,
                current: RwLock::new(Arc::new(snapshot)),
            }),
        })
    }

    /// The currently published snapshot. Cheap: clones an `Arc`.
    pub fn get_snapshot(&self) -> Arc<Snapshot> {
        self.inner.current.read().clone()
    }

    /// Re-read configuration from disk and atomically swap it in if it
    /// parses and validates. On failure the previous snapshot stays live
    /// and the error is returned to the caller (spec §4.1: "invalid
    /// configuration is rejected; the previous snapshot remains active").
    pub fn reload(&self) -> Result<Arc<Snapshot>, ConfigError> {
        let snapshot = match build_snapshot(&self.inner.config_dir, self.inner.environment.as_deref()) {
            Ok(s) => s,
            Err(err) => {
                warn!(error = %err, "configuration reload rejected, keeping previous snapshot");
                return Err(err);
            }
        };
        let snapshot = Arc::new(snapshot);
        *self.inner.current.write() = snapshot.clone();
        info!("configuration reloaded");
        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
