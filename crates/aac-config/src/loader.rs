// SPDX-License-Identifier: MIT

//! Layered file discovery and parsing (spec §6).
//!
//! Each logical config file (`sla_rules`, `routing_rules`, `queries`) may be
//! provided in any of `config/base/`, `config/environments/<env>/`, or
//! `config/local/`, in any of `.yaml`/`.yml`/`.json`/`.toml`. Layers are
//! deep-merged in that order so a later layer overrides an earlier one.

use crate::error::ConfigError;
use crate::merge::deep_merge;
use serde_json::Value;
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["yaml", "yml", "json", "toml"];

fn find_layer_file(dir: &Path, stem: &str) -> Option<PathBuf> {
    for ext in EXTENSIONS {
        let candidate = dir.join(format!("{stem}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn parse_file(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext {
        "json" => serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        "yaml" | "yml" => serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        "toml" => {
            let toml_value: toml::Value = toml::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            serde_json::to_value(toml_value).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        _ => Err(ConfigError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load and deep-merge one logical config file (`stem`, e.g. `"routing_rules"`)
/// across the base/environment/local layers. Missing layers are skipped;
/// returns `Value::Null` if no layer provides the file at all.
pub fn load_layered(config_dir: &Path, stem: &str, environment: Option<&str>) -> Result<Value, ConfigError> {
    let mut merged = Value::Null;
    let mut any_found = false;

    let base_dir = config_dir.join("base");
    if let Some(path) = find_layer_file(&base_dir, stem) {
        let value = parse_file(&path)?;
        apply(&mut merged, value, &mut any_found);
    }

    if let Some(env) = environment {
        let env_dir = config_dir.join("environments").join(env);
        if let Some(path) = find_layer_file(&env_dir, stem) {
            let value = parse_file(&path)?;
            apply(&mut merged, value, &mut any_found);
        }
    }

    let local_dir = config_dir.join("local");
    if let Some(path) = find_layer_file(&local_dir, stem) {
        let value = parse_file(&path)?;
        apply(&mut merged, value, &mut any_found);
    }

    Ok(merged)
}

fn apply(merged: &mut Value, overlay: Value, any_found: &mut bool) {
    *any_found = true;
    if merged.is_null() {
        *merged = overlay;
    } else {
        deep_merge(merged, overlay);
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
