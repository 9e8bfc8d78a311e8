// SPDX-License-Identifier: MIT

use super::*;
use aac_core::Session;
use aac_storage::Store;

#[test]
fn stability_score_follows_ema_formula() {
    let store = Store::open_in_memory().unwrap();
    let registry = Registry::new(&store);
    registry.upsert(&Session::new("dev_w1", "/work"), 1_000).unwrap();

    let config = DriftConfig::default();
    let score = DriftControl::apply_drift_sample(&registry, "dev_w1", 1.0, 0.2, &config).unwrap();
    assert!((score - (0.9 * 1.0 + 0.1 * 0.8)).abs() < 1e-9);
}

#[test]
fn circuit_opens_after_failure_threshold() {
    let store = Store::open_in_memory().unwrap();
    let registry = Registry::new(&store);
    registry.upsert(&Session::new("dev_w1", "/work"), 1_000).unwrap();
    let config = DriftConfig { failure_threshold: 3, ..DriftConfig::default() };

    let mut state = CircuitState::Closed;
    for failures in 1..=3 {
        state = DriftControl::on_outcome(&registry, "dev_w1", false, state, failures, 1_000, &config).unwrap();
    }
    assert_eq!(state, CircuitState::Open);
}

#[test]
fn half_open_closes_on_success_and_reopens_on_failure() {
    let store = Store::open_in_memory().unwrap();
    let registry = Registry::new(&store);
    registry.upsert(&Session::new("dev_w1", "/work"), 1_000).unwrap();
    let config = DriftConfig::default();

    let closed = DriftControl::on_outcome(&registry, "dev_w1", true, CircuitState::HalfOpen, 0, 1_000, &config).unwrap();
    assert_eq!(closed, CircuitState::Closed);

    let reopened = DriftControl::on_outcome(&registry, "dev_w1", false, CircuitState::HalfOpen, 0, 1_000, &config).unwrap();
    assert_eq!(reopened, CircuitState::Open);
}

#[test]
fn open_circuit_does_not_route_until_cooldown_elapses() {
    let config = DriftConfig { cooldown_ms: 60_000, ..DriftConfig::default() };
    assert!(!DriftControl::cooldown_elapsed(Some(1_000), 30_000, &config));
    assert!(DriftControl::cooldown_elapsed(Some(1_000), 70_000, &config));
}
