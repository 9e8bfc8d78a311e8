// SPDX-License-Identifier: MIT

//! Property-based tests for the quantified invariants in spec §8.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use aac_config::Snapshot;
use aac_core::{
    CircuitState, Provider, RoutingRule, Session, SessionStatus, UuidIdGen, WorkItemConfig, WorkItemId, WorkItemStatus,
};
use aac_engine::{DriftConfig, DriftControl, RoutingConfig, RoutingEngine};
use aac_storage::{Queue, Registry, Store};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

fn idle_session(name: &str) -> Session {
    let mut session = Session::new(name, "/work");
    session.status = SessionStatus::Idle;
    session
}

fn snapshot_preferring(task_type: &str, preferred: &[&str]) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let mut rule = RoutingRule::default_for(task_type);
    rule.preferred_sessions = preferred.iter().map(|s| s.to_string()).collect();
    snapshot.routing_rules.insert(task_type.to_string(), rule);
    snapshot
}

proptest! {
    /// Invariant 1: a WorkItem in a terminal status never leaves it, no
    /// matter which further transition is attempted (spec §8 #1).
    #[test]
    fn terminal_status_never_changes(
        which in 0..4usize,
        attempt in 0..5usize,
    ) {
        let store = Store::open_in_memory().unwrap();
        let queue = Queue::new(&store);
        let id = WorkItemId::from("wi-1");
        let item = queue.enqueue(id.clone(), WorkItemConfig::new("p", "cli", "shell"), 1_000).unwrap();
        queue.mark_assigned(item.id.as_str(), "dev_w1", 1_000).unwrap();

        match which {
            0 => { queue.mark_completed(item.id.as_str(), 2_000).unwrap(); }
            1 => { queue.mark_failed(item.id.as_str(), "boom", 2_000).unwrap(); }
            2 => { queue.cancel(item.id.as_str(), 2_000).unwrap(); }
            _ => { queue.expire(item.id.as_str(), 2_000).unwrap(); }
        }
        let terminal_status = queue.get(item.id.as_str()).unwrap().status;
        prop_assert!(terminal_status.is_terminal());

        match attempt {
            0 => { queue.mark_assigned(item.id.as_str(), "dev_w2", 3_000).unwrap(); }
            1 => { queue.mark_completed(item.id.as_str(), 3_000).unwrap(); }
            2 => { queue.mark_failed(item.id.as_str(), "again", 3_000).unwrap(); }
            3 => { queue.retry(item.id.as_str(), "again").unwrap(); }
            _ => { queue.expire(item.id.as_str(), 3_000).unwrap(); }
        }
        prop_assert_eq!(queue.get(item.id.as_str()).unwrap().status, terminal_status);
    }

    /// Invariant 2: `current_work_id(s) != null <=> status(s) = busy` holds
    /// across bind/release (spec §8 #2).
    #[test]
    fn busy_invariant_holds_across_bind_release(work_id in "[a-z]{1,8}") {
        let store = Store::open_in_memory().unwrap();
        let registry = Registry::new(&store);
        registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();
        prop_assert!(registry.get("dev_w1").unwrap().busy_invariant_holds());

        prop_assert!(registry.bind("dev_w1", &work_id, 1_000).unwrap());
        prop_assert!(registry.get("dev_w1").unwrap().busy_invariant_holds());

        registry.release("dev_w1", 2_000).unwrap();
        prop_assert!(registry.get("dev_w1").unwrap().busy_invariant_holds());
    }

    /// Invariant 3: given identical eligibility, higher priority is always
    /// selected before lower priority (spec §8 #3).
    #[test]
    fn higher_priority_selected_first(hi in 1u8..=10, lo in 0u8..=9) {
        prop_assume!(hi > lo);
        let store = Store::open_in_memory().unwrap();
        let registry = Registry::new(&store);
        registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();
        let snapshot = snapshot_preferring("shell", &["dev_w1"]);
        let queue = Queue::new(&store);
        let low = queue.enqueue(WorkItemId::from("low"), WorkItemConfig::new("a", "cli", "shell").with_priority(lo), 1_000).unwrap();
        let high = queue.enqueue(WorkItemId::from("high"), WorkItemConfig::new("b", "cli", "shell").with_priority(hi), 1_100).unwrap();

        let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &UuidIdGen, 2_000).unwrap();
        prop_assert_eq!(assignments[0].item.id.clone(), high.id);
        prop_assert_ne!(assignments.first().unwrap().item.id.clone(), low.id);
    }

    /// Invariant 4: equal-priority items are selected in arrival order
    /// (spec §8 #4).
    #[test]
    fn equal_priority_selected_fifo(priority in 0u8..=10) {
        let store = Store::open_in_memory().unwrap();
        let registry = Registry::new(&store);
        registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();
        let snapshot = snapshot_preferring("shell", &["dev_w1"]);
        let queue = Queue::new(&store);
        let earlier = queue.enqueue(WorkItemId::from("earlier"), WorkItemConfig::new("a", "cli", "shell").with_priority(priority), 1_000).unwrap();
        let later = queue.enqueue(WorkItemId::from("later"), WorkItemConfig::new("b", "cli", "shell").with_priority(priority), 1_500).unwrap();

        let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &UuidIdGen, 2_000).unwrap();
        prop_assert_eq!(assignments[0].item.id.clone(), earlier.id);
        prop_assert_ne!(assignments.first().unwrap().item.id.clone(), later.id);
    }

    /// Invariant 6: a protected session receives zero normal-path dispatches
    /// (spec §8 #6), no matter how many pending items are eligible for it.
    #[test]
    fn protected_session_never_dispatched(n_items in 1usize..5) {
        let store = Store::open_in_memory().unwrap();
        let registry = Registry::new(&store);
        registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();
        registry.set_protected("dev_w1", true).unwrap();
        let snapshot = snapshot_preferring("shell", &["dev_w1"]);
        let queue = Queue::new(&store);
        for i in 0..n_items {
            queue.enqueue(WorkItemId::from(format!("wi-{i}")), WorkItemConfig::new("p", "cli", "shell"), 1_000).unwrap();
        }

        let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &UuidIdGen, 2_000).unwrap();
        prop_assert!(assignments.is_empty());
    }

    /// Invariant 7: a session is never selected for a WorkItem whose source
    /// tag equals that session's name (spec §8 #7).
    #[test]
    fn no_self_assignment(session_name in "[a-z_]{3,10}") {
        let store = Store::open_in_memory().unwrap();
        let registry = Registry::new(&store);
        registry.upsert(&idle_session(&session_name), 1_000).unwrap();
        let snapshot = snapshot_preferring("shell", &[&session_name]);
        let queue = Queue::new(&store);
        queue.enqueue(WorkItemId::from("wi-1"), WorkItemConfig::new("p", &session_name, "shell"), 1_000).unwrap();

        let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &UuidIdGen, 2_000).unwrap();
        prop_assert!(assignments.is_empty());
    }

    /// Invariant 9: a retryable failure returns the item to `pending` within
    /// one tick with retry_count incremented by exactly one (spec §8 #9).
    #[test]
    fn retry_increments_count_by_exactly_one(starting_retry_count in 0u32..3) {
        let store = Store::open_in_memory().unwrap();
        let queue = Queue::new(&store);
        let item = queue.enqueue(WorkItemId::from("wi-1"), WorkItemConfig::new("p", "cli", "shell"), 1_000).unwrap();
        queue.mark_assigned(item.id.as_str(), "dev_w1", 1_000).unwrap();
        for _ in 0..starting_retry_count {
            queue.retry(item.id.as_str(), "setup").unwrap();
            queue.mark_assigned(item.id.as_str(), "dev_w1", 1_000).unwrap();
        }

        prop_assert!(queue.retry(item.id.as_str(), "transient").unwrap());
        let retried = queue.get(item.id.as_str()).unwrap();
        prop_assert_eq!(retried.status, WorkItemStatus::Pending);
        prop_assert_eq!(retried.retry_count, starting_retry_count + 1);
    }

    /// Invariant 10: after F consecutive delivery failures the circuit
    /// opens; fewer than F leaves it closed (spec §8 #10).
    #[test]
    fn circuit_opens_at_exactly_the_failure_threshold(threshold in 1u32..10, failures in 0u32..10) {
        let store = Store::open_in_memory().unwrap();
        let registry = Registry::new(&store);
        registry.upsert(&idle_session("codex_1"), 1_000).unwrap();
        let mut config = DriftConfig::default();
        config.failure_threshold = threshold;

        let mut now_ms = 1_000;
        let mut circuit = CircuitState::Closed;
        for _ in 0..failures {
            registry.record_outcome("codex_1", false).unwrap();
            let consecutive = registry.get("codex_1").unwrap().consecutive_failures;
            circuit = DriftControl::on_outcome(&registry, "codex_1", false, circuit, consecutive, now_ms, &config).unwrap();
            now_ms += 1_000;
        }

        if failures >= threshold {
            prop_assert_eq!(circuit, CircuitState::Open);
        } else {
            prop_assert_eq!(circuit, CircuitState::Closed);
        }
    }
}

/// Invariant 5: routing is work-conserving. If an eligible (item, session)
/// pair exists, the next tick dispatches at least one pair (spec §8 #5).
#[test]
fn routing_is_work_conserving_when_a_pair_exists() {
    let store = Store::open_in_memory().unwrap();
    let registry = Registry::new(&store);
    registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();
    let snapshot = snapshot_preferring("shell", &["dev_w1"]);
    Queue::new(&store).enqueue(WorkItemId::from("wi-1"), WorkItemConfig::new("p", "cli", "shell"), 1_000).unwrap();

    let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &UuidIdGen, 2_000).unwrap();
    assert_eq!(assignments.len(), 1);
}

/// Invariant 8: across K concurrent claimants and N pending items, exactly
/// N distinct items get claimed, never the same item twice (spec §8 #8).
#[test]
fn concurrent_claims_never_double_claim_or_lose_an_item() {
    const N: usize = 12;
    const K: usize = 6;

    let store = Arc::new(Store::open_in_memory().unwrap());
    {
        let queue = Queue::new(&store);
        for i in 0..N {
            queue.enqueue(WorkItemId::from(format!("wi-{i}")), WorkItemConfig::new("p", "cli", "shell"), 1_000).unwrap();
        }
    }

    let handles: Vec<_> = (0..K)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                let queue = Queue::new(&store);
                let mut claimed = Vec::new();
                for i in 0..N {
                    let id = format!("wi-{i}");
                    if queue.mark_assigned(&id, &format!("dev_w{worker}"), 1_000).unwrap_or(false) {
                        claimed.push(id);
                    }
                }
                claimed
            })
        })
        .collect();

    let mut all_claimed: Vec<String> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    all_claimed.sort();
    let expected: Vec<String> = (0..N).map(|i| format!("wi-{i}")).collect();
    assert_eq!(all_claimed, expected, "every item claimed exactly once, none lost, none double-claimed");
}

/// Boundary: priority 0 and 10 are the inclusive accepted range; values
/// outside it are a matter for Intake's policy-violation check, not the
/// Queue Store, which stores whatever `u8` it is given.
#[test]
fn priority_boundaries_zero_and_ten_round_trip() {
    let store = Store::open_in_memory().unwrap();
    let queue = Queue::new(&store);
    let low = queue.enqueue(WorkItemId::from("lo"), WorkItemConfig::new("p", "cli", "shell").with_priority(0), 1_000).unwrap();
    let high = queue.enqueue(WorkItemId::from("hi"), WorkItemConfig::new("p", "cli", "shell").with_priority(10), 1_000).unwrap();
    assert_eq!(queue.get(low.id.as_str()).unwrap().priority, 0);
    assert_eq!(queue.get(high.id.as_str()).unwrap().priority, 10);
}

/// Boundary: an empty payload is accepted as opaque data (spec §8).
#[test]
fn empty_payload_is_accepted() {
    let store = Store::open_in_memory().unwrap();
    let queue = Queue::new(&store);
    let item = queue.enqueue(WorkItemId::from("wi-1"), WorkItemConfig::new("", "cli", "shell"), 1_000).unwrap();
    assert_eq!(queue.get(item.id.as_str()).unwrap().payload, "");
}

/// Boundary: retries exactly exhausted terminates in `failed`, never back
/// to `pending` (spec §8).
#[test]
fn max_retries_exactly_exhausted_terminates_rather_than_retries() {
    let store = Store::open_in_memory().unwrap();
    let queue = Queue::new(&store);
    let mut config = WorkItemConfig::new("p", "cli", "shell");
    config.max_retries = 1;
    let item = queue.enqueue(WorkItemId::from("wi-1"), config, 1_000).unwrap();

    queue.mark_assigned(item.id.as_str(), "dev_w1", 1_000).unwrap();
    queue.retry(item.id.as_str(), "first failure").unwrap();
    let retried = queue.get(item.id.as_str()).unwrap();
    assert_eq!(retried.status, WorkItemStatus::Pending);
    assert!(!retried.retries_exhausted());

    queue.mark_assigned(item.id.as_str(), "dev_w1", 1_000).unwrap();
    assert!(queue.get(item.id.as_str()).unwrap().retries_exhausted());
    queue.mark_failed(item.id.as_str(), "final failure", 2_000).unwrap();
    let failed = queue.get(item.id.as_str()).unwrap();
    assert_eq!(failed.status, WorkItemStatus::Failed);
}

/// Boundary: a session that disappears and reappears keeps its name
/// identity; stability_score and totals survive the round trip through
/// `mark_offline` (spec §8).
#[test]
fn session_identity_and_counters_survive_offline_round_trip() {
    let store = Store::open_in_memory().unwrap();
    let registry = Registry::new(&store);
    let mut session = idle_session("dev_w1");
    session.stability_score = 0.42;
    session.total_completed = 7;
    session.total_failed = 2;
    registry.upsert(&session, 1_000).unwrap();

    registry.mark_offline("dev_w1", 2_000).unwrap();
    let offline = registry.get("dev_w1").unwrap();
    assert_eq!(offline.status, SessionStatus::Offline);

    registry.update_observed_state("dev_w1", SessionStatus::Idle, Provider::Claude, "$ ", 3_000).unwrap();
    let reappeared = registry.get("dev_w1").unwrap();
    assert_eq!(reappeared.name, "dev_w1");
    assert_eq!(reappeared.stability_score, 0.42);
    assert_eq!(reappeared.total_completed, 7);
    assert_eq!(reappeared.total_failed, 2);
}
