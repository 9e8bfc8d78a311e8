// SPDX-License-Identifier: MIT

use super::*;
use aac_core::{Session, WorkItemConfig, WorkItemId};
use aac_storage::Store;

fn snapshot_with_rule(task_type: &str, preferred: Vec<&str>) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let mut rule = aac_core::RoutingRule::default_for(task_type);
    rule.preferred_sessions = preferred.into_iter().map(String::from).collect();
    snapshot.routing_rules.insert(task_type.to_string(), rule);
    snapshot
}

fn idle_session(name: &str) -> Session {
    let mut session = Session::new(name, "/work");
    session.status = aac_core::SessionStatus::Idle;
    session
}

#[test]
fn assigns_highest_priority_item_first() {
    let store = Store::open_in_memory().unwrap();
    let queue = Queue::new(&store);
    let registry = Registry::new(&store);
    queue.enqueue(WorkItemId::from("low"), WorkItemConfig::new("a", "cli", "shell").with_priority(1), 1_000).unwrap();
    queue.enqueue(WorkItemId::from("high"), WorkItemConfig::new("b", "cli", "shell").with_priority(9), 1_100).unwrap();
    registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();

    let snapshot = snapshot_with_rule("shell", vec!["dev_w1"]);
    let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &aac_core::UuidIdGen, 2_000).unwrap();

    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].item.id.as_str(), "high");
    assert_eq!(assignments[0].session_name, "dev_w1");
}

#[test]
fn self_assignment_is_forbidden() {
    let store = Store::open_in_memory().unwrap();
    let queue = Queue::new(&store);
    let registry = Registry::new(&store);
    let config = WorkItemConfig::new("a", "dev_w1", "shell");
    queue.enqueue(WorkItemId::from("wi-1"), config, 1_000).unwrap();
    registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();

    let snapshot = snapshot_with_rule("shell", vec!["dev_w1"]);
    let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &aac_core::UuidIdGen, 2_000).unwrap();

    assert!(assignments.is_empty());
}

#[test]
fn protected_sessions_are_never_selected() {
    let store = Store::open_in_memory().unwrap();
    let queue = Queue::new(&store);
    let registry = Registry::new(&store);
    queue.enqueue(WorkItemId::from("wi-1"), WorkItemConfig::new("a", "cli", "shell"), 1_000).unwrap();
    let mut session = idle_session("dev_w1");
    session.protected = true;
    registry.upsert(&session, 1_000).unwrap();

    let snapshot = snapshot_with_rule("shell", vec!["dev_w1"]);
    let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &aac_core::UuidIdGen, 2_000).unwrap();

    assert!(assignments.is_empty());
}

#[test]
fn target_session_overrides_routing_rule() {
    let store = Store::open_in_memory().unwrap();
    let queue = Queue::new(&store);
    let registry = Registry::new(&store);
    let config = WorkItemConfig::new("a", "cli", "shell").with_target_session("dev_w2");
    queue.enqueue(WorkItemId::from("wi-1"), config, 1_000).unwrap();
    registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();
    registry.upsert(&idle_session("dev_w2"), 1_000).unwrap();

    let snapshot = snapshot_with_rule("shell", vec!["dev_w1"]);
    let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &aac_core::UuidIdGen, 2_000).unwrap();

    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].session_name, "dev_w2");
}

#[test]
fn fifo_order_preserved_among_equal_priority_items() {
    let store = Store::open_in_memory().unwrap();
    let queue = Queue::new(&store);
    let registry = Registry::new(&store);
    queue.enqueue(WorkItemId::from("first"), WorkItemConfig::new("a", "cli", "shell"), 1_000).unwrap();
    queue.enqueue(WorkItemId::from("second"), WorkItemConfig::new("b", "cli", "shell"), 1_100).unwrap();
    registry.upsert(&idle_session("dev_w1"), 1_000).unwrap();

    let snapshot = snapshot_with_rule("shell", vec!["dev_w1"]);
    let assignments = RoutingEngine::run_tick(&store, &snapshot, &RoutingConfig::default(), &aac_core::UuidIdGen, 2_000).unwrap();

    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].item.id.as_str(), "first");
}
