// SPDX-License-Identifier: MIT

use super::*;
use aac_core::{Provider, Session, SessionStatus, UuidIdGen, WorkItemConfig, WorkItemId, WorkItemStatus};
use aac_multiplex::Classification;
use aac_storage::Queue;
use std::sync::Arc;

fn bound_fixture(store: Arc<Store>) -> (String, String) {
    let queue = Queue::new(&store);
    let registry = Registry::new(&store);
    let item = queue.enqueue(WorkItemId::from("wi-1"), WorkItemConfig::new("a", "cli", "shell"), 1_000).unwrap();
    registry.upsert(&Session::new("dev_w1", "/work"), 1_000).unwrap();
    queue.mark_assigned(item.id.as_str(), "dev_w1", 1_000).unwrap();
    registry.bind("dev_w1", item.id.as_str(), 1_000).unwrap();
    (item.id.as_str().to_string(), "dev_w1".to_string())
}

fn bound_fixture_exhausted(store: Arc<Store>) -> (String, String) {
    let queue = Queue::new(&store);
    let registry = Registry::new(&store);
    let mut config = WorkItemConfig::new("a", "cli", "shell");
    config.max_retries = 0;
    let item = queue.enqueue(WorkItemId::from("wi-1"), config, 1_000).unwrap();
    registry.upsert(&Session::new("dev_w1", "/work"), 1_000).unwrap();
    queue.mark_assigned(item.id.as_str(), "dev_w1", 1_000).unwrap();
    registry.bind("dev_w1", item.id.as_str(), 1_000).unwrap();
    (item.id.as_str().to_string(), "dev_w1".to_string())
}

#[tokio::test]
async fn busy_then_idle_with_evidence_completes_after_c_probes() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let (work_id, session_name) = bound_fixture(store.clone());
    let supervisor = LifecycleSupervisor::new(store.clone(), UuidIdGen, LifecycleConfig::default());

    supervisor.observe(&session_name, Classification { status: SessionStatus::Busy, provider: Provider::Claude }, "thinking...", 2_000).await;
    supervisor.observe(&session_name, Classification { status: SessionStatus::Idle, provider: Provider::Claude }, "Human:", 3_000).await;
    supervisor.observe(&session_name, Classification { status: SessionStatus::Idle, provider: Provider::Claude }, "Human:", 4_000).await;

    let item = Queue::new(&store).get(&work_id).unwrap();
    assert_eq!(item.status, WorkItemStatus::Completed);

    let session = Registry::new(&store).get(&session_name).unwrap();
    assert_eq!(session.current_work_id, None);
    assert_eq!(session.total_completed, 1);

    let events = EventLog::new(&store).history_for(&work_id).unwrap();
    assert!(events.iter().any(|e| e.action == AssignmentAction::ObservedProgress));
    assert!(events.iter().any(|e| e.action == AssignmentAction::Completed));
}

#[tokio::test]
async fn failure_pattern_retries_when_retries_remain() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let (work_id, session_name) = bound_fixture(store.clone());
    let supervisor = LifecycleSupervisor::new(store.clone(), UuidIdGen, LifecycleConfig::default());

    supervisor.observe(&session_name, Classification { status: SessionStatus::Idle, provider: Provider::Claude }, "panicked at src/main.rs", 2_000).await;

    let item = Queue::new(&store).get(&work_id).unwrap();
    assert_eq!(item.status, WorkItemStatus::Pending);
    assert_eq!(item.retry_count, 1);

    let session = Registry::new(&store).get(&session_name).unwrap();
    assert_eq!(session.current_work_id, None);
    assert_eq!(session.total_failed, 1);
}

#[tokio::test]
async fn failure_pattern_with_retries_exhausted_terminally_fails() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let (work_id, session_name) = bound_fixture_exhausted(store.clone());
    let supervisor = LifecycleSupervisor::new(store.clone(), UuidIdGen, LifecycleConfig::default());

    supervisor.observe(&session_name, Classification { status: SessionStatus::Idle, provider: Provider::Claude }, "panicked at src/main.rs", 2_000).await;

    let item = Queue::new(&store).get(&work_id).unwrap();
    assert_eq!(item.status, WorkItemStatus::Failed);
    assert_eq!(item.last_error.as_deref(), Some("failure pattern matched"));
}

#[tokio::test]
async fn sweep_timeouts_expires_items_past_effective_timeout() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let (work_id, _session_name) = bound_fixture(store.clone());
    let supervisor = LifecycleSupervisor::new(store.clone(), UuidIdGen, LifecycleConfig::default());

    let mut snapshot = Snapshot::default();
    snapshot.sla_targets.insert("shell".to_string(), aac_core::SlaTarget { target_minutes: 1, ..aac_core::SlaTarget::DEFAULT });

    // Exhaust retries so the sweep expires rather than retries.
    let queue = Queue::new(&store);
    for _ in 0..3 {
        queue.mark_assigned(&work_id, "dev_w1", 1_000).ok();
        queue.retry(&work_id, "setup").unwrap();
        queue.mark_assigned(&work_id, "dev_w1", 1_000).unwrap();
    }

    let expired = supervisor.sweep_timeouts(&snapshot, 1_000 + 2 * 60_000).unwrap();
    assert_eq!(expired, 1);

    let item = queue.get(&work_id).unwrap();
    assert_eq!(item.status, WorkItemStatus::Expired);
}

#[tokio::test]
async fn mark_offline_releases_and_retries_bound_item() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let (work_id, session_name) = bound_fixture(store.clone());
    let supervisor = LifecycleSupervisor::new(store.clone(), UuidIdGen, LifecycleConfig::default());

    supervisor.mark_offline(&session_name, 5_000).await;

    let item = Queue::new(&store).get(&work_id).unwrap();
    assert_eq!(item.status, WorkItemStatus::Pending);
    assert_eq!(item.retry_count, 1);
}
