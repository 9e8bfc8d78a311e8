// SPDX-License-Identifier: MIT

use super::*;
use aac_core::{UuidIdGen, WorkItemStatus};
use aac_storage::EventLog;

#[test]
fn enqueue_emits_queued_event_and_resolves_sla_timeout() {
    let store = Store::open_in_memory().unwrap();
    let mut snapshot = Snapshot::default();
    snapshot.sla_targets.insert("shell".to_string(), aac_core::SlaTarget { target_minutes: 15, ..aac_core::SlaTarget::DEFAULT });
    snapshot.routing_rules.insert("shell".to_string(), aac_core::RoutingRule::default_for("shell"));

    let item = Intake::enqueue(&store, &snapshot, &UuidIdGen, WorkItemConfig::new("do it", "cli", "shell"), 1_000).unwrap();

    assert_eq!(item.status, WorkItemStatus::Pending);
    assert_eq!(item.timeout_minutes, None);

    let events = EventLog::new(&store).history_for(item.id.as_str()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AssignmentAction::Queued);
}

#[test]
fn unknown_task_type_falls_back_to_default() {
    let store = Store::open_in_memory().unwrap();
    let snapshot = Snapshot::default();

    let item = Intake::enqueue(&store, &snapshot, &UuidIdGen, WorkItemConfig::new("do it", "cli", "mystery"), 1_000).unwrap();

    assert_eq!(item.task_type, "default");
}

#[test]
fn priority_is_clamped_to_ten() {
    let store = Store::open_in_memory().unwrap();
    let snapshot = Snapshot::default();

    let item = Intake::enqueue(
        &store,
        &snapshot,
        &UuidIdGen,
        WorkItemConfig::new("do it", "cli", "shell").with_priority(255),
        1_000,
    )
    .unwrap();

    assert_eq!(item.priority, 10);
}
