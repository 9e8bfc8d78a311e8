// SPDX-License-Identifier: MIT

use super::*;
use crate::store::Store;
use aac_core::WorkItemConfig;

fn queue_fixture() -> Store {
    Store::open_in_memory().unwrap()
}

#[test]
fn enqueue_and_get_round_trips() {
    let store = queue_fixture();
    let queue = Queue::new(&store);
    let config = WorkItemConfig::new("do the thing", "cli", "shell");
    let item = queue.enqueue(WorkItemId::from("wi-1"), config, 1_000).unwrap();

    let fetched = queue.get(item.id.as_str()).unwrap();
    assert_eq!(fetched.status, WorkItemStatus::Pending);
    assert_eq!(fetched.payload, "do the thing");
}

#[test]
fn mark_assigned_is_cas_and_rejects_double_claim() {
    let store = queue_fixture();
    let queue = Queue::new(&store);
    let config = WorkItemConfig::new("p", "cli", "shell");
    let item = queue.enqueue(WorkItemId::from("wi-1"), config, 1_000).unwrap();

    assert!(queue.mark_assigned(item.id.as_str(), "dev_w1", 1_100).unwrap());
    assert!(!queue.mark_assigned(item.id.as_str(), "dev_w2", 1_200).unwrap());

    let fetched = queue.get(item.id.as_str()).unwrap();
    assert_eq!(fetched.assigned_session.as_deref(), Some("dev_w1"));
}

#[test]
fn retry_releases_binding_and_increments_count() {
    let store = queue_fixture();
    let queue = Queue::new(&store);
    let config = WorkItemConfig::new("p", "cli", "shell");
    let item = queue.enqueue(WorkItemId::from("wi-1"), config, 1_000).unwrap();
    queue.mark_assigned(item.id.as_str(), "dev_w1", 1_100).unwrap();
    queue.mark_in_progress(item.id.as_str()).unwrap();

    assert!(queue.retry(item.id.as_str(), "timed out").unwrap());
    let fetched = queue.get(item.id.as_str()).unwrap();
    assert_eq!(fetched.status, WorkItemStatus::Pending);
    assert_eq!(fetched.retry_count, 1);
    assert!(fetched.assigned_session.is_none());
}

#[test]
fn next_pending_respects_priority_then_fifo() {
    let store = queue_fixture();
    let queue = Queue::new(&store);
    queue
        .enqueue(WorkItemId::from("wi-low"), WorkItemConfig::new("a", "cli", "shell").with_priority(1), 1_000)
        .unwrap();
    queue
        .enqueue(WorkItemId::from("wi-high"), WorkItemConfig::new("b", "cli", "shell").with_priority(5), 1_100)
        .unwrap();

    let next = queue.next_pending(Some("shell")).unwrap().unwrap();
    assert_eq!(next.id.as_str(), "wi-high");
}

#[test]
fn cancel_is_rejected_once_terminal() {
    let store = queue_fixture();
    let queue = Queue::new(&store);
    let item = queue.enqueue(WorkItemId::from("wi-1"), WorkItemConfig::new("a", "cli", "shell"), 1_000).unwrap();
    queue.mark_assigned(item.id.as_str(), "dev_w1", 1_100).unwrap();
    queue.mark_completed(item.id.as_str(), 1_200).unwrap();

    assert!(!queue.cancel(item.id.as_str(), 1_300).unwrap());
}
