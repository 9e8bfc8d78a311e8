// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn new_work_item_starts_pending_with_zero_retries() {
    let cfg = WorkItemConfig::new("payload", "session_a", "feature_development").with_priority(5);
    let item = WorkItem::new(WorkItemId::new("wi-1"), cfg, 1_000);
    assert_eq!(item.status, WorkItemStatus::Pending);
    assert_eq!(item.retry_count, 0);
    assert_eq!(item.priority, 5);
    assert!(!item.retries_exhausted());
}

#[test]
fn terminal_statuses_are_identified() {
    assert!(WorkItemStatus::Completed.is_terminal());
    assert!(WorkItemStatus::Failed.is_terminal());
    assert!(WorkItemStatus::Cancelled.is_terminal());
    assert!(WorkItemStatus::Expired.is_terminal());
    assert!(!WorkItemStatus::Pending.is_terminal());
    assert!(!WorkItemStatus::Assigned.is_terminal());
    assert!(!WorkItemStatus::InProgress.is_terminal());
}

#[test]
fn retries_exhausted_at_max() {
    let cfg = WorkItemConfig::new("p", "s", "t");
    let mut item = WorkItem::new(WorkItemId::new("wi-1"), cfg, 0);
    item.max_retries = 2;
    item.retry_count = 2;
    assert!(item.retries_exhausted());
    item.retry_count = 1;
    assert!(!item.retries_exhausted());
}
