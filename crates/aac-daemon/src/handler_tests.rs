// SPDX-License-Identifier: MIT

use super::*;
use aac_core::{FakeClock, UuidIdGen};
use std::sync::Arc;

fn fixture() -> Handler<FakeClock, UuidIdGen> {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigService::load(dir.path(), None).unwrap();
    let clock = Arc::new(FakeClock::new(1_000));
    Handler::new(store, config, clock, UuidIdGen)
}

#[test]
fn enqueue_then_get_round_trips_the_work_item() {
    let handler = fixture();
    let enqueued = handler.handle(Request::Enqueue {
        payload: "do the thing".to_string(),
        source: "cli".to_string(),
        priority: 3,
        task_type: "shell".to_string(),
        target_session: None,
        target_provider: None,
        timeout_minutes: None,
    });
    let Response::WorkItem { item } = enqueued else { panic!("expected WorkItem response") };

    let fetched = handler.handle(Request::Get { id: item.id.as_str().to_string() });
    match fetched {
        Response::WorkItemDetail { item: fetched_item, events } => {
            assert_eq!(fetched_item.id, item.id);
            assert_eq!(events.len(), 1);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn get_unknown_id_returns_not_found_exit_code() {
    let handler = fixture();
    let response = handler.handle(Request::Get { id: "missing".to_string() });
    assert_eq!(response, Response::Error { message: "work item 'missing' not found".to_string(), code: EXIT_NOT_FOUND });
}

#[test]
fn cancel_on_completed_item_reports_conflict() {
    let handler = fixture();
    let Response::WorkItem { item } = handler.handle(Request::Enqueue {
        payload: "p".to_string(),
        source: "cli".to_string(),
        priority: 0,
        task_type: "default".to_string(),
        target_session: None,
        target_provider: None,
        timeout_minutes: None,
    }) else { panic!() };
    Queue::new(&*handler.store).mark_completed(item.id.as_str(), 1_000).unwrap();

    let response = handler.handle(Request::Cancel { id: item.id.as_str().to_string() });
    assert_eq!(response, Response::Error { message: format!("work item '{}' cannot be cancelled in its current state", item.id), code: EXIT_CONFLICT });
}

#[test]
fn stats_reports_pending_count_after_enqueue() {
    let handler = fixture();
    handler.handle(Request::Enqueue {
        payload: "p".to_string(),
        source: "cli".to_string(),
        priority: 0,
        task_type: "default".to_string(),
        target_session: None,
        target_provider: None,
        timeout_minutes: None,
    });
    let Response::Stats { queue_counts, .. } = handler.handle(Request::Stats) else { panic!() };
    assert_eq!(queue_counts.get("pending"), Some(&1));
}

#[test]
fn unknown_query_reports_invalid_argument() {
    let handler = fixture();
    let response = handler.handle(Request::Query { name: "nope".to_string(), params: Default::default(), format: None });
    assert_eq!(response, Response::Error { message: "unknown query 'nope'".to_string(), code: EXIT_INVALID_ARGUMENT });
}
