// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn action_display_matches_spec_vocabulary() {
    assert_eq!(AssignmentAction::Queued.to_string(), "queued");
    assert_eq!(AssignmentAction::ObservedProgress.to_string(), "observed_progress");
    assert_eq!(AssignmentAction::TimedOut.to_string(), "timed_out");
}

#[test]
fn event_carries_optional_session_name() {
    let ev = AssignmentEvent::new(
        AssignmentEventId::new("ev-1"),
        "wi-1",
        None,
        AssignmentAction::Queued,
        0,
        serde_json::json!({}),
    );
    assert!(ev.session_name.is_none());
}
