// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn enqueue_request_round_trips_through_json() {
    let request = Request::Enqueue {
        payload: "run the tests".to_string(),
        source: "cli".to_string(),
        priority: 5,
        task_type: "shell".to_string(),
        target_session: None,
        target_provider: None,
        timeout_minutes: Some(30),
    };
    let json = serde_json::to_string(&request).unwrap();
    let back: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(back, request);
}

#[test]
fn list_request_defaults_omit_optional_fields() {
    let json = r#"{"type":"List"}"#;
    let request: Request = serde_json::from_str(json).unwrap();
    assert_eq!(request, Request::List { status: None, limit: None, offset: None });
}

#[test]
fn export_format_maps_to_engine_format() {
    assert_eq!(aac_engine::ExportFormat::from(ExportFormat::Csv), aac_engine::ExportFormat::Csv);
}
