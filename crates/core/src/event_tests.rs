// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_queued_round_trips_through_json() {
    let event = Event::JobQueued {
        job_id: JobId::new(42),
        host_alias: HostAlias::new("mirror01"),
        msg_number: 7,
        files_to_send: 3,
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"job:queued\""));
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn unknown_type_tag_deserializes_to_custom() {
    let json = r#"{"type":"job:teleported","job_id":1}"#;
    let event: Event = serde_json::from_str(json).unwrap();
    assert_eq!(event, Event::Custom);
}

#[test]
fn job_finished_helper_carries_exit_code() {
    let event = Event::job_finished(
        JobId::new(1),
        HostAlias::new("mirror01"),
        ExitCode::TransferSuccess,
        1,
        10,
    );
    match event {
        Event::JobFinished { exit_code, .. } => assert_eq!(exit_code, 0),
        _ => panic!("expected JobFinished"),
    }
}
