// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn write_then_read_active_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(MON_ACTIVE_FILE);
    let record = ActiveRecord {
        supervisor_pid: 123,
        log_pids: [456, 789],
        worker_pids: vec![1, 2, 3],
    };

    write_active(&path, &record).unwrap();
    let read_back = read_active(&path).unwrap().unwrap();

    assert_eq!(read_back, record);
}

#[test]
fn read_active_returns_none_when_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(MON_ACTIVE_FILE);
    assert_eq!(read_active(&path).unwrap(), None);
}

#[tokio::test]
async fn probe_with_no_active_file_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let active_path = dir.path().join(MON_ACTIVE_FILE);
    probe_and_clear_stale(dir.path(), &active_path).await.unwrap();
    assert!(!active_path.exists());
}

#[tokio::test]
#[serial]
async fn probe_clears_a_stale_record_that_never_answers() {
    std::env::set_var("AFD_MON_PROBE_TIMEOUT_MS", "50");
    let dir = TempDir::new().unwrap();
    let active_path = dir.path().join(MON_ACTIVE_FILE);
    write_active(
        &active_path,
        &ActiveRecord {
            supervisor_pid: 999_999,
            log_pids: [0, 0],
            worker_pids: vec![],
        },
    )
    .unwrap();

    probe_and_clear_stale(dir.path(), &active_path).await.unwrap();

    assert!(!active_path.exists());
    std::env::remove_var("AFD_MON_PROBE_TIMEOUT_MS");
}
