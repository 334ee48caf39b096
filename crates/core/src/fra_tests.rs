// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::host::ConnectStatus;

#[test]
fn new_entry_is_idle_and_not_paused() {
    let fra = FraEntry::new("dir01");
    assert!(!fra.is_busy());
    assert!(!fra.is_paused());
    assert_eq!(fra.error_counter, 0);
}

#[test]
fn dispatch_occupies_the_single_slot() {
    let mut fra = FraEntry::new("dir01");
    fra.dispatch(7, 1234, ConnectStatus::FtpActive).unwrap();
    assert!(fra.is_busy());
    assert_eq!(fra.job_id, Some(7));
    assert_eq!(fra.process_id, Some(1234));
}

#[test]
fn dispatch_while_busy_errors() {
    let mut fra = FraEntry::new("dir01");
    fra.dispatch(7, 1234, ConnectStatus::FtpActive).unwrap();
    assert!(matches!(
        fra.dispatch(8, 5678, ConnectStatus::FtpActive),
        Err(FraError::AlreadyRunning(_))
    ));
}

#[test]
fn retrieval_success_clears_slot_and_resets_errors() {
    let mut fra = FraEntry::new("dir01");
    fra.error_counter = 3;
    fra.dispatch(7, 1234, ConnectStatus::FtpActive).unwrap();
    fra.on_retrieval_success();
    assert!(!fra.is_busy());
    assert_eq!(fra.error_counter, 0);
}

#[test]
fn retrieval_error_frees_slot_and_bumps_counters() {
    let mut fra = FraEntry::new("dir01");
    fra.dispatch(7, 1234, ConnectStatus::FtpActive).unwrap();
    fra.on_retrieval_error(1_000);
    assert!(!fra.is_busy());
    assert_eq!(fra.error_counter, 1);
    assert_eq!(fra.total_errors, 1);
    assert_eq!(fra.last_retry_time, Some(1_000));
}

#[test]
fn paused_status_is_reported() {
    let mut fra = FraEntry::new("dir01");
    fra.status.insert(DirStatus::AUTO_PAUSE_QUEUE_STAT);
    assert!(fra.is_paused());
}
