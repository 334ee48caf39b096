// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_host_has_no_active_transfers() {
    let host = Host::new("mirror01", 2, 3);
    assert_eq!(host.active_transfers, 0);
    assert_eq!(host.slots.len(), 2);
    assert!(host.has_capacity());
}

#[test]
fn dispatch_respects_capacity() {
    let mut host = Host::new("mirror01", 1, 3);
    host.dispatch_into_slot(42, 1000, ConnectStatus::FtpActive)
        .unwrap();
    assert!(!host.has_capacity());
    let err = host.dispatch_into_slot(43, 1001, ConnectStatus::FtpActive);
    assert!(matches!(err, Err(HostError::NoFreeSlot(_))));
}

#[test]
fn transfer_success_resets_error_counter_and_pause() {
    let mut host = Host::new("mirror01", 1, 3);
    host.error_counter = 2;
    host.status.insert(HostStatus::AUTO_PAUSE_QUEUE_STAT);
    let slot = host
        .dispatch_into_slot(42, 1000, ConnectStatus::FtpActive)
        .unwrap();
    host.on_transfer_success(slot).unwrap();
    assert_eq!(host.error_counter, 0);
    assert_eq!(host.active_transfers, 0);
    assert!(!host.status.contains(HostStatus::AUTO_PAUSE_QUEUE_STAT));
}

#[test]
fn still_files_to_send_keeps_queue_entry_clears_pid() {
    let mut host = Host::new("mirror01", 1, 3);
    let slot = host
        .dispatch_into_slot(42, 1000, ConnectStatus::FtpActive)
        .unwrap();
    host.on_still_files_to_send(slot, true).unwrap();
    assert_eq!(host.active_transfers, 0);
    assert_eq!(host.error_counter, 1);
    assert!(host.slots[slot].process_id.is_none());
}

#[test]
fn auto_toggle_flips_after_max_errors_and_saves_original() {
    let mut host = Host::new("mirror01", 1, 3);
    host.auto_toggle = true;
    host.host_dsp_name = "mirror1".to_string();
    let slot = host
        .dispatch_into_slot(42, 1000, ConnectStatus::FtpActive)
        .unwrap();

    for _ in 0..2 {
        host.on_transfer_error(slot, 100).unwrap();
        host.dispatch_into_slot(42, 1000, ConnectStatus::FtpActive)
            .unwrap();
    }
    host.on_transfer_error(slot, 100).unwrap();

    assert_eq!(host.error_counter, 3);
    assert_eq!(host.host_toggle, HostToggle::HostTwo);
    assert_eq!(host.original_toggle_pos, Some(HostToggle::HostOne));
    assert_eq!(host.host_dsp_name, "mirror2");
}

#[test]
fn no_errors_means_no_backoff() {
    let host = Host::new("mirror01", 1, 3);
    assert!(!host.in_error_backoff(1_000, 30));
}

#[test]
fn recent_error_is_in_backoff_until_interval_elapses() {
    let mut host = Host::new("mirror01", 1, 3);
    host.error_counter = 1;
    host.last_retry_time = Some(1_000);
    assert!(host.in_error_backoff(1_010, 30));
    assert!(!host.in_error_backoff(1_030, 30));
}

#[test]
fn idle_reconciliation_zeroes_counters() {
    let mut host = Host::new("mirror01", 2, 3);
    host.total_file_counter = 5;
    host.total_file_size = 500;
    host.error_counter = 2;
    host.reset_counters_if_idle(false);
    assert_eq!(host.total_file_counter, 0);
    assert_eq!(host.total_file_size, 0);
    assert_eq!(host.error_counter, 0);
}

#[test]
fn idle_reconciliation_leaves_active_host_alone() {
    let mut host = Host::new("mirror01", 2, 3);
    host.total_file_counter = 5;
    host.reset_counters_if_idle(true);
    assert_eq!(host.total_file_counter, 5);
}
