// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn log_history_evicts_oldest_past_capacity() {
    let mut log = LogHistory::new(2);
    log.push("a");
    log.push("b");
    log.push("c");
    let entries: Vec<&str> = log.entries().collect();
    assert_eq!(entries, vec!["b", "c"]);
}

#[test]
fn apply_update_shifts_once_per_hour_then_only_overwrites_tail() {
    let mut log = LogHistory::new(4);
    let full: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    log.apply_update(&full, 100);
    assert_eq!(log.entries().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);

    // Short batch for a new hour: shifts left once, tail gets the batch.
    let short: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
    log.apply_update(&short, 101);
    assert_eq!(log.entries().collect::<Vec<_>>(), vec!["b", "x", "y", "z"]);

    // A second short batch within the same hour must not shift again.
    let short2: Vec<String> = ["p", "q", "r"].iter().map(|s| s.to_string()).collect();
    log.apply_update(&short2, 101);
    assert_eq!(log.entries().collect::<Vec<_>>(), vec!["b", "p", "q", "r"]);

    // Crossing into a new hour shifts exactly once more.
    let short3: Vec<String> = ["m", "n", "o"].iter().map(|s| s.to_string()).collect();
    log.apply_update(&short3, 102);
    assert_eq!(log.entries().collect::<Vec<_>>(), vec!["p", "m", "n", "o"]);
}

#[test]
fn new_entry_starts_disconnected_with_empty_logs() {
    let msa = MsaEntry::new("remote01", 10, 7);
    assert_eq!(msa.connect_status, ConnectStatus::Disconnected);
    assert!(msa.receive_log.is_empty());
    assert_eq!(msa.day_counters.len(), 0);
}

#[test]
fn push_day_counters_respects_storage_window() {
    let mut msa = MsaEntry::new("remote01", 10, 2);
    msa.push_day_counters(DayCounters { transfer_rate: 1, file_rate: 1, active_transfers: 1 });
    msa.push_day_counters(DayCounters { transfer_rate: 2, file_rate: 2, active_transfers: 2 });
    msa.push_day_counters(DayCounters { transfer_rate: 3, file_rate: 3, active_transfers: 3 });
    assert_eq!(msa.day_counters.len(), 2);
    assert_eq!(msa.day_counters.front().unwrap().transfer_rate, 2);
}
