// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_core::host::HostStatus;
use afd_core::message::{JobId, MdbEntry, Scheme};
use afd_core::test_support::{test_host, test_mdb_entry, test_queue_entry};

const NOW: u64 = 10_000;
const RETRY_INTERVAL: u64 = 30;

fn next_pid() -> impl FnMut() -> u32 {
    let mut n = 1000u32;
    move || {
        n += 1;
        n
    }
}

fn seed(tables: &SharedTables, host_alias: &str, allowed_transfers: u32, job_ids: &[u32]) {
    tables.insert_host(test_host(host_alias, allowed_transfers, 3));
    for (i, job_id) in job_ids.iter().enumerate() {
        tables.insert_mdb(test_mdb_entry(*job_id, host_alias, Scheme::Ftp));
        tables.insert_queue_entry(test_queue_entry(*job_id, i as u64));
    }
}

#[test]
fn dispatches_earliest_pending_entry_first() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 1, &[2, 1]);
    // job 1 has the smaller msg_number (inserted second, msg_number=1)
    // but we want FIFO by msg_number, not insertion order, so fix it up:
    tables.with_queue_entry(JobId::new(1), |q| q.msg_number = 0);
    tables.with_queue_entry(JobId::new(2), |q| q.msg_number = 1);

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].job_id, JobId::new(1));
}

#[test]
fn respects_per_host_concurrency_limit() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 1, &[1, 2]);

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert_eq!(plans.len(), 1);
    let host = tables.host_snapshot(&HostAlias::new("mirror01")).unwrap();
    assert_eq!(host.active_transfers, 1);
}

#[test]
fn dispatches_up_to_full_slot_count_in_one_tick() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 2, &[1, 2, 3]);

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert_eq!(plans.len(), 2);
}

#[test]
fn paused_host_is_skipped_entirely() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 1, &[1]);
    tables.with_host(&HostAlias::new("mirror01"), |h| {
        h.status.insert(HostStatus::AUTO_PAUSE_QUEUE_STAT)
    });

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert!(plans.is_empty());
}

#[test]
fn disabled_host_is_skipped_entirely() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 1, &[1]);
    tables.with_host(&HostAlias::new("mirror01"), |h| {
        h.status.insert(HostStatus::DISABLED)
    });

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert!(plans.is_empty());
}

#[test]
fn every_host_with_capacity_gets_a_chance_in_the_same_tick() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 1, &[1]);
    seed(&tables, "mirror02", 1, &[2]);

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    let hosts: Vec<_> = plans.iter().map(|p| p.host_alias.to_string()).collect();
    assert!(hosts.contains(&"mirror01".to_string()));
    assert!(hosts.contains(&"mirror02".to_string()));
}

#[test]
fn marks_dispatched_queue_entry_with_allocated_pid() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 1, &[1]);

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());
    let pid = tables
        .with_queue_entry(plans[0].job_id, |q| q.pid)
        .unwrap();

    assert!(pid > 0);
    assert!(!tables
        .with_queue_entry(plans[0].job_id, |q| q.is_pending())
        .unwrap());
}

#[test]
fn in_progress_entries_are_not_redispatched() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 2, &[1]);
    tables.with_queue_entry(JobId::new(1), |q| q.mark_dispatched(42));

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert!(plans.is_empty());
}

#[test]
fn host_in_error_backoff_only_gets_one_retry_slot_per_tick() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 2, &[1, 2]);
    tables.with_host(&HostAlias::new("mirror01"), |h| {
        h.error_counter = 1;
        h.last_retry_time = Some(NOW - 1);
    });

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert_eq!(plans.len(), 1);
}

#[test]
fn host_past_retry_interval_is_not_in_backoff() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 2, &[1, 2]);
    tables.with_host(&HostAlias::new("mirror01"), |h| {
        h.error_counter = 1;
        h.last_retry_time = Some(NOW - RETRY_INTERVAL);
    });

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert_eq!(plans.len(), 2);
}

#[test]
fn host_never_errored_is_never_in_backoff() {
    let tables = SharedTables::new();
    seed(&tables, "mirror01", 2, &[1, 2]);

    let plans = dispatch_ready(&tables, NOW, RETRY_INTERVAL, next_pid());

    assert_eq!(plans.len(), 2);
}
