// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::host::{ConnectStatus, Host, HostAlias};
use crate::message::{JobId, MdbEntry, Scheme};
use crate::queue::QueueEntry;

/// Builds a [`Host`] with sensible defaults for tests that only care about
/// a handful of fields.
pub fn test_host(alias: &str, allowed_transfers: u32, max_errors: u32) -> Host {
    Host::new(alias, allowed_transfers, max_errors)
}

/// Builds an [`MdbEntry`] pointing at a freshly-constructed host alias.
pub fn test_mdb_entry(job_id: u32, host_alias: &str, scheme: Scheme) -> MdbEntry {
    MdbEntry {
        job_id: JobId::new(job_id),
        host_alias: HostAlias::new(host_alias),
        fsa_pos: 0,
        scheme,
        age_limit_secs: None,
        message_mtime_epoch_ms: 0,
        last_transfer_time_epoch_ms: None,
        in_current_fsa: true,
    }
}

/// Builds a pending [`QueueEntry`] for a single-file job.
pub fn test_queue_entry(job_id: u32, msg_number: u64) -> QueueEntry {
    QueueEntry::new_pending(JobId::new(job_id), msg_number, 1, 10)
}

/// Drives a host through one full dispatch/success cycle and returns the
/// slot index used, for tests that only care about the end state.
///
/// Panics if the host has no free slot; callers are expected to size
/// `allowed_transfers` accordingly.
#[allow(clippy::expect_used)]
pub fn dispatch_and_succeed(host: &mut Host, job_id: u32, pid: u32) -> usize {
    let slot = host
        .dispatch_into_slot(job_id, pid, ConnectStatus::FtpActive)
        .expect("host should have capacity in test fixtures");
    host.on_transfer_success(slot)
        .expect("slot index returned by dispatch_into_slot must be valid");
    slot
}
