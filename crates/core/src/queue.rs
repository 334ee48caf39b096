// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue (QB) entry: one pending-or-in-flight unit of work per job-id.

use crate::message::JobId;
use serde::{Deserialize, Serialize};

/// Sentinel values the `pid` field can carry in addition to a real process
/// id, per spec §3/§4.5.
pub const PID_PENDING: i32 = -2;
pub const PID_REMOVED: i32 = -3;

/// A single queue entry. `msg_number` orders entries FIFO within a host's
/// queue; lower numbers are dispatched first (spec §4.2, invariant I2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueEntry {
    pub job_id: JobId,
    pub msg_number: u64,
    pub files_to_send: u32,
    pub file_size_to_send: u64,
    /// `>= 0`: pid of the worker currently processing this entry.
    /// `PID_PENDING`: queued, not yet dispatched.
    /// `PID_REMOVED`: marked for deletion, awaiting reconciler sweep.
    pub pid: i32,
    pub in_error_queue: bool,
}

impl QueueEntry {
    pub fn new_pending(job_id: JobId, msg_number: u64, files_to_send: u32, file_size_to_send: u64) -> Self {
        Self {
            job_id,
            msg_number,
            files_to_send,
            file_size_to_send,
            pid: PID_PENDING,
            in_error_queue: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pid == PID_PENDING
    }

    pub fn is_removed(&self) -> bool {
        self.pid == PID_REMOVED
    }

    pub fn is_in_progress(&self) -> bool {
        self.pid >= 0
    }

    pub fn mark_dispatched(&mut self, pid: u32) {
        self.pid = pid as i32;
    }

    pub fn mark_pending(&mut self) {
        self.pid = PID_PENDING;
    }

    pub fn mark_removed(&mut self) {
        self.pid = PID_REMOVED;
    }
}

/// Total ordering used to sort a host's queue before dispatch: pending
/// entries by `msg_number` ascending, in-progress and removed entries sort
/// after (they are not candidates for dispatch at all). Mirrors the FIFO
/// requirement of spec §4.2 item 2 and invariant I2.
pub fn dispatch_order(a: &QueueEntry, b: &QueueEntry) -> std::cmp::Ordering {
    match (a.is_pending(), b.is_pending()) {
        (true, true) => a.msg_number.cmp(&b.msg_number),
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        (false, false) => a.msg_number.cmp(&b.msg_number),
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
