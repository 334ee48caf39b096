// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tick dispatch decision (spec §4.5): for each host with free
//! transfer slots and no administrative pause, pick the next pending
//! queue entry in FIFO order and hand it to the caller to actually spawn
//! a worker for.
//!
//! This module only decides *what* should be dispatched; it does not
//! spawn anything itself, keeping the pure decision step separate from
//! the runtime's own effect execution.

use crate::tables::SharedTables;
use afd_core::host::HostAlias;
use afd_core::message::JobId;
use afd_core::queue::dispatch_order;

/// One queue entry chosen to be dispatched this tick, plus the FSA slot
/// index it was reserved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub host_alias: HostAlias,
    pub job_id: JobId,
    pub slot: usize,
}

/// Scans every host's queue and reserves a slot for the earliest pending
/// entry on each host that has capacity and isn't paused, up to however
/// many slots that host has free. `allocate_pid` is called once per
/// reservation to obtain the pid the caller will spawn the worker under;
/// it is injected so tests can supply deterministic ids.
///
/// Dispatch order within a host is FIFO by `msg_number` (spec §4.2 item
/// 2, invariant I2); across hosts, every host with capacity gets a
/// chance to dispatch in the same tick rather than one host starving the
/// rest.
///
/// A host with `error_counter > 0` is in host-error-backoff until
/// `retry_interval_secs` has elapsed since `last_retry_time` (spec §4.5:
/// "host not in host-error-backoff OR this is the first retry slot"). The
/// exception keeps the host from stalling forever: the first pending
/// entry dispatched to a backed-off host each tick is always let through
/// (a single probe attempt), but no further entries for that host are
/// dispatched in the same tick until the backoff window clears.
pub fn dispatch_ready(
    tables: &SharedTables,
    now_epoch_secs: u64,
    retry_interval_secs: u64,
    mut allocate_pid: impl FnMut() -> u32,
) -> Vec<DispatchPlan> {
    let mut plans = Vec::new();

    for alias in tables.host_aliases() {
        let Some(snapshot) = tables.host_snapshot(&alias) else {
            continue;
        };
        if snapshot.is_paused() {
            continue;
        }
        let in_backoff = snapshot.in_error_backoff(now_epoch_secs, retry_interval_secs);

        let mut pending: Vec<_> = tables
            .queue_entries_for_host(&alias)
            .into_iter()
            .filter(|q| q.is_pending())
            .collect();
        pending.sort_by(dispatch_order);

        let mut dispatched_this_host = 0usize;
        for entry in pending {
            if in_backoff && dispatched_this_host >= 1 {
                break;
            }

            let pid = allocate_pid();
            let connect_status = afd_core::host::ConnectStatus::Connecting;
            let reserved = tables.with_host_or_err(&alias, |host| {
                if !host.has_capacity() {
                    return Err(afd_core::host::HostError::NoFreeSlot(alias.to_string()));
                }
                host.dispatch_into_slot(entry.job_id.0, pid, connect_status)
            });

            match reserved {
                Ok(slot) => {
                    tables.with_queue_entry(entry.job_id, |q| q.mark_dispatched(pid));
                    tracing::debug!(host = %alias, job_id = entry.job_id.0, slot, pid, "dispatched");
                    plans.push(DispatchPlan {
                        host_alias: alias.clone(),
                        job_id: entry.job_id,
                        slot,
                    });
                    dispatched_this_host += 1;
                }
                Err(_) => break, // host out of free slots; move to the next host
            }
        }
    }

    plans
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
