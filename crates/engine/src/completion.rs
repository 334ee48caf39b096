// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a finished transfer worker's outcome onto the FSA slot and
//! queue-entry mutations spec §4.5 describes for `TRANSFER_SUCCESS`,
//! `STILL_FILES_TO_SEND`, and any other exit code, and produces the
//! `Event`s an observer (the daemon's log, `afd-mon`, `afd-cli status
//! --follow`) sees for it.

use crate::tables::SharedTables;
use afd_core::event::Event;
use afd_core::exit_code::ExitCode;
use afd_core::host::HostAlias;
use afd_core::message::JobId;

/// What a finished worker reported, already translated from
/// `afd-adapters::TransferOutcome`/`TransferError` into the closed exit
/// code set.
#[derive(Debug, Clone, Copy)]
pub struct WorkerResult {
    pub exit_code: ExitCode,
    pub files_done: u32,
    pub bytes_done: u64,
}

/// Applies one worker's result to the FSA slot it occupied and the queue
/// entry it was dispatched for, returning the events produced. `now_secs`
/// feeds the auto-toggle backoff timestamp (spec §4.5).
pub fn apply_outcome(
    tables: &SharedTables,
    host_alias: &HostAlias,
    job_id: JobId,
    slot: usize,
    result: WorkerResult,
    now_secs: u64,
) -> Vec<Event> {
    let mut events = Vec::new();

    match result.exit_code {
        ExitCode::TransferSuccess => {
            let _ = tables.with_host_or_err(host_alias, |h| h.on_transfer_success(slot));
            tables.remove_queue_entry(job_id);
            events.push(Event::job_finished(
                job_id,
                host_alias.clone(),
                result.exit_code,
                result.files_done,
                result.bytes_done,
            ));
        }
        ExitCode::StillFilesToSend => {
            let transport_error = false;
            let _ = tables.with_host_or_err(host_alias, |h| {
                h.on_still_files_to_send(slot, transport_error)
            });
            tables.with_queue_entry(job_id, |q| q.mark_pending());
            events.push(Event::job_finished(
                job_id,
                host_alias.clone(),
                result.exit_code,
                result.files_done,
                result.bytes_done,
            ));
        }
        ExitCode::NoFilesToSend => {
            let _ = tables.with_host_or_err(host_alias, |h| h.on_transfer_success(slot));
            tables.remove_queue_entry(job_id);
        }
        other => {
            tracing::warn!(host = %host_alias, job_id = job_id.0, exit_code = other.code(), "transfer error");
            let _ = tables.with_host_or_err(host_alias, |h| h.on_transfer_error(slot, now_secs));
            tables.with_queue_entry(job_id, |q| q.mark_pending());

            events.push(Event::job_finished(
                job_id,
                host_alias.clone(),
                other,
                result.files_done,
                result.bytes_done,
            ));

            if let Some(host) = tables.host_snapshot(host_alias) {
                events.push(Event::HostError {
                    host_alias: host_alias.clone(),
                    error_counter: host.error_counter,
                    exit_code: Some(other.code()),
                });
                if host.error_counter > 0 && host.auto_toggle && host.error_counter % host.max_errors.max(1) == 0 {
                    events.push(Event::HostAutoToggled {
                        host_alias: host_alias.clone(),
                        new_dsp_name: host.host_dsp_name.clone(),
                    });
                }
            }
        }
    }

    events
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
