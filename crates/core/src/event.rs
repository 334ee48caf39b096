// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ambient observability events emitted by the daemon's components.
//!
//! These are a secondary log stream, separate from the FSA/MDB/QB shared
//! state itself: nothing in the scheduler or worker outcome handling reads
//! them back, but they give operators and the CLI's `tail` command a
//! structured feed of what happened and when.

use crate::exit_code::ExitCode;
use crate::host::HostAlias;
use crate::message::JobId;
use serde::{Deserialize, Serialize};

/// Structured events that flow out of the daemon's components onto the
/// system log.
///
/// Serializes with `{"type": "domain:name", ...fields}` format. Unknown
/// type tags deserialize to `Custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- job --
    #[serde(rename = "job:queued")]
    JobQueued {
        job_id: JobId,
        host_alias: HostAlias,
        msg_number: u64,
        files_to_send: u32,
    },

    #[serde(rename = "job:dispatched")]
    JobDispatched {
        job_id: JobId,
        host_alias: HostAlias,
        pid: u32,
        slot: usize,
    },

    #[serde(rename = "job:finished")]
    JobFinished {
        job_id: JobId,
        host_alias: HostAlias,
        exit_code: u8,
        files_done: u32,
        bytes_done: u64,
    },

    // -- host --
    #[serde(rename = "host:error")]
    HostError {
        host_alias: HostAlias,
        error_counter: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<u8>,
    },

    #[serde(rename = "host:auto_toggled")]
    HostAutoToggled {
        host_alias: HostAlias,
        new_dsp_name: String,
    },

    #[serde(rename = "host:paused")]
    HostPaused { host_alias: HostAlias },

    #[serde(rename = "host:resumed")]
    HostResumed { host_alias: HostAlias },

    // -- archive --
    #[serde(rename = "archive:stored")]
    ArchiveStored {
        job_id: JobId,
        host_alias: HostAlias,
        bucket: u32,
        filename: String,
    },

    #[serde(rename = "archive:full")]
    ArchiveFull {
        host_alias: HostAlias,
        filename: String,
    },

    // -- append/restart --
    #[serde(rename = "append:recorded")]
    AppendRecorded { job_id: JobId, filename: String },

    #[serde(rename = "append:resolved")]
    AppendResolved { job_id: JobId, filename: String },

    // -- monitor --
    #[serde(rename = "mon:connect_status_changed")]
    MonConnectStatusChanged {
        afd_alias: String,
        connect_status: String,
    },

    #[serde(rename = "mon:worker_restarted")]
    MonWorkerRestarted { afd_alias: String, attempt: u32 },

    /// Fallback for forward-compatible deserialization of unknown event
    /// types written by a newer daemon version.
    #[serde(other)]
    Custom,
}

impl Event {
    pub fn job_finished(job_id: JobId, host_alias: HostAlias, exit_code: ExitCode, files_done: u32, bytes_done: u64) -> Self {
        Event::JobFinished {
            job_id,
            host_alias,
            exit_code: exit_code.code(),
            files_done,
            bytes_done,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
