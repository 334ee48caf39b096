// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory status entry (FRA, "Fileretrieve Status Area") — the
//! per-watched-directory counterpart to [`crate::host::Host`]'s FSA row,
//! shared state for directories that pull files in rather than push them
//! out (spec §3 C1, §4.1, §4.6, GLOSSARY "FSA/FRA"). A QB entry stores
//! either an MDB position (send job) or an FRA position (retrieve job,
//! spec §3); the `gf_xxx` retrieve worker is invoked as `-d <dir_alias>
//! -j <slot>` (spec §6), mirroring `sf_xxx`'s `-j <slot>` against a host.

use serde::{Deserialize, Serialize};

use crate::host::ConnectStatus;
use crate::jid::DirAlias;

bitflags::bitflags! {
    /// Directory status bitset, named after the FRA-equivalent fields
    /// [`crate::host::HostStatus`] defines for the FSA.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DirStatus: u32 {
        /// Retrieval from this directory is administratively paused; the
        /// scheduler skips it entirely.
        const AUTO_PAUSE_QUEUE_STAT = 1 << 0;
        /// Directory is administratively disabled.
        const DISABLED = 1 << 2;
    }
}

impl Default for DirStatus {
    fn default() -> Self {
        DirStatus::empty()
    }
}

/// A watched directory's full shared-state entry (FRA row). One retrieve
/// slot per directory: unlike a host's `allowed_transfers` slots, a
/// `gf_xxx` worker owns its directory exclusively for the duration of one
/// retrieval (spec §4.6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FraEntry {
    pub alias: DirAlias,
    pub connect_status: ConnectStatus,
    pub error_counter: u32,
    pub total_errors: u64,
    pub status: DirStatus,
    pub process_id: Option<u32>,
    pub job_id: Option<u32>,
    pub file_counter_done: u32,
    pub bytes_retrieved: u64,
    pub last_retry_time: Option<u64>,
}

/// Errors returned by [`FraEntry`] invariant-preserving mutators.
#[derive(Debug, thiserror::Error)]
pub enum FraError {
    #[error("directory {0} already has a retrieval in progress")]
    AlreadyRunning(String),
}

impl FraEntry {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: DirAlias::new(alias),
            connect_status: ConnectStatus::Disconnect,
            error_counter: 0,
            total_errors: 0,
            status: DirStatus::empty(),
            process_id: None,
            job_id: None,
            file_counter_done: 0,
            bytes_retrieved: 0,
            last_retry_time: None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.status.contains(DirStatus::AUTO_PAUSE_QUEUE_STAT)
            || self.status.contains(DirStatus::DISABLED)
    }

    pub fn is_busy(&self) -> bool {
        self.process_id.is_some()
    }

    /// Marks this directory's one retrieve slot running, mirroring
    /// `Host::dispatch_into_slot` (spec §4.5/§4.6).
    pub fn dispatch(
        &mut self,
        job_id: u32,
        pid: u32,
        connect_status: ConnectStatus,
    ) -> Result<(), FraError> {
        if self.is_busy() {
            return Err(FraError::AlreadyRunning(self.alias.to_string()));
        }
        self.process_id = Some(pid);
        self.job_id = Some(job_id);
        self.connect_status = connect_status;
        Ok(())
    }

    /// Outcome handling for a successful retrieval: clear the slot and
    /// reset the error counter, mirroring `Host::on_transfer_success`.
    pub fn on_retrieval_success(&mut self) {
        self.process_id = None;
        self.job_id = None;
        self.connect_status = ConnectStatus::Disconnect;
        self.error_counter = 0;
    }

    /// Outcome handling for a failed retrieval, mirroring
    /// `Host::on_transfer_error` minus host auto-toggle (directories have
    /// no secondary real-hostname slot to toggle between).
    pub fn on_retrieval_error(&mut self, now_epoch_secs: u64) {
        self.process_id = None;
        self.job_id = None;
        self.connect_status = ConnectStatus::Disconnect;
        self.error_counter += 1;
        self.total_errors += 1;
        self.last_retry_time = Some(now_epoch_secs);
    }
}

#[cfg(test)]
#[path = "fra_tests.rs"]
mod tests;
