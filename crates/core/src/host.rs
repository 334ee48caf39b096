// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host status entry (FSA) — the per-destination shared state the
//! scheduler, workers, and reconciler all read and mutate.

use serde::{Deserialize, Serialize};

crate::define_id! {
    #[derive(Default)]
    /// Stable alias identifying a destination host (the FSA key).
    pub struct HostAlias;
}

/// Which of the two switchable real-hostname slots is currently active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostToggle {
    #[default]
    HostOne,
    HostTwo,
}

impl HostToggle {
    pub fn flip(self) -> Self {
        match self {
            HostToggle::HostOne => HostToggle::HostTwo,
            HostToggle::HostTwo => HostToggle::HostOne,
        }
    }

    /// The display-name suffix character used in `host_dsp_name`.
    pub fn suffix_char(self) -> char {
        match self {
            HostToggle::HostOne => '1',
            HostToggle::HostTwo => '2',
        }
    }
}

bitflags::bitflags! {
    /// Host status bitset. Named after the fields the spec calls out
    /// explicitly (§3); other bits are reserved for future flags but are
    /// not otherwise interpreted by this crate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct HostStatus: u32 {
        /// Host is administratively paused; the scheduler skips it entirely.
        const AUTO_PAUSE_QUEUE_STAT = 1 << 0;
        /// At least one slot on this host currently has a file mid-transfer
        /// that must not be double-dispatched.
        const ERROR_FILE_UNDER_PROCESS = 1 << 1;
        /// Host is administratively disabled (equivalent to DISABLED in §5).
        const DISABLED = 1 << 2;
    }
}

impl Default for HostStatus {
    fn default() -> Self {
        HostStatus::empty()
    }
}

/// Connection status of a single transfer slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectStatus {
    #[default]
    Disconnect,
    Connecting,
    FtpActive,
    FtpBurst2TransferActive,
    SmtpActive,
    LocActive,
    WmoActive,
    WmoBurst2TransferActive,
    NotWorking,
}

impl ConnectStatus {
    /// `NOT_WORKING` statuses are cleared to `DISCONNECT` after a
    /// successful transfer, per spec §4.5.
    pub fn is_not_working(self) -> bool {
        matches!(self, ConnectStatus::NotWorking)
    }
}

/// Per-transfer-slot job status, one entry per `allowed_transfers` slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusSlot {
    pub connect_status: ConnectStatus,
    pub file_name_in_use: String,
    pub file_size_in_use: u64,
    pub file_size_done: u64,
    pub bytes_send: u64,
    pub file_counter_done: u32,
    pub process_id: Option<u32>,
    pub burst_counter: u32,
    /// Job-id currently occupying this slot; left populated by the FD to
    /// signal burst-mode readiness (§4.5).
    pub job_id: Option<u32>,
}

impl Default for JobStatusSlot {
    fn default() -> Self {
        Self {
            connect_status: ConnectStatus::Disconnect,
            file_name_in_use: String::new(),
            file_size_in_use: 0,
            file_size_done: 0,
            bytes_send: 0,
            file_counter_done: 0,
            process_id: None,
            burst_counter: 0,
            job_id: None,
        }
    }
}

impl JobStatusSlot {
    /// Reset to idle, as performed by `reset_fsa` after a crash or a
    /// supervisor-side cleanup when a worker's own exit handler didn't run.
    pub fn reset(&mut self) {
        *self = JobStatusSlot::default();
    }
}

/// A destination host's full shared-state entry (FSA row).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Host {
    pub alias: HostAlias,
    pub host_dsp_name: String,
    pub real_hostname: [String; 2],
    pub host_toggle: HostToggle,
    /// Toggle position saved when auto-toggle first engages; `None` means
    /// "no saved toggle" (the `original_toggle_pos == NONE` condition).
    pub original_toggle_pos: Option<HostToggle>,
    pub allowed_transfers: u32,
    pub active_transfers: u32,
    pub error_counter: u32,
    pub total_errors: u64,
    pub max_errors: u32,
    pub auto_toggle: bool,
    pub status: HostStatus,
    pub total_file_counter: u64,
    pub total_file_size: u64,
    pub last_retry_time: Option<u64>,
    pub slots: Vec<JobStatusSlot>,
}

/// Errors returned by [`Host`] invariant-preserving mutators.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("host {0} has no free transfer slots")]
    NoFreeSlot(String),
    #[error("slot index {0} out of range")]
    SlotOutOfRange(usize),
}

impl Host {
    pub fn new(alias: impl Into<String>, allowed_transfers: u32, max_errors: u32) -> Self {
        let alias = HostAlias::new(alias);
        Self {
            host_dsp_name: alias.as_str().to_string(),
            alias,
            real_hostname: [String::new(), String::new()],
            host_toggle: HostToggle::HostOne,
            original_toggle_pos: None,
            allowed_transfers,
            active_transfers: 0,
            error_counter: 0,
            total_errors: 0,
            max_errors,
            auto_toggle: false,
            status: HostStatus::empty(),
            total_file_counter: 0,
            total_file_size: 0,
            last_retry_time: None,
            slots: (0..allowed_transfers)
                .map(|_| JobStatusSlot::default())
                .collect(),
        }
    }

    /// Invariant: `0 <= active_transfers <= allowed_transfers` (spec §8 I1).
    pub fn has_capacity(&self) -> bool {
        self.active_transfers < self.allowed_transfers
    }

    pub fn is_paused(&self) -> bool {
        self.status.contains(HostStatus::AUTO_PAUSE_QUEUE_STAT)
            || self.status.contains(HostStatus::DISABLED)
    }

    /// Whether this host is within its post-error backoff window (spec
    /// §4.5 dispatch condition "host not in host-error-backoff"): it has
    /// recorded at least one error and fewer than `retry_interval_secs`
    /// have elapsed since `last_retry_time`.
    pub fn in_error_backoff(&self, now_epoch_secs: u64, retry_interval_secs: u64) -> bool {
        if self.error_counter == 0 {
            return false;
        }
        match self.last_retry_time {
            Some(last) => now_epoch_secs.saturating_sub(last) < retry_interval_secs,
            None => false,
        }
    }

    /// Find a free slot and mark it running with the given pid/job id.
    /// Mirrors the scheduler's atomic "increment active_transfers, set
    /// qb.pid, record connect slot" sequence from spec §4.5.
    pub fn dispatch_into_slot(
        &mut self,
        job_id: u32,
        pid: u32,
        connect_status: ConnectStatus,
    ) -> Result<usize, HostError> {
        if !self.has_capacity() {
            return Err(HostError::NoFreeSlot(self.alias.to_string()));
        }
        let idx = self
            .slots
            .iter()
            .position(|s| s.process_id.is_none())
            .ok_or_else(|| HostError::NoFreeSlot(self.alias.to_string()))?;
        let slot = &mut self.slots[idx];
        slot.process_id = Some(pid);
        slot.job_id = Some(job_id);
        slot.connect_status = connect_status;
        self.active_transfers += 1;
        Ok(idx)
    }

    /// Outcome handling for `TRANSFER_SUCCESS` (spec §4.5): drop the slot,
    /// reset error_counter, clear NOT_WORKING statuses on other slots, and
    /// clear AUTO_PAUSE_QUEUE_STAT.
    pub fn on_transfer_success(&mut self, slot_idx: usize) -> Result<(), HostError> {
        let slot = self
            .slots
            .get_mut(slot_idx)
            .ok_or(HostError::SlotOutOfRange(slot_idx))?;
        slot.reset();
        self.active_transfers = self.active_transfers.saturating_sub(1);
        self.error_counter = 0;
        self.status.remove(HostStatus::AUTO_PAUSE_QUEUE_STAT);
        for s in self.slots.iter_mut() {
            if s.connect_status.is_not_working() {
                s.connect_status = ConnectStatus::Disconnect;
            }
        }
        Ok(())
    }

    /// Outcome handling for `STILL_FILES_TO_SEND`: leave the queue entry,
    /// clear the slot's pid (left PENDING upstream), optionally bump the
    /// error counter if a transport error occurred alongside it.
    pub fn on_still_files_to_send(
        &mut self,
        slot_idx: usize,
        transport_error: bool,
    ) -> Result<(), HostError> {
        let slot = self
            .slots
            .get_mut(slot_idx)
            .ok_or(HostError::SlotOutOfRange(slot_idx))?;
        slot.process_id = None;
        self.active_transfers = self.active_transfers.saturating_sub(1);
        if transport_error {
            self.error_counter += 1;
        }
        Ok(())
    }

    /// Outcome handling for any other non-zero exit or signal death: bump
    /// error counters and apply auto-toggle per spec §4.5.
    pub fn on_transfer_error(&mut self, slot_idx: usize, now_epoch_secs: u64) -> Result<(), HostError> {
        {
            let slot = self
                .slots
                .get_mut(slot_idx)
                .ok_or(HostError::SlotOutOfRange(slot_idx))?;
            slot.reset();
        }
        self.active_transfers = self.active_transfers.saturating_sub(1);
        self.error_counter += 1;
        self.total_errors += 1;
        self.last_retry_time = Some(now_epoch_secs);

        if self.auto_toggle {
            if self.error_counter == self.max_errors && self.original_toggle_pos.is_none() {
                self.original_toggle_pos = Some(self.host_toggle);
            }
            if self.max_errors > 0 && self.error_counter % self.max_errors == 0 {
                self.host_toggle = self.host_toggle.flip();
                let suffix = self.host_toggle.suffix_char();
                if let Some(stripped) = self.host_dsp_name.strip_suffix(|c: char| c.is_ascii_digit())
                {
                    self.host_dsp_name = format!("{stripped}{suffix}");
                } else {
                    self.host_dsp_name.push(suffix);
                }
            }
        }
        Ok(())
    }

    /// Recompute aggregate counters to zero when no jobs are queued for
    /// this host (reconciler task, spec §4.9 item 3).
    pub fn reset_counters_if_idle(&mut self, queued_for_host: bool) {
        if !queued_for_host {
            self.active_transfers = 0;
            self.total_file_counter = 0;
            self.total_file_size = 0;
            self.error_counter = 0;
            for slot in self.slots.iter_mut() {
                slot.reset();
            }
        }
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
