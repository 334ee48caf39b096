// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor Status Area (MSA) entry: per-remote-AFD state tracked by the
//! remote monitor core (spec §3).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

crate::define_id! {
    #[derive(Default)]
    /// Stable alias for a monitored remote AFD instance.
    pub struct AfdAlias;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectStatus {
    #[default]
    Disconnected,
    Established,
    Defunct,
    Disabled,
}

/// A single day's top-of-day counters, retained for `STORAGE_TIME` days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCounters {
    pub transfer_rate: u64,
    pub file_rate: u64,
    pub active_transfers: u32,
}

/// Bounded ring buffer of the last `MAX_LOG_HISTORY` entries of one log
/// category (receive/system/transfer).
///
/// `shifted_for_hour` tracks which wall-clock hour bucket the ring last
/// shifted for, so that [`LogHistory::apply_update`] can enforce "at most
/// one left-shift per hour" (spec §4.10, invariant 9) even though AFDD
/// sends a short incremental update every poll interval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogHistory {
    capacity: usize,
    entries: VecDeque<String>,
    shifted_for_hour: Option<u64>,
}

impl LogHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            shifted_for_hour: None,
        }
    }

    /// Unconditional push: drops the oldest entry once at capacity. Used
    /// directly by callers that don't carry hour semantics; `RH`/`SH`/`TH`
    /// updates from AFDD go through [`LogHistory::apply_update`] instead.
    pub fn push(&mut self, entry: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.into());
    }

    /// Applies one `RH`/`SH`/`TH` batch per spec §4.10 / invariant 9. A
    /// batch at least as long as `capacity` is a full hourly refresh and
    /// replaces the ring outright. A shorter batch shifts the ring left by
    /// one entry the first time it's seen for `hour_bucket`, then writes
    /// the batch into the tail; later short batches for the same
    /// `hour_bucket` only overwrite the tail; they never shift again, so
    /// at most one left-shift happens per wall-clock hour regardless of
    /// how many short updates arrive in it.
    pub fn apply_update(&mut self, lines: &[String], hour_bucket: u64) {
        if lines.len() >= self.capacity {
            let start = lines.len() - self.capacity;
            self.entries = lines[start..].iter().cloned().collect();
            return;
        }
        if self.shifted_for_hour != Some(hour_bucket) {
            self.push(String::new());
            self.shifted_for_hour = Some(hour_bucket);
        }
        let tail_start = self.entries.len().saturating_sub(lines.len());
        for (slot, line) in self.entries.iter_mut().skip(tail_start).zip(lines) {
            *slot = line.clone();
        }
        if lines.len() > self.entries.len() {
            for line in &lines[self.entries.len()..] {
                self.push(line.clone());
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-remote-host error history tracked within an MSA entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostErrorHistory {
    pub host_alias: String,
    pub error_counter: u32,
}

/// Full MSA entry for one monitored remote AFD instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MsaEntry {
    pub alias: AfdAlias,
    pub real_hostname: [String; 2],
    pub port: [u16; 2],
    pub poll_interval_secs: u32,
    pub last_connect_time_epoch_ms: Option<u64>,
    pub last_disconnect_time_epoch_ms: Option<u64>,
    pub amg_running: bool,
    pub fd_running: bool,
    pub archive_watch_running: bool,
    pub jobs_in_queue: u32,
    pub active_transfers: u32,
    pub day_counters: VecDeque<DayCounters>,
    pub storage_time_days: usize,
    pub receive_log: LogHistory,
    pub system_log: LogHistory,
    pub transfer_log: LogHistory,
    pub host_error_counter: u32,
    pub no_of_hosts: u32,
    pub no_of_dirs: u32,
    pub host_error_histories: Vec<HostErrorHistory>,
    pub remote_work_dir: String,
    pub remote_version: String,
    pub connect_status: ConnectStatus,
}

impl MsaEntry {
    pub fn new(alias: impl Into<String>, max_log_history: usize, storage_time_days: usize) -> Self {
        Self {
            alias: AfdAlias::new(alias),
            real_hostname: [String::new(), String::new()],
            port: [0, 0],
            poll_interval_secs: 0,
            last_connect_time_epoch_ms: None,
            last_disconnect_time_epoch_ms: None,
            amg_running: false,
            fd_running: false,
            archive_watch_running: false,
            jobs_in_queue: 0,
            active_transfers: 0,
            day_counters: VecDeque::with_capacity(storage_time_days),
            storage_time_days,
            receive_log: LogHistory::new(max_log_history),
            system_log: LogHistory::new(max_log_history),
            transfer_log: LogHistory::new(max_log_history),
            host_error_counter: 0,
            no_of_hosts: 0,
            no_of_dirs: 0,
            host_error_histories: Vec::new(),
            remote_work_dir: String::new(),
            remote_version: String::new(),
            connect_status: ConnectStatus::Disconnected,
        }
    }

    /// Records a new day's counters, evicting the oldest once the
    /// `STORAGE_TIME`-day window is full.
    pub fn push_day_counters(&mut self, counters: DayCounters) {
        if self.day_counters.len() == self.storage_time_days {
            self.day_counters.pop_front();
        }
        self.day_counters.push_back(counters);
    }
}

#[cfg(test)]
#[path = "msa_tests.rs"]
mod tests;
