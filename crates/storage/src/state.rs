// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ambient daemon bookkeeping, derived from replaying the [`Event`] log.
//!
//! This is deliberately separate from the FSA/MDB/QB/JID arenas: those are
//! the system of record for in-flight work (spec §3/§4.1) and are
//! recovered by re-attaching their files directly. `DaemonState` only
//! tracks aggregate counters and per-host summaries useful for the CLI's
//! status views and for deciding when a new checkpoint is due.

use afd_core::event::Event;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rolling summary of one destination host's recent activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSummary {
    pub error_counter: u32,
    pub total_errors: u64,
    pub paused: bool,
    pub jobs_dispatched: u64,
    pub jobs_finished: u64,
}

/// Materialized ambient state, replayed from the [`Event`] log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonState {
    pub hosts: HashMap<String, HostSummary>,
    pub total_jobs_dispatched: u64,
    pub total_jobs_finished: u64,
    pub total_bytes_transferred: u64,
    pub total_archived: u64,
    pub total_archive_full_events: u64,
}

impl DaemonState {
    pub fn host(&self, alias: &str) -> Option<&HostSummary> {
        self.hosts.get(alias)
    }

    /// Apply one event to derive the next state.
    ///
    /// Each event is applied exactly once: replay only ever visits entries
    /// the log's own sequence tracking has not yet marked processed (see
    /// [`crate::wal::Wal::next_unprocessed`]), so counters accumulate with
    /// plain `+=` rather than needing per-handler idempotency guards.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobQueued { host_alias, .. } => {
                self.hosts.entry(host_alias.to_string()).or_default();
            }
            Event::JobDispatched { host_alias, .. } => {
                let summary = self.hosts.entry(host_alias.to_string()).or_default();
                summary.jobs_dispatched += 1;
                self.total_jobs_dispatched += 1;
            }
            Event::JobFinished {
                host_alias,
                bytes_done,
                ..
            } => {
                let summary = self.hosts.entry(host_alias.to_string()).or_default();
                summary.jobs_finished += 1;
                self.total_jobs_finished += 1;
                self.total_bytes_transferred += bytes_done;
            }
            Event::HostError {
                host_alias,
                error_counter,
                ..
            } => {
                let summary = self.hosts.entry(host_alias.to_string()).or_default();
                summary.error_counter = *error_counter;
                summary.total_errors += 1;
            }
            Event::HostPaused { host_alias } => {
                self.hosts.entry(host_alias.to_string()).or_default().paused = true;
            }
            Event::HostResumed { host_alias } => {
                self.hosts.entry(host_alias.to_string()).or_default().paused = false;
            }
            Event::ArchiveStored { host_alias, .. } => {
                self.hosts.entry(host_alias.to_string()).or_default();
                self.total_archived += 1;
            }
            Event::ArchiveFull { .. } => {
                self.total_archive_full_events += 1;
            }
            Event::HostAutoToggled { .. }
            | Event::AppendRecorded { .. }
            | Event::AppendResolved { .. }
            | Event::MonConnectStatusChanged { .. }
            | Event::MonWorkerRestarted { .. }
            | Event::Custom => {}
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
