// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message cache (MDB) entry: job-id to destination metadata.

use crate::host::HostAlias;
use serde::{Deserialize, Serialize};

/// Job identifier. Unlike the string-based ids elsewhere in the workspace,
/// job-ids are a dense unsigned integer keyspace shared with the JID/QB/MDB
/// arenas (spec §3), so it wraps `u32` directly rather than using
/// `define_id!`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u32);

impl JobId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire protocol scheme tag, used to select the transfer task
/// implementation (spec §4.6, §9).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Ftp,
    Smtp,
    Loc,
    Wmo,
    Map,
}

impl Scheme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ftp" => Some(Scheme::Ftp),
            "smtp" | "mailto" => Some(Scheme::Smtp),
            "file" | "loc" => Some(Scheme::Loc),
            "wmo" => Some(Scheme::Wmo),
            "map" => Some(Scheme::Map),
            _ => None,
        }
    }

    pub fn supports_burst(self) -> bool {
        matches!(self, Scheme::Ftp | Scheme::Wmo)
    }

    pub fn supports_append(self) -> bool {
        matches!(self, Scheme::Ftp | Scheme::Wmo | Scheme::Loc)
    }
}

/// Message cache (MDB) entry.
///
/// Lifecycle: created when the FD first sees a job-id; updated when the
/// underlying message file changes; deleted when the job disappears from
/// the AMG's current-message list *and* has not been transferred recently
/// (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MdbEntry {
    pub job_id: JobId,
    pub host_alias: HostAlias,
    /// Position of the host's entry in the FSA array, cached to avoid a
    /// lookup by alias on every dispatch.
    pub fsa_pos: usize,
    pub scheme: Scheme,
    pub age_limit_secs: Option<u64>,
    pub message_mtime_epoch_ms: u64,
    pub last_transfer_time_epoch_ms: Option<u64>,
    /// Set during reconciliation: true while this job-id still appears in
    /// the AMG's current-message list.
    pub in_current_fsa: bool,
}

impl MdbEntry {
    /// Whether this entry is eligible for deletion per spec §4.2/§4.9:
    /// gone from the current-message list and not transferred recently.
    pub fn eligible_for_removal(&self, now_epoch_ms: u64, max_idle_ms: u64) -> bool {
        if self.in_current_fsa {
            return false;
        }
        match self.last_transfer_time_epoch_ms {
            Some(t) => now_epoch_ms.saturating_sub(t) > max_idle_ms,
            None => now_epoch_ms.saturating_sub(self.message_mtime_epoch_ms) > max_idle_ms,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
