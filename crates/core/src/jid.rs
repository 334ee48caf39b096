// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-id database (JID) and directory-name buffer (DNB): the shared
//! lookup tables that let a job-id be traced back to the directory it
//! watches and the recipients it fans out to (spec §3, §4.1).

use crate::host::HostAlias;
use crate::message::JobId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    #[derive(Default)]
    /// Stable alias for a watched local directory (the DNB key).
    pub struct DirAlias;
}

/// Directory-name buffer entry: one watched local directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnbEntry {
    pub alias: DirAlias,
    pub path: String,
    /// Number of job-ids currently fed by this directory.
    pub job_count: u32,
}

/// Job-id database entry: one recipient/option combination for a given
/// directory, uniquely identified by `job_id`.
///
/// `recipient_url` and `soptions` are the fields `recreate_msg` (spec
/// §4.9) concatenates to rebuild a job message file when the on-disk copy
/// has gone missing: `recipient_url` becomes the `[destination]` section,
/// `soptions` (already newline-joined) becomes the body of `[options]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JidEntry {
    pub job_id: JobId,
    pub dir_alias: DirAlias,
    pub host_alias: HostAlias,
    pub priority: u8,
    pub recipient_url: String,
    pub no_of_loptions: u32,
    pub no_of_soptions: u32,
    pub soptions: String,
}

/// In-memory index over the JID/DNB tables, built at startup from the
/// runbook and kept current by the reconciler (spec §4.9).
#[derive(Debug, Default)]
pub struct JidTable {
    dirs: HashMap<DirAlias, DnbEntry>,
    jobs: HashMap<JobId, JidEntry>,
}

impl JidTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_dir(&mut self, entry: DnbEntry) {
        self.dirs.insert(entry.alias.clone(), entry);
    }

    pub fn insert_job(&mut self, entry: JidEntry) {
        if let Some(dir) = self.dirs.get_mut(&entry.dir_alias) {
            dir.job_count += 1;
        }
        self.jobs.insert(entry.job_id, entry);
    }

    pub fn remove_job(&mut self, job_id: JobId) -> Option<JidEntry> {
        let removed = self.jobs.remove(&job_id)?;
        if let Some(dir) = self.dirs.get_mut(&removed.dir_alias) {
            dir.job_count = dir.job_count.saturating_sub(1);
        }
        Some(removed)
    }

    pub fn job(&self, job_id: JobId) -> Option<&JidEntry> {
        self.jobs.get(&job_id)
    }

    pub fn dir(&self, alias: &DirAlias) -> Option<&DnbEntry> {
        self.dirs.get(alias)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JidEntry> {
        self.jobs.values()
    }

    pub fn dirs(&self) -> impl Iterator<Item = &DnbEntry> {
        self.dirs.values()
    }

    /// Directories left with no referencing job-ids: candidates for
    /// unwatching (spec §4.9 item 2).
    pub fn orphaned_dirs(&self) -> impl Iterator<Item = &DnbEntry> {
        self.dirs.values().filter(|d| d.job_count == 0)
    }
}

impl JidEntry {
    /// Rebuilds a job message file's contents from this JID row, per
    /// `recreate_msg` (spec §4.9): `[destination]`/`recipient` followed by
    /// `[options]` with the stored secondary-options body.
    pub fn recreate_message(&self) -> String {
        let mut out = format!("[destination]\nrecipient {}\n", self.recipient_url);
        if !self.soptions.is_empty() {
            out.push_str("[options]\n");
            out.push_str(self.soptions.trim_end_matches('\n'));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
#[path = "jid_tests.rs"]
mod tests;
