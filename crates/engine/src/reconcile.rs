// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciler (spec §4.9): the three periodic background sweeps that
//! repair drift between the FD's own tables and the outside world —
//! directories no longer referenced by any job-id, MDB entries for jobs
//! the AMG no longer lists, and per-host aggregate counters left stale
//! by a crashed worker.
//!
//! The AMG itself is out of scope (spec §1, "external collaborators");
//! [`CurrentMessageSource`] is the seam that stands in for "what does
//! the AMG currently say is queued", following the same
//! inject-the-external-dependency pattern `afd-adapters::transfer::map`
//! uses for the MAP SDK. [`FilesystemMessageSource`] is the real
//! implementation, since the directories the AMG announces jobs through
//! are themselves on local disk and in scope.

use crate::tables::SharedTables;
use afd_core::host::HostAlias;
use afd_core::jid::DirAlias;
use afd_core::message::JobId;
use afd_core::queue::QueueEntry;
use afd_runbook::{msg_number, MessageName};
use afd_shell::enumerate_files;
use std::collections::HashSet;
use std::path::Path;

/// Abstraction over "which job-ids does the AMG currently list as
/// having pending work", read from the message directory it writes
/// into. A job-id present in the MDB but absent here (and idle past the
/// age limit) is a removal candidate (spec §4.2, §4.9 item 2).
pub trait CurrentMessageSource: Send + Sync {
    fn current_job_ids(&self, messages_dir: &Path) -> std::io::Result<HashSet<JobId>>;
}

/// Reads the message directory's entries directly: one file per
/// currently-queued job-id, named after the job-id itself.
pub struct FilesystemMessageSource;

impl CurrentMessageSource for FilesystemMessageSource {
    fn current_job_ids(&self, messages_dir: &Path) -> std::io::Result<HashSet<JobId>> {
        let read_dir = match std::fs::read_dir(messages_dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e),
        };
        let mut ids = HashSet::new();
        for entry in read_dir {
            let entry = entry?;
            if let Ok(id) = entry.file_name().to_string_lossy().parse::<u32>() {
                ids.insert(JobId::new(id));
            }
        }
        Ok(ids)
    }
}

/// What one reconciler pass did, for logging/events.
#[derive(Debug, Default, Clone)]
pub struct ReconcileReport {
    pub removed_jobs: Vec<JobId>,
    pub recreated_messages: Vec<JobId>,
    pub orphaned_dirs: Vec<DirAlias>,
    pub hosts_reset: Vec<HostAlias>,
    /// Job-ids recovered by the item-1 filesystem sweep: a `files/<msg>`
    /// or `files/error/<host>/<msg>` directory whose name parsed as a
    /// valid message name but had no QB entry (spec §4.9 item 1).
    pub recovered_queue_entries: Vec<JobId>,
}

/// Runs the three sweeps against a shared table set. `max_dirs_per_pass`
/// bounds how many watched directories get checked for orphan status in
/// one call, at the cost of orphaned directories only being caught over
/// several passes rather than immediately. `max_fd_dir_check` is the
/// unrelated `MAX_FD_DIR_CHECK` throttle (spec §4.9 item 1): the entry
/// count above which a single `files/<msg>`-shaped directory is skipped
/// for one pass rather than scanned.
pub struct Reconciler<S: CurrentMessageSource = FilesystemMessageSource> {
    source: S,
    max_dirs_per_pass: usize,
    max_idle_ms: u64,
    max_fd_dir_check: usize,
}

impl Reconciler<FilesystemMessageSource> {
    pub fn new(max_dirs_per_pass: usize, max_idle_ms: u64) -> Self {
        Self {
            source: FilesystemMessageSource,
            max_dirs_per_pass,
            max_idle_ms,
            max_fd_dir_check: 2048,
        }
    }

}

impl<S: CurrentMessageSource> Reconciler<S> {
    pub fn with_source(source: S, max_dirs_per_pass: usize, max_idle_ms: u64) -> Self {
        Self {
            source,
            max_dirs_per_pass,
            max_idle_ms,
            max_fd_dir_check: 2048,
        }
    }

    pub fn with_fd_dir_check(mut self, max_fd_dir_check: usize) -> Self {
        self.max_fd_dir_check = max_fd_dir_check;
        self
    }

    pub fn run(
        &self,
        tables: &SharedTables,
        messages_dir: &Path,
        now_epoch_ms: u64,
    ) -> std::io::Result<ReconcileReport> {
        self.run_with_files(tables, messages_dir, None, now_epoch_ms, false)
    }

    /// Like [`Self::run`], but also drives the item-1 filesystem sweep
    /// over `files_dir` when one is given. `force_check` overrides the
    /// `MAX_FD_DIR_CHECK` per-directory throttle for this pass (spec
    /// §4.9 item 1, "on reconfiguration").
    pub fn run_with_files(
        &self,
        tables: &SharedTables,
        messages_dir: &Path,
        files_dir: Option<&Path>,
        now_epoch_ms: u64,
        force_check: bool,
    ) -> std::io::Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        // Item 1: directories under `files/` vs. QB.
        if let Some(files_dir) = files_dir {
            self.scan_job_dirs(tables, files_dir, force_check, &mut report)?;
            let error_root = files_dir.join("error");
            if let Ok(host_dirs) = std::fs::read_dir(&error_root) {
                for host_dir in host_dirs.flatten() {
                    if host_dir.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                        self.scan_job_dirs(tables, &host_dir.path(), force_check, &mut report)?;
                    }
                }
            }
        }

        let current = self.source.current_job_ids(messages_dir)?;

        // Item 2: MDB vs. AMG's current-message list.
        for mut entry in tables.mdb_entries() {
            entry.in_current_fsa = current.contains(&entry.job_id);
            let eligible = entry.eligible_for_removal(now_epoch_ms, self.max_idle_ms);
            tables.with_mdb(entry.job_id, |e| e.in_current_fsa = entry.in_current_fsa);

            if eligible {
                tables.remove_mdb(entry.job_id);
                tables.remove_queue_entry(entry.job_id);
                tables.with_jid(|jid| jid.remove_job(entry.job_id));
                report.removed_jobs.push(entry.job_id);
            } else if !entry.in_current_fsa {
                // Still tracked but its message file vanished: recreate it
                // from the JID row so a subsequent AMG-side rescan can
                // still find it (spec §4.9 `recreate_msg`).
                let recreated = tables.with_jid(|jid| {
                    jid.job(entry.job_id).map(|j| j.recreate_message())
                });
                if let Some(contents) = recreated {
                    let path = messages_dir.join(entry.job_id.0.to_string());
                    if std::fs::write(&path, contents).is_ok() {
                        report.recreated_messages.push(entry.job_id);
                    }
                }
            }
        }

        // DNB compaction follow-up: directories with no referencing
        // job-ids left get unwatched, throttled to max_dirs_per_pass.
        let orphaned: Vec<DirAlias> = tables.with_jid(|jid| {
            jid.orphaned_dirs()
                .take(self.max_dirs_per_pass)
                .map(|d| d.alias.clone())
                .collect()
        });
        report.orphaned_dirs = orphaned;

        // Item 3: per-host aggregate recomputation.
        for alias in tables.host_aliases() {
            if !tables.has_queued_for_host(&alias) {
                let reset = tables
                    .with_host(&alias, |h| {
                        let was_nonzero = h.active_transfers != 0 || h.total_file_counter != 0;
                        h.reset_counters_if_idle(false);
                        was_nonzero
                    })
                    .unwrap_or(false);
                if reset {
                    report.hosts_reset.push(alias);
                }
            }
        }

        tracing::debug!(
            removed = report.removed_jobs.len(),
            recreated = report.recreated_messages.len(),
            orphaned_dirs = report.orphaned_dirs.len(),
            hosts_reset = report.hosts_reset.len(),
            recovered_queue_entries = report.recovered_queue_entries.len(),
            "reconcile pass complete"
        );
        Ok(report)
    }

    /// Item 1: scans one directory's immediate children (either `files/`
    /// itself or one `files/error/<host>/` subdirectory) for job-name-shaped
    /// entries with no QB row, inserting a pending entry for each. Skips
    /// the whole directory once it holds `>= max_fd_dir_check` entries
    /// unless `force_check` — the source behaviour is "skip this sweep",
    /// not "skip permanently", so a later pass still picks it up.
    fn scan_job_dirs(
        &self,
        tables: &SharedTables,
        dir: &Path,
        force_check: bool,
        report: &mut ReconcileReport,
    ) -> std::io::Result<()> {
        let read_dir = match std::fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        let entries: Vec<_> = read_dir.collect::<Result<_, _>>()?;
        if entries.len() >= self.max_fd_dir_check && !force_check {
            return Ok(());
        }

        for entry in entries {
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == "error" {
                continue;
            }
            let Ok(parsed) = MessageName::parse(&name) else {
                continue;
            };
            if tables.has_queue_entry(parsed.job_id) {
                continue;
            }
            let files = enumerate_files(&entry.path())?;
            let files_to_send = files.len() as u32;
            let file_size_to_send = files.iter().map(|f| f.size).sum();
            tables.insert_queue_entry(QueueEntry::new_pending(
                parsed.job_id,
                msg_number(parsed.priority, parsed.creation_time, parsed.unique),
                files_to_send,
                file_size_to_send,
            ));
            report.recovered_queue_entries.push(parsed.job_id);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
