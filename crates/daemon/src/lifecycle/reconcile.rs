// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wrapper around [`afd_engine::reconcile::Reconciler`] for the
//! periodic reconcile tick the main loop drives (spec §4.9).

use std::path::Path;

use afd_engine::reconcile::{ReconcileReport, Reconciler};
use afd_engine::tables::SharedTables;
use tracing::info;

/// Runs one reconciliation pass: the item-1 `files/<msg>`-vs-QB sweep,
/// the MDB-vs-current-message sweep, orphaned directory detection, and
/// idle host-counter reset.
#[allow(clippy::too_many_arguments)]
pub(crate) fn reconcile_once(
    tables: &SharedTables,
    messages_dir: &Path,
    files_dir: &Path,
    max_dirs_per_pass: usize,
    max_fd_dir_check: usize,
    max_idle_ms: u64,
    now_epoch_ms: u64,
    force_check: bool,
) -> std::io::Result<ReconcileReport> {
    let reconciler = Reconciler::new(max_dirs_per_pass, max_idle_ms).with_fd_dir_check(max_fd_dir_check);
    let report =
        reconciler.run_with_files(tables, messages_dir, Some(files_dir), now_epoch_ms, force_check)?;

    if !report.removed_jobs.is_empty()
        || !report.recreated_messages.is_empty()
        || !report.orphaned_dirs.is_empty()
        || !report.hosts_reset.is_empty()
        || !report.recovered_queue_entries.is_empty()
    {
        info!(
            removed = report.removed_jobs.len(),
            recreated = report.recreated_messages.len(),
            orphaned_dirs = report.orphaned_dirs.len(),
            hosts_reset = report.hosts_reset.len(),
            recovered_queue_entries = report.recovered_queue_entries.len(),
            "reconcile pass complete"
        );
    }

    Ok(report)
}
