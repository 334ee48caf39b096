// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive engine (spec §4.7): materializes the numeric-bucket directory
//! layout `afd_core::archive` derives keys for, moving a transferred file
//! into it with the same prefer-hardlink-over-copy discipline the local
//! transfer worker uses (spec §4.6 "Local worker specifics").
//!
//! Bucket selection itself (`allocate_bucket`) is pure and lives in
//! `afd-core`; this module's job is turning that decision into real
//! directories on disk, the way `afd-storage`'s checkpoint writer turns a
//! `Snapshot` into a durable file (create-then-rename, never partial
//! writes visible to a reader).

use afd_core::archive::{allocate_bucket, ArchiveError, ArchiveKey};
use afd_core::message::JobId;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveFileError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("io error archiving to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Scans `<work>/archive/<host>/<user>/` for numeric bucket
/// subdirectories, returning `(bucket, link_count)` pairs sorted
/// ascending by bucket number. `link_count` approximates the number of
/// job subdirectories already filed under that bucket as `nlink - 2`
/// (every directory starts with `.` and `..`), matching what
/// `allocate_bucket` expects (spec §4.7 item 3).
fn scan_bucket_counts(user_dir: &Path) -> std::io::Result<Vec<(u32, u32)>> {
    let mut counts = match std::fs::read_dir(user_dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    }
    .filter_map(|entry| entry.ok())
    .filter_map(|entry| {
        let name = entry.file_name();
        let bucket: u32 = name.to_string_lossy().parse().ok()?;
        let meta = entry.metadata().ok()?;
        if !meta.is_dir() {
            return None;
        }
        Some((bucket, meta.nlink().saturating_sub(2) as u32))
    })
    .collect::<Vec<_>>();
    counts.sort_by_key(|(bucket, _)| *bucket);
    Ok(counts)
}

/// Directory materialization for the archive engine: owns the work
/// directory root and the configured `link_max` (the filesystem's
/// per-directory hardlink ceiling) once per host, so repeated calls to
/// `archive_file` don't need it threaded through every call.
pub struct ArchiveEngine {
    work_dir: PathBuf,
    link_max: u32,
}

impl ArchiveEngine {
    pub fn new(work_dir: PathBuf, link_max: u32) -> Self {
        Self { work_dir, link_max }
    }

    /// Archives `src` under the host/user/priority bucket derived from
    /// `host_alias`/`user`/`priority`/`job_id`, returning the path the
    /// file now lives at.
    pub fn archive_file(
        &self,
        host_alias: &str,
        user: Option<&str>,
        priority: u8,
        job_id: JobId,
        src: &Path,
        now_epoch_secs: u64,
        archive_time_secs: u64,
        step_time_secs: u64,
    ) -> Result<PathBuf, ArchiveFileError> {
        archive_file(
            &self.work_dir,
            self.link_max,
            host_alias,
            user,
            priority,
            job_id,
            src,
            now_epoch_secs,
            archive_time_secs,
            step_time_secs,
        )
    }
}

/// Free-function form of [`ArchiveEngine::archive_file`], for callers
/// that don't want to hold a long-lived engine around the work
/// directory.
#[allow(clippy::too_many_arguments)]
pub fn archive_file(
    work_dir: &Path,
    link_max: u32,
    host_alias: &str,
    user: Option<&str>,
    priority: u8,
    job_id: JobId,
    src: &Path,
    now_epoch_secs: u64,
    archive_time_secs: u64,
    step_time_secs: u64,
) -> Result<PathBuf, ArchiveFileError> {
    let user_dir = work_dir
        .join("archive")
        .join(host_alias)
        .join(user.unwrap_or("none"));

    let existing = scan_bucket_counts(&user_dir).map_err(|source| ArchiveFileError::Io {
        path: user_dir.clone(),
        source,
    })?;
    let dir_number = allocate_bucket(&existing, link_max)?;

    let key = ArchiveKey {
        host_alias: host_alias.to_string(),
        user: user.map(str::to_string),
        dir_number,
        priority,
        bucket_time: ArchiveKey::bucket_time(now_epoch_secs, archive_time_secs, step_time_secs),
        job_id,
    };
    let dest_dir = key.relative_path(work_dir);
    std::fs::create_dir_all(&dest_dir).map_err(|source| ArchiveFileError::Io {
        path: dest_dir.clone(),
        source,
    })?;

    let file_name = src.file_name().unwrap_or_default();
    let dest = dest_dir.join(file_name);
    afd_shell::link_or_copy(src, &dest).map_err(|source| ArchiveFileError::Io {
        path: dest.clone(),
        source,
    })?;

    Ok(dest)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
