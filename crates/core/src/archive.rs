// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive directory key derivation and numeric-bucket allocation.
//!
//! Path shape (spec §3, §4.7):
//! `<work>/archive/<host_alias>/<user|"none">/<dir_number>/<priority>_<bucket_time>_<job_id>`

use crate::message::JobId;
use std::path::PathBuf;

/// Identifies one archived-file destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveKey {
    pub host_alias: String,
    pub user: Option<String>,
    pub dir_number: u32,
    pub priority: u8,
    pub bucket_time: u64,
    pub job_id: JobId,
}

impl ArchiveKey {
    /// Bucket time rounds `now + archive_time` down to the nearest
    /// `step_time` boundary, so multiple files archived within the same
    /// window share a destination directory (spec §3).
    pub fn bucket_time(now_epoch_secs: u64, archive_time_secs: u64, step_time_secs: u64) -> u64 {
        if step_time_secs == 0 {
            return now_epoch_secs + archive_time_secs;
        }
        ((now_epoch_secs + archive_time_secs) / step_time_secs) * step_time_secs
    }

    pub fn relative_path(&self, work_dir: &std::path::Path) -> PathBuf {
        work_dir
            .join("archive")
            .join(&self.host_alias)
            .join(self.user.as_deref().unwrap_or("none"))
            .join(self.dir_number.to_string())
            .join(format!(
                "{}_{}_{}",
                self.priority, self.bucket_time, self.job_id
            ))
    }
}

/// Errors returned by bucket allocation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("archive is full: no numeric bucket has free link capacity")]
    ArchiveFull,
}

/// Picks the lowest-numbered bucket whose current subdirectory count
/// (`nlink - 2`, since every directory starts with `.` and `..`) is still
/// below `link_max - 2`; otherwise allocates the next bucket. Returns
/// [`ArchiveError::ArchiveFull`] once the newly allocated bucket number
/// itself would reach `link_max - 2` (spec §4.7 item 3, scenario S4).
///
/// `existing_counts` must be sorted ascending by bucket number and is
/// typically produced by scanning `<work>/archive/<host>/<user>/` for
/// numeric directory names.
pub fn allocate_bucket(existing_counts: &[(u32, u32)], link_max: u32) -> Result<u32, ArchiveError> {
    let capacity = link_max.saturating_sub(2);
    for &(bucket, count) in existing_counts {
        if count < capacity {
            return Ok(bucket);
        }
    }
    let next = existing_counts.iter().map(|(b, _)| *b).max().map_or(0, |m| m + 1);
    if next >= capacity {
        return Err(ArchiveError::ArchiveFull);
    }
    Ok(next)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
