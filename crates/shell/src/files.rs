// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-file enumeration and the local worker's link-or-copy move
//! (spec §4.6 step 2, "Local worker specifics").

use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One file found in a job's spool directory, ready for transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub size: u64,
    pub mtime_epoch_secs: u64,
}

fn epoch_secs(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Lists the regular files directly under `dir`, sorted by mtime ascending
/// (spec §4.6 step 2: "Enumerate files … sorted by mtime"). Subdirectories
/// are ignored; a missing directory yields an empty list rather than an
/// error, since a job whose spool directory has already been cleaned up
/// is simply done.
pub fn enumerate_files(dir: &Path) -> io::Result<Vec<PendingFile>> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        files.push(PendingFile {
            path: entry.path(),
            size: metadata.len(),
            mtime_epoch_secs: epoch_secs(metadata.modified()?),
        });
    }
    files.sort_by_key(|f| f.mtime_epoch_secs);
    Ok(files)
}

/// Whether `file` has exceeded its job's age-limit as of `now`
/// (spec §4.6 step 2, scenario S2).
pub fn is_expired(file: &PendingFile, age_limit_secs: u64, now_epoch_secs: u64) -> bool {
    now_epoch_secs.saturating_sub(file.mtime_epoch_secs) > age_limit_secs
}

/// Moves `src` to `dst`, preferring a hardlink when both paths share a
/// device (no data copy, atomic w.r.t. readers of `src`'s old name) and
/// falling back to a full copy-then-remove when they don't (spec §4.6
/// "Local worker specifics: prefer `link` over copy when source and
/// destination share a device; fall back to full copy otherwise").
pub fn link_or_copy(src: &Path, dst: &Path) -> io::Result<()> {
    let dst_dir = dst.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dst_dir)?;

    let same_device = match (src.parent(), dst_dir.metadata()) {
        (Some(src_dir), Ok(dst_meta)) => src_dir
            .metadata()
            .map(|src_meta| src_meta.dev() == dst_meta.dev())
            .unwrap_or(false),
        _ => false,
    };

    if same_device {
        std::fs::hard_link(src, dst)?;
    } else {
        std::fs::copy(src, dst)?;
    }
    std::fs::remove_file(src)
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
