// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append/restart log file IO (spec §4.8): the locked, read-modify-write
//! wrapper around a job message file that `afd-runbook::{log_append,
//! remove_append, remove_all_appends}` only transform as text. Grounded
//! on the same advisory-lock-then-atomic-rewrite discipline
//! `afd-storage::arena`'s `SlotGuard` uses for arena slots, scaled down
//! to a single whole-file lock since a job message file is read and
//! rewritten in full rather than by byte range.

use afd_runbook::MessageError;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppendError {
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error("io error editing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One of the three restart-list mutations spec §4.8 performs against a
/// job message file in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOp {
    /// `log_append`: a file's transfer was interrupted; record it so a
    /// retry resumes rather than restarts from scratch.
    Record,
    /// `remove_append`: one filename finished (or was abandoned) and no
    /// longer needs tracking.
    Resolve,
    /// `remove_all_appends`: drop the whole restart option, e.g. once
    /// the job itself completes.
    ResolveAll,
}

/// Applies `op` to the job message file at `path` under an exclusive
/// file lock: read, transform, truncate-and-rewrite, unlock on return.
/// `filename` is ignored for [`AppendOp::ResolveAll`].
pub fn apply_append_op(path: &Path, op: AppendOp, filename: &str) -> Result<(), AppendError> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| AppendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    file.lock_exclusive().map_err(|source| AppendError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let result = (|| -> Result<(), AppendError> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|source| AppendError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let rewritten = match op {
            AppendOp::Record => afd_runbook::log_append(&contents, filename)?,
            AppendOp::Resolve => afd_runbook::remove_append(&contents, filename)?,
            AppendOp::ResolveAll => afd_runbook::remove_all_appends(&contents)?,
        };

        file.set_len(0).map_err(|source| AppendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        file.seek(SeekFrom::Start(0))
            .map_err(|source| AppendError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        file.write_all(rewritten.as_bytes())
            .map_err(|source| AppendError::Io {
                path: path.to_path_buf(),
                source,
            })
    })();

    let _ = fs2::FileExt::unlock(&file);
    result
}

/// Engine-facing handle bundling the job message directory root so
/// callers don't re-derive the message path for every restart-list
/// mutation.
pub struct AppendEngine {
    pub afd_dir: PathBuf,
}

impl AppendEngine {
    pub fn new(afd_dir: PathBuf) -> Self {
        Self { afd_dir }
    }

    pub fn message_path(&self, job_id: u32) -> PathBuf {
        self.afd_dir.join("messages").join(job_id.to_string())
    }

    pub fn record(&self, job_id: u32, filename: &str) -> Result<(), AppendError> {
        apply_append_op(&self.message_path(job_id), AppendOp::Record, filename)
    }

    pub fn resolve(&self, job_id: u32, filename: &str) -> Result<(), AppendError> {
        apply_append_op(&self.message_path(job_id), AppendOp::Resolve, filename)
    }

    pub fn resolve_all(&self, job_id: u32) -> Result<(), AppendError> {
        apply_append_op(&self.message_path(job_id), AppendOp::ResolveAll, "")
    }
}

#[cfg(test)]
#[path = "append_tests.rs"]
mod tests;
