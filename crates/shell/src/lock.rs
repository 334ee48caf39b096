// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dot-notation and lockfile locking regimes a transfer worker honours
//! before a destination sees a file it hasn't finished writing yet (spec
//! §4.6 "Local worker specifics": "Honour dot-notation or lockfile locking
//! regimes (`.name` → rename, `LOCKFILE` sentinel create-then-delete)").

use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRegime {
    /// Write under a leading-dot name, then rename to the final name once
    /// the transfer completes.
    Dot,
    /// As `Dot`, but preserves a VMS-style `;<version>` suffix across the
    /// dot-prefixing so the version number survives the rename.
    DotVms,
    /// Write under the final name directly, guarded by a `LOCKFILE`
    /// sentinel created in the destination directory for the duration of
    /// the transfer.
    Lockfile,
}

/// Returns the name a file should be written under while its transfer is
/// in progress. For [`LockRegime::Lockfile`] this is just `filename`
/// itself — the guard is the sentinel file, not the name.
pub fn apply_lock_name(regime: LockRegime, filename: &str) -> String {
    match regime {
        LockRegime::Dot => format!(".{filename}"),
        LockRegime::DotVms => match filename.split_once(';') {
            Some((base, version)) => format!(".{base};{version}"),
            None => format!(".{filename}"),
        },
        LockRegime::Lockfile => filename.to_string(),
    }
}

/// Recovers the final (public) name from a name produced by
/// [`apply_lock_name`], i.e. what the post-transfer rename target is.
pub fn final_name(regime: LockRegime, locked_name: &str) -> String {
    match regime {
        LockRegime::Dot | LockRegime::DotVms => {
            locked_name.strip_prefix('.').unwrap_or(locked_name).to_string()
        }
        LockRegime::Lockfile => locked_name.to_string(),
    }
}

const LOCKFILE_NAME: &str = "LOCKFILE";

/// Creates the `LOCKFILE` sentinel in `dir`, signalling to any concurrent
/// reader that the directory's contents are mid-update. Tolerates the
/// sentinel already existing (a previous worker crashed without cleaning
/// up); the caller is responsible for deciding whether that is fatal.
pub fn create_lockfile(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    match std::fs::File::create(dir.join(LOCKFILE_NAME)) {
        Ok(_) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Removes the `LOCKFILE` sentinel from `dir`. A missing sentinel is not
/// an error — releasing an already-released lock is a no-op.
pub fn release_lockfile(dir: &Path) -> io::Result<()> {
    match std::fs::remove_file(dir.join(LOCKFILE_NAME)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

pub fn lockfile_present(dir: &Path) -> bool {
    dir.join(LOCKFILE_NAME).exists()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
