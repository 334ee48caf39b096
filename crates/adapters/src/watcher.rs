// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory watcher giving the reconciler (spec §4.9) an event-driven
//! fast path alongside its periodic sweep: a file appearing under a
//! job's AMG input directory wakes the scan immediately instead of
//! waiting for the next poll tick.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// A filesystem change under a watched directory. Carries only the path
/// that changed; callers re-run [`crate::transfer`]'s own enumeration
/// rather than trust the watcher's notion of what's new, since events
/// can coalesce or be dropped under load (spec §4.9: the sweep remains
/// authoritative, this is only a wakeup signal).
#[derive(Debug, Clone)]
pub struct DirectoryEvent {
    pub path: PathBuf,
}

/// Starts watching `dir` non-recursively, returning a receiver that
/// yields a [`DirectoryEvent`] each time `notify` reports a change.
/// The returned watcher must be kept alive for as long as events are
/// wanted; dropping it stops the watch.
pub fn watch_directory(dir: &Path) -> Result<(RecommendedWatcher, mpsc::Receiver<DirectoryEvent>), WatchError> {
    let (tx, rx) = mpsc::channel(32);
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res {
            for path in event.paths {
                let _ = tx.blocking_send(DirectoryEvent { path });
            }
        }
    })
    .map_err(|source| WatchError::Setup {
        path: dir.to_path_buf(),
        source,
    })?;

    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Setup {
            path: dir.to_path_buf(),
            source,
        })?;

    Ok((watcher, rx))
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
