// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ambient event bus: the durable, group-committed path every [`Event`]
//! producer (dispatch, completion, reconcile) writes through on its way
//! to `afd-storage`'s WAL, and the single reader the main loop drains to
//! replay them into `afd_storage::DaemonState` (spec §9 "ambient
//! observability layer, secondary to the authoritative arena state").
//!
//! `EventBus`/`EventReader` are two handles onto the same
//! `Mutex`-guarded [`Wal`]: producers only ever append and ask
//! `needs_flush`, the reader is the sole caller of `next_unprocessed`/
//! `mark_processed`. Splitting the handle this way (rather than hiding
//! the WAL behind an mpsc channel) keeps `send` synchronous and cheap
//! for call sites that aren't already `async`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use afd_core::event::Event;
use afd_storage::{Wal, WalEntry, WalError};
use parking_lot::Mutex;

/// How long the reader sleeps between polls of an empty WAL. Group
/// commit already batches writes on ~10ms boundaries; polling faster
/// than that buys nothing.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Write handle: cheap to clone, safe to hold from any task or closure
/// that needs to emit an event.
#[derive(Clone)]
pub struct EventBus {
    wal: Arc<Mutex<Wal>>,
    closed: Arc<AtomicBool>,
}

impl EventBus {
    pub fn send(&self, event: Event) -> Result<u64, WalError> {
        self.wal.lock().append(&event)
    }

    pub fn needs_flush(&self) -> bool {
        self.wal.lock().needs_flush()
    }

    pub fn flush(&self) -> Result<(), WalError> {
        self.wal.lock().flush()
    }

    /// Signals the reader side that no further events will be sent,
    /// unblocking its `recv` loop for a clean shutdown.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Read handle: the main loop's sole path for draining the WAL in
/// sequence order and driving it into `DaemonState::apply_event`.
pub struct EventReader {
    wal: Arc<Mutex<Wal>>,
    closed: Arc<AtomicBool>,
}

impl EventReader {
    /// Shares the underlying WAL with the checkpoint task, which needs
    /// it to read `processed_seq()` and call `truncate_before`.
    pub fn wal(&self) -> Arc<Mutex<Wal>> {
        Arc::clone(&self.wal)
    }

    /// Waits for the next unprocessed WAL entry, polling at
    /// [`POLL_INTERVAL`]. Returns `Ok(None)` once the bus has been
    /// closed and no entry remains.
    pub async fn recv(&mut self) -> Result<Option<WalEntry>, WalError> {
        loop {
            if let Some(entry) = self.wal.lock().next_unprocessed()? {
                return Ok(Some(entry));
            }
            if self.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.wal.lock().mark_processed(seq);
    }
}

/// Opens (or creates) the WAL at `path` and returns its paired
/// read/write handles. `processed_seq` should come from the last
/// snapshot, or 0 on first startup.
pub fn open(path: &std::path::Path, processed_seq: u64) -> Result<(EventBus, EventReader), WalError> {
    let wal = Arc::new(Mutex::new(Wal::open(path, processed_seq)?));
    let closed = Arc::new(AtomicBool::new(false));
    Ok((
        EventBus {
            wal: Arc::clone(&wal),
            closed: Arc::clone(&closed),
        },
        EventReader { wal, closed },
    ))
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
