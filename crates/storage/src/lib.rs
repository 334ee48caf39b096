// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for the automatic file distributor daemon: the
//! fixed-slot arenas backing the FSA/MDB/QB/JID tables, and the ambient
//! event log (WAL + snapshot + checkpoint) used for the daemon's own
//! secondary bookkeeping and crash recovery.

pub mod arena;
mod checkpoint;
mod migration;
mod snapshot;
mod state;
mod wal;

pub use arena::{Arena, ArenaError, SlotGuard};
pub use checkpoint::{
    load_snapshot, CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter,
    Checkpointer, FsCheckpointWriter,
};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::{DaemonState, HostSummary};
pub use wal::{Wal, WalEntry, WalError};

/// Current snapshot schema version. Bumped whenever [`DaemonState`]'s
/// shape changes in a way [`MigrationRegistry`] needs to translate.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;
