// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

pub mod arenas;
mod reconcile;
pub use reconcile::reconcile_once;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use afd_core::event::Event;
use afd_engine::tables::SharedTables;
use afd_storage::{
    load_snapshot, CheckpointError, Checkpointer, DaemonState, SnapshotError, Wal, WalError,
};

use crate::events::{self, EventBus, EventReader};
use crate::fifos;
use arenas::{Arenas, ArenasError};

/// On-disk layout, every path rooted under [`crate::env::work_dir`] (spec
/// §6 "all FD state lives under a single configurable work directory").
#[derive(Debug, Clone)]
pub struct Config {
    /// Root work directory.
    pub work_dir: PathBuf,
    /// Directory holding the control-plane fifos (spec §4.4).
    pub fifo_dir: PathBuf,
    /// Directory holding the FSA/MDB/QB/JID arenas and their indexes.
    pub arena_dir: PathBuf,
    /// Directory holding per-job message files.
    pub messages_dir: PathBuf,
    /// Directory holding per-job pending-file spools, `files/<msg>` and
    /// `files/error/<host>/<msg>` (spec §4.9 item 1, §6).
    pub files_dir: PathBuf,
    /// Directory holding the archive tree (spec §4.8).
    pub archive_dir: PathBuf,
    /// Exclusive lock / PID file: only one FD may run against a work dir.
    pub lock_path: PathBuf,
    /// Daemon log file.
    pub log_path: PathBuf,
    /// Ambient event-bus WAL file.
    pub wal_path: PathBuf,
    /// Ambient event-bus snapshot file.
    pub snapshot_path: PathBuf,
    /// Scheduler tick interval (spec §5 "bounded timeout"), default 1s.
    pub timer_check: Duration,
    /// Reconciler sweep interval (spec §4.9 `DIR_CHECK_TIME`), default 60s.
    pub dir_check: Duration,
    /// Administrative shutdown grace period (spec §5 `ABORT_TIMEOUT`),
    /// default 10s.
    pub abort_timeout: Duration,
    /// Host-error-backoff retry interval (spec §4.5), default 30s.
    pub retry_interval: Duration,
    /// Reconciler directory-sweep per-pass throttle (spec §4.9 item 1
    /// `MAX_FD_DIR_CHECK`), default 2048.
    pub max_fd_dir_check: usize,
}

impl Config {
    /// Loads configuration rooted at [`crate::env::work_dir`], applying
    /// any `AFD_*` overrides (spec §6).
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::at(crate::env::work_dir()?))
    }

    /// Builds the on-disk path layout rooted at an explicit `work_dir`,
    /// still honouring the `AFD_*` timing overrides. Used by `afd-ctl
    /// status` to read a running daemon's state without re-deriving
    /// [`crate::env::work_dir`]'s own resolution order.
    pub fn at(work_dir: PathBuf) -> Self {
        Self {
            fifo_dir: work_dir.join("fifodir"),
            arena_dir: work_dir.join("arenas"),
            messages_dir: work_dir.join("messages"),
            files_dir: work_dir.join("files"),
            archive_dir: work_dir.join("archive"),
            lock_path: work_dir.join("afd.pid"),
            log_path: work_dir.join("log").join("AFD_LOG"),
            wal_path: work_dir.join("wal").join("events.wal"),
            snapshot_path: work_dir.join("snapshot.json"),
            timer_check: crate::env::timer_check_ms().unwrap_or(Duration::from_secs(1)),
            dir_check: Duration::from_secs(crate::env::dir_check_secs().unwrap_or(60)),
            abort_timeout: crate::env::abort_timeout().unwrap_or(Duration::from_secs(10)),
            retry_interval: Duration::from_secs(crate::env::retry_interval_secs().unwrap_or(30)),
            max_fd_dir_check: crate::env::max_fd_dir_check().unwrap_or(2048),
            work_dir,
        }
    }
}

/// The running daemon: every table, arena, and durability handle a
/// started FD core holds for the lifetime of the process.
///
/// Named `Daemon` rather than `DaemonState` to keep it distinct from
/// [`afd_storage::DaemonState`], the ambient bookkeeping snapshot this
/// struct checkpoints through `event_bus`/`ambient_state` — the two are
/// related but not the same thing: one is the authoritative arena-backed
/// working set, the other is the secondary observability rollup spec §9
/// describes as "ambient, not authoritative".
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): held to maintain the exclusive work-dir lock; released on drop.
    #[allow(dead_code)]
    lock_file: File,
    /// FSA/MDB/QB/JID working set, loaded from `arenas` at startup.
    pub tables: Arc<SharedTables>,
    /// On-disk arena handles `tables` is periodically flushed back into.
    pub arenas: Arc<Arenas>,
    /// Ambient rollup counters (spec §9), fed by every [`Event`].
    pub ambient_state: Arc<Mutex<DaemonState>>,
    /// Durable event bus; every state transition is announced here before
    /// the ambient rollup and on-disk arenas are updated.
    pub event_bus: EventBus,
    /// Shared handle onto the same WAL `event_bus` writes, used to read
    /// `processed_seq` for checkpointing without needing the reader side.
    wal: Arc<Mutex<Wal>>,
    pub start_time: Instant,
}

/// Everything [`startup`] hands back to `main`.
pub struct StartupResult {
    pub daemon: Daemon,
    /// Read handle for the main loop to drain into `ambient_state`.
    pub event_reader: EventReader,
}

impl Daemon {
    /// Applies `event` to the ambient rollup and appends it to the
    /// durable event bus. Callers that also need the event reflected in
    /// `tables` (the authoritative working set) must do so themselves —
    /// this only drives the secondary bookkeeping layer.
    pub fn process_event(&self, event: Event) -> Result<(), LifecycleError> {
        self.ambient_state.lock().apply_event(&event);
        self.event_bus.send(event)?;
        Ok(())
    }

    /// Persists the working set back to its arenas and checkpoints the
    /// ambient rollup, synchronously. Used on graceful shutdown and from
    /// the periodic checkpoint tick.
    pub fn checkpoint_sync(&self) -> Result<(), LifecycleError> {
        self.arenas.persist_from(&self.tables)?;

        let processed_seq = self.wal.lock().processed_seq();
        let state_clone = self.ambient_state.lock().clone();
        let checkpointer = Checkpointer::new(self.config.snapshot_path.clone());
        let result = checkpointer.checkpoint_sync(processed_seq, &state_clone)?;
        info!(
            seq = result.seq,
            size_bytes = result.size_bytes,
            "saved ambient-state snapshot"
        );
        Ok(())
    }

    /// Shuts the daemon down gracefully: flushes the WAL, checkpoints,
    /// persists the arenas, and removes the lock file. The lock itself is
    /// released when `lock_file` drops.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("shutting down");

        if let Err(e) = self.event_bus.flush() {
            warn!("failed to flush event bus on shutdown: {}", e);
        }

        if let Err(e) = self.checkpoint_sync() {
            warn!("failed to checkpoint on shutdown: {}", e);
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("failed to remove lock file: {}", e);
            }
        }

        info!("shutdown complete");
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine work directory")]
    NoWorkDir,

    #[error("failed to acquire work-dir lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("arena error: {0}")]
    Arenas(#[from] ArenasError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Starts the daemon: acquires the work-dir lock, ensures the
/// control-plane fifos exist, loads the FSA/MDB/QB/JID arenas into
/// memory, and replays the ambient event WAL.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if another daemon already holds the lock —
            // those files belong to it, not to this failed attempt.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.work_dir)?;
    std::fs::create_dir_all(&config.messages_dir)?;
    std::fs::create_dir_all(&config.files_dir)?;
    std::fs::create_dir_all(&config.archive_dir)?;
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Acquire the lock before touching anything else in the work dir, to
    // avoid a second instance racing this one during setup. Opened
    // without truncating so a concurrent holder's PID survives the open.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    fifos::ensure_all(&config.fifo_dir)?;

    let arenas = Arc::new(Arenas::open(&config.arena_dir)?);
    let tables = Arc::new(SharedTables::new());
    arenas.load_into(&tables)?;

    let (ambient_state, processed_seq) = match load_snapshot(&config.snapshot_path)? {
        Some(snapshot) => {
            info!(
                seq = snapshot.seq,
                hosts = snapshot.state.hosts.len(),
                "loaded ambient-state snapshot"
            );
            (snapshot.state, snapshot.seq)
        }
        None => {
            info!("no ambient-state snapshot found, starting empty");
            (DaemonState::default(), 0)
        }
    };
    let ambient_state = Arc::new(Mutex::new(ambient_state));

    let (event_bus, event_reader) = events::open(&config.wal_path, processed_seq)?;
    let wal = event_reader.wal();
    {
        let entries = wal.lock().entries_after(processed_seq)?;
        let mut state = ambient_state.lock();
        let replay_count = entries.len();
        for entry in entries {
            state.apply_event(&entry.event);
        }
        if replay_count > 0 {
            info!(replay_count, processed_seq, "replayed ambient events from WAL");
        }
    }

    info!(
        hosts = tables.host_aliases().len(),
        mdb = tables.mdb_entries().len(),
        queue = tables.queue_entries().len(),
        "recovered working set from arenas"
    );

    Ok(StartupResult {
        daemon: Daemon {
            config: config.clone(),
            lock_file,
            tables,
            arenas,
            ambient_state,
            event_bus,
            wal,
            start_time: Instant::now(),
        },
        event_reader,
    })
}

fn cleanup_on_failure(config: &Config) {
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "../lifecycle_tests/mod.rs"]
mod tests;
