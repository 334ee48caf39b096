// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory, lock-guarded view over the FSA/MDB/QB/JID tables (spec §3,
//! §4.1).
//!
//! `afd-storage`'s `Arena<T>` is the on-disk persistence mechanism for
//! these tables (byte-range-locked fixed slots, survivable across a
//! restart); it round-trips every read/write through JSON, which is fine
//! for startup load and periodic checkpointing but too slow to call on
//! every scheduler tick or slot update. `SharedTables` is the hot-path
//! cache sitting in front of it: the daemon binary loads it from the
//! arenas at startup and is responsible for flushing dirty entries back
//! out, the same way the daemon's lifecycle module treats `DaemonState`
//! as an in-memory aggregate fed by, but not identical to, the WAL it
//! persists to (`afd-storage::state`).
//!
//! Each table is guarded by its own `parking_lot::Mutex` rather than one
//! mutex over the whole struct, so a scheduler pass over one host doesn't
//! block a worker updating an unrelated queue entry.

use afd_core::fra::FraEntry;
use afd_core::host::{Host, HostAlias, HostError};
use afd_core::jid::{DirAlias, JidTable};
use afd_core::message::{JobId, MdbEntry};
use afd_core::queue::QueueEntry;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Shared state handed to the scheduler, worker tasks, archive engine,
/// append engine, and reconciler. Cheap to clone (an `Arc` wrapper is the
/// caller's concern); the tables themselves are the shared resource.
#[derive(Default)]
pub struct SharedTables {
    hosts: Mutex<HashMap<HostAlias, Host>>,
    mdb: Mutex<HashMap<JobId, MdbEntry>>,
    queue: Mutex<HashMap<JobId, QueueEntry>>,
    jid: Mutex<JidTable>,
    fra: Mutex<HashMap<DirAlias, FraEntry>>,
}

impl SharedTables {
    pub fn new() -> Self {
        Self::default()
    }

    // -- hosts (FSA) --

    pub fn insert_host(&self, host: Host) {
        self.hosts.lock().insert(host.alias.clone(), host);
    }

    pub fn host_aliases(&self) -> Vec<HostAlias> {
        self.hosts.lock().keys().cloned().collect()
    }

    pub fn host_snapshot(&self, alias: &HostAlias) -> Option<Host> {
        self.hosts.lock().get(alias).cloned()
    }

    /// Runs `f` against the host under lock, returning its result. `None`
    /// if no host is registered under `alias`.
    pub fn with_host<R>(&self, alias: &HostAlias, f: impl FnOnce(&mut Host) -> R) -> Option<R> {
        self.hosts.lock().get_mut(alias).map(f)
    }

    pub fn with_host_or_err<R>(
        &self,
        alias: &HostAlias,
        f: impl FnOnce(&mut Host) -> Result<R, HostError>,
    ) -> Result<R, HostError> {
        let mut hosts = self.hosts.lock();
        let host = hosts
            .get_mut(alias)
            .ok_or_else(|| HostError::NoFreeSlot(alias.to_string()))?;
        f(host)
    }

    // -- message cache (MDB) --

    pub fn insert_mdb(&self, entry: MdbEntry) {
        self.mdb.lock().insert(entry.job_id, entry);
    }

    pub fn mdb_entry(&self, job_id: JobId) -> Option<MdbEntry> {
        self.mdb.lock().get(&job_id).cloned()
    }

    pub fn remove_mdb(&self, job_id: JobId) -> Option<MdbEntry> {
        self.mdb.lock().remove(&job_id)
    }

    pub fn mdb_entries(&self) -> Vec<MdbEntry> {
        self.mdb.lock().values().cloned().collect()
    }

    pub fn with_mdb<R>(&self, job_id: JobId, f: impl FnOnce(&mut MdbEntry) -> R) -> Option<R> {
        self.mdb.lock().get_mut(&job_id).map(f)
    }

    // -- queue (QB) --

    pub fn insert_queue_entry(&self, entry: QueueEntry) {
        self.queue.lock().insert(entry.job_id, entry);
    }

    pub fn remove_queue_entry(&self, job_id: JobId) -> Option<QueueEntry> {
        self.queue.lock().remove(&job_id)
    }

    pub fn with_queue_entry<R>(&self, job_id: JobId, f: impl FnOnce(&mut QueueEntry) -> R) -> Option<R> {
        self.queue.lock().get_mut(&job_id).map(f)
    }

    /// Whether `job_id` already has a QB entry, used by the reconciler's
    /// filesystem sweep (spec §4.9 item 1) to avoid inserting duplicates
    /// for directories it's already tracking.
    pub fn has_queue_entry(&self, job_id: JobId) -> bool {
        self.queue.lock().contains_key(&job_id)
    }

    /// Every queue entry currently held, regardless of host. Used by the
    /// daemon's checkpoint writer to persist the whole table back to its
    /// arena without needing a per-host scan.
    pub fn queue_entries(&self) -> Vec<QueueEntry> {
        self.queue.lock().values().cloned().collect()
    }

    /// All queue entries currently targeting `host_alias`, via the MDB
    /// host lookup (no direct host field on `QueueEntry` itself).
    pub fn queue_entries_for_host(&self, host_alias: &HostAlias) -> Vec<QueueEntry> {
        let mdb = self.mdb.lock();
        let queue = self.queue.lock();
        queue
            .values()
            .filter(|q| {
                mdb.get(&q.job_id)
                    .map(|m| &m.host_alias == host_alias)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    pub fn has_queued_for_host(&self, host_alias: &HostAlias) -> bool {
        let mdb = self.mdb.lock();
        let queue = self.queue.lock();
        queue.values().any(|q| {
            !q.is_removed()
                && mdb
                    .get(&q.job_id)
                    .map(|m| &m.host_alias == host_alias)
                    .unwrap_or(false)
        })
    }

    // -- job-id database (JID/DNB) --

    pub fn with_jid<R>(&self, f: impl FnOnce(&mut JidTable) -> R) -> R {
        f(&mut self.jid.lock())
    }

    // -- directory status (FRA) --

    pub fn insert_fra(&self, entry: FraEntry) {
        self.fra.lock().insert(entry.alias.clone(), entry);
    }

    pub fn fra_aliases(&self) -> Vec<DirAlias> {
        self.fra.lock().keys().cloned().collect()
    }

    pub fn fra_snapshot(&self, alias: &DirAlias) -> Option<FraEntry> {
        self.fra.lock().get(alias).cloned()
    }

    pub fn fra_entries(&self) -> Vec<FraEntry> {
        self.fra.lock().values().cloned().collect()
    }

    pub fn with_fra<R>(&self, alias: &DirAlias, f: impl FnOnce(&mut FraEntry) -> R) -> Option<R> {
        self.fra.lock().get_mut(alias).map(f)
    }
}

#[cfg(test)]
#[path = "tables_tests.rs"]
mod tests;
