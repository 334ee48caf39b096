// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk arena layout for the FSA/FRA/MDB/QB/JID/DNB tables (spec §9
//! Design Notes, "arena + index"): one fixed-slot [`Arena`] per table,
//! indexed either directly by job-id (MDB/QB/JID share the same job-id
//! keyspace) or through a small alias-to-slot sidecar file persisted
//! alongside it (hosts/directories/FRA rows, which are string-keyed).
//!
//! A slot's contents round-trip through `T::default()` when never
//! written (`afd_storage::arena`'s own behaviour), which is indistinguishable
//! from a live entry that happens to equal the zero value. The sidecar
//! files are the actual source of truth for which slots are occupied;
//! arena contents are only ever read through an index entry that says
//! "this slot is live".
//!
//! `mdb`/`queue`/`jid` are the one set of tables that genuinely grows
//! past its initial capacity (spec §4.2); `hosts`/`dnb`/`fra` stay
//! fixed-capacity, sized from runbook configuration at startup the same
//! way the original's `HOST_CONFIG`/`DIR_CONFIG` sizing works, and return
//! [`ArenasError::Full`] if that configuration-derived bound is exceeded.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use afd_core::fra::FraEntry;
use afd_core::host::Host;
use afd_core::jid::{DnbEntry, JidEntry};
use afd_core::message::MdbEntry;
use afd_core::queue::QueueEntry;
use afd_engine::tables::SharedTables;
use afd_storage::arena::{Arena, ArenaError};
use parking_lot::Mutex;
use thiserror::Error;

const HOST_CAPACITY: usize = 256;
const HOST_SLOT_SIZE: usize = 1024;
const DIR_CAPACITY: usize = 1024;
const DIR_SLOT_SIZE: usize = 512;
const FRA_SLOT_SIZE: usize = 512;
/// MDB/QB/JID share one dense job-id keyspace (spec §3); a job-id is used
/// as its own slot index in all three arenas. Starting capacity; grows by
/// `MSG_CACHE_BUF_SIZE` via `Arena::grow` once exhausted (spec §4.2).
const JOB_CAPACITY: usize = 16384;
const MDB_SLOT_SIZE: usize = 512;
const QUEUE_SLOT_SIZE: usize = 256;
const JID_SLOT_SIZE: usize = 8192;
/// Growth increment for the job-id-keyed arenas (spec §4.2
/// `MSG_CACHE_BUF_SIZE`).
const MSG_CACHE_BUF_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum ArenasError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("index file {path} is corrupt: {source}")]
    IndexCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{table} arena is full (capacity {capacity})")]
    Full { table: &'static str, capacity: usize },
}

/// Alias-to-slot indexes are kept as `HashMap<String, usize>` on disk
/// (rather than keying the JSON object directly on `HostAlias`/`DirAlias`)
/// so the sidecar format doesn't depend on how those newtypes happen to
/// serialize as a map key.
fn load_index(path: &Path) -> Result<HashMap<String, usize>, ArenasError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            serde_json::from_slice(&bytes).map_err(|source| ArenasError::IndexCorrupt {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(source) => Err(ArenasError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn save_index(path: &Path, index: &HashMap<String, usize>) -> Result<(), ArenasError> {
    let bytes = serde_json::to_vec_pretty(index).map_err(|source| ArenasError::IndexCorrupt {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, bytes).map_err(|source| ArenasError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_job_index(path: &Path) -> Result<HashSet<u32>, ArenasError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            serde_json::from_slice(&bytes).map_err(|source| ArenasError::IndexCorrupt {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashSet::new()),
        Err(source) => Err(ArenasError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn save_job_index(path: &Path, ids: &HashSet<u32>) -> Result<(), ArenasError> {
    let bytes = serde_json::to_vec_pretty(ids).map_err(|source| ArenasError::IndexCorrupt {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, bytes).map_err(|source| ArenasError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Every file-backed table the daemon persists across restarts, plus the
/// occupancy sidecars that tell a reload which slots hold live entries.
pub struct Arenas {
    hosts: Arena<Host>,
    host_index: Mutex<HashMap<String, usize>>,
    host_index_path: PathBuf,

    mdb: Arena<MdbEntry>,
    queue: Arena<QueueEntry>,
    jid: Arena<JidEntry>,
    job_index: Mutex<HashSet<u32>>,
    job_index_path: PathBuf,

    dnb: Arena<DnbEntry>,
    dnb_index: Mutex<HashMap<String, usize>>,
    dnb_index_path: PathBuf,

    fra: Arena<FraEntry>,
    fra_index: Mutex<HashMap<String, usize>>,
    fra_index_path: PathBuf,
}

impl Arenas {
    /// Opens (creating if absent) every arena and its index sidecar under
    /// `dir`.
    pub fn open(dir: &Path) -> Result<Self, ArenasError> {
        std::fs::create_dir_all(dir).map_err(|source| ArenasError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let host_index_path = dir.join("hosts.index.json");
        let dnb_index_path = dir.join("dnb.index.json");
        let job_index_path = dir.join("jobs.index.json");
        let fra_index_path = dir.join("fra.index.json");

        Ok(Self {
            hosts: Arena::open(&dir.join("hosts.arena"), HOST_CAPACITY, HOST_SLOT_SIZE)?,
            host_index: Mutex::new(load_index(&host_index_path)?),
            host_index_path,

            mdb: Arena::open(&dir.join("mdb.arena"), JOB_CAPACITY, MDB_SLOT_SIZE)?,
            queue: Arena::open(&dir.join("queue.arena"), JOB_CAPACITY, QUEUE_SLOT_SIZE)?,
            jid: Arena::open(&dir.join("jid.arena"), JOB_CAPACITY, JID_SLOT_SIZE)?,
            job_index: Mutex::new(load_job_index(&job_index_path)?),
            job_index_path,

            dnb: Arena::open(&dir.join("dnb.arena"), DIR_CAPACITY, DIR_SLOT_SIZE)?,
            dnb_index: Mutex::new(load_index(&dnb_index_path)?),
            dnb_index_path,

            fra: Arena::open(&dir.join("fra.arena"), DIR_CAPACITY, FRA_SLOT_SIZE)?,
            fra_index: Mutex::new(load_index(&fra_index_path)?),
            fra_index_path,
        })
    }

    /// Loads every persisted entry into `tables`, called once at startup
    /// before the main event loop begins accepting work.
    pub fn load_into(&self, tables: &SharedTables) -> Result<(), ArenasError> {
        for idx in self.host_index.lock().values() {
            tables.insert_host(self.hosts.read(*idx)?);
        }
        for idx in self.dnb_index.lock().values() {
            let entry = self.dnb.read(*idx)?;
            tables.with_jid(|jid| jid.insert_dir(entry.clone()));
        }
        for idx in self.fra_index.lock().values() {
            tables.insert_fra(self.fra.read(*idx)?);
        }
        for &job_id in self.job_index.lock().iter() {
            let idx = job_id as usize;
            tables.insert_mdb(self.mdb.read(idx)?);
            tables.insert_queue_entry(self.queue.read(idx)?);
            let jid_entry = self.jid.read(idx)?;
            tables.with_jid(|jid| jid.insert_job(jid_entry.clone()));
        }
        Ok(())
    }

    /// Writes every live entry in `tables` back to its arena slot and
    /// flushes the index sidecars. Called by the checkpoint task and on
    /// graceful shutdown.
    pub fn persist_from(&self, tables: &SharedTables) -> Result<(), ArenasError> {
        {
            let mut index = self.host_index.lock();
            for alias in tables.host_aliases() {
                let Some(host) = tables.host_snapshot(&alias) else {
                    continue;
                };
                let next = index.len();
                let idx = *index.entry(alias.as_str().to_string()).or_insert(next);
                if idx >= HOST_CAPACITY {
                    return Err(ArenasError::Full {
                        table: "hosts",
                        capacity: HOST_CAPACITY,
                    });
                }
                self.hosts.write(idx, &host)?;
            }
            save_index(&self.host_index_path, &index)?;
        }

        {
            let mut index = self.dnb_index.lock();
            let dirs: Vec<DnbEntry> = tables.with_jid(|jid| jid.dirs().cloned().collect());
            for dir in dirs {
                let next = index.len();
                let idx = *index.entry(dir.alias.as_str().to_string()).or_insert(next);
                if idx >= DIR_CAPACITY {
                    return Err(ArenasError::Full {
                        table: "dnb",
                        capacity: DIR_CAPACITY,
                    });
                }
                self.dnb.write(idx, &dir)?;
            }
            save_index(&self.dnb_index_path, &index)?;
        }

        {
            let mut index = self.fra_index.lock();
            let dirs: Vec<FraEntry> = tables.fra_entries();
            for dir in dirs {
                let next = index.len();
                let idx = *index.entry(dir.alias.as_str().to_string()).or_insert(next);
                if idx >= DIR_CAPACITY {
                    return Err(ArenasError::Full {
                        table: "fra",
                        capacity: DIR_CAPACITY,
                    });
                }
                self.fra.write(idx, &dir)?;
            }
            save_index(&self.fra_index_path, &index)?;
        }

        {
            let mut occupied = self.job_index.lock();
            for entry in tables.mdb_entries() {
                let idx = entry.job_id.0 as usize;
                self.ensure_job_capacity(idx)?;
                self.mdb.write(idx, &entry)?;
                occupied.insert(entry.job_id.0);
            }
            for entry in tables.queue_entries() {
                let idx = entry.job_id.0 as usize;
                self.ensure_job_capacity(idx)?;
                self.queue.write(idx, &entry)?;
                occupied.insert(entry.job_id.0);
            }
            let jid_entries: Vec<JidEntry> = tables.with_jid(|jid| jid.jobs().cloned().collect());
            for entry in jid_entries {
                let idx = entry.job_id.0 as usize;
                self.ensure_job_capacity(idx)?;
                self.jid.write(idx, &entry)?;
                occupied.insert(entry.job_id.0);
            }
            save_job_index(&self.job_index_path, &occupied)?;
        }

        Ok(())
    }

    /// Grows the mdb/queue/jid arenas, which share one job-id keyspace, by
    /// `MSG_CACHE_BUF_SIZE` at a time until slot `min_index` is addressable
    /// in all three (spec §4.2: "grows by `MSG_CACHE_BUF_SIZE` entries at a
    /// time via the arena's `grow()`"). The three capacities are kept in
    /// lockstep since a job-id indexes the same slot in every one of them.
    fn ensure_job_capacity(&self, min_index: usize) -> Result<(), ArenasError> {
        while self.mdb.capacity() <= min_index {
            self.mdb.grow(MSG_CACHE_BUF_SIZE)?;
        }
        while self.queue.capacity() <= min_index {
            self.queue.grow(MSG_CACHE_BUF_SIZE)?;
        }
        while self.jid.capacity() <= min_index {
            self.jid.grow(MSG_CACHE_BUF_SIZE)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "arenas_tests.rs"]
mod tests;
