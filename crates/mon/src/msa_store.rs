// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk MSA arena (spec §3, §4.10): one fixed slot per configured
//! remote AFD, indexed through an alias-to-slot sidecar file, following
//! the same "arena + index" shape as `afd-daemon::lifecycle::arenas`
//! (the FD core's own table layout), applied here to a single table
//! instead of four.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use afd_core::msa::{AfdAlias, MsaEntry};
use afd_storage::arena::{Arena, ArenaError};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

const MSA_CAPACITY: usize = 256;
const MSA_SLOT_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum MsaStoreError {
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
    #[error("MSA arena is full (capacity {capacity})")]
    Full { capacity: usize },
    #[error("no MSA entry registered for alias {0:?}")]
    UnknownAlias(String),
}

fn load_index(path: &Path) -> Result<HashMap<String, usize>, MsaStoreError> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| MsaStoreError::IndexCorrupt {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(source) => Err(MsaStoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn save_index(path: &Path, index: &HashMap<String, usize>) -> Result<(), MsaStoreError> {
    let bytes =
        serde_json::to_vec_pretty(index).map_err(|source| MsaStoreError::IndexCorrupt {
            path: path.to_path_buf(),
            source,
        })?;
    std::fs::write(path, bytes).map_err(|source| MsaStoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// In-memory working set of MSA entries, one per configured remote AFD,
/// backed by a file-resident [`Arena`].
pub struct MsaStore {
    arena: Arena<MsaEntry>,
    index: Mutex<HashMap<String, usize>>,
    index_path: PathBuf,
    live: RwLock<HashMap<String, Arc<Mutex<MsaEntry>>>>,
}

impl MsaStore {
    /// Opens (creating if absent) the MSA arena and its index sidecar
    /// under `dir`, loading every previously-persisted entry into memory.
    pub fn open(dir: &Path) -> Result<Self, MsaStoreError> {
        std::fs::create_dir_all(dir).map_err(|source| MsaStoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let index_path = dir.join("msa.index.json");
        let arena = Arena::open(&dir.join("msa.arena"), MSA_CAPACITY, MSA_SLOT_SIZE)?;
        let index = load_index(&index_path)?;

        let mut live = HashMap::new();
        for (alias, idx) in index.iter() {
            let entry = arena.read(*idx)?;
            live.insert(alias.clone(), Arc::new(Mutex::new(entry)));
        }

        Ok(Self {
            arena,
            index: Mutex::new(index),
            index_path,
            live: RwLock::new(live),
        })
    }

    /// Registers `alias` if not already known, assigning it a fresh slot.
    /// Returns the (possibly pre-existing) in-memory entry handle.
    pub fn ensure_entry(
        &self,
        alias: &str,
        max_log_history: usize,
        storage_time_days: usize,
    ) -> Result<Arc<Mutex<MsaEntry>>, MsaStoreError> {
        if let Some(existing) = self.live.read().get(alias) {
            return Ok(existing.clone());
        }

        let mut index = self.index.lock();
        let next = index.len();
        let idx = *index.entry(alias.to_string()).or_insert(next);
        if idx >= MSA_CAPACITY {
            return Err(MsaStoreError::Full {
                capacity: MSA_CAPACITY,
            });
        }
        save_index(&self.index_path, &index)?;
        drop(index);

        let entry = Arc::new(Mutex::new(MsaEntry::new(
            alias,
            max_log_history,
            storage_time_days,
        )));
        self.live.write().insert(alias.to_string(), entry.clone());
        Ok(entry)
    }

    /// Returns the in-memory handle for `alias`, if registered.
    pub fn entry(&self, alias: &str) -> Option<Arc<Mutex<MsaEntry>>> {
        self.live.read().get(alias).cloned()
    }

    /// Snapshots every registered entry, sorted by alias for stable
    /// display order (used by the control CLI's status view).
    pub fn snapshot_all(&self) -> Vec<MsaEntry> {
        let mut entries: Vec<MsaEntry> =
            self.live.read().values().map(|e| e.lock().clone()).collect();
        entries.sort_by(|a, b| a.alias.as_str().cmp(b.alias.as_str()));
        entries
    }

    pub fn aliases(&self) -> Vec<AfdAlias> {
        self.live
            .read()
            .keys()
            .map(|a| AfdAlias::new(a.clone()))
            .collect()
    }

    /// Persists every live entry back to its arena slot.
    pub fn persist(&self) -> Result<(), MsaStoreError> {
        let index = self.index.lock();
        let live = self.live.read();
        for (alias, idx) in index.iter() {
            let Some(entry) = live.get(alias) else {
                continue;
            };
            self.arena.write(*idx, &entry.lock())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "msa_store_tests.rs"]
mod tests;
