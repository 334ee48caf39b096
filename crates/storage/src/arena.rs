// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-slot shared-state arena: the persistence mechanism backing the
//! FSA/MDB/QB/JID tables.
//!
//! Each arena is a single file holding `capacity` fixed-size slots. A slot
//! stores its entry JSON-encoded and padded with spaces to `slot_size`
//! bytes, so any slot can be read or written independently via
//! [`FileExt::read_at`]/[`FileExt::write_at`] without touching its
//! neighbours and without `unsafe` `mmap`. Concurrent writers coordinate
//! through an advisory lock file per slot (spec §4.1 "Shared-resource
//! policy": every hot field takes an advisory write lock before mutation).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io;
use std::marker::PhantomData;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("slot {index} out of range (capacity {capacity})")]
    OutOfRange { index: usize, capacity: usize },
    #[error("serialized entry does not fit in slot size {slot_size}")]
    EntryTooLarge { slot_size: usize },
}

/// A fixed-slot-size file-backed table of `T` that can grow its slot
/// count in place (spec §4.2's `MSG_CACHE_BUF_SIZE` growth block).
/// `capacity` is atomic so [`Arena::grow`] only needs `&self`, matching
/// the read/write methods it shares a table with behind a single shared
/// lock.
pub struct Arena<T> {
    file: File,
    lock_dir: PathBuf,
    capacity: AtomicUsize,
    slot_size: usize,
    _marker: PhantomData<T>,
}

impl<T> Arena<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Opens (creating if absent) an arena at `path` with room for
    /// `capacity` slots of `slot_size` bytes each. Lock files for
    /// individual slots live under `<path>.locks/`.
    pub fn open(path: &Path, capacity: usize, slot_size: usize) -> Result<Self, ArenaError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let needed = (capacity * slot_size) as u64;
        let existing_len = file.metadata()?.len();
        // A prior `grow()` can have left the file larger than `capacity`
        // calls for; reopening must pick up the grown size rather than
        // silently truncating the arena back down.
        let capacity = if existing_len > needed {
            (existing_len / slot_size as u64) as usize
        } else {
            file.set_len(needed)?;
            capacity
        };
        let lock_dir = path.with_extension("locks");
        std::fs::create_dir_all(&lock_dir)?;
        Ok(Self {
            file,
            lock_dir,
            capacity: AtomicUsize::new(capacity),
            slot_size,
            _marker: PhantomData,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::SeqCst)
    }

    /// Grows the arena by `additional` slots, extending the backing file
    /// in place; existing slots keep their contents and offsets, and new
    /// slots read as `T::default()` until written (spec §4.2: "grows by
    /// `MSG_CACHE_BUF_SIZE` entries at a time... preserves contents").
    /// Returns the new capacity.
    pub fn grow(&self, additional: usize) -> Result<usize, ArenaError> {
        let new_capacity = self.capacity.load(Ordering::SeqCst) + additional;
        let needed = (new_capacity * self.slot_size) as u64;
        self.file.set_len(needed)?;
        self.capacity.store(new_capacity, Ordering::SeqCst);
        Ok(new_capacity)
    }

    fn offset(&self, index: usize) -> Result<u64, ArenaError> {
        let capacity = self.capacity();
        if index >= capacity {
            return Err(ArenaError::OutOfRange { index, capacity });
        }
        Ok((index * self.slot_size) as u64)
    }

    /// Reads slot `index`. An all-blank slot (never written) deserializes
    /// as `T::default()`.
    pub fn read(&self, index: usize) -> Result<T, ArenaError> {
        let offset = self.offset(index)?;
        let mut buf = vec![0u8; self.slot_size];
        self.file.read_at(&mut buf, offset)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        if end == 0 {
            return Ok(T::default());
        }
        Ok(serde_json::from_slice(&buf[..end])?)
    }

    /// Writes `value` into slot `index`, zero-padding the remainder.
    pub fn write(&self, index: usize, value: &T) -> Result<(), ArenaError> {
        let offset = self.offset(index)?;
        let mut buf = serde_json::to_vec(value)?;
        if buf.len() > self.slot_size {
            return Err(ArenaError::EntryTooLarge {
                slot_size: self.slot_size,
            });
        }
        buf.resize(self.slot_size, 0);
        self.file.write_at(&buf, offset)?;
        Ok(())
    }

    /// Takes an advisory exclusive lock over slot `index` for the
    /// duration of the returned guard. Approximates the spec's
    /// byte-range write lock on a hot field: the lock is scoped to this
    /// one slot, not the whole arena, so concurrent writers to different
    /// slots never block each other.
    pub fn lock_slot(&self, index: usize) -> Result<SlotGuard, ArenaError> {
        let capacity = self.capacity();
        if index >= capacity {
            return Err(ArenaError::OutOfRange { index, capacity });
        }
        let path = self.lock_dir.join(index.to_string());
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)?;
        fs2::FileExt::lock_exclusive(&file)?;
        Ok(SlotGuard { file })
    }

    /// Locks offset 0's slot, used by the reconciler for whole-table
    /// aggregate repairs (spec §4.1).
    pub fn lock_aggregate(&self) -> Result<SlotGuard, ArenaError> {
        self.lock_slot(0)
    }
}

/// Holds an advisory lock on one arena slot; unlocks on drop.
pub struct SlotGuard {
    file: File,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "arena_tests.rs"]
mod tests;
