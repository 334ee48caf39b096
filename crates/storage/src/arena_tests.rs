// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    counter: u32,
    name: String,
}

#[test]
fn unwritten_slot_reads_as_default() {
    let dir = tempdir().unwrap();
    let arena: Arena<Entry> = Arena::open(&dir.path().join("test.arena"), 4, 256).unwrap();
    assert_eq!(arena.read(0).unwrap(), Entry::default());
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let arena: Arena<Entry> = Arena::open(&dir.path().join("test.arena"), 4, 256).unwrap();
    let entry = Entry {
        counter: 7,
        name: "mirror01".to_string(),
    };
    arena.write(2, &entry).unwrap();
    assert_eq!(arena.read(2).unwrap(), entry);
    assert_eq!(arena.read(1).unwrap(), Entry::default());
}

#[test]
fn out_of_range_index_errors() {
    let dir = tempdir().unwrap();
    let arena: Arena<Entry> = Arena::open(&dir.path().join("test.arena"), 2, 256).unwrap();
    assert!(matches!(
        arena.read(5),
        Err(ArenaError::OutOfRange { index: 5, capacity: 2 })
    ));
}

#[test]
fn entry_larger_than_slot_errors() {
    let dir = tempdir().unwrap();
    let arena: Arena<Entry> = Arena::open(&dir.path().join("test.arena"), 2, 8).unwrap();
    let entry = Entry {
        counter: 1,
        name: "a much longer name than eight bytes".to_string(),
    };
    assert!(matches!(
        arena.write(0, &entry),
        Err(ArenaError::EntryTooLarge { slot_size: 8 })
    ));
}

#[test]
fn reopening_existing_arena_preserves_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.arena");
    {
        let arena: Arena<Entry> = Arena::open(&path, 4, 256).unwrap();
        arena
            .write(1, &Entry { counter: 3, name: "x".to_string() })
            .unwrap();
    }
    let arena: Arena<Entry> = Arena::open(&path, 4, 256).unwrap();
    assert_eq!(arena.read(1).unwrap().counter, 3);
}

#[test]
fn grow_extends_capacity_and_preserves_existing_slots() {
    let dir = tempdir().unwrap();
    let arena: Arena<Entry> = Arena::open(&dir.path().join("test.arena"), 2, 256).unwrap();
    arena
        .write(1, &Entry { counter: 9, name: "preserved".to_string() })
        .unwrap();

    let new_capacity = arena.grow(2).unwrap();
    assert_eq!(new_capacity, 4);
    assert_eq!(arena.capacity(), 4);
    assert_eq!(arena.read(1).unwrap().counter, 9);
    assert_eq!(arena.read(3).unwrap(), Entry::default());

    arena
        .write(3, &Entry { counter: 1, name: "new-slot".to_string() })
        .unwrap();
    assert_eq!(arena.read(3).unwrap().counter, 1);
}

#[test]
fn reopening_after_grow_preserves_the_grown_capacity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.arena");
    {
        let arena: Arena<Entry> = Arena::open(&path, 2, 256).unwrap();
        arena.grow(2).unwrap();
        arena
            .write(3, &Entry { counter: 5, name: "grown".to_string() })
            .unwrap();
    }
    let arena: Arena<Entry> = Arena::open(&path, 2, 256).unwrap();
    assert_eq!(arena.capacity(), 4);
    assert_eq!(arena.read(3).unwrap().counter, 5);
}

#[test]
fn slot_lock_is_exclusive_per_slot() {
    let dir = tempdir().unwrap();
    let arena: Arena<Entry> = Arena::open(&dir.path().join("test.arena"), 4, 256).unwrap();
    let guard0 = arena.lock_slot(0).unwrap();
    // A different slot must remain lockable while slot 0 is held.
    let guard1 = arena.lock_slot(1).unwrap();
    drop(guard0);
    drop(guard1);
}
