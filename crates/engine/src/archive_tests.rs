// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_core::message::JobId;

#[test]
fn archive_file_creates_bucket_and_moves_source() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("inbound.bin");
    std::fs::write(&src, b"payload").unwrap();

    let dest = archive_file(
        dir.path(),
        100,
        "mirror01",
        None,
        b'I' as u8,
        JobId::new(42),
        &src,
        1_700_000_000,
        0,
        10,
    )
    .unwrap();

    assert!(!src.exists());
    assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
    assert!(dest.starts_with(dir.path().join("archive/mirror01/none/0")));
}

#[test]
fn archive_file_defaults_missing_user_to_none() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.bin");
    std::fs::write(&src, b"x").unwrap();

    let dest = archive_file(dir.path(), 100, "host", None, b'N' as u8, JobId::new(1), &src, 0, 0, 1).unwrap();

    assert!(dest
        .to_string_lossy()
        .contains("/archive/host/none/"));
}

#[test]
fn archive_file_strips_nothing_from_present_user() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.bin");
    std::fs::write(&src, b"x").unwrap();

    let dest = archive_file(
        dir.path(),
        100,
        "host",
        Some("alice"),
        b'N' as u8,
        JobId::new(1),
        &src,
        0,
        0,
        1,
    )
    .unwrap();

    assert!(dest.to_string_lossy().contains("/archive/host/alice/"));
}

#[test]
fn archive_engine_wraps_free_function() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.bin");
    std::fs::write(&src, b"x").unwrap();

    let engine = ArchiveEngine::new(dir.path().to_path_buf(), 100);
    let dest = engine
        .archive_file("host", None, b'N' as u8, JobId::new(7), &src, 0, 0, 1)
        .unwrap();

    assert!(dest.exists());
}

#[test]
fn archive_file_rotates_bucket_once_link_max_is_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let link_max = 10;
    // Fill bucket 0 with 8 terminal directories directly (nlink - 2 == 8).
    let bucket_dir = dir.path().join("archive/host/none/0");
    std::fs::create_dir_all(&bucket_dir).unwrap();
    for i in 0..8 {
        std::fs::create_dir(bucket_dir.join(format!("existing_{i}"))).unwrap();
    }

    let src = dir.path().join("a.bin");
    std::fs::write(&src, b"x").unwrap();

    let dest = archive_file(
        dir.path(),
        link_max,
        "host",
        None,
        b'N' as u8,
        JobId::new(9),
        &src,
        0,
        0,
        1,
    )
    .unwrap();

    assert!(dest.starts_with(dir.path().join("archive/host/none/1")));
}
