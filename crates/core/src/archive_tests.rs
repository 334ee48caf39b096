// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn bucket_time_rounds_down_to_step_boundary() {
    assert_eq!(ArchiveKey::bucket_time(1_700_000_007, 0, 10), 1_700_000_000);
    assert_eq!(ArchiveKey::bucket_time(1_700_000_000, 5, 10), 1_700_000_000);
}

#[test]
fn bucket_time_falls_back_when_step_is_zero() {
    assert_eq!(ArchiveKey::bucket_time(100, 50, 0), 150);
}

#[test]
fn relative_path_matches_spec_shape() {
    let key = ArchiveKey {
        host_alias: "mirror01".to_string(),
        user: None,
        dir_number: 3,
        priority: 5,
        bucket_time: 1_700_000_000,
        job_id: JobId::new(42),
    };
    let path = key.relative_path(std::path::Path::new("/work"));
    assert_eq!(
        path,
        std::path::PathBuf::from("/work/archive/mirror01/none/3/5_1700000000_42")
    );
}

#[test]
fn allocate_bucket_picks_first_with_free_capacity() {
    let counts = [(0, 8), (1, 3)];
    assert_eq!(allocate_bucket(&counts, 10), Ok(1));
}

#[test]
fn allocate_bucket_allocates_next_when_all_full() {
    let counts = [(0, 8), (1, 8)];
    assert_eq!(allocate_bucket(&counts, 10), Ok(2));
}

#[test]
fn allocate_bucket_rotation_matches_scenario_s4() {
    let link_max = 10;
    let mut counts: Vec<(u32, u32)> = Vec::new();
    for bucket in 0..8u32 {
        assert_eq!(allocate_bucket(&counts, link_max), Ok(bucket));
        counts.push((bucket, 8));
    }
    assert_eq!(
        allocate_bucket(&counts, link_max),
        Err(ArchiveError::ArchiveFull)
    );
}

#[test]
fn allocate_bucket_with_no_existing_buckets_starts_at_zero() {
    assert_eq!(allocate_bucket(&[], 10), Ok(0));
}
