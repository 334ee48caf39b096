// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_core::jid::{DirAlias, DnbEntry, JidEntry};
use afd_core::message::{JobId, Scheme};
use afd_core::test_support::test_mdb_entry;
use afd_engine::SharedTables;
use tempfile::TempDir;

fn seed(
    tables: &SharedTables,
    job_id: u32,
    scheme: Scheme,
    dir_path: &str,
    contents: &str,
) -> TempDir {
    let messages = TempDir::new().unwrap();
    tables.insert_mdb(test_mdb_entry(job_id, "mirror01", scheme));
    tables.with_jid(|jid| {
        jid.insert_dir(DnbEntry {
            alias: DirAlias::new("incoming"),
            path: dir_path.to_string(),
            job_count: 1,
        });
        jid.insert_job(JidEntry {
            job_id: JobId::new(job_id),
            dir_alias: DirAlias::new("incoming"),
            host_alias: afd_core::host::HostAlias::new("mirror01"),
            priority: 5,
            recipient_url: String::new(),
            no_of_loptions: 0,
            no_of_soptions: 0,
            soptions: String::new(),
        });
    });
    std::fs::write(messages.path().join(job_id.to_string()), contents).unwrap();
    messages
}

#[test]
fn builds_a_plan_for_a_loc_job() {
    let tables = SharedTables::new();
    let spool = TempDir::new().unwrap();
    let messages = seed(
        &tables,
        1,
        Scheme::Loc,
        spool.path().to_str().unwrap(),
        "[destination]\nrecipient loc://mirror01/out\n",
    );

    let plan = build_worker_plan(&tables, messages.path(), 1).unwrap();

    assert_eq!(plan.spool_dir.to_str().unwrap(), spool.path().to_str().unwrap());
    assert!(plan.trans_rename.is_none());
}

#[test]
fn reads_age_limit_and_trans_rename_options() {
    let tables = SharedTables::new();
    let spool = TempDir::new().unwrap();
    let messages = seed(
        &tables,
        2,
        Scheme::Ftp,
        spool.path().to_str().unwrap(),
        "[destination]\nrecipient ftp://user:pw@mirror01/inbox\n[options]\nage-limit 1800\ntrans_rename s/a/b/\n",
    );

    let plan = build_worker_plan(&tables, messages.path(), 2).unwrap();

    assert_eq!(plan.age_limit_secs, Some(1800));
    assert_eq!(plan.trans_rename.as_deref(), Some("s/a/b/"));
}

#[test]
fn map_scheme_has_no_wired_adapter() {
    let tables = SharedTables::new();
    let messages = seed(
        &tables,
        3,
        Scheme::Map,
        "/nonexistent",
        "[destination]\nrecipient map://mirror01/out\n",
    );

    let err = build_worker_plan(&tables, messages.path(), 3).unwrap_err();

    assert!(matches!(err, DispatchSetupError::UnsupportedScheme(Scheme::Map)));
}

#[test]
fn errors_when_no_mdb_entry_is_registered() {
    let tables = SharedTables::new();
    let messages = TempDir::new().unwrap();

    let err = build_worker_plan(&tables, messages.path(), 42).unwrap_err();

    assert!(matches!(err, DispatchSetupError::UnknownMdb(42)));
}

#[test]
fn errors_when_the_message_file_is_missing() {
    let tables = SharedTables::new();
    tables.insert_mdb(test_mdb_entry(5, "mirror01", Scheme::Ftp));
    tables.with_jid(|jid| {
        jid.insert_dir(DnbEntry {
            alias: DirAlias::new("incoming"),
            path: "/nonexistent".to_string(),
            job_count: 1,
        });
        jid.insert_job(JidEntry {
            job_id: JobId::new(5),
            dir_alias: DirAlias::new("incoming"),
            host_alias: afd_core::host::HostAlias::new("mirror01"),
            priority: 5,
            recipient_url: String::new(),
            no_of_loptions: 0,
            no_of_soptions: 0,
            soptions: String::new(),
        });
    });
    let messages = TempDir::new().unwrap();

    let err = build_worker_plan(&tables, messages.path(), 5).unwrap_err();

    assert!(matches!(err, DispatchSetupError::Io { job_id: 5, .. }));
}
