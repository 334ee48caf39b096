// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_core::host::HostAlias;
use afd_core::jid::{DirAlias, DnbEntry, JidEntry};
use afd_core::message::Scheme;
use afd_core::test_support::test_host;
use tempfile::TempDir;

fn seed_jid(tables: &SharedTables, job_id: u32, dir_alias: &str, dir_path: &str, host_alias: &str, recipient_url: &str) {
    tables.with_jid(|jid| {
        jid.insert_dir(DnbEntry {
            alias: DirAlias::new(dir_alias),
            path: dir_path.to_string(),
            job_count: 0,
        });
        jid.insert_job(JidEntry {
            job_id: JobId::new(job_id),
            dir_alias: DirAlias::new(dir_alias),
            host_alias: HostAlias::new(host_alias),
            priority: 5,
            recipient_url: recipient_url.to_string(),
            no_of_loptions: 0,
            no_of_soptions: 0,
            soptions: String::new(),
        });
    });
}

#[test]
fn ingests_an_existing_message_file_into_mdb_and_queue() {
    let work = TempDir::new().unwrap();
    let spool = TempDir::new().unwrap();
    std::fs::write(spool.path().join("a.dat"), b"hello").unwrap();

    let tables = SharedTables::new();
    tables.insert_host(test_host("mirror01", 2, 3));
    seed_jid(
        &tables,
        1,
        "incoming",
        spool.path().to_str().unwrap(),
        "mirror01",
        "ftp://user:pw@mirror01/inbox",
    );
    std::fs::write(
        work.path().join("1"),
        "[destination]\nrecipient ftp://user:pw@mirror01/inbox\n[options]\nage-limit 3600\n",
    )
    .unwrap();

    let outcome = ingest_job(&tables, work.path(), JobId::new(1), '5', 1000, 1, 2000).unwrap();

    assert_eq!(outcome, IngestOutcome::Queued);
    let mdb = tables.mdb_entry(JobId::new(1)).unwrap();
    assert_eq!(mdb.scheme, Scheme::Ftp);
    assert_eq!(mdb.age_limit_secs, Some(3600));
    assert!(tables.with_queue_entry(JobId::new(1), |q| q.is_pending()).unwrap());
}

#[test]
fn recreates_a_missing_message_file_from_the_jid_row() {
    let work = TempDir::new().unwrap();
    let tables = SharedTables::new();
    tables.insert_host(test_host("mirror01", 2, 3));
    seed_jid(&tables, 7, "incoming", "/nonexistent", "mirror01", "loc://mirror01/out");

    let outcome = ingest_job(&tables, work.path(), JobId::new(7), 'A', 10, 1, 20).unwrap();

    assert_eq!(outcome, IngestOutcome::Queued);
    assert!(work.path().join("7").exists());
    let mdb = tables.mdb_entry(JobId::new(7)).unwrap();
    assert_eq!(mdb.scheme, Scheme::Loc);
}

#[test]
fn discards_a_job_whose_host_alias_left_the_fsa() {
    let work = TempDir::new().unwrap();
    let tables = SharedTables::new();
    // no insert_host call: mirror01 is absent from the FSA.
    seed_jid(&tables, 2, "incoming", "/nonexistent", "mirror01", "ftp://mirror01/out");
    std::fs::write(
        work.path().join("2"),
        "[destination]\nrecipient ftp://mirror01/out\n",
    )
    .unwrap();

    let outcome = ingest_job(&tables, work.path(), JobId::new(2), '5', 1, 1, 1).unwrap();

    assert_eq!(outcome, IngestOutcome::Discarded);
    assert!(tables.mdb_entry(JobId::new(2)).is_none());
}

#[test]
fn unlinks_a_message_file_with_a_malformed_recipient_url() {
    let work = TempDir::new().unwrap();
    let tables = SharedTables::new();
    tables.insert_host(test_host("mirror01", 2, 3));
    seed_jid(&tables, 3, "incoming", "/nonexistent", "mirror01", "not-a-url");
    let path = work.path().join("3");
    std::fs::write(&path, "[destination]\nrecipient not-a-url\n").unwrap();

    let err = ingest_job(&tables, work.path(), JobId::new(3), '5', 1, 1, 1).unwrap_err();

    assert!(matches!(err, IngestError::MalformedUrl(_, _)));
    assert!(!path.exists());
}

#[test]
fn errors_on_a_job_id_with_no_jid_row() {
    let work = TempDir::new().unwrap();
    let tables = SharedTables::new();

    let err = ingest_job(&tables, work.path(), JobId::new(99), '5', 1, 1, 1).unwrap_err();

    assert!(matches!(err, IngestError::UnknownJob(id) if id == JobId::new(99)));
}
