use super::*;
use afd_core::fra::FraEntry;
use afd_core::host::{Host, HostAlias};
use afd_core::jid::{DirAlias, DnbEntry, JidEntry};
use afd_core::message::{JobId, MdbEntry, Scheme};
use afd_core::queue::QueueEntry;
use tempfile::tempdir;

fn sample_host(alias: &str) -> Host {
    let mut host = Host::default();
    host.alias = HostAlias::new(alias);
    host
}

fn sample_mdb(job_id: u32, host_alias: &str) -> MdbEntry {
    MdbEntry {
        job_id: JobId(job_id),
        host_alias: HostAlias::new(host_alias),
        scheme: Scheme::Ftp,
        ..Default::default()
    }
}

#[test]
fn round_trips_hosts_through_reopen() {
    let dir = tempdir().unwrap();
    let tables = SharedTables::new();
    tables.insert_host(sample_host("mail01"));
    tables.insert_host(sample_host("mail02"));

    let arenas = Arenas::open(dir.path()).unwrap();
    arenas.persist_from(&tables).unwrap();

    let reopened = Arenas::open(dir.path()).unwrap();
    let fresh = SharedTables::new();
    reopened.load_into(&fresh).unwrap();

    let mut aliases: Vec<String> = fresh.host_aliases().iter().map(|a| a.as_str().to_string()).collect();
    aliases.sort();
    assert_eq!(aliases, vec!["mail01".to_string(), "mail02".to_string()]);
}

#[test]
fn round_trips_jobs_across_mdb_queue_jid() {
    let dir = tempdir().unwrap();
    let tables = SharedTables::new();
    tables.insert_mdb(sample_mdb(7, "mail01"));
    tables.insert_queue_entry(QueueEntry {
        job_id: JobId(7),
        ..Default::default()
    });
    tables.with_jid(|jid| {
        jid.insert_job(JidEntry {
            job_id: JobId(7),
            dir_alias: DirAlias::new("indir"),
            host_alias: HostAlias::new("mail01"),
            ..Default::default()
        })
    });

    let arenas = Arenas::open(dir.path()).unwrap();
    arenas.persist_from(&tables).unwrap();

    let reopened = Arenas::open(dir.path()).unwrap();
    let fresh = SharedTables::new();
    reopened.load_into(&fresh).unwrap();

    assert!(fresh.mdb_entry(JobId(7)).is_some());
    assert!(fresh.with_queue_entry(JobId(7), |_| ()).is_some());
    assert!(fresh.with_jid(|jid| jid.job(JobId(7)).is_some()));
}

#[test]
fn round_trips_directories() {
    let dir = tempdir().unwrap();
    let tables = SharedTables::new();
    tables.with_jid(|jid| {
        jid.insert_dir(DnbEntry {
            alias: DirAlias::new("indir"),
            path: "/var/afd/in".to_string(),
            job_count: 0,
        })
    });

    let arenas = Arenas::open(dir.path()).unwrap();
    arenas.persist_from(&tables).unwrap();

    let reopened = Arenas::open(dir.path()).unwrap();
    let fresh = SharedTables::new();
    reopened.load_into(&fresh).unwrap();

    assert!(fresh.with_jid(|jid| jid.dir(&DirAlias::new("indir")).is_some()));
}

#[test]
fn round_trips_directory_status() {
    let dir = tempdir().unwrap();
    let tables = SharedTables::new();
    tables.insert_fra(FraEntry::new("indir"));

    let arenas = Arenas::open(dir.path()).unwrap();
    arenas.persist_from(&tables).unwrap();

    let reopened = Arenas::open(dir.path()).unwrap();
    let fresh = SharedTables::new();
    reopened.load_into(&fresh).unwrap();

    assert!(fresh.fra_snapshot(&DirAlias::new("indir")).is_some());
}

#[test]
fn persist_from_grows_job_arenas_past_initial_capacity() {
    let dir = tempdir().unwrap();
    let tables = SharedTables::new();
    let job_id = (JOB_CAPACITY + 10) as u32;
    tables.insert_mdb(sample_mdb(job_id, "mail01"));
    tables.insert_queue_entry(QueueEntry {
        job_id: JobId(job_id),
        ..Default::default()
    });
    tables.with_jid(|jid| {
        jid.insert_job(JidEntry {
            job_id: JobId(job_id),
            dir_alias: DirAlias::new("indir"),
            host_alias: HostAlias::new("mail01"),
            ..Default::default()
        })
    });

    let arenas = Arenas::open(dir.path()).unwrap();
    arenas.persist_from(&tables).unwrap();
    assert!(arenas.mdb.capacity() > JOB_CAPACITY);

    let reopened = Arenas::open(dir.path()).unwrap();
    let fresh = SharedTables::new();
    reopened.load_into(&fresh).unwrap();
    assert!(fresh.mdb_entry(JobId(job_id)).is_some());
}

#[test]
fn reopening_without_new_writes_keeps_index_stable() {
    let dir = tempdir().unwrap();
    let tables = SharedTables::new();
    tables.insert_host(sample_host("mail01"));

    let arenas = Arenas::open(dir.path()).unwrap();
    arenas.persist_from(&tables).unwrap();
    arenas.persist_from(&tables).unwrap();

    let index_path = dir.path().join("hosts.index.json");
    let index: std::collections::HashMap<String, usize> =
        serde_json::from_slice(&std::fs::read(&index_path).unwrap()).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.get("mail01"), Some(&0));
}

#[test]
fn empty_tables_persist_and_reload_cleanly() {
    let dir = tempdir().unwrap();
    let tables = SharedTables::new();

    let arenas = Arenas::open(dir.path()).unwrap();
    arenas.persist_from(&tables).unwrap();

    let reopened = Arenas::open(dir.path()).unwrap();
    let fresh = SharedTables::new();
    reopened.load_into(&fresh).unwrap();

    assert!(fresh.host_aliases().is_empty());
}
