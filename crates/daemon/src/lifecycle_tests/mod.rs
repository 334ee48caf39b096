use super::*;
use afd_core::event::Event;
use afd_core::host::HostAlias;
use afd_core::message::JobId;
use std::time::Duration;

fn config_in(dir: &std::path::Path) -> Config {
    Config {
        work_dir: dir.to_path_buf(),
        fifo_dir: dir.join("fifodir"),
        arena_dir: dir.join("arenas"),
        messages_dir: dir.join("messages"),
        files_dir: dir.join("files"),
        archive_dir: dir.join("archive"),
        lock_path: dir.join("afd.pid"),
        log_path: dir.join("log").join("AFD_LOG"),
        wal_path: dir.join("wal").join("events.wal"),
        snapshot_path: dir.join("snapshot.json"),
        timer_check: Duration::from_secs(1),
        dir_check: Duration::from_secs(60),
        abort_timeout: Duration::from_secs(10),
        retry_interval: Duration::from_secs(30),
        max_fd_dir_check: 2048,
    }
}

#[tokio::test]
async fn startup_creates_fifos_and_an_empty_working_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let result = startup(&config).await.unwrap();

    assert!(config.fifo_dir.join(crate::fifos::MSG_FIFO).exists());
    assert!(result.daemon.tables.host_aliases().is_empty());
    assert!(config.lock_path.exists());
}

#[tokio::test]
async fn a_second_startup_against_the_same_work_dir_fails_to_acquire_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let first = startup(&config).await.unwrap();

    let second = startup(&config).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));

    // The first daemon's lock file must survive the second's failed attempt.
    assert!(config.lock_path.exists());
    drop(first);
}

#[tokio::test]
async fn process_event_is_reflected_in_the_ambient_rollup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let result = startup(&config).await.unwrap();

    result
        .daemon
        .process_event(Event::JobQueued {
            job_id: JobId::new(1),
            host_alias: HostAlias::new("mirror01"),
            msg_number: 1,
            files_to_send: 2,
        })
        .unwrap();

    assert!(result
        .daemon
        .ambient_state
        .lock()
        .host("mirror01")
        .is_some());
}

#[tokio::test]
async fn checkpoint_sync_persists_tables_back_into_their_arenas() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let result = startup(&config).await.unwrap();

    result.daemon.tables.insert_host(afd_core::test_support::test_host("mirror01", 1, 3));
    result.daemon.checkpoint_sync().unwrap();

    let reopened_arenas = arenas::Arenas::open(&config.arena_dir).unwrap();
    let fresh_tables = afd_engine::tables::SharedTables::new();
    reopened_arenas.load_into(&fresh_tables).unwrap();
    assert_eq!(fresh_tables.host_aliases(), vec![HostAlias::new("mirror01")]);
}

#[tokio::test]
async fn shutdown_removes_the_lock_file_so_a_restart_can_reacquire_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let result = startup(&config).await.unwrap();

    let mut daemon = result.daemon;
    daemon.shutdown().unwrap();
    assert!(!config.lock_path.exists());

    // A fresh startup against the same work dir now succeeds.
    startup(&config).await.unwrap();
}

#[tokio::test]
async fn restart_replays_wal_entries_written_after_the_last_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    {
        let result = startup(&config).await.unwrap();
        result
            .daemon
            .process_event(Event::JobQueued {
                job_id: JobId::new(1),
                host_alias: HostAlias::new("mirror01"),
                msg_number: 1,
                files_to_send: 1,
            })
            .unwrap();
        result.daemon.event_bus.flush().unwrap();
        // No checkpoint: the snapshot stays empty, so the next startup must
        // replay this event from the WAL to recover the rollup.
        std::mem::drop(result);
    }

    let restarted = startup(&config).await.unwrap();
    assert!(restarted
        .daemon
        .ambient_state
        .lock()
        .host("mirror01")
        .is_some());
}
