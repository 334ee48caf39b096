//! Black-box specifications for the `afd-ctl` control CLI (spec §6).
//!
//! Each test drives the real `afd-ctl` binary as a subprocess against a
//! tempdir work directory, with a plain `std::fs`-based thread standing
//! in for the `afd` daemon side of the control-plane fifos.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::thread;

use assert_cmd::Command;
use tempfile::tempdir;

use afd_daemon::control::{decode_delete_jobs, CommandCode, ResponseCode};
use afd_daemon::fifos;

fn afd_ctl() -> Command {
    Command::cargo_bin("afd-ctl").expect("afd-ctl binary not built")
}

fn make_work_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let fifo_dir = dir.path().join("fifodir");
    fifos::ensure_all(&fifo_dir).expect("create fifos");
    (dir, fifo_dir)
}

fn open_rw(dir: &std::path::Path, name: &str) -> fs::File {
    fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(dir.join(name))
        .unwrap_or_else(|e| panic!("opening {name}: {e}"))
}

#[test]
fn is_alive_prints_ackn_on_response() {
    let (work_dir, fifo_dir) = make_work_dir();

    let server = thread::spawn({
        let fifo_dir = fifo_dir.clone();
        move || {
            let mut cmd = open_rw(&fifo_dir, "fd_cmd_fifo");
            let mut buf = [0u8; 1];
            cmd.read_exact(&mut buf).unwrap();
            assert_eq!(CommandCode::from_byte(buf[0]).unwrap(), CommandCode::IsAlive);

            let mut resp = open_rw(&fifo_dir, "fd_resp_fifo");
            resp.write_all(&[ResponseCode::Ackn.byte()]).unwrap();
        }
    });

    let output = afd_ctl()
        .arg("--work-dir")
        .arg(work_dir.path())
        .arg("is-alive")
        .output()
        .expect("run afd-ctl");

    assert!(output.status.success(), "{:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("ACKN"));

    server.join().unwrap();
}

#[test]
fn delete_jobs_sends_length_prefixed_ids() {
    let (work_dir, fifo_dir) = make_work_dir();

    let server = thread::spawn({
        let fifo_dir = fifo_dir.clone();
        move || {
            let mut cmd = open_rw(&fifo_dir, "fd_cmd_fifo");
            let mut cmd_buf = [0u8; 1];
            cmd.read_exact(&mut cmd_buf).unwrap();
            assert_eq!(
                CommandCode::from_byte(cmd_buf[0]).unwrap(),
                CommandCode::DeleteJobs
            );

            let mut ids_fifo = open_rw(&fifo_dir, "delete_jobs_fifo");
            let mut count_buf = [0u8; 4];
            ids_fifo.read_exact(&mut count_buf).unwrap();
            let count = u32::from_be_bytes(count_buf) as usize;
            let mut ids_buf = vec![0u8; count * 4];
            ids_fifo.read_exact(&mut ids_buf).unwrap();
            let mut full = count_buf.to_vec();
            full.extend_from_slice(&ids_buf);
            assert_eq!(decode_delete_jobs(&full).unwrap(), vec![101, 202]);

            let mut resp = open_rw(&fifo_dir, "fd_resp_fifo");
            resp.write_all(&[ResponseCode::Ackn.byte()]).unwrap();
        }
    });

    let output = afd_ctl()
        .arg("--work-dir")
        .arg(work_dir.path())
        .arg("delete-jobs")
        .arg("101")
        .arg("202")
        .output()
        .expect("run afd-ctl");

    assert!(output.status.success(), "{:?}", output);

    server.join().unwrap();
}

#[test]
fn shutdown_prints_proc_term() {
    let (work_dir, fifo_dir) = make_work_dir();

    let server = thread::spawn({
        let fifo_dir = fifo_dir.clone();
        move || {
            let mut cmd = open_rw(&fifo_dir, "fd_cmd_fifo");
            let mut buf = [0u8; 1];
            cmd.read_exact(&mut buf).unwrap();
            assert_eq!(CommandCode::from_byte(buf[0]).unwrap(), CommandCode::Shutdown);

            let mut resp = open_rw(&fifo_dir, "fd_resp_fifo");
            resp.write_all(&[ResponseCode::ProcTerm.byte()]).unwrap();
        }
    });

    let output = afd_ctl()
        .arg("--work-dir")
        .arg(work_dir.path())
        .arg("shutdown")
        .output()
        .expect("run afd-ctl");

    assert!(output.status.success(), "{:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("PROC_TERM"));

    server.join().unwrap();
}

#[test]
fn command_fails_with_timeout_when_no_daemon_is_running() {
    let (work_dir, _fifo_dir) = make_work_dir();

    let output = afd_ctl()
        .arg("--work-dir")
        .arg(work_dir.path())
        .arg("--timeout-ms")
        .arg("200")
        .arg("is-alive")
        .output()
        .expect("run afd-ctl");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("timed out"));
}

#[test]
fn status_lists_registered_hosts_from_the_arenas() {
    let dir = tempdir().expect("tempdir");
    let arena_dir = dir.path().join("arenas");

    let tables = afd_engine::tables::SharedTables::new();
    let host = afd_core::host::Host::new("mercury", 4, 10);
    tables.insert_host(host);

    let arenas = afd_daemon::lifecycle::arenas::Arenas::open(&arena_dir).expect("open arenas");
    arenas.persist_from(&tables).expect("persist arenas");

    let output = afd_ctl()
        .arg("--work-dir")
        .arg(dir.path())
        .arg("status")
        .output()
        .expect("run afd-ctl");

    assert!(output.status.success(), "{:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("mercury"));
}
