// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the `fd_cmd_fifo`/`fd_resp_fifo` client, exercised against
//! real fifos in a tempdir with a task standing in for the daemon side.

use std::time::Duration;

use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use afd_daemon::control::{decode_delete_jobs, CommandCode, ResponseCode};
use afd_daemon::fifos::{self, DELETE_JOBS_FIFO, FD_CMD_FIFO, FD_RESP_FIFO};

use super::{ClientError, FdClient};

const TEST_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn command_round_trip_returns_daemon_response() {
    let dir = tempdir().unwrap();
    fifos::ensure_all(dir.path()).unwrap();
    let fifo_dir = dir.path().to_path_buf();

    let server = tokio::spawn({
        let fifo_dir = fifo_dir.clone();
        async move {
            let mut cmd_fifo = fifos::open_rw(&fifo_dir, FD_CMD_FIFO).await.unwrap();
            let mut buf = [0u8; 1];
            cmd_fifo.read_exact(&mut buf).await.unwrap();
            assert_eq!(CommandCode::from_byte(buf[0]).unwrap(), CommandCode::IsAlive);

            let mut resp_fifo = fifos::open_rw(&fifo_dir, FD_RESP_FIFO).await.unwrap();
            resp_fifo.write_all(&[ResponseCode::Ackn.byte()]).await.unwrap();
        }
    });

    let client = FdClient::new(&fifo_dir);
    let response = client.command(CommandCode::IsAlive, TEST_TIMEOUT).await.unwrap();
    assert_eq!(response, ResponseCode::Ackn);

    server.await.unwrap();
}

#[tokio::test]
async fn delete_jobs_sends_ids_then_waits_for_ack() {
    let dir = tempdir().unwrap();
    fifos::ensure_all(dir.path()).unwrap();
    let fifo_dir = dir.path().to_path_buf();

    let server = tokio::spawn({
        let fifo_dir = fifo_dir.clone();
        async move {
            let mut cmd_fifo = fifos::open_rw(&fifo_dir, FD_CMD_FIFO).await.unwrap();
            let mut cmd_buf = [0u8; 1];
            cmd_fifo.read_exact(&mut cmd_buf).await.unwrap();
            assert_eq!(
                CommandCode::from_byte(cmd_buf[0]).unwrap(),
                CommandCode::DeleteJobs
            );

            let mut ids_fifo = fifos::open_rw(&fifo_dir, DELETE_JOBS_FIFO).await.unwrap();
            let mut count_buf = [0u8; 4];
            ids_fifo.read_exact(&mut count_buf).await.unwrap();
            let count = u32::from_be_bytes(count_buf) as usize;
            let mut ids_buf = vec![0u8; count * 4];
            ids_fifo.read_exact(&mut ids_buf).await.unwrap();
            let mut full = count_buf.to_vec();
            full.extend_from_slice(&ids_buf);
            assert_eq!(decode_delete_jobs(&full).unwrap(), vec![7, 9]);

            let mut resp_fifo = fifos::open_rw(&fifo_dir, FD_RESP_FIFO).await.unwrap();
            resp_fifo.write_all(&[ResponseCode::Ackn.byte()]).await.unwrap();
        }
    });

    let client = FdClient::new(&fifo_dir);
    let response = client.delete_jobs(&[7, 9], TEST_TIMEOUT).await.unwrap();
    assert_eq!(response, ResponseCode::Ackn);

    server.await.unwrap();
}

#[tokio::test]
async fn shutdown_waits_for_proc_term() {
    let dir = tempdir().unwrap();
    fifos::ensure_all(dir.path()).unwrap();
    let fifo_dir = dir.path().to_path_buf();

    let server = tokio::spawn({
        let fifo_dir = fifo_dir.clone();
        async move {
            let mut cmd_fifo = fifos::open_rw(&fifo_dir, FD_CMD_FIFO).await.unwrap();
            let mut buf = [0u8; 1];
            cmd_fifo.read_exact(&mut buf).await.unwrap();
            assert_eq!(CommandCode::from_byte(buf[0]).unwrap(), CommandCode::Shutdown);

            let mut resp_fifo = fifos::open_rw(&fifo_dir, FD_RESP_FIFO).await.unwrap();
            resp_fifo.write_all(&[ResponseCode::ProcTerm.byte()]).await.unwrap();
        }
    });

    let client = FdClient::new(&fifo_dir);
    let response = client
        .command(CommandCode::Shutdown, TEST_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(response, ResponseCode::ProcTerm);

    server.await.unwrap();
}

#[tokio::test]
async fn command_times_out_when_no_daemon_is_listening() {
    let dir = tempdir().unwrap();
    fifos::ensure_all(dir.path()).unwrap();

    // Open our own read end so the fifo open() in FdClient::command does
    // not block on the cmd fifo, then never supply a response — the
    // response read should time out instead of hanging forever.
    let _keep_open = fifos::open_rw(dir.path(), FD_CMD_FIFO).await.unwrap();

    let client = FdClient::new(dir.path());
    let result = client
        .command(CommandCode::IsAlive, Duration::from_millis(200))
        .await;
    assert!(matches!(result, Err(ClientError::Timeout { .. })));
}
