// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin client over the control-plane fifos (spec §4.4, §6): writes a
//! single command byte to `fd_cmd_fifo` (and, for [`CommandCode::DeleteJobs`],
//! the job-id list to `delete_jobs_fifo`), then waits for the matching
//! `fd_resp_fifo` reply.
//!
//! Every fifo open and read/write is wrapped in [`tokio::time::timeout`]:
//! a POSIX fifo `open()` blocks until a peer opens the other end, which
//! would otherwise hang forever against a work directory with no running
//! daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use afd_daemon::control::{encode_delete_jobs, CommandCode, ResponseCode};
use afd_daemon::fifos::{open_rw, DELETE_JOBS_FIFO, FD_CMD_FIFO, FD_RESP_FIFO};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("timed out waiting on {fifo} after {timeout:?} (is afd running against this work dir?)")]
    Timeout { fifo: &'static str, timeout: Duration },
    #[error("I/O error on {fifo}: {source}")]
    Io {
        fifo: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("daemon sent an unrecognized response byte: {0:#x}")]
    UnknownResponse(u8),
}

/// A handle onto one daemon's fifo directory, used for one request at a
/// time. Holds no state of its own between calls.
pub struct FdClient {
    fifo_dir: PathBuf,
}

impl FdClient {
    pub fn new(fifo_dir: impl Into<PathBuf>) -> Self {
        Self {
            fifo_dir: fifo_dir.into(),
        }
    }

    pub fn fifo_dir(&self) -> &Path {
        &self.fifo_dir
    }

    /// Sends a single-byte command and waits for the daemon's reply.
    /// `Shutdown`/`QuickStop`/`SaveStop` only reply once the daemon has
    /// finished draining in-flight transfers, so `timeout` should be
    /// generous for those (spec §5 `ABORT_TIMEOUT`-scale grace periods).
    pub async fn command(
        &self,
        code: CommandCode,
        timeout: Duration,
    ) -> Result<ResponseCode, ClientError> {
        self.write_command(code, timeout).await?;
        self.read_response(timeout).await
    }

    /// Sends [`CommandCode::DeleteJobs`] followed by the job-id list on
    /// `delete_jobs_fifo` (spec §4.4), then waits for the acknowledgement.
    pub async fn delete_jobs(
        &self,
        job_ids: &[u32],
        timeout: Duration,
    ) -> Result<ResponseCode, ClientError> {
        self.write_command(CommandCode::DeleteJobs, timeout).await?;

        let payload = encode_delete_jobs(job_ids);
        let mut fifo = open_with_timeout(&self.fifo_dir, DELETE_JOBS_FIFO, timeout).await?;
        tokio::time::timeout(timeout, fifo.write_all(&payload))
            .await
            .map_err(|_| ClientError::Timeout {
                fifo: DELETE_JOBS_FIFO,
                timeout,
            })?
            .map_err(|source| ClientError::Io {
                fifo: DELETE_JOBS_FIFO,
                source,
            })?;

        self.read_response(timeout).await
    }

    async fn write_command(
        &self,
        code: CommandCode,
        timeout: Duration,
    ) -> Result<(), ClientError> {
        let mut fifo = open_with_timeout(&self.fifo_dir, FD_CMD_FIFO, timeout).await?;
        tokio::time::timeout(timeout, fifo.write_all(&[code.byte()]))
            .await
            .map_err(|_| ClientError::Timeout {
                fifo: FD_CMD_FIFO,
                timeout,
            })?
            .map_err(|source| ClientError::Io {
                fifo: FD_CMD_FIFO,
                source,
            })
    }

    async fn read_response(&self, timeout: Duration) -> Result<ResponseCode, ClientError> {
        let mut fifo = open_with_timeout(&self.fifo_dir, FD_RESP_FIFO, timeout).await?;
        let mut buf = [0u8; 1];
        tokio::time::timeout(timeout, fifo.read_exact(&mut buf))
            .await
            .map_err(|_| ClientError::Timeout {
                fifo: FD_RESP_FIFO,
                timeout,
            })?
            .map_err(|source| ClientError::Io {
                fifo: FD_RESP_FIFO,
                source,
            })?;
        ResponseCode::from_byte(buf[0]).ok_or(ClientError::UnknownResponse(buf[0]))
    }
}

async fn open_with_timeout(
    fifo_dir: &Path,
    name: &'static str,
    timeout: Duration,
) -> Result<tokio::fs::File, ClientError> {
    tokio::time::timeout(timeout, open_rw(fifo_dir, name))
        .await
        .map_err(|_| ClientError::Timeout { fifo: name, timeout })?
        .map_err(|source| ClientError::Io { fifo: name, source })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
