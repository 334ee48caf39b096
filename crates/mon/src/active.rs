// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MON_ACTIVE` bookkeeping (spec §4.10): "a `MON_ACTIVE` file on disk
//! records the supervisor pid, its two log pids, and all worker pids; on
//! startup, if the file exists, the previous supervisor is probed (send
//! `IS_ALIVE` on the command fifo; wait for `ACKN`). If it does not
//! answer within 10s, all pids listed are SIGINT-killed to clear stale
//! workers."

use std::io;
use std::path::Path;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};

use crate::control::{self, CommandCode, ResponseCode};
use crate::env;

pub const MON_ACTIVE_FILE: &str = "AFD_MON_ACTIVE";

/// Every pid a running supervisor is responsible for, snapshotted to
/// disk so a restart can find and probe (or clear) a stale instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveRecord {
    pub supervisor_pid: u32,
    pub log_pids: [u32; 2],
    pub worker_pids: Vec<u32>,
}

pub fn write_active(path: &Path, record: &ActiveRecord) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(record)?;
    std::fs::write(path, bytes)
}

pub fn read_active(path: &Path) -> io::Result<Option<ActiveRecord>> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Sends `IS_ALIVE` on `mon_cmd_fifo` and waits up to
/// [`env::probe_timeout`] for an `ACKN` reply on `mon_resp_fifo`.
async fn probe_is_alive(fifo_dir: &Path) -> bool {
    let Ok(mut cmd) = control::open_rw(fifo_dir, control::MON_CMD_FIFO).await else {
        return false;
    };
    let Ok(mut resp) = control::open_rw(fifo_dir, control::MON_RESP_FIFO).await else {
        return false;
    };
    if cmd.write_all(&[CommandCode::IsAlive.byte()]).await.is_err() {
        return false;
    }

    let read = tokio::time::timeout(env::probe_timeout(), async {
        let mut buf = [0u8; 1];
        resp.read_exact(&mut buf).await.map(|_| buf[0])
    })
    .await;

    matches!(read, Ok(Ok(b)) if ResponseCode::from_byte(b) == Some(ResponseCode::Ackn))
}

fn kill_pid(pid: u32) {
    match signal::kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
        Ok(()) => info!(pid, "sigint'd stale afd_mon pid"),
        Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(pid, error = %e, "failed to sigint stale afd_mon pid"),
    }
}

/// Probes a previous instance recorded in `MON_ACTIVE`, if any, and
/// SIGINTs every pid it lists when the probe doesn't answer in time.
/// A missing `MON_ACTIVE` file is not an error: there is simply no prior
/// instance to clear.
pub async fn probe_and_clear_stale(fifo_dir: &Path, active_path: &Path) -> io::Result<()> {
    let Some(record) = read_active(active_path)? else {
        return Ok(());
    };

    control::ensure_all(fifo_dir)?;
    if probe_is_alive(fifo_dir).await {
        info!("previous afd_mon supervisor answered IS_ALIVE, leaving it running");
        return Ok(());
    }

    warn!(
        supervisor_pid = record.supervisor_pid,
        "previous afd_mon supervisor did not answer within {:?}, clearing stale pids",
        env::probe_timeout()
    );
    kill_pid(record.supervisor_pid);
    for pid in record.log_pids {
        if pid != 0 {
            kill_pid(pid);
        }
    }
    for pid in record.worker_pids {
        kill_pid(pid);
    }
    let _ = std::fs::remove_file(active_path);
    Ok(())
}

#[cfg(test)]
#[path = "active_tests.rs"]
mod tests;
