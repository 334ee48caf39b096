// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane fifo lifecycle (spec §4.4): "FIFOs ... must exist
//! before use; create with 0640 permissions if absent."
//!
//! Every fifo here is opened read-write rather than read-only or
//! write-only. That is the standard way to use a POSIX fifo from a
//! long-lived reader without blocking at `open()` until some writer
//! shows up (and without the reader seeing EOF the moment the last
//! writer disconnects) — the descriptor itself has both ends, so the
//! fifo never drains to "no writers".

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use std::io;
use std::path::Path;
use tokio::fs::File;

/// Named pipes the FD core and its collaborators rendezvous through
/// (spec §4.4 table).
pub const MSG_FIFO: &str = "msg_fifo";
pub const SF_FIN_FIFO: &str = "sf_fin_fifo";
pub const FD_CMD_FIFO: &str = "fd_cmd_fifo";
pub const FD_RESP_FIFO: &str = "fd_resp_fifo";
pub const FD_WAKE_UP_FIFO: &str = "fd_wake_up_fifo";
pub const RETRY_FIFO: &str = "retry_fifo";
pub const DELETE_JOBS_FIFO: &str = "delete_jobs_fifo";
pub const TRANS_DEBUG_FIFO: &str = "trans_debug_fifo";

pub const ALL_FIFOS: &[&str] = &[
    MSG_FIFO,
    SF_FIN_FIFO,
    FD_CMD_FIFO,
    FD_RESP_FIFO,
    FD_WAKE_UP_FIFO,
    RETRY_FIFO,
    DELETE_JOBS_FIFO,
    TRANS_DEBUG_FIFO,
];

/// Creates `fifo_dir/name` with mode 0640 if it does not already exist.
/// Idempotent: an existing fifo (from a prior run) is left alone.
pub fn ensure_fifo(fifo_dir: &Path, name: &str) -> io::Result<()> {
    std::fs::create_dir_all(fifo_dir)?;
    let path = fifo_dir.join(name);
    match mkfifo(&path, Mode::from_bits_truncate(0o640)) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::EEXIST) => Ok(()),
        Err(e) => Err(io::Error::from(e)),
    }
}

/// Creates every control-plane fifo under `fifo_dir`.
pub fn ensure_all(fifo_dir: &Path) -> io::Result<()> {
    for name in ALL_FIFOS {
        ensure_fifo(fifo_dir, name)?;
    }
    Ok(())
}

/// Opens `fifo_dir/name` read-write, for use as either a reader or a
/// writer (the fifo never drains to zero writers as long as this handle
/// is held open).
pub async fn open_rw(fifo_dir: &Path, name: &str) -> io::Result<File> {
    let path = fifo_dir.join(name);
    tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .await
}

#[cfg(test)]
#[path = "fifos_tests.rs"]
mod tests;
