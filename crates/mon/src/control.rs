// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The monitor's own command/response fifo pair (spec §4.10): a stale
//! supervisor is probed by sending `IS_ALIVE` and waiting for `ACKN`
//! before its recorded pids are treated as dead. Mirrors `afd-daemon`'s
//! `fd_cmd_fifo`/`fd_resp_fifo` byte protocol, scoped down to the one
//! command the monitor needs to answer.

use std::io;
use std::path::Path;

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use thiserror::Error;
use tokio::fs::File;

pub const MON_CMD_FIFO: &str = "mon_cmd_fifo";
pub const MON_RESP_FIFO: &str = "mon_resp_fifo";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },
    #[error("unknown command byte: {0:#x}")]
    UnknownCommand(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    IsAlive,
    Shutdown,
}

impl CommandCode {
    pub const fn byte(self) -> u8 {
        match self {
            CommandCode::IsAlive => b'I',
            CommandCode::Shutdown => b'S',
        }
    }

    pub fn from_byte(b: u8) -> Result<Self, ControlError> {
        match b {
            b'I' => Ok(CommandCode::IsAlive),
            b'S' => Ok(CommandCode::Shutdown),
            other => Err(ControlError::UnknownCommand(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Ackn,
}

impl ResponseCode {
    pub const fn byte(self) -> u8 {
        match self {
            ResponseCode::Ackn => b'A',
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'A' => Some(ResponseCode::Ackn),
            _ => None,
        }
    }
}

/// Creates `fifo_dir/{mon_cmd_fifo,mon_resp_fifo}` with mode 0640 if
/// absent. Idempotent.
pub fn ensure_all(fifo_dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(fifo_dir)?;
    for name in [MON_CMD_FIFO, MON_RESP_FIFO] {
        let path = fifo_dir.join(name);
        match mkfifo(&path, Mode::from_bits_truncate(0o640)) {
            Ok(()) => {}
            Err(nix::errno::Errno::EEXIST) => {}
            Err(e) => return Err(io::Error::from(e)),
        }
    }
    Ok(())
}

/// Opens `fifo_dir/name` read-write, so the fifo never drains to zero
/// writers while this handle is held.
pub async fn open_rw(fifo_dir: &Path, name: &str) -> io::Result<File> {
    tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(fifo_dir.join(name))
        .await
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
