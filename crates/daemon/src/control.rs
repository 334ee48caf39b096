// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane fifo wire formats (spec §4.4, §6). Every payload here is
//! framed by a fixed byte width, never by a newline — bytes within one
//! `write` of at most `PIPE_BUF` are atomic, so a fixed-width record
//! never tears across a read.
//!
//! `retry_fifo` and `delete_jobs_fifo` additionally carry a `u32` length
//! prefix ahead of their variable-length payload, following the Design
//! Notes' "give each control fifo an explicit framed message type with a
//! version byte" — reusing the teacher's length-prefixed framing idiom
//! (`protocol_wire.rs`) for the fifo codec instead of a Unix-socket one.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },
    #[error("unknown command byte: {0:#x}")]
    UnknownCommand(u8),
}

/// Single-byte command codes accepted on `fd_cmd_fifo` (spec §6 "Control
/// CLI"). Unknown bytes are logged and skipped per spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    Shutdown,
    IsAlive,
    QuickStop,
    SaveStop,
    DeleteJobs,
    CheckDir,
}

impl CommandCode {
    pub const fn byte(self) -> u8 {
        match self {
            CommandCode::Shutdown => b'S',
            CommandCode::IsAlive => b'I',
            CommandCode::QuickStop => b'Q',
            CommandCode::SaveStop => b's',
            CommandCode::DeleteJobs => b'D',
            CommandCode::CheckDir => b'C',
        }
    }

    pub fn from_byte(b: u8) -> Result<Self, ControlError> {
        match b {
            b'S' => Ok(CommandCode::Shutdown),
            b'I' => Ok(CommandCode::IsAlive),
            b'Q' => Ok(CommandCode::QuickStop),
            b's' => Ok(CommandCode::SaveStop),
            b'D' => Ok(CommandCode::DeleteJobs),
            b'C' => Ok(CommandCode::CheckDir),
            other => Err(ControlError::UnknownCommand(other)),
        }
    }
}

/// Single-byte response codes written to `fd_resp_fifo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Ackn,
    ProcTerm,
}

impl ResponseCode {
    pub const fn byte(self) -> u8 {
        match self {
            ResponseCode::Ackn => b'A',
            ResponseCode::ProcTerm => b'T',
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'A' => Some(ResponseCode::Ackn),
            b'T' => Some(ResponseCode::ProcTerm),
            _ => None,
        }
    }
}

/// One `msg_fifo` record: `creation_time, job_id, unique_number,
/// priority` (spec §4.4). Fixed 17-byte layout: three big-endian `u64`
/// fields would be wasteful for `job_id`/`unique_number`; kept at their
/// natural widths instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgAnnouncement {
    pub creation_time: u64,
    pub job_id: u32,
    pub unique_number: u32,
    pub priority: u8,
}

pub const MSG_ANNOUNCEMENT_LEN: usize = 8 + 4 + 4 + 1;

impl MsgAnnouncement {
    pub fn to_bytes(self) -> [u8; MSG_ANNOUNCEMENT_LEN] {
        let mut buf = [0u8; MSG_ANNOUNCEMENT_LEN];
        buf[0..8].copy_from_slice(&self.creation_time.to_be_bytes());
        buf[8..12].copy_from_slice(&self.job_id.to_be_bytes());
        buf[12..16].copy_from_slice(&self.unique_number.to_be_bytes());
        buf[16] = self.priority;
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, ControlError> {
        if buf.len() != MSG_ANNOUNCEMENT_LEN {
            return Err(ControlError::ShortRead {
                expected: MSG_ANNOUNCEMENT_LEN,
                got: buf.len(),
            });
        }
        Ok(Self {
            creation_time: u64::from_be_bytes(buf[0..8].try_into().unwrap_or_default()),
            job_id: u32::from_be_bytes(buf[8..12].try_into().unwrap_or_default()),
            unique_number: u32::from_be_bytes(buf[12..16].try_into().unwrap_or_default()),
            priority: buf[16],
        })
    }
}

/// `sf_fin_fifo` carries exactly `sizeof(pid_t)` bytes: the worker task's
/// synthetic id (spec §4.4, §9 "async tasks rather than raw OS pids").
pub const PID_LEN: usize = 4;

pub fn encode_pid(pid: u32) -> [u8; PID_LEN] {
    pid.to_be_bytes()
}

pub fn decode_pid(buf: &[u8]) -> Result<u32, ControlError> {
    if buf.len() != PID_LEN {
        return Err(ControlError::ShortRead {
            expected: PID_LEN,
            got: buf.len(),
        });
    }
    Ok(u32::from_be_bytes(buf.try_into().unwrap_or_default()))
}

/// `retry_fifo`: a qb index, as a bare `u32` (spec §4.4).
pub fn encode_retry_index(index: u32) -> [u8; 4] {
    index.to_be_bytes()
}

pub fn decode_retry_index(buf: &[u8]) -> Result<u32, ControlError> {
    if buf.len() != 4 {
        return Err(ControlError::ShortRead {
            expected: 4,
            got: buf.len(),
        });
    }
    Ok(u32::from_be_bytes(buf.try_into().unwrap_or_default()))
}

/// `delete_jobs_fifo`: a length-prefixed list of job-ids (spec §4.4).
pub fn encode_delete_jobs(ids: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + ids.len() * 4);
    out.extend_from_slice(&(ids.len() as u32).to_be_bytes());
    for id in ids {
        out.extend_from_slice(&id.to_be_bytes());
    }
    out
}

pub fn decode_delete_jobs(buf: &[u8]) -> Result<Vec<u32>, ControlError> {
    if buf.len() < 4 {
        return Err(ControlError::ShortRead {
            expected: 4,
            got: buf.len(),
        });
    }
    let count = u32::from_be_bytes(buf[0..4].try_into().unwrap_or_default()) as usize;
    let expected = 4 + count * 4;
    if buf.len() != expected {
        return Err(ControlError::ShortRead {
            expected,
            got: buf.len(),
        });
    }
    let mut ids = Vec::with_capacity(count);
    for chunk in buf[4..].chunks_exact(4) {
        ids.push(u32::from_be_bytes(chunk.try_into().unwrap_or_default()));
    }
    Ok(ids)
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
