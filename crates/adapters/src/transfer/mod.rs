// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transfer task abstraction (spec §9 "Inheritance / polymorphism"):
//! a single capability set `{connect, send_file, close, supports_burst,
//! supports_append}` that every worker protocol (FTP, SMTP, LOC, WMO,
//! MAP) implements, dispatched on `mdb.type` rather than four near-copies
//! of a shared skeleton.

mod ftp;
mod loc;
mod map;
mod smtp;
mod wmo;

pub use ftp::FtpAdapter;
pub use loc::LocAdapter;
pub use map::{MapAdapter, MapClient};
pub use smtp::SmtpAdapter;
pub use wmo::{MessageType, WmoAdapter};

use afd_core::exit_code::ExitCode;
use afd_runbook::{RecipientUrl, TransferType};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::time::Duration;

/// Resolved connection parameters for one worker session, derived from a
/// job's [`RecipientUrl`] plus host configuration not carried in the URL
/// itself (spec §4.6 `eval_recipient`).
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub passive_mode: bool,
    pub transfer_type: Option<TransferType>,
    pub connect_timeout: Duration,
    pub transfer_timeout: Duration,
}

impl ConnectTarget {
    pub fn from_recipient(url: &RecipientUrl, connect_timeout: Duration, transfer_timeout: Duration) -> Self {
        Self {
            host: url.host.clone(),
            port: url.port,
            user: url.user.clone(),
            password: url.password.clone(),
            passive_mode: true,
            transfer_type: url.transfer_type,
            connect_timeout,
            transfer_timeout,
        }
    }
}

/// One file to transfer within an open session.
#[derive(Debug, Clone)]
pub struct FileTransferRequest {
    pub local_path: PathBuf,
    /// Name (or, for SMTP, subject-derived identifier) the remote side
    /// should see, after any `trans_rename` rule has been applied.
    pub remote_name: String,
    pub size: u64,
    /// Byte offset to resume from, populated from the append/restart log
    /// on a retry (spec §4.8, scenario S5).
    pub resume_offset: u64,
}

/// Outcome of one `send_file` call: bytes actually written this call
/// (from `resume_offset` onward), for the caller to add to `file_size_done`
/// / `bytes_send` under the FSA slot's region lock (spec §4.6 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub bytes_sent: u64,
}

/// Errors a transfer adapter can raise, already categorised by the exit
/// code the supervisor will see on worker exit (spec §4.6, §6, §7).
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("user/login failed: {0}")]
    User(String),
    #[error("password rejected: {0}")]
    Password(String),
    #[error("transfer type negotiation failed: {0}")]
    Type(String),
    #[error("directory listing failed: {0}")]
    List(String),
    #[error("remote open failed: {0}")]
    OpenRemote(String),
    #[error("remote write failed: {0}")]
    WriteRemote(String),
    #[error("remote rename/move failed: {0}")]
    MoveRemote(String),
    #[error("local read failed: {0}")]
    ReadLocal(#[from] std::io::Error),
    #[error("timed out waiting on {0}")]
    Timeout(String),
}

impl TransferError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            TransferError::Connect(_) => ExitCode::ConnectError,
            TransferError::User(_) => ExitCode::UserError,
            TransferError::Password(_) => ExitCode::PasswordError,
            TransferError::Type(_) => ExitCode::TypeError,
            TransferError::List(_) => ExitCode::ListError,
            TransferError::OpenRemote(_) => ExitCode::OpenRemoteError,
            TransferError::WriteRemote(_) => ExitCode::WriteRemoteError,
            TransferError::MoveRemote(_) => ExitCode::MoveRemoteError,
            TransferError::ReadLocal(_) => ExitCode::ReadLocalError,
            TransferError::Timeout(_) => ExitCode::TimeoutError,
        }
    }
}

/// Per-byte progress callback, invoked as data is written so the caller
/// can update `file_size_done`/`bytes_send` under the FSA slot's region
/// lock without waiting for the whole file (spec §4.6 step 4).
pub type ProgressFn<'a> = dyn FnMut(u64) + Send + 'a;

/// The capability set every protocol driver implements (spec §9).
/// `connect`/`close` bracket a session that may carry more than one
/// `send_file` call when burst mode is in effect (spec §4.5).
#[async_trait]
pub trait TransferAdapter: Send + Sync {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), TransferError>;

    async fn send_file(
        &mut self,
        request: &FileTransferRequest,
        progress: &mut ProgressFn<'_>,
    ) -> Result<TransferOutcome, TransferError>;

    async fn close(&mut self) -> Result<(), TransferError>;

    /// Whether this protocol may reuse an open connection for a
    /// newly-arrived job on the same host (spec §4.5 "Burst mode").
    fn supports_burst(&self) -> bool;

    /// Whether this protocol can resume a partially-sent file from the
    /// append/restart log rather than retransmitting from byte 0
    /// (spec §4.8).
    fn supports_append(&self) -> bool;
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransferAdapter, TransferCall};
