// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of transfer worker exit codes (spec §4.6, §6).
//!
//! Numeric values for `TRANSFER_SUCCESS`, `SYNTAX_ERROR`, `NO_FILES_TO_SEND`,
//! and `STILL_FILES_TO_SEND` are fixed by the spec; the remaining
//! transport/local error codes are only specified as "a closed set … each
//! with a stable numeric value" without naming the values, so this module
//! assigns them sequentially starting at 1. That assignment is an Open
//! Question resolution recorded in the grounding ledger.

/// Exit status of a transfer worker process, reported to the supervisor
/// over the done-fifo / process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    TransferSuccess = 0,
    ConnectError = 1,
    UserError = 2,
    PasswordError = 3,
    TypeError = 4,
    ListError = 5,
    OpenRemoteError = 6,
    WriteRemoteError = 7,
    MoveRemoteError = 8,
    ReadLocalError = 9,
    OpenLocalError = 10,
    TimeoutError = 11,
    StatError = 12,
    MoveError = 13,
    RenameError = 14,
    WriteLockError = 15,
    RemoveLockfileError = 16,
    GotKilled = 17,
    SyntaxError = 60,
    NoFilesToSend = 61,
    StillFilesToSend = 62,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => ExitCode::TransferSuccess,
            1 => ExitCode::ConnectError,
            2 => ExitCode::UserError,
            3 => ExitCode::PasswordError,
            4 => ExitCode::TypeError,
            5 => ExitCode::ListError,
            6 => ExitCode::OpenRemoteError,
            7 => ExitCode::WriteRemoteError,
            8 => ExitCode::MoveRemoteError,
            9 => ExitCode::ReadLocalError,
            10 => ExitCode::OpenLocalError,
            11 => ExitCode::TimeoutError,
            12 => ExitCode::StatError,
            13 => ExitCode::MoveError,
            14 => ExitCode::RenameError,
            15 => ExitCode::WriteLockError,
            16 => ExitCode::RemoveLockfileError,
            17 => ExitCode::GotKilled,
            60 => ExitCode::SyntaxError,
            61 => ExitCode::NoFilesToSend,
            62 => ExitCode::StillFilesToSend,
            _ => return None,
        })
    }

    /// Whether this outcome should be treated as a transient transport
    /// failure that bumps a host's `error_counter` and is retried, as
    /// opposed to `TransferSuccess`/`StillFilesToSend`/`NoFilesToSend`
    /// which have their own dedicated outcome handling (spec §4.5).
    pub fn is_transport_error(self) -> bool {
        !matches!(
            self,
            ExitCode::TransferSuccess
                | ExitCode::StillFilesToSend
                | ExitCode::NoFilesToSend
        )
    }
}

#[cfg(test)]
#[path = "exit_code_tests.rs"]
mod tests;
