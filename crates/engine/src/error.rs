// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level error type the engine's orchestration modules return. Each
//! module also keeps its own narrower error enum (`ArchiveFileError`,
//! `AppendError`, ...); this is the union `afd-daemon` matches on at the
//! call sites that drive the engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Host(#[from] afd_core::host::HostError),
    #[error(transparent)]
    Archive(#[from] crate::archive::ArchiveFileError),
    #[error(transparent)]
    Append(#[from] crate::append::AppendError),
    #[error(transparent)]
    Message(#[from] afd_runbook::MessageError),
    #[error(transparent)]
    Transfer(#[from] afd_adapters::TransferError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
