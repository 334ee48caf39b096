// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Protocol driver adapters for the Automatic File Distributor's transfer
//! workers (spec §4.6, §9) and the directory watcher that gives the
//! reconciler (spec §4.9) a responsive, event-driven fast path alongside
//! its periodic sweep.

pub mod transfer;
mod watcher;

pub use transfer::{
    ConnectTarget, FileTransferRequest, TransferAdapter, TransferError, TransferOutcome,
};
pub use watcher::{watch_directory, DirectoryEvent, WatchError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use transfer::{FakeTransferAdapter, TransferCall};
