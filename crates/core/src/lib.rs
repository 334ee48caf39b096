// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! afd-core: shared data types for the Automatic File Distributor.
//!
//! Holds the entry types that make up the FD's shared-state areas (FSA,
//! FRA, MDB, QB, JID/DNB, archive keys, append lists) and the afd_mon remote
//! monitor's MSA, independent of how those areas are persisted or wired
//! together. [`crate::storage`](https://docs.rs/afd-storage) owns the
//! memory-mapped arena these types live inside; this crate owns their
//! shape and invariants only.

pub mod append;
pub mod archive;
pub mod clock;
pub mod event;
pub mod exit_code;
pub mod fra;
pub mod id;
pub mod jid;
pub mod message;
pub mod msa;
pub mod host;
pub mod queue;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use append::AppendList;
pub use archive::{ArchiveError, ArchiveKey};
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::Event;
pub use exit_code::ExitCode;
pub use fra::{DirStatus, FraEntry, FraError};
pub use host::{ConnectStatus, Host, HostAlias, HostError, HostStatus, HostToggle, JobStatusSlot};
pub use id::{IdGen, ShortId, UuidIdGen};
pub use jid::{DirAlias, DnbEntry, JidEntry, JidTable};
pub use message::{JobId, MdbEntry, Scheme};
pub use msa::{AfdAlias, DayCounters, LogHistory, MsaEntry};
pub use queue::{QueueEntry, PID_PENDING, PID_REMOVED};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
