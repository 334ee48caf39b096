// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The File Distributor daemon (spec §2 C4/C5/C9): owns the
//! control-plane fifos, the scheduler/supervisor event loop, and the
//! background reconciler sweep, built on top of `afd-engine`'s pure
//! decision logic and `afd-storage`'s shared-state arenas.
//!
//! Split into a library (exercised by the test suite) and the `afd`
//! binary (`main.rs`) so the event loop's pieces can be tested without a
//! real process and real fifos.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod control;
pub mod dispatch;
pub mod env;
pub mod events;
pub mod fifos;
pub mod lifecycle;

pub use control::{CommandCode, ResponseCode};
pub use lifecycle::{Config, Daemon, LifecycleError, StartupResult};
