// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve the work directory every on-disk path in spec §6 is rooted
/// under: `AFD_WORK_DIR` > `XDG_STATE_HOME/afd` > `~/.local/state/afd`.
pub fn work_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("AFD_WORK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("afd"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoWorkDir)?;
    Ok(PathBuf::from(home).join(".local/state/afd"))
}

/// Scheduler tick interval override (spec §5 "bounded timeout"), default
/// 1 second.
pub fn timer_check_ms() -> Option<Duration> {
    std::env::var("AFD_TIMER_CHECK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Reconciler sweep interval override (spec §4.9 `DIR_CHECK_TIME`),
/// default 60 seconds.
pub fn dir_check_secs() -> Option<u64> {
    std::env::var("AFD_DIR_CHECK_TIME")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
}

/// Administrative shutdown grace period override (spec §5
/// `ABORT_TIMEOUT`), default 10 seconds.
pub fn abort_timeout() -> Option<Duration> {
    std::env::var("AFD_ABORT_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Host-error-backoff retry interval override (spec §4.5
/// "host-error-backoff"), default 30 seconds.
pub fn retry_interval_secs() -> Option<u64> {
    std::env::var("AFD_RETRY_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
}

/// Per-pass directory-count throttle for the reconciler's filesystem
/// sweep (spec §4.9 item 1 `MAX_FD_DIR_CHECK`), default 2048.
pub fn max_fd_dir_check() -> Option<usize> {
    std::env::var("AFD_MAX_FD_DIR_CHECK")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
}
