// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the remote monitor crate.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("could not determine work directory")]
    NoWorkDir,
}

/// Resolve the work directory the monitor's MSA arena, fifos, and
/// `MON_ACTIVE` file are rooted under: `AFD_MON_WORK_DIR` >
/// `XDG_STATE_HOME/afd_mon` > `~/.local/state/afd_mon`.
pub fn work_dir() -> Result<PathBuf, EnvError> {
    if let Ok(dir) = std::env::var("AFD_MON_WORK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("afd_mon"));
    }
    let home = std::env::var("HOME").map_err(|_| EnvError::NoWorkDir)?;
    Ok(PathBuf::from(home).join(".local/state/afd_mon"))
}

/// Path to the `AFD_MON_CONFIG` file listing the remote AFDs to poll.
/// Defaults to `<work_dir>/AFD_MON_CONFIG`.
pub fn mon_config_path(work_dir: &std::path::Path) -> PathBuf {
    std::env::var("AFD_MON_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| work_dir.join("AFD_MON_CONFIG"))
}

/// Reconnect backoff after a worker loses its AFDD connection, default 30s.
pub fn retry_interval() -> Duration {
    std::env::var("AFD_MON_RETRY_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Ring-buffer depth for each MSA log-history category, default 10.
pub fn max_log_history() -> usize {
    std::env::var("AFD_MON_MAX_LOG_HISTORY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10)
}

/// Retention window in days for MSA day counters, default 7.
pub fn storage_time_days() -> usize {
    std::env::var("AFD_MON_STORAGE_TIME_DAYS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(7)
}

/// Crash-loop window (spec §4.10 "more than 20 exits within 5 seconds of
/// its last start"), default 5s.
pub fn crash_loop_window() -> Duration {
    std::env::var("AFD_MON_CRASH_LOOP_WINDOW_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Crash-loop exit threshold within [`crash_loop_window`], default 20.
pub fn crash_loop_max_exits() -> u32 {
    std::env::var("AFD_MON_CRASH_LOOP_MAX_EXITS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(20)
}

/// How long the startup probe waits for a stale supervisor's ACKN before
/// treating its pids as dead (spec §4.10 "wait 10s"), default 10s.
pub fn probe_timeout() -> Duration {
    std::env::var("AFD_MON_PROBE_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}
