// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-loop-backoff supervision of one polling task per configured
//! remote AFD (spec §4.10): "the supervisor watches worker exits ...; if
//! a worker exits more than 20 times within 5 seconds of its last start,
//! it gives up for that AFD, else it restarts with an exponential count
//! reset." Workers here are tokio tasks rather than forked processes
//! (spec §9 "async tasks rather than raw OS pids"), generalizing
//! `afd-daemon`'s in-process worker model from one engine to N
//! independently-polled remotes.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::time::sleep;
use tracing::{error, info, warn};

use afd_core::msa::MsaEntry;
use afd_runbook::mon_config::MonConfigEntry;

use crate::client;
use crate::env;

/// Tracks a single remote AFD's recent restart history and decides
/// whether another restart is still permitted.
struct CrashLoopGuard {
    window: Duration,
    max_exits: u32,
    recent_exits: VecDeque<Instant>,
}

impl CrashLoopGuard {
    fn new(window: Duration, max_exits: u32) -> Self {
        Self {
            window,
            max_exits,
            recent_exits: VecDeque::new(),
        }
    }

    /// Records an exit and reports whether the worker may restart.
    /// "Exponential count reset": once a gap larger than the window
    /// passes between exits, the history before that gap no longer
    /// counts toward the threshold.
    fn record_exit_and_check(&mut self, now: Instant) -> bool {
        if let Some(&last) = self.recent_exits.back() {
            if now.duration_since(last) > self.window {
                self.recent_exits.clear();
            }
        }
        self.recent_exits.push_back(now);
        while let Some(&front) = self.recent_exits.front() {
            if now.duration_since(front) > self.window {
                self.recent_exits.pop_front();
            } else {
                break;
            }
        }
        self.recent_exits.len() as u32 <= self.max_exits
    }
}

/// Polls one remote AFD forever, reconnecting after [`env::retry_interval`]
/// on disconnect, until the crash-loop guard gives up or `shutdown` fires.
pub async fn supervise_one(
    config: MonConfigEntry,
    entry: Arc<Mutex<MsaEntry>>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut guard = CrashLoopGuard::new(env::crash_loop_window(), env::crash_loop_max_exits());
    let (host, port) = (config.hostnames.0.clone(), config.ports.0);

    loop {
        if *shutdown.borrow() {
            return;
        }

        let started_at = Instant::now();
        tokio::select! {
            result = client::poll_once(&host, port, &entry) => {
                if let Err(e) = result {
                    warn!(alias = %config.alias, error = %e, "afdd poll attempt failed");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }

        if *shutdown.borrow() {
            return;
        }

        if !guard.record_exit_and_check(Instant::now()) {
            error!(
                alias = %config.alias,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "giving up on remote AFD after repeated crash-loop exits"
            );
            return;
        }

        info!(alias = %config.alias, retry_in = ?env::retry_interval(), "reconnecting to remote afd");
        tokio::select! {
            _ = sleep(env::retry_interval()) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
