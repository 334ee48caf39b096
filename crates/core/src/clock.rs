// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time abstraction threaded through the scheduler, archive engine, and
//! reconciler so that age-limit, backoff, and bucket-time logic can be
//! driven deterministically in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Abstraction over wall-clock time.
///
/// Every component that reasons about elapsed time (age-limit expiry,
/// archive bucket time, host error backoff, timer firing) takes a `Clock`
/// rather than calling `Instant::now()`/`SystemTime::now()` directly.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, used for interval/backoff arithmetic.
    fn now(&self) -> Instant;

    /// Wall-clock epoch milliseconds, used for anything persisted or
    /// compared against on-disk mtimes (age-limit, bucket_time).
    fn epoch_ms(&self) -> u64;

    /// Wall-clock epoch seconds (archive bucket math works in seconds).
    fn epoch_secs(&self) -> u64 {
        self.epoch_ms() / 1000
    }
}

/// Real clock backed by the OS.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Deterministic clock for tests: starts at a fixed instant/epoch and only
/// advances when explicitly told to.
#[derive(Clone)]
pub struct FakeClock {
    start: Instant,
    offset_ms: Arc<AtomicU64>,
    epoch_base_ms: u64,
}

impl FakeClock {
    /// Create a fake clock anchored at the given epoch milliseconds.
    pub fn new(epoch_base_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
            epoch_base_ms,
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        self.offset_ms
            .fetch_add(d.as_millis() as u64, Ordering::SeqCst);
    }

    fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + self.offset()
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_base_ms + self.offset().as_millis() as u64
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
