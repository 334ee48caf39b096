// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_starts_at_base_epoch() {
    let clock = FakeClock::new(1_700_000_000_000);
    assert_eq!(clock.epoch_ms(), 1_700_000_000_000);
    assert_eq!(clock.epoch_secs(), 1_700_000_000);
}

#[test]
fn fake_clock_advances_both_instant_and_epoch() {
    let clock = FakeClock::new(0);
    let t0 = clock.now();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.epoch_ms(), 5_000);
    assert!(clock.now() >= t0 + Duration::from_secs(5));
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new(0);
    let clone = clock.clone();
    clock.advance(Duration::from_secs(1));
    assert_eq!(clone.epoch_ms(), 1_000);
}

#[test]
fn system_clock_epoch_is_plausible() {
    let clock = SystemClock;
    // Any time after 2020-01-01 in ms.
    assert!(clock.epoch_ms() > 1_577_836_800_000);
}
