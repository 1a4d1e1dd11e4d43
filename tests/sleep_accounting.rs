// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Scenario 3 (spec §8): a thread sleeping for `n` quantums observes its
//! countdown, read by a peer via `uthread_get_time_until_wakeup`, step
//! through `n+1, n, …, 1` before it becomes runnable again.

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use uthreads::{
    uthread_get_time_until_wakeup, uthread_get_tid, uthread_get_total_quantums, uthread_init,
    uthread_sleep, uthread_spawn,
};

const SLEEP_QUANTUMS: i64 = 3;

static SLEEPER_TID: AtomicI32 = AtomicI32::new(-1);
static WOKE_AT_QUANTUM: AtomicU64 = AtomicU64::new(0);

extern "C" fn sleeper() {
    assert_eq!(uthread_sleep(SLEEP_QUANTUMS), 0);
    WOKE_AT_QUANTUM.store(uthread_get_total_quantums(), Ordering::SeqCst);
    loop {
        std::hint::spin_loop();
    }
}

#[test]
fn sleep_then_wake() {
    assert_eq!(uthread_init(5_000), 0);

    let sleeper_tid = uthread_spawn(sleeper);
    assert!(sleeper_tid >= 0);
    SLEEPER_TID.store(sleeper_tid, Ordering::SeqCst);

    // Spin on the main thread, which is always READY, so the scheduler
    // keeps making progress: each of its own quantums lets one foreign
    // quantum of the sleeper's countdown elapse.
    let quantum_when_spawned = uthread_get_total_quantums();
    let mut last_remaining = i32::MAX;
    let mut observed = Vec::new();
    loop {
        let remaining = uthread_get_time_until_wakeup(sleeper_tid);
        if remaining != last_remaining {
            observed.push(remaining);
            last_remaining = remaining;
        }
        if remaining == 0 {
            break;
        }
        assert!(
            uthread_get_total_quantums() - quantum_when_spawned < 1000,
            "sleeper never woke up: observed {observed:?}"
        );
    }

    // The countdown should have been strictly decreasing, starting at or
    // below SLEEP_QUANTUMS + 1 and ending at the implicit 0 once it wakes.
    assert!(observed[0] <= (SLEEP_QUANTUMS + 1) as i32);
    for window in observed.windows(2) {
        assert!(window[0] > window[1], "{observed:?} is not monotonically decreasing");
    }
    assert_eq!(*observed.last().unwrap(), 0);

    assert!(
        WOKE_AT_QUANTUM.load(Ordering::SeqCst) > quantum_when_spawned,
        "sleeper should have observed foreign quantums elapse before waking"
    );
    assert_ne!(uthread_get_tid(), sleeper_tid);
}
