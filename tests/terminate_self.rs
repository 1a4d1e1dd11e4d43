// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Scenario 4 (spec §8): a non-main thread terminating itself never
//! returns to its own entry function, and the freed id is reused by the
//! very next spawn (the free-id set always yields the smallest id).

use std::sync::atomic::{AtomicBool, Ordering};
use uthreads::{uthread_get_quantums, uthread_get_tid, uthread_init, uthread_spawn, uthread_terminate};

static REACHED_AFTER_TERMINATE: AtomicBool = AtomicBool::new(false);

extern "C" fn suicidal() {
    let tid = uthread_get_tid();
    assert_eq!(uthread_terminate(tid), 0);
    // Unreachable: `terminate` on the calling thread never returns.
    REACHED_AFTER_TERMINATE.store(true, Ordering::SeqCst);
    loop {
        std::hint::spin_loop();
    }
}

#[test]
fn self_terminate_frees_its_id() {
    assert_eq!(uthread_init(5_000), 0);

    let t = uthread_spawn(suicidal);
    assert!(t >= 0);

    // Poll for the record's liveness without mutating scheduler state:
    // `get_quantums` fails with `NoSuchThread` (-1) once `t`'s record is
    // freed.
    let mut spins = 0u64;
    while uthread_get_quantums(t) != -1 {
        spins += 1;
        assert!(spins < 10_000_000, "suicidal thread never terminated itself");
        std::hint::spin_loop();
    }

    assert!(!REACHED_AFTER_TERMINATE.load(Ordering::SeqCst));

    // The freed id is the smallest available, so the next spawn reuses it.
    let reused = uthread_spawn(suicidal);
    assert_eq!(reused, t);
}
