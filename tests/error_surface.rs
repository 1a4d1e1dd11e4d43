// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Scenario 7 (spec §8): argument and usage errors return `-1` and leave
//! scheduler state unchanged; `spawn` past `MAX_THREADS` fails without
//! disturbing the threads already spawned.

use uthreads::{
    uthread_get_quantums, uthread_init, uthread_sleep, uthread_spawn, uthread_terminate,
    MAX_THREADS,
};

extern "C" fn idle() {
    loop {
        std::hint::spin_loop();
    }
}

#[test]
fn exhausting_spawn_and_bad_arguments() {
    assert_eq!(uthread_init(5_000), 0);

    // Thread 0 (main) already occupies one slot; fill the rest.
    let mut ids = Vec::new();
    for _ in 0..MAX_THREADS - 1 {
        let id = uthread_spawn(idle);
        assert!(id >= 0, "spawn should succeed while under the limit");
        ids.push(id);
    }

    // The table is now full: one more spawn fails, and every prior thread
    // is untouched.
    assert_eq!(uthread_spawn(idle), -1);
    for &id in &ids {
        assert!(uthread_get_quantums(id) >= 0);
    }

    assert_eq!(uthread_terminate(999), -1);
    // Called from the main thread, so this fails on the "can't sleep the
    // main thread" branch rather than the negative-argument branch, but
    // either way it's an `InvalidArgument` surfaced as -1.
    assert_eq!(uthread_sleep(-1), -1);
}
