// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Scenario 6 (spec §8): `resume` is idempotent on every state but
//! `BLOCKED`, and `block`/`resume` round-trips a thread back into the
//! ready set.

use std::sync::atomic::{AtomicBool, Ordering};
use uthreads::{uthread_block, uthread_get_quantums, uthread_init, uthread_resume, uthread_spawn};

static RAN_AFTER_RESUME: AtomicBool = AtomicBool::new(false);

extern "C" fn blockable() {
    loop {
        if RAN_AFTER_RESUME.load(Ordering::SeqCst) {
            break;
        }
        std::hint::spin_loop();
    }
    loop {
        std::hint::spin_loop();
    }
}

// A single `#[test]` covers both the round-trip and the error surface:
// `uthread_init` may only be called once per process, and cargo runs
// every `#[test]` in a file inside the same process, so this file — like
// every other file under `tests/` — holds exactly one.
#[test]
fn block_then_resume() {
    assert_eq!(uthread_init(5_000), 0);

    // Main thread can never be blocked; nonexistent ids fail both ops.
    assert_eq!(uthread_block(0), -1);
    assert_eq!(uthread_block(57), -1);
    assert_eq!(uthread_resume(57), -1);

    let t = uthread_spawn(blockable);
    assert!(t >= 0);

    // Let it get scheduled at least once before blocking it.
    while uthread_get_quantums(t) == 0 {
        std::hint::spin_loop();
    }

    assert_eq!(uthread_block(t), 0);

    // Resuming/blocking a READY/RUNNING/SLEEPING/BLOCKED thread besides
    // the already-blocked one is always a no-op success; re-blocking the
    // already-blocked thread is explicitly a no-op too.
    assert_eq!(uthread_block(t), 0);
    let quantums_while_blocked = uthread_get_quantums(t);

    // A blocked thread makes no further progress no matter how many
    // quantums elapse.
    for _ in 0..20 {
        std::hint::spin_loop();
    }
    assert_eq!(uthread_get_quantums(t), quantums_while_blocked);

    assert_eq!(uthread_resume(t), 0);
    // Resuming an already-ready/running thread is a no-op.
    assert_eq!(uthread_resume(t), 0);

    RAN_AFTER_RESUME.store(true, Ordering::SeqCst);
    while uthread_get_quantums(t) == quantums_while_blocked {
        std::hint::spin_loop();
    }
    assert!(uthread_get_quantums(t) > quantums_while_blocked);
}
