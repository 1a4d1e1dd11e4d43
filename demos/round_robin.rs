// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Spawns three busy-looping threads alongside the main thread and lets
//! the scheduler round-robin between all four until each has run a
//! handful of quantums, then prints each thread's quantum count.
//!
//! Demonstrates spec scenario 2: with a short quantum and CPU-bound
//! bodies, `uthread_get_quantums` for every thread should differ by at
//! most one, and the interleaving should be `0, A, B, C, 0, A, B, C, …`.

use std::sync::atomic::{AtomicU32, Ordering};
use uthreads::{
    uthread_get_quantums, uthread_get_tid, uthread_get_total_quantums, uthread_init,
    uthread_spawn,
};

static SPINS: AtomicU32 = AtomicU32::new(0);

extern "C" fn worker() {
    loop {
        // Busy-loop so the quantum timer, not a voluntary yield, is what
        // moves this thread off the CPU.
        SPINS.fetch_add(1, Ordering::Relaxed);
        if uthread_get_total_quantums() > 40 {
            break;
        }
    }
    uthreads::uthread_terminate(uthread_get_tid());
}

fn main() {
    assert_eq!(uthread_init(10_000), 0);

    let a = uthread_spawn(worker);
    let b = uthread_spawn(worker);
    let c = uthread_spawn(worker);
    assert!(a >= 0 && b >= 0 && c >= 0);

    while uthread_get_total_quantums() <= 40 {
        std::hint::spin_loop();
    }

    println!(
        "quantums: main={} a={} b={} c={}",
        uthread_get_quantums(0),
        uthread_get_quantums(a),
        uthread_get_quantums(b),
        uthread_get_quantums(c),
    );
}
