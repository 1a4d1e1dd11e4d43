// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Scenario 1 (init + main quantum) and scenario 2 (round-robin fairness),
//! spec §8. Each `tests/*.rs` file holds exactly one `#[test]`, since the
//! scheduler is a process-wide singleton that installs a real
//! `SIGVTALRM` handler — cargo gives each file its own test binary, but
//! multiple `#[test]`s inside one file would still race on that global
//! state if run on cargo's default multi-threaded test runner.

use uthreads::{uthread_get_quantums, uthread_get_tid, uthread_get_total_quantums, uthread_init, uthread_spawn};

/// Spins forever. Deliberately never terminates itself: the test reads
/// each worker's quantum count while it is still alive, so the id stays
/// valid for the whole assertion. The process exits with the test
/// harness regardless of what's still running.
extern "C" fn busy_loop() {
    loop {
        std::hint::spin_loop();
    }
}

#[test]
fn init_then_round_robin() {
    assert_eq!(uthread_init(5_000), 0);

    // Scenario 1: right after init, the main thread has run exactly one
    // quantum, and the total counter reads 1.
    assert_eq!(uthread_get_tid(), 0);
    assert_eq!(uthread_get_total_quantums(), 1);
    assert_eq!(uthread_get_quantums(0), 1);

    let a = uthread_spawn(busy_loop);
    let b = uthread_spawn(busy_loop);
    let c = uthread_spawn(busy_loop);
    assert!(a >= 0 && b >= 0 && c >= 0);

    while uthread_get_total_quantums() <= 40 {
        std::hint::spin_loop();
    }

    let counts = [
        uthread_get_quantums(0),
        uthread_get_quantums(a),
        uthread_get_quantums(b),
        uthread_get_quantums(c),
    ];
    let min = *counts.iter().min().unwrap();
    let max = *counts.iter().max().unwrap();
    assert!(
        max - min <= 1,
        "round-robin quantum counts should differ by at most 1: {counts:?}"
    );
}
