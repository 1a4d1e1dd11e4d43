// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Spawns one thread that sleeps for a fixed number of quantums while a
//! peer thread polls `uthread_get_time_until_wakeup` on it, demonstrating
//! spec scenario 3 (sleep accounting: the countdown is observed as
//! `n+1, n, …, 1` across successive quantums, then the sleeper is
//! READY/RUNNING again).

use uthreads::{
    uthread_get_time_until_wakeup, uthread_get_tid, uthread_get_total_quantums, uthread_init,
    uthread_sleep, uthread_spawn, uthread_terminate,
};

const SLEEP_QUANTUMS: i64 = 3;

static mut SLEEPER_TID: i32 = -1;

extern "C" fn sleeper() {
    // SAFETY: written once by `main` before this thread is spawned, read
    // only from this thread and from `watcher`, which only ever observes
    // it after `main` has already assigned it.
    let _ = uthread_sleep(SLEEP_QUANTUMS);
    println!("sleeper woke up at quantum {}", uthread_get_total_quantums());
    uthread_terminate(uthread_get_tid());
}

extern "C" fn watcher() {
    let sleeper_tid = unsafe { SLEEPER_TID };
    let mut last = -1;
    loop {
        let remaining = uthread_get_time_until_wakeup(sleeper_tid);
        if remaining != last {
            println!("quantum {}: {SLEEP_QUANTUMS}-quantum sleeper has {remaining} left", uthread_get_total_quantums());
            last = remaining;
        }
        if remaining == 0 {
            break;
        }
    }
    uthread_terminate(uthread_get_tid());
}

fn main() {
    assert_eq!(uthread_init(20_000), 0);

    let sleeper_tid = uthread_spawn(sleeper);
    assert!(sleeper_tid >= 0);
    unsafe { SLEEPER_TID = sleeper_tid };

    let watcher_tid = uthread_spawn(watcher);
    assert!(watcher_tid >= 0);

    // The main thread just keeps the process alive; it is always ready,
    // so the scheduler never starves for a runnable thread.
    loop {
        std::hint::spin_loop();
        if uthread_get_total_quantums() > 60 {
            break;
        }
    }
}
