// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Terminates the main thread (id 0) and exits. Used by
//! `tests/main_terminate.rs` as a subprocess, since spec scenario 5
//! ("main-terminate exits the process with status 0; no other library
//! call returns") can only be observed from outside the terminating
//! process.

use uthreads::{uthread_init, uthread_terminate};

fn main() {
    assert_eq!(uthread_init(100_000), 0);
    uthread_terminate(0);
    unreachable!("uthread_terminate(0) does not return");
}
