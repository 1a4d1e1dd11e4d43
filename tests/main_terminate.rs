// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Scenario 5 (spec §8): terminating the main thread exits the whole
//! process with status 0. That can't be observed from inside the process
//! doing the terminating — the test harness itself would exit — so this
//! drives the `main_terminate` demo binary as a subprocess and asserts on
//! its `ExitStatus`, per SPEC_FULL.md §8's test architecture note.

use std::process::Command;

#[test]
fn terminating_main_exits_cleanly() {
    let status = Command::new(env!("CARGO_BIN_EXE_main_terminate"))
        .status()
        .expect("failed to run main_terminate demo binary");
    assert!(status.success());
    assert_eq!(status.code(), Some(0));
}
