// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! The quantum clock: a virtual-time interval timer that periodically
//! raises `SIGVTALRM`, and the handler installation that makes the
//! scheduler's dispatch loop double as that signal's handler (spec §2.5,
//! §4.2). Bound directly to the POSIX primitives
//! `original_source/uthreads.cpp` uses (`setitimer`/`sigaction`), via the
//! `libc` crate — none of this repo's kernel teachers touch a userspace
//! interval timer, since they each own real hardware interrupts instead.

use crate::diag;
use std::mem::MaybeUninit;
use std::os::raw::c_int;
use std::sync::OnceLock;

/// A `sigset_t` containing exactly `SIGVTALRM`, built once and reused by
/// every mask/unmask call in [`crate::preempt`].
pub(crate) static SIGVTALRM_SET: OnceLockSet = OnceLockSet::new();

pub(crate) struct OnceLockSet(OnceLock<libc::sigset_t>);

impl OnceLockSet {
    const fn new() -> Self {
        OnceLockSet(OnceLock::new())
    }

    pub(crate) fn as_ptr(&self) -> *const libc::sigset_t {
        self.0.get_or_init(|| {
            let mut set = MaybeUninit::<libc::sigset_t>::uninit();
            // SAFETY: `set` is a valid out-param for sigemptyset/sigaddset.
            unsafe {
                libc::sigemptyset(set.as_mut_ptr());
                libc::sigaddset(set.as_mut_ptr(), libc::SIGVTALRM);
                set.assume_init()
            }
        })
    }
}

/// Installs `handler` as the `SIGVTALRM` signal handler. Called once, from
/// [`crate::api::init`].
pub(crate) fn install_handler(handler: extern "C" fn(c_int)) {
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    action.sa_sigaction = handler as usize;
    // SAFETY: `action` is fully initialized above; `sigaction` only reads
    // it and optionally writes the previous disposition, which we discard.
    let ret = unsafe { libc::sigaction(libc::SIGVTALRM, &action, std::ptr::null_mut()) };
    if ret != 0 {
        diag::system_error("sigaction error");
    }
}

/// Arms `ITIMER_VIRTUAL` to fire once after `quantum_usecs` and then every
/// `quantum_usecs` thereafter. Re-arming (rather than leaving a
/// free-running interval timer) is what makes a non-timer-driven
/// scheduling event reset the quantum boundary, per spec §4.2 step 7: each
/// call replaces any previously pending expiry.
pub(crate) fn arm(quantum_usecs: i64) {
    let interval = libc::timeval {
        tv_sec: quantum_usecs / 1_000_000,
        tv_usec: quantum_usecs % 1_000_000,
    };
    let timer = libc::itimerval {
        it_interval: interval,
        it_value: interval,
    };
    // SAFETY: `timer` is fully initialized; we don't need the previous value.
    let ret = unsafe { libc::setitimer(libc::ITIMER_VIRTUAL, &timer, std::ptr::null_mut()) };
    if ret != 0 {
        diag::system_error("setitimer error");
    }
}
