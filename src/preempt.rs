// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Scoped masking of the quantum signal, the library's sole atomicity
//! primitive (spec §5, §9). The closure shape mirrors the teacher's
//! `without_interrupts` in `kernel/src/multitasking/thread/mod.rs`, with
//! `SIGVTALRM` masking standing in for the teacher's local-interrupt
//! disable.

use crate::diag;
use crate::timer::SIGVTALRM_SET;
use std::mem::MaybeUninit;
use std::os::raw::c_int;

/// Runs `f` with `SIGVTALRM` blocked, restoring the prior mask on return.
/// Restoration happens even if `f` unwinds the current thread (only
/// possible for `f` running on the process's own call stack, never across
/// a thread switch, since nothing here crosses `context::switch`).
pub(crate) fn masked<T>(f: impl FnOnce() -> T) -> T {
    let _guard = Guard::block();
    f()
}

/// Unblocks `SIGVTALRM` unconditionally. Used by the dispatcher immediately
/// before every `context::switch`, so that whichever thread resumes next
/// always observes preemption re-enabled, regardless of whether dispatch
/// was entered via the signal handler (auto-masked by the kernel) or via
/// an explicit API call (masked by a [`Guard`]). See SPEC_FULL.md §4.1.
pub(crate) fn force_unblock() {
    sigprocmask(libc::SIG_UNBLOCK);
}

struct Guard {
    previous: libc::sigset_t,
}

impl Guard {
    fn block() -> Self {
        let previous = sigprocmask(libc::SIG_BLOCK);
        Guard { previous }
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        // SAFETY: `previous` was filled in by a prior `sigprocmask` call.
        let ret = unsafe {
            libc::sigprocmask(
                libc::SIG_SETMASK,
                &self.previous as *const libc::sigset_t,
                std::ptr::null_mut(),
            )
        };
        if ret != 0 {
            diag::system_error("sigprocmask restore failed");
        }
    }
}

/// Applies `how` (`SIG_BLOCK` or `SIG_UNBLOCK`) to `SIGVTALRM` and returns
/// the mask that was in effect beforehand.
fn sigprocmask(how: c_int) -> libc::sigset_t {
    let mut previous = MaybeUninit::<libc::sigset_t>::uninit();
    // SAFETY: SIGVTALRM_SET is a valid, initialized sigset_t containing
    // only SIGVTALRM; `previous` is an out-param the kernel fully writes.
    let ret = unsafe {
        libc::sigprocmask(
            how,
            SIGVTALRM_SET.as_ptr(),
            previous.as_mut_ptr(),
        )
    };
    if ret != 0 {
        diag::system_error("sigprocmask error");
    }
    // SAFETY: the call above succeeded, so `previous` was written.
    unsafe { previous.assume_init() }
}
