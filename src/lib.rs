// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! uthreads implements a cooperative-preemptive user-level threading
//! library running entirely within a single OS process and a single
//! kernel thread.
//!
//! Lightweight threads ("uthreads") are scheduled in strict round-robin
//! order, each given a fixed-length virtual-time quantum. Multiplexing
//! happens entirely in user space: every uthread owns its own stack, and
//! the library switches between them by saving and restoring machine
//! context, driven by a `SIGVTALRM` interval timer that doubles as the
//! scheduler's entry point.
//!
//! # Usage
//!
//! ```no_run
//! extern "C" fn worker() {
//!     loop {
//!         // do some work, then yield the rest of this quantum eventually
//!         // via preemption or `uthread_sleep`.
//!     }
//! }
//!
//! uthreads::uthread_init(100_000);
//! let tid = uthreads::uthread_spawn(worker);
//! assert!(tid >= 0);
//! ```
//!
//! # Subsystems
//!
//! - [thread] — the per-thread record: id, state, stack, saved context.
//! - [context] — the context save/restore primitive, the library's sole
//!   block of inline assembly.
//! - [scheduler] — the round-robin dispatcher, ready queue, and sleep
//!   wheel; also the `SIGVTALRM` handler.
//! - [timer] — the quantum clock's POSIX bindings.
//! - [preempt] — scoped masking of the quantum signal.
//! - [error] — the library's argument/usage error type.
//! - [diag] — the two mandated diagnostic prefixes.
//!
//! # Non-goals
//!
//! SMP parallelism, priorities or fairness beyond FIFO round-robin,
//! thread-local storage, inter-thread synchronization primitives (mutex,
//! condition variable), blocking I/O, and stack-overflow detection are all
//! out of scope; see `SPEC_FULL.md` for the full rationale.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod context;
pub mod diag;
pub mod error;
pub mod preempt;
pub mod scheduler;
pub mod thread;
mod timer;

pub use thread::{ThreadId, MAX_THREADS, STACK_SIZE};

use error::ThreadLibError;

/// Initializes the thread library. Must be called before any other
/// function in this crate, and exactly once.
///
/// Installs the `SIGVTALRM` handler, spawns the main thread (id 0), arms
/// the quantum timer, and performs an immediate scheduling event so the
/// total quantum counter becomes 1 and the main thread begins its first
/// quantum.
///
/// `quantum_usecs` is the length of a quantum, in microseconds; it must be
/// positive.
///
/// Returns `0` on success, `-1` on failure (and prints a
/// `thread library error: ` diagnostic to stderr).
#[must_use]
pub fn uthread_init(quantum_usecs: i64) -> i32 {
    to_abi(scheduler::init(quantum_usecs).map(|()| 0))
}

/// Creates a new thread whose entry point is `entry`, a `void f(void)`
/// function. The thread is appended to the ready queue.
///
/// Fails if the number of concurrently live threads would exceed
/// [`MAX_THREADS`].
///
/// Returns the new thread's id on success, `-1` on failure.
#[must_use]
pub fn uthread_spawn(entry: extern "C" fn()) -> i32 {
    to_abi(scheduler::spawn(entry).map(|id| id.as_usize() as i32))
}

/// Terminates the thread with id `tid` and releases every resource the
/// library holds for it.
///
/// If `tid` is the main thread (`0`), this frees every live thread record
/// and exits the process with status `0` — it never returns. If `tid` is
/// the calling thread, this also never returns: control passes to the
/// next ready thread instead.
///
/// Returns `0` on success, `-1` if no thread with id `tid` exists.
#[must_use]
pub fn uthread_terminate(tid: i32) -> i32 {
    match tid_arg(tid) {
        Ok(tid) => to_abi(scheduler::terminate(tid)),
        Err(e) => to_abi(Err(e)),
    }
}

/// Blocks the thread with id `tid`; it stays blocked until a matching
/// [`uthread_resume`]. A no-op on a thread already `BLOCKED` or
/// `SLEEPING`. It is an error to block the main thread.
///
/// If a thread blocks itself, this does not return until some later
/// `uthread_resume`.
///
/// Returns `0` on success, `-1` on failure.
#[must_use]
pub fn uthread_block(tid: i32) -> i32 {
    match tid_arg(tid) {
        Ok(tid) => to_abi(scheduler::block(tid)),
        Err(e) => to_abi(Err(e)),
    }
}

/// Resumes a blocked thread, moving it to `READY`. A no-op on a thread
/// that is `RUNNING`, `READY`, or `SLEEPING`.
///
/// Returns `0` on success, `-1` if no thread with id `tid` exists.
#[must_use]
pub fn uthread_resume(tid: i32) -> i32 {
    match tid_arg(tid) {
        Ok(tid) => to_abi(scheduler::resume(tid)),
        Err(e) => to_abi(Err(e)),
    }
}

/// Puts the calling thread to sleep for `num_quantums` full quanta (not
/// including the quantum in which this is called), after which it becomes
/// `READY` again. It is an error to call this from the main thread, or
/// with a non-positive `num_quantums`.
///
/// Always triggers an immediate scheduling decision, so this does not
/// return until `num_quantums` foreign quanta have elapsed.
///
/// Returns `0` on success, `-1` on failure.
#[must_use]
pub fn uthread_sleep(num_quantums: i64) -> i32 {
    to_abi(scheduler::sleep(num_quantums))
}

/// Returns the number of quantums remaining until `tid` wakes (including
/// the current quantum), or `0` if `tid` is not sleeping.
///
/// Returns `-1` if no thread with id `tid` exists.
#[must_use]
pub fn uthread_get_time_until_wakeup(tid: i32) -> i32 {
    match tid_arg(tid) {
        Ok(tid) => to_abi(scheduler::time_until_wakeup(tid).map(|n| n as i32)),
        Err(e) => to_abi(Err(e)),
    }
}

/// Returns the id of the calling thread.
#[must_use]
pub fn uthread_get_tid() -> i32 {
    scheduler::current_tid().as_usize() as i32
}

/// Returns the total number of quantums started since [`uthread_init`]
/// was called, including the current one. Immediately after `uthread_init`
/// returns, this is `1`.
#[must_use]
pub fn uthread_get_total_quantums() -> u64 {
    scheduler::total_quantums()
}

/// Returns the number of quantums during which `tid` has been the running
/// thread, including the current quantum if `tid` is currently running.
///
/// Returns `-1` if no thread with id `tid` exists.
#[must_use]
pub fn uthread_get_quantums(tid: i32) -> i32 {
    match tid_arg(tid) {
        Ok(tid) => to_abi(scheduler::quantums_of(tid).map(|n| n as i32)),
        Err(e) => to_abi(Err(e)),
    }
}

/// Validates a raw `i32` thread id argument, rejecting negative values and
/// anything outside `[0, MAX_THREADS)` as [`ThreadLibError::NoSuchThread`]
/// before it ever reaches the scheduler's table lookup.
fn tid_arg(tid: i32) -> error::Result<ThreadId> {
    if tid < 0 || tid as usize >= MAX_THREADS {
        return Err(ThreadLibError::NoSuchThread);
    }
    Ok(ThreadId(tid as usize))
}

/// Converts a `Result` into the spec's `i32` return ABI (§6), printing the
/// `thread library error: ` diagnostic on the error path.
fn to_abi(result: error::Result<i32>) -> i32 {
    match result {
        Ok(n) => n,
        Err(e) => {
            diag::lib_error(e);
            -1
        }
    }
}
