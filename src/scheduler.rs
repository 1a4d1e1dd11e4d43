// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! The scheduler: the single choke point that advances quantum counters,
//! ages sleepers, enqueues the outgoing thread, dequeues the next ready
//! thread, and performs the context switch (spec §4.2). [`dispatch`] also
//! serves directly as the `SIGVTALRM` handler.
//!
//! The ready queue, sleep table, and thread table are held in one
//! process-wide singleton, mirroring the teacher's single `SCHEDULER` /
//! `THREADS` statics in `kernel/src/multitasking/thread/mod.rs` — except
//! guarded by signal masking rather than a `spin::Mutex`, since this
//! library runs on exactly one kernel thread by construction (spec §1,
//! §5) and a real mutex would misrepresent that guarantee.

use crate::context::{self, Context};
use crate::diag;
use crate::error::{Result, ThreadLibError};
use crate::preempt;
use crate::thread::{ThreadId, ThreadRecord, ThreadState, MAX_THREADS};
use crate::timer;
use std::cell::UnsafeCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::os::raw::c_int;

struct State {
    threads: [Option<Box<ThreadRecord>>; MAX_THREADS],
    free_ids: BTreeSet<usize>,
    ready: VecDeque<ThreadId>,
    sleeping: BTreeMap<ThreadId, u32>,
    current: ThreadId,
    total_quantums: u64,
    quantum_usecs: i64,
    initialized: bool,
}

impl State {
    fn new() -> Self {
        State {
            threads: std::array::from_fn(|_| None),
            free_ids: BTreeSet::new(),
            ready: VecDeque::new(),
            sleeping: BTreeMap::new(),
            current: ThreadId::MAIN,
            total_quantums: 0,
            quantum_usecs: 0,
            initialized: false,
        }
    }

    fn get(&self, id: ThreadId) -> Option<&ThreadRecord> {
        self.threads[id.as_usize()].as_deref()
    }

    fn get_mut(&mut self, id: ThreadId) -> Option<&mut ThreadRecord> {
        self.threads[id.as_usize()].as_deref_mut()
    }
}

/// `State` is only ever touched while `SIGVTALRM` is masked (either by a
/// [`preempt::Guard`] around an explicit API call, or by the OS during
/// signal delivery to [`signal_handler`]), so there is never more than one
/// path of execution inside it at a time, despite there being exactly one
/// kernel thread in the whole process. See SPEC_FULL.md §5.
struct Global(UnsafeCell<Option<State>>);
unsafe impl Sync for Global {}

static STATE: Global = Global(UnsafeCell::new(None));

fn state() -> &'static mut State {
    // SAFETY: see the `Global` doc comment above.
    unsafe { (*STATE.0.get()).get_or_insert_with(State::new) }
}

/// Initializes the scheduler: installs the `SIGVTALRM` handler, seeds the
/// free-id set, creates the main thread, arms the quantum timer, and
/// performs the first scheduling event (spec §4.3 `init`).
pub(crate) fn init(quantum_usecs: i64) -> Result<()> {
    if quantum_usecs <= 0 {
        return Err(ThreadLibError::InvalidArgument);
    }

    preempt::masked(|| {
        let s = state();
        if s.initialized {
            diag::system_error("uthread_init called more than once");
        }
        s.initialized = true;
        s.threads[0] = Some(Box::new(ThreadRecord::main()));
        s.free_ids = (1..MAX_THREADS).collect();
        s.current = ThreadId::MAIN;
        s.quantum_usecs = quantum_usecs;

        timer::install_handler(signal_handler);
        timer::arm(quantum_usecs);

        log::debug!("uthreads initialized, quantum = {quantum_usecs}us");
        dispatch();
    });
    Ok(())
}

/// Allocates a thread record for `entry`, draws the smallest free id, and
/// queues it as `Ready` (spec §4.3 `spawn`).
pub(crate) fn spawn(entry: extern "C" fn()) -> Result<ThreadId> {
    preempt::masked(|| {
        let s = state();
        let id = *s.free_ids.iter().next().ok_or(ThreadLibError::OutOfResources)?;
        s.free_ids.remove(&id);
        let id = ThreadId(id);
        s.threads[id.as_usize()] = Some(Box::new(ThreadRecord::spawn(id, entry)));
        s.ready.push_back(id);
        log::trace!("spawned thread {}", id.as_usize());
        Ok(id)
    })
}

/// Terminates `tid` (spec §4.3 `terminate`). Returns `Ok(0)` if the caller
/// should get control back; if `tid` is the current thread (or the main
/// thread), this does not return to the caller at all — either control
/// passes to the next thread, or the process exits.
pub(crate) fn terminate(tid: ThreadId) -> Result<i32> {
    preempt::masked(|| {
        let s = state();
        if s.get(tid).is_none() {
            return Err(ThreadLibError::NoSuchThread);
        }

        if tid.is_main() {
            log::debug!("main thread terminated, tearing down process");
            s.threads = std::array::from_fn(|_| None);
            std::process::exit(0);
        }

        remove_from_ready(s, tid);
        s.sleeping.remove(&tid);
        s.threads[tid.as_usize()] = None;
        s.free_ids.insert(tid.as_usize());
        log::trace!("terminated thread {}", tid.as_usize());

        if s.current == tid {
            dispatch();
            unreachable!("terminated thread resumed");
        }

        Ok(0)
    })
}

/// Terminates the calling thread. Used by [`crate::context::trampoline_body`]
/// when a spawned thread's entry function returns, making that case always
/// well-defined rather than relying on caller discipline (spec §4.1).
pub(crate) fn exit_current() -> ! {
    let current = state().current;
    match terminate(current) {
        Ok(_) | Err(_) => unreachable!("terminate(current) never returns"),
    }
}

/// Blocks `tid` (spec §4.3 `block`).
pub(crate) fn block(tid: ThreadId) -> Result<i32> {
    preempt::masked(|| {
        let s = state();
        if s.get(tid).is_none() {
            return Err(ThreadLibError::NoSuchThread);
        }
        if tid.is_main() {
            return Err(ThreadLibError::InvalidArgument);
        }

        let current_state = s.get(tid).unwrap().state;
        if current_state == ThreadState::Blocked || current_state == ThreadState::Sleeping {
            return Ok(0);
        }

        remove_from_ready(s, tid);
        s.get_mut(tid).unwrap().state = ThreadState::Blocked;
        log::trace!("blocked thread {}", tid.as_usize());

        if s.current == tid {
            dispatch();
            unreachable!("blocked thread resumed without going through resume()");
        }

        Ok(0)
    })
}

/// Resumes `tid` (spec §4.3 `resume`). A no-op on any state but `Blocked`.
pub(crate) fn resume(tid: ThreadId) -> Result<i32> {
    preempt::masked(|| {
        let s = state();
        let thread = s.get_mut(tid).ok_or(ThreadLibError::NoSuchThread)?;
        if thread.state == ThreadState::Blocked {
            thread.state = ThreadState::Ready;
            s.ready.push_back(tid);
            log::trace!("resumed thread {}", tid.as_usize());
        }
        Ok(0)
    })
}

/// Puts the current thread to sleep for `num_quantums` (spec §4.3 `sleep`).
pub(crate) fn sleep(num_quantums: i64) -> Result<i32> {
    preempt::masked(|| {
        let s = state();
        if s.current.is_main() || num_quantums <= 0 {
            return Err(ThreadLibError::InvalidArgument);
        }

        let current = s.current;
        // +1: the aging step in `dispatch` fires once during the very
        // tick in which this thread gives up the CPU, so after `n` full
        // foreign quanta the counter reaches 1, not 0 (spec §4.2,
        // "Sleep-duration accounting").
        s.sleeping.insert(current, num_quantums as u32 + 1);
        s.get_mut(current).unwrap().state = ThreadState::Sleeping;
        log::trace!("thread {} sleeping for {num_quantums} quantums", current.as_usize());

        dispatch();
        Ok(0)
    })
}

/// Returns the number of quantums until `tid` wakes, or `0` if it is not
/// sleeping (spec §4.3 `get_time_until_wakeup`).
pub(crate) fn time_until_wakeup(tid: ThreadId) -> Result<u32> {
    preempt::masked(|| {
        let s = state();
        if s.get(tid).is_none() {
            return Err(ThreadLibError::NoSuchThread);
        }
        Ok(s.sleeping.get(&tid).copied().unwrap_or(0))
    })
}

// These three getters read the thread table / quantum counter without
// mutating them, but are still masked: a `BTreeMap`/array lookup is not a
// single atomic load, and letting `SIGVTALRM` re-enter `dispatch` mid-
// traversal while the same structure is concurrently mutated would be
// unsound, not just racy. Spec §4.3 permits skipping masking specifically
// for `resume`'s single-word update; that reasoning does not extend to a
// multi-step read, so we mask here despite the spec text allowing more
// laxity for "resume does not mask the signal".
pub(crate) fn current_tid() -> ThreadId {
    preempt::masked(|| state().current)
}

pub(crate) fn total_quantums() -> u64 {
    preempt::masked(|| state().total_quantums)
}

pub(crate) fn quantums_of(tid: ThreadId) -> Result<u32> {
    preempt::masked(|| {
        state()
            .get(tid)
            .map(|t| t.quantum_count)
            .ok_or(ThreadLibError::NoSuchThread)
    })
}

fn remove_from_ready(s: &mut State, tid: ThreadId) {
    if let Some(pos) = s.ready.iter().position(|&id| id == tid) {
        s.ready.remove(pos);
    }
}

/// The scheduling algorithm (spec §4.2). Invoked directly as the
/// `SIGVTALRM` handler, and explicitly by `sleep`, `block` (on self),
/// `terminate` (on self or another), and the tail of `init`.
extern "C" fn signal_handler(_sig: c_int) {
    dispatch();
}

fn dispatch() {
    let s = state();
    s.total_quantums += 1;
    let outgoing = s.current;
    log::trace!("dispatch: quantum {} (outgoing {})", s.total_quantums, outgoing.as_usize());

    // Step 3: age sleepers. Collecting expirations first and removing them
    // in a second pass keeps this safe against removing the map entry the
    // iterator is currently positioned on.
    let expired: Vec<ThreadId> = s
        .sleeping
        .iter_mut()
        .filter_map(|(&tid, remaining)| {
            *remaining -= 1;
            (*remaining == 0).then_some(tid)
        })
        .collect();
    for tid in expired {
        s.sleeping.remove(&tid);
        if let Some(t) = s.get_mut(tid) {
            t.state = ThreadState::Ready;
        }
        s.ready.push_back(tid);
    }

    // Step 4: re-enqueue the outgoing thread if it wasn't blocked, put to
    // sleep, or terminated by itself before calling us.
    if let Some(t) = s.get_mut(outgoing) {
        if t.state == ThreadState::Running {
            t.state = ThreadState::Ready;
            s.ready.push_back(outgoing);
        }
    }

    // Step 5.
    let Some(next) = s.ready.pop_front() else {
        diag::system_error("ready queue empty at scheduler entry");
    };

    // Step 6.
    s.current = next;
    if let Some(t) = s.get_mut(next) {
        t.state = ThreadState::Running;
        t.quantum_count += 1;
    }

    // Step 7.
    timer::arm(s.quantum_usecs);

    if next == outgoing {
        // Already running the right thread (spec.md has no explicit
        // clause for this, but it is reachable whenever the ready queue
        // was otherwise empty); a self-switch via `context::switch` would
        // be a correct no-op, but skipping it avoids an unnecessary
        // register save/restore, matching the teacher's
        // `Arc::ptr_eq(&current, &next)` short-circuit in
        // `kernel/src/multitasking/thread/scheduler.rs`.
        return;
    }

    // Step 8. Unblock before switching so that whichever thread resumes —
    // new or old — always observes preemption re-enabled, regardless of
    // whether we were entered via the signal handler or an explicit call.
    preempt::force_unblock();

    match s.get(outgoing) {
        Some(_) => {
            // SAFETY: `outgoing` and `next` name distinct, live records;
            // we take two raw pointers to sidestep borrowing both
            // `ThreadRecord`s out of `s.threads` simultaneously, then
            // immediately reborrow each inside `context::switch`, which
            // does not touch `s` again once control leaves this function.
            let current_ctx: *mut Context = &mut s.get_mut(outgoing).unwrap().context;
            let next_ctx: *const Context = &s.get(next).unwrap().context;
            unsafe { context::switch(&mut *current_ctx, &*next_ctx) };
        }
        None => {
            // The outgoing thread already terminated itself and its
            // record is gone: there is nothing to save into, and its
            // stack is about to be freed, so we only ever restore.
            let next_ctx: *const Context = &s.get(next).unwrap().context;
            unsafe { context::enter(&*next_ctx) };
        }
    }
}
