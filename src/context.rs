// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Context save/restore, isolated behind a narrow trusted boundary.
//!
//! Per spec §9, the context-switch primitive is inherently unsafe across
//! Rust's type system (it violates stack discipline), so this module
//! exposes exactly one operation, [`switch`], and keeps every raw register
//! buffer private. There is no separate "save" step distinguishing a first
//! return from a restored one (contrast spec §4.1): `switch` is a plain
//! call/return pair in the System V AMD64 ABI, so the call to `switch`
//! itself simply returns later, on a different stack, when some other
//! dispatch switches back. See SPEC_FULL.md §4.1 for the full rationale.
//!
//! This is the x86-64 System V ABI implementation, matching the register
//! save/restore shape of the teacher's `kernel/src/multitasking/thread/mod.rs`
//! `push_stack`/`create_kernel_thread` initial-stack construction, adapted
//! from kernel stacks to the spec's fixed-size per-thread stack buffers.

use std::arch::global_asm;

/// A thread's saved machine state: just the stack pointer. Callee-saved
/// registers and the resumption address live on the thread's own stack,
/// pushed there by [`switch`] (for a running thread being switched out) or
/// by [`Context::initial`] (for a freshly spawned thread).
pub struct Context {
    stack_pointer: u64,
}

impl Context {
    /// An empty context, used for the main thread before its first
    /// dispatch populates it with the caller's live stack pointer.
    pub(crate) fn empty() -> Self {
        Context { stack_pointer: 0 }
    }

    /// Synthesizes the initial context for a freshly spawned thread: the
    /// first [`switch`] into this context resumes at [`thread_trampoline`],
    /// on a clean stack, which then calls `entry`.
    pub(crate) fn initial(stack_top: *mut u8, entry: extern "C" fn()) -> Self {
        // SAFETY: `stack_top` is one-past-the-end of a STACK_SIZE-byte
        // buffer owned exclusively by the caller's ThreadRecord; we only
        // ever write within that buffer, moving downwards from the top.
        unsafe {
            // Align down to a 16-byte boundary, matching the ABI's
            // call-site alignment requirement. The 9 words we push below
            // (72 bytes, 8 mod 16) then leave `thread_trampoline`'s entry
            // stack pointer at the 16n+8 alignment a real `call` would
            // have produced.
            let mut rsp = ((stack_top as usize) & !0xf) as *mut u64;

            rsp = push(rsp, entry as usize as u64);
            rsp = push(rsp, thread_trampoline as usize as u64); // synthetic return address
            rsp = push(rsp, 0); // rbp
            rsp = push(rsp, 0); // rbx
            rsp = push(rsp, 0); // r12
            rsp = push(rsp, 0); // r13
            rsp = push(rsp, 0); // r14
            rsp = push(rsp, 0); // r15
            rsp = push(rsp, 0x2); // rflags: bit 1 is always reserved-set

            Context {
                stack_pointer: rsp as u64,
            }
        }
    }
}

unsafe fn push(mut rsp: *mut u64, value: u64) -> *mut u64 {
    rsp = rsp.sub(1);
    rsp.write(value);
    rsp
}

extern "sysv64" {
    /// Switches the CPU onto `next`'s stack, saving the current stack's
    /// callee-saved registers and flags onto the current stack first and
    /// recording the resulting stack pointer through `current`. Does not
    /// return until some later `switch` call targets `current` again.
    ///
    /// Implemented in `context_switch.s` below.
    fn context_switch(current: *mut u64, next: *const u64);

    /// Restores `next`'s stack pointer and the registers/flags saved on
    /// it, without saving anything first. Used when the outgoing thread's
    /// record has already been freed (self-`terminate`), so there is
    /// nothing left to save into and its stack is about to be reclaimed.
    fn context_enter(next: *const u64) -> !;

    /// Entry point installed as the synthetic return address of a freshly
    /// spawned thread's initial stack. Pops the thread's entry-function
    /// pointer and tail-calls into [`trampoline_body`]. Never called
    /// directly from Rust; only its address is taken, in
    /// [`Context::initial`].
    fn thread_trampoline();
}

/// Switches execution from `current`'s stack to `next`'s stack.
///
/// # Safety
///
/// `current` and `next` must each point at the `stack_pointer` field of a
/// live [`Context`] belonging to a distinct [`crate::thread::ThreadRecord`],
/// and `next`'s stack pointer must have been produced by
/// [`Context::initial`] or by a previous call to `switch` that saved into
/// it. The caller must not hold any reference into `current`'s thread
/// record across the call: once `switch` returns, it has returned on
/// `current`'s stack, potentially much later, after arbitrary other
/// threads have run.
pub(crate) unsafe fn switch(current: &mut Context, next: &Context) {
    context_switch(&mut current.stack_pointer, &next.stack_pointer);
}

/// Restores `next`'s context and never returns. See [`context_enter`].
///
/// # Safety
///
/// `next` must point at a live [`Context`] whose stack pointer was
/// produced by [`Context::initial`] or a previous `switch`/`enter` save.
pub(crate) unsafe fn enter(next: &Context) -> ! {
    context_enter(&next.stack_pointer)
}

/// Called by [`thread_trampoline`] once it has popped the entry-function
/// pointer off the freshly spawned thread's stack. Runs the thread's entry
/// function, then auto-terminates the thread if the function returns
/// (spec §4.1: a returning entry function is undefined behavior *unless*
/// the thread terminated itself first; calling `terminate` here for the
/// caller makes a returning entry function always well-defined instead of
/// relying on caller discipline).
#[no_mangle]
extern "sysv64" fn trampoline_body(entry: usize) -> ! {
    // SAFETY: constructed in Context::initial from an `extern "C" fn()`.
    let entry: extern "C" fn() = unsafe { std::mem::transmute(entry) };
    entry();
    crate::scheduler::exit_current();
}

global_asm!(
    ".global context_switch",
    "context_switch:",
    "push rbp",
    "push rbx",
    "push r12",
    "push r13",
    "push r14",
    "push r15",
    "pushfq",
    "mov [rdi], rsp",
    "mov rsp, [rsi]",
    "popfq",
    "pop r15",
    "pop r14",
    "pop r13",
    "pop r12",
    "pop rbx",
    "pop rbp",
    "ret",
);

global_asm!(
    ".global context_enter",
    "context_enter:",
    "mov rsp, [rdi]",
    "popfq",
    "pop r15",
    "pop r14",
    "pop r13",
    "pop r12",
    "pop rbx",
    "pop rbp",
    "ret",
);

global_asm!(
    ".global thread_trampoline",
    "thread_trampoline:",
    "pop rdi",
    "call trampoline_body",
    "ud2",
);
