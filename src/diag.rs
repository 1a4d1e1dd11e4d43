// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! The two mandated diagnostic channels (spec §6): `thread library error:`
//! for usage errors returned to the caller as `-1`, and `system error:` for
//! unrecoverable OS-primitive failures, which abort the process.
//!
//! These always print verbatim to stderr, independent of whether a `log`
//! subscriber is installed — the error-surface contract does not depend on
//! logging configuration. Internal scheduler tracing goes through the
//! `log` crate instead; see the `trace!`/`debug!` calls in
//! [`crate::scheduler`].

use crate::error::ThreadLibError;
use std::fmt::Display;

/// Prints the given library error to stderr with the mandated prefix and
/// returns it, so call sites can write `return Err(lib_error(...))`.
pub(crate) fn lib_error(err: ThreadLibError) -> ThreadLibError {
    eprintln!("thread library error: {err}");
    err
}

/// Prints a fatal OS-primitive failure to stderr with the mandated prefix
/// and aborts the process. Never returns.
pub(crate) fn system_error(message: impl Display) -> ! {
    eprintln!("system error: {message}");
    std::process::exit(1);
}
