// Copyright 2026 The uthreads Authors.
//
// Use of this source code is governed by a BSD 3-clause
// license that can be found in the LICENSE file.

//! Error kinds surfaced by the public API.
//!
//! `SystemFailure` from spec §7 has no variant here: it is never returned
//! to a caller. A failing OS primitive is fatal and is handled at the call
//! site by [`crate::diag::system_error`], which never returns.

use thiserror::Error;

/// Argument and usage errors the public API can return as `-1`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ThreadLibError {
    /// A non-positive quantum length, a non-positive sleep count, or a
    /// `block`/`sleep` call targeting the main thread.
    #[error("invalid argument")]
    InvalidArgument,

    /// An operation targeted a thread id with no live record.
    #[error("no thread with given id exists")]
    NoSuchThread,

    /// `spawn` was called with no free thread id available.
    #[error("number of concurrent threads exceeds the limit")]
    OutOfResources,
}

/// Convenience alias used throughout the crate's internals.
pub type Result<T> = core::result::Result<T, ThreadLibError>;
