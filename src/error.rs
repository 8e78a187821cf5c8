// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error kinds, per spec s:7. Geometry queries never return these; they
//! clamp and return a best-effort result instead. Mutation APIs return
//! `Result<T, LayoutError>`.

use core::ops::Range;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A query offset or range exceeds the document.
    #[error("offset or range {0:?} exceeds document bounds")]
    IndexOutOfRange(Range<usize>),
    /// Attachment insertion overlaps an existing attachment.
    #[error("attachment range overlaps an existing attachment")]
    OverlapsExisting,
    /// A single-edit failure left storage invariants broken. Debug
    /// builds `debug_assert!` on this instead of constructing it; release
    /// builds log it and force a full re-layout on the next draw.
    #[error("line storage invariant violated: {0}")]
    InvariantViolated(&'static str),
}

/// Panics in debug builds (the spec's "aborts in debug" semantics);
/// in release builds, logs the violation and returns an error for the
/// caller to recover from by forcing a full re-layout.
pub(crate) fn invariant(condition: bool, message: &'static str) -> Result<(), LayoutError> {
    debug_assert!(condition, "{message}");
    if condition {
        Ok(())
    } else {
        log::error!("invariant violated: {message}");
        Err(LayoutError::InvariantViolated(message))
    }
}
