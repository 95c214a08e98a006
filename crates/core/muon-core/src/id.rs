//! Type-safe identifiers for scheduling resources.
//!
//! The newtype prevents accidental mixing of thread ids with tick counts
//! and other plain integers at compile time.

use core::fmt;

/// Process-wide unique thread identifier.
///
/// Also the tie-break key in the ready queue: when two threads carry the
/// same burst estimate, the one with the smaller id sorts ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Creates a new `ThreadId`.
    pub const fn new(val: u64) -> Self {
        Self(val)
    }

    /// Returns the raw `u64` value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
