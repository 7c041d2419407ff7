//! The kernel's logical clock.
//!
//! Expression nodes carry a last-change stamp drawn from a process-global
//! monotonic counter. Staleness of a cached result is decided by comparing
//! stamps, never by wall-clock time: a node is "up to date" relative to a
//! reference time iff neither it nor any descendant was restamped after
//! that reference was taken.
//!
//! Stamps are signed. A negative stamp marks a value that is not yet
//! globally visible; such a value is never considered up to date.

use std::sync::atomic::{AtomicI64, Ordering};

static CLOCK: AtomicI64 = AtomicI64::new(1);

/// A point on the kernel's logical clock.
///
/// Ordered, compact, and cheap to copy. `LogicalTime::now()` is unique per
/// call for the lifetime of the process.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct LogicalTime(i64);

impl LogicalTime {
    /// The stamp carried by values that never change (atoms).
    pub const ZERO: LogicalTime = LogicalTime(0);

    /// Advance the global clock and return the new time.
    #[inline]
    pub fn now() -> LogicalTime {
        LogicalTime(CLOCK.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw signed counter value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Rebuild a stamp from its raw value.
    #[inline]
    pub const fn from_raw(raw: i64) -> LogicalTime {
        LogicalTime(raw)
    }

    /// Whether this stamp is globally visible. Negative stamps mark values
    /// still private to their producer and are never up to date.
    #[inline]
    pub const fn is_visible(self) -> bool {
        self.0 >= 0
    }
}

impl std::fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_strictly_monotonic() {
        let a = LogicalTime::now();
        let b = LogicalTime::now();
        let c = LogicalTime::now();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn negative_stamps_are_invisible() {
        assert!(LogicalTime::ZERO.is_visible());
        assert!(LogicalTime::now().is_visible());
        assert!(!LogicalTime::from_raw(-5).is_visible());
    }
}
