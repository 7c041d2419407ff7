//! Cooperative abort flag.
//!
//! Evaluation runs on plain OS threads with no scheduler that could
//! interrupt them, so cancellation is cooperative: anyone may raise the
//! process-global abort flag, and the dispatch layer checks it before
//! invoking a builtin. The size-overflow path in expression construction
//! raises it as well, turning a hopeless allocation request into a normal
//! abort of the current computation.
//!
//! The flag carries no payload and is not reset by the kernel itself;
//! whoever drives evaluation clears it once the abort has been observed.

use std::sync::atomic::{AtomicBool, Ordering};

static ABORT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Request that the current computation stop at the next dispatch point.
#[inline]
pub fn request() {
    ABORT_REQUESTED.store(true, Ordering::Release);
}

/// Clear a previously requested abort.
#[inline]
pub fn clear() {
    ABORT_REQUESTED.store(false, Ordering::Release);
}

/// Whether an abort has been requested and not yet cleared.
#[inline]
pub fn is_requested() -> bool {
    ABORT_REQUESTED.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_and_clear() {
        clear();
        assert!(!is_requested());
        request();
        assert!(is_requested());
        clear();
        assert!(!is_requested());
    }
}
