//! Recycling pool for small child buffers.
//!
//! Expression trees churn through huge numbers of short-lived nodes of
//! small arity, and the allocation that matters per node is its child
//! buffer. When the last reference to an owning node drops, the emptied
//! buffer is parked here instead of freed; construction of a node with the
//! same arity reclaims it.
//!
//! Each pooled arity has a fixed ring of slots and one atomic cursor. The
//! cursor step and the slot access are individually atomic but not
//! synchronized with each other: two threads may race to the same slot and
//! one of them simply loses — an acquire that loses falls back to a plain
//! heap allocation, a release that loses frees its buffer. That race is
//! performance-only; no buffer is ever handed out twice because each slot
//! is taken under its own `try_lock`.

use crate::expr::Expr;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::LazyLock;

/// Largest child-buffer capacity kept in the pool. Larger buffers are
/// always freed normally.
pub(crate) const MAX_POOLED_ARITY: usize = 8;

/// Slots per arity ring. A full ring frees further releases.
const RING_CAPACITY: usize = 32;

struct Ring {
    cursor: AtomicUsize,
    slots: [Mutex<Option<Vec<Expr>>>; RING_CAPACITY],
}

impl Ring {
    fn new() -> Ring {
        Ring {
            cursor: AtomicUsize::new(0),
            slots: std::array::from_fn(|_| Mutex::new(None)),
        }
    }
}

static RINGS: LazyLock<[Ring; MAX_POOLED_ARITY + 1]> =
    LazyLock::new(|| std::array::from_fn(|_| Ring::new()));

/// Count of live owning nodes, for leak detection in tests.
static LIVE_NODES: AtomicIsize = AtomicIsize::new(0);

/// Try to reclaim a pooled buffer with capacity for exactly `arity`
/// children. `None` on a pool miss (empty slot, lost race, or unpooled
/// arity); the caller allocates normally.
pub(crate) fn acquire(arity: usize) -> Option<Vec<Expr>> {
    if arity > MAX_POOLED_ARITY {
        return None;
    }
    let ring = &RINGS[arity];
    // Step back first, then read: releases step forward, so the ring
    // behaves as a stack of recently parked buffers.
    let pos = ring.cursor.fetch_sub(1, Ordering::Relaxed).wrapping_sub(1);
    let mut slot = ring.slots[pos % RING_CAPACITY].try_lock()?;
    slot.take()
}

/// Park an emptied buffer for reuse, or free it if its arity is not
/// pooled or the ring slot cannot be taken.
pub(crate) fn release(mut buffer: Vec<Expr>) {
    buffer.clear();
    let capacity = buffer.capacity();
    if capacity == 0 || capacity > MAX_POOLED_ARITY {
        return;
    }
    let ring = &RINGS[capacity];
    let pos = ring.cursor.fetch_add(1, Ordering::Relaxed);
    if let Some(mut slot) = ring.slots[pos % RING_CAPACITY].try_lock() {
        // Overwriting a still-occupied slot frees the older buffer.
        *slot = Some(buffer);
    }
}

/// A child buffer with capacity for `arity` children: recycled when the
/// pool has one, freshly allocated otherwise.
pub(crate) fn buffer(arity: usize) -> Vec<Expr> {
    acquire(arity).unwrap_or_else(|| Vec::with_capacity(arity))
}

pub(crate) fn note_node_created() {
    LIVE_NODES.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_node_dropped() {
    LIVE_NODES.fetch_sub(1, Ordering::Relaxed);
}

/// Number of owning nodes currently alive in the process.
///
/// Meaningful for leak checks only when no other thread is creating or
/// dropping expressions; the stress test runs in its own test binary for
/// that reason.
pub fn live_node_count() -> isize {
    LIVE_NODES.load(Ordering::Relaxed)
}
