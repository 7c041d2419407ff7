//! Stack safety utilities for deep expression-tree recursion.
//!
//! Expressions are unbounded trees, and equality, canonical ordering,
//! hashing, staleness checks, and associative flattening all recurse
//! structurally. A hostile or machine-generated input (a list nested a
//! hundred thousand levels deep) would overflow the OS stack long before it
//! exhausts memory. Every such traversal in the kernel wraps its recursive
//! step in [`ensure_deep_stack`], which grows the stack on demand instead of
//! crashing.
//!
//! # Platform Support
//!
//! - **Native targets**: uses the `stacker` crate to grow the stack.
//! - **WASM targets**: no-op passthrough (WASM manages its own stack).

/// Minimum stack space to keep available (64KB red zone).
///
/// If less than this amount remains, the stack is grown before recursing.
/// A single traversal frame over an expression node is small, so the red
/// zone only needs to cover a short burst of frames plus the allocator.
const RED_ZONE: usize = 64 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_GROWTH: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
///
/// Call this around the recursive step of any structural traversal:
///
/// ```text
/// fn equal(a: &Expr, b: &Expr) -> bool {
///     ensure_deep_stack(|| {
///         // ... compare heads, recurse into children ...
///     })
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_deep_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_GROWTH, f)
}

/// WASM version: call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_deep_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
