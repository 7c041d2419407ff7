//! Typed errors surfaced by the expression layer.
//!
//! Everything here is recoverable: the kernel never panics on bad input.
//! Errors that abandon an operation hand the untouched input back to the
//! caller so nothing is lost.

use crate::expr::Expr;
use thiserror::Error;

/// Failure of elementwise broadcasting.
#[derive(Debug, Error)]
pub enum ThreadError {
    /// Two broadcastable arguments disagreed on length. The node being
    /// threaded is returned unmodified inside the error.
    #[error("cannot combine arguments of lengths {expected} and {found}")]
    LengthMismatch {
        expected: usize,
        found: usize,
        original: Expr,
    },
}

impl ThreadError {
    /// Recover the unmodified input node.
    pub fn into_original(self) -> Expr {
        match self {
            ThreadError::LengthMismatch { original, .. } => original,
        }
    }
}

/// Failure of a symbol-cell update.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// The symbol carries the protected attribute; its value cell cannot
    /// be written until protection is lifted.
    #[error("symbol `{name}` is protected")]
    Protected { name: String },
}
