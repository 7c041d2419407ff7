//! Riven Dispatch - builtin dispatch for the Riven kernel.
//!
//! This crate maps head symbols to native ("builtin") implementations.
//! The evaluator reduces an expression by reading its head symbol, asking
//! the tables here "is there code for this symbol in this role?", and
//! invoking whatever it finds; builtin modules populate the tables at
//! load time through the registration API.
//!
//! # Architecture
//!
//! - [`Usage`]: the five evaluation roles (early/down/sub/up/approx)
//! - [`DispatchTables`]: five lock-guarded identity-keyed hashtables
//! - [`Kernel`]: the composition root owning one runtime's symbol table
//!   and dispatch tables
//!
//! Cancellation is cooperative: `run_code` consults the abort flag in
//! `riven_expr::abort` before invoking anything, and reports an abort the
//! same way as a missing registration (`None`).

mod kernel;
mod tables;
mod usage;

pub use kernel::Kernel;
pub use tables::DispatchTables;
pub use usage::{ApproxFn, BuiltinFn, Usage};

// Re-export the value types every consumer of this crate touches.
pub use riven_expr::{abort, Expr, Symbol, SymbolTable};
