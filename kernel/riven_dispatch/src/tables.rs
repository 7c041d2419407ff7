//! The dispatch table set.
//!
//! Five lock-guarded hashtables, one per usage role, each mapping a
//! symbol (by identity, not name) to a native function. The evaluator's
//! inner loop probes these on every reduction step, so the critical
//! section is exactly one hashtable probe: the function pointer is copied
//! out under the lock and invoked after the lock is dropped. Holders
//! never block and never re-enter.
//!
//! A table and its entries live and die together; each entry owns a
//! reference to its key symbol, keeping the symbol alive as long as code
//! is registered for it.

use crate::usage::{ApproxFn, BuiltinFn, Usage};
use parking_lot::Mutex;
use riven_expr::{abort, Expr, Symbol};
use rustc_hash::FxHashMap;

/// One symbol-keyed table behind its lock.
type Table<F> = Mutex<FxHashMap<Symbol, F>>;

fn new_table<F>() -> Table<F> {
    Mutex::new(FxHashMap::default())
}

/// The five per-role dispatch tables.
pub struct DispatchTables {
    early: Table<BuiltinFn>,
    down: Table<BuiltinFn>,
    sub: Table<BuiltinFn>,
    up: Table<BuiltinFn>,
    approx: Table<ApproxFn>,
}

impl DispatchTables {
    pub fn new() -> DispatchTables {
        DispatchTables {
            early: new_table(),
            down: new_table(),
            sub: new_table(),
            up: new_table(),
            approx: new_table(),
        }
    }

    /// The table for a role with the common signature; `None` for the
    /// approximate role, whose functions live in their own table.
    fn common_table(&self, usage: Usage) -> Option<&Table<BuiltinFn>> {
        match usage {
            Usage::Early => Some(&self.early),
            Usage::Down => Some(&self.down),
            Usage::Sub => Some(&self.sub),
            Usage::Up => Some(&self.up),
            Usage::Approx => None,
        }
    }

    /// Bind `function` to `symbol` for `usage`, or remove the binding
    /// when `function` is `None`.
    ///
    /// Returns false without side effects when `usage` does not accept
    /// this function signature (the approximate role; use
    /// [`DispatchTables::register_approx`]).
    pub fn register(&self, symbol: &Symbol, function: Option<BuiltinFn>, usage: Usage) -> bool {
        let Some(table) = self.common_table(usage) else {
            return false;
        };
        let mut guard = table.lock();
        match function {
            Some(f) => {
                guard.insert(symbol.clone(), f);
                tracing::trace!(symbol = symbol.name(), usage = usage.name(), "registered");
            }
            None => {
                guard.remove(symbol);
                tracing::trace!(symbol = symbol.name(), usage = usage.name(), "unregistered");
            }
        }
        true
    }

    /// Bind an approximate-role function, or remove it with `None`.
    pub fn register_approx(&self, symbol: &Symbol, function: Option<ApproxFn>) -> bool {
        let mut guard = self.approx.lock();
        match function {
            Some(f) => {
                guard.insert(symbol.clone(), f);
                tracing::trace!(symbol = symbol.name(), usage = "approx", "registered");
            }
            None => {
                guard.remove(symbol);
                tracing::trace!(symbol = symbol.name(), usage = "approx", "unregistered");
            }
        }
        true
    }

    /// Whether `symbol` has code registered for `usage`.
    pub fn has_code(&self, symbol: &Symbol, usage: Usage) -> bool {
        match usage {
            Usage::Approx => self.approx.lock().contains_key(symbol),
            _ => self
                .common_table(usage)
                .is_some_and(|t| t.lock().contains_key(symbol)),
        }
    }

    /// Look up and invoke the builtin bound to `symbol` for `usage`.
    ///
    /// `None` both when no code is registered and when an abort is
    /// pending: callers that need the distinction consult
    /// [`abort::is_requested`] themselves. The approximate role is not
    /// callable through this signature and yields `None`.
    ///
    /// The invocation happens outside the table lock.
    pub fn run_code(&self, symbol: &Symbol, usage: Usage, value: Expr) -> Option<Expr> {
        let table = self.common_table(usage)?;
        let function = {
            let guard = table.lock();
            guard.get(symbol).copied()
        };
        let function = function?;
        if abort::is_requested() {
            return None;
        }
        Some(function(value))
    }

    /// Look up and invoke the approximation hook bound to `symbol`.
    ///
    /// Same conflation as [`DispatchTables::run_code`]: `None` covers
    /// "not registered", "hook declined", and "abort pending".
    pub fn run_approx_code(&self, symbol: &Symbol, value: Expr, precision: f64) -> Option<Expr> {
        let function = {
            let guard = self.approx.lock();
            guard.get(symbol).copied()
        };
        let function = function?;
        if abort::is_requested() {
            return None;
        }
        function(value, precision)
    }

    /// Remove every binding in every role.
    pub fn clear(&self) {
        self.early.lock().clear();
        self.down.lock().clear();
        self.sub.lock().clear();
        self.up.lock().clear();
        self.approx.lock().clear();
        tracing::debug!("dispatch tables cleared");
    }
}

impl Default for DispatchTables {
    fn default() -> Self {
        DispatchTables::new()
    }
}
