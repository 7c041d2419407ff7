//! The runtime composition root.
//!
//! A [`Kernel`] owns the symbol table and the dispatch table set for one
//! runtime instance. It is constructed at startup, handed around by
//! reference (or inside an `Arc` for multi-threaded evaluators), and torn
//! down by drop — there is no process-wide mutable kernel state, which is
//! what makes side-by-side kernels in tests possible. Only the logical
//! clock, the abort flag, and the buffer pool are process-global, and
//! none of them carries semantic state.

use crate::tables::DispatchTables;
use crate::usage::{ApproxFn, BuiltinFn, Usage};
use riven_expr::{Expr, Symbol, SymbolTable};

/// One runtime instance: interned symbols plus their registered code.
pub struct Kernel {
    symbols: SymbolTable,
    tables: DispatchTables,
}

impl Kernel {
    pub fn new() -> Kernel {
        Kernel {
            symbols: SymbolTable::new(),
            tables: DispatchTables::new(),
        }
    }

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    #[inline]
    pub fn tables(&self) -> &DispatchTables {
        &self.tables
    }

    /// Intern a name in this kernel's symbol table.
    pub fn intern(&self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    /// See [`DispatchTables::register`].
    pub fn register(&self, symbol: &Symbol, function: Option<BuiltinFn>, usage: Usage) -> bool {
        self.tables.register(symbol, function, usage)
    }

    /// See [`DispatchTables::register_approx`].
    pub fn register_approx(&self, symbol: &Symbol, function: Option<ApproxFn>) -> bool {
        self.tables.register_approx(symbol, function)
    }

    /// See [`DispatchTables::has_code`].
    pub fn has_code(&self, symbol: &Symbol, usage: Usage) -> bool {
        self.tables.has_code(symbol, usage)
    }

    /// See [`DispatchTables::run_code`].
    pub fn run_code(&self, symbol: &Symbol, usage: Usage, value: Expr) -> Option<Expr> {
        self.tables.run_code(symbol, usage, value)
    }

    /// See [`DispatchTables::run_approx_code`].
    pub fn run_approx_code(&self, symbol: &Symbol, value: Expr, precision: f64) -> Option<Expr> {
        self.tables.run_approx_code(symbol, value, precision)
    }

    /// Explicit teardown: unregister everything and drop every interned
    /// symbol. Dropping the kernel does the same implicitly; this exists
    /// for runtimes that shut down and restart within one process.
    pub fn shutdown(&self) {
        self.tables.clear();
        self.symbols.clear();
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::new()
    }
}
