//! Symbols: named, interned atoms with identity equality.
//!
//! A symbol is one allocation for the lifetime of the table that interned
//! it. Two symbols are the same symbol iff they are the same allocation;
//! name equality is not symbol equality (a cleared and re-interned table
//! can hold a distinct symbol under an old name). Dispatch tables and
//! expression identity both rely on this.
//!
//! Each symbol carries an attribute bitset read on every reduction step
//! (hence atomic, not locked) and a value cell holding an arbitrary
//! expression behind a read-mostly lock.

use crate::clock::LogicalTime;
use crate::error::SymbolError;
use crate::expr::Expr;
use bitflags::bitflags;
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

bitflags! {
    /// Evaluation-relevant properties of a symbol.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct SymbolAttributes: u32 {
        /// The value cell rejects writes.
        const PROTECTED = 1 << 0;
        /// Definitions are hidden from introspection.
        const READ_PROTECTED = 1 << 1;
        /// Nested applications of this head splice into one (flattening).
        const ASSOCIATIVE = 1 << 2;
        /// Calls broadcast elementwise over list-shaped arguments.
        const LISTABLE = 1 << 3;
        /// The first argument is passed unevaluated.
        const HOLD_FIRST = 1 << 4;
        /// All arguments but the first are passed unevaluated.
        const HOLD_REST = 1 << 5;
        /// Arguments are held and even upvalue dispatch is suppressed.
        const HOLD_ALL_COMPLETE = 1 << 6;
        /// Argument sequences are not spliced.
        const SEQUENCE_HOLD = 1 << 7;
        /// The function maps numbers to numbers.
        const NUMERIC_FUNCTION = 1 << 8;
        /// `f(x)` collapses to `x`.
        const ONE_IDENTITY = 1 << 9;
        /// Argument order is canonicalized.
        const SYMMETRIC = 1 << 10;
        /// The symbol disappears when its last reference does.
        const TEMPORARY = 1 << 11;
        /// The value cell is per-thread.
        const THREAD_LOCAL = 1 << 12;
        /// All arguments are passed unevaluated.
        const HOLD_ALL = Self::HOLD_FIRST.bits() | Self::HOLD_REST.bits();
    }
}

impl SymbolAttributes {
    /// Whether calls with this head receive any argument unevaluated.
    /// Broadcasting consults this before re-evaluating threaded children.
    #[inline]
    pub fn holds_arguments(self) -> bool {
        self.intersects(
            SymbolAttributes::HOLD_FIRST
                | SymbolAttributes::HOLD_REST
                | SymbolAttributes::HOLD_ALL_COMPLETE,
        )
    }
}

pub(crate) struct SymbolData {
    name: Arc<str>,
    attributes: AtomicU32,
    value: RwLock<Expr>,
    /// Logical time of the last value-cell write.
    last_update: AtomicI64,
}

/// A shared reference to a symbol.
///
/// Cloning is a reference-count increment. Equality and hashing go by
/// allocation identity, never by name.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolData>);

impl Symbol {
    /// Create a fresh symbol that is not attached to any table.
    ///
    /// The symbol table calls this during interning; calling it directly
    /// yields a temporary symbol with its own identity, distinct from any
    /// interned symbol of the same name.
    pub fn new(name: &str) -> Symbol {
        Symbol(Arc::new(SymbolData {
            name: Arc::from(name),
            attributes: AtomicU32::new(SymbolAttributes::empty().bits()),
            value: RwLock::new(Expr::Null),
            last_update: AtomicI64::new(LogicalTime::ZERO.raw()),
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn attributes(&self) -> SymbolAttributes {
        SymbolAttributes::from_bits_truncate(self.0.attributes.load(Ordering::Acquire))
    }

    /// Replace the attribute set.
    ///
    /// Attribute writes are not gated by `PROTECTED`; lifting protection
    /// must itself be an attribute write.
    #[inline]
    pub fn set_attributes(&self, attributes: SymbolAttributes) {
        self.0.attributes.store(attributes.bits(), Ordering::Release);
    }

    /// Current content of the value cell (a new reference).
    pub fn value(&self) -> Expr {
        self.0.value.read().clone()
    }

    /// Write the value cell, rejecting writes to protected symbols.
    pub fn set_value(&self, value: Expr) -> Result<(), SymbolError> {
        if self.attributes().contains(SymbolAttributes::PROTECTED) {
            return Err(SymbolError::Protected {
                name: self.name().to_string(),
            });
        }
        *self.0.value.write() = value;
        self.0
            .last_update
            .store(LogicalTime::now().raw(), Ordering::Release);
        Ok(())
    }

    /// Logical time of the last value-cell write.
    #[inline]
    pub fn last_update(&self) -> LogicalTime {
        LogicalTime::from_raw(self.0.last_update.load(Ordering::Acquire))
    }

    /// Identity comparison: same allocation, not same name.
    #[inline]
    pub fn same(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.0.name)
    }
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Symbol) -> bool {
        self.same(other)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_not_name_equality() {
        let a = Symbol::new("x");
        let b = Symbol::new("x");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn attributes_round_trip() {
        let s = Symbol::new("Plus");
        assert_eq!(s.attributes(), SymbolAttributes::empty());

        s.set_attributes(SymbolAttributes::ASSOCIATIVE | SymbolAttributes::LISTABLE);
        assert!(s.attributes().contains(SymbolAttributes::ASSOCIATIVE));
        assert!(!s.attributes().contains(SymbolAttributes::PROTECTED));
    }

    #[test]
    fn hold_all_implies_holding() {
        assert!(SymbolAttributes::HOLD_ALL.holds_arguments());
        assert!(SymbolAttributes::HOLD_FIRST.holds_arguments());
        assert!(!SymbolAttributes::LISTABLE.holds_arguments());
    }

    #[test]
    fn value_cell_round_trip() {
        let s = Symbol::new("x");
        assert_eq!(s.value(), Expr::Null);

        let before = LogicalTime::now();
        s.set_value(Expr::int(42)).unwrap();
        assert_eq!(s.value(), Expr::int(42));
        assert!(s.last_update() > before);
    }

    #[test]
    fn protected_symbols_reject_writes() {
        let s = Symbol::new("Pi");
        s.set_value(Expr::real(3.14)).unwrap();
        s.set_attributes(SymbolAttributes::PROTECTED);

        let err = s.set_value(Expr::int(3)).unwrap_err();
        assert_eq!(
            err,
            SymbolError::Protected {
                name: "Pi".to_string()
            }
        );
        assert_eq!(s.value(), Expr::real(3.14));
    }
}
