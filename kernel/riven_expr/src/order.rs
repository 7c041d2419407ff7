//! Identity, structural equality, hashing, and the canonical order.
//!
//! Three notions of sameness coexist:
//!   - [`Expr::same`]: allocation identity, non-recursive and O(1). This
//!     is what "the same expression" means to the dispatch tables and to
//!     the copy-on-write short circuits.
//!   - `==`: structural equality, recursive. Views compare equal to the
//!     owning nodes they window.
//!   - [`Expr::canonical_cmp`]: the total order used for canonical
//!     argument sorting. Value classes rank `Null`, then numbers, then
//!     strings, then complex-number constructions, then symbols, then all
//!     other composites; within a class the order is value-wise, with
//!     allocation address as the final tie-break for same-named symbols.
//!
//! Reals compare and hash under bit-normalized semantics so the `Eq` and
//! `Hash` contracts hold: `-0.0` equals and hashes like `0.0`, and a NaN
//! equals itself.

use crate::expr::Expr;
use crate::symbol::Symbol;
use riven_stack::ensure_deep_stack;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Head name identifying complex-number constructions, which sort ahead
/// of symbols regardless of which table interned the head.
const COMPLEX_HEAD: &str = "Complex";

impl Expr {
    /// Allocation identity: both values are the same atom or the same
    /// node allocation. Never recurses. String atoms compare by content
    /// (they are immutable values with no useful identity).
    pub fn same(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::Null, Expr::Null) => true,
            (Expr::Int(a), Expr::Int(b)) => a == b,
            (Expr::Real(a), Expr::Real(b)) => a.to_bits() == b.to_bits(),
            (Expr::Str(a), Expr::Str(b)) => a == b,
            (Expr::Symbol(a), Expr::Symbol(b)) => a.same(b),
            (Expr::Node(a), Expr::Node(b)) => a.same(b),
            _ => false,
        }
    }

    /// Rank of the value class in the canonical order.
    fn class_rank(&self) -> u8 {
        match self {
            Expr::Null => 0,
            Expr::Int(_) | Expr::Real(_) => 1,
            Expr::Str(_) => 2,
            Expr::Node(_) if self.is_complex_construction() => 3,
            Expr::Symbol(_) => 4,
            Expr::Node(_) => 5,
        }
    }

    /// Whether this is a composite whose head symbol is named `Complex`.
    fn is_complex_construction(&self) -> bool {
        match self {
            Expr::Node(node) => matches!(
                node.head_ref(),
                Expr::Symbol(s) if s.name() == COMPLEX_HEAD
            ),
            _ => false,
        }
    }

    /// The canonical total order.
    pub fn canonical_cmp(&self, other: &Expr) -> Ordering {
        ensure_deep_stack(|| {
            let rank = self.class_rank().cmp(&other.class_rank());
            if rank != Ordering::Equal {
                return rank;
            }
            match (self, other) {
                (Expr::Null, Expr::Null) => Ordering::Equal,
                (Expr::Int(a), Expr::Int(b)) => a.cmp(b),
                (Expr::Int(a), Expr::Real(b)) => {
                    cmp_real(*a as f64, *b).then(Ordering::Less)
                }
                (Expr::Real(a), Expr::Int(b)) => {
                    cmp_real(*a, *b as f64).then(Ordering::Greater)
                }
                (Expr::Real(a), Expr::Real(b)) => cmp_real(*a, *b),
                (Expr::Str(a), Expr::Str(b)) => a.cmp(b),
                (Expr::Symbol(a), Expr::Symbol(b)) => cmp_symbols(a, b),
                (Expr::Node(a), Expr::Node(b)) => {
                    // Shorter composites first, then head, then children
                    // position by position.
                    a.len()
                        .cmp(&b.len())
                        .then_with(|| a.head_ref().canonical_cmp(b.head_ref()))
                        .then_with(|| {
                            for (x, y) in a.children().iter().zip(b.children()) {
                                let c = x.canonical_cmp(y);
                                if c != Ordering::Equal {
                                    return c;
                                }
                            }
                            Ordering::Equal
                        })
                }
                // Distinct variants of equal rank are covered above.
                _ => Ordering::Equal,
            }
        })
    }

    /// Address of the backing allocation, used as the deterministic final
    /// tie-break in stable sorting. Unboxed atoms have no address.
    pub(crate) fn storage_address(&self) -> usize {
        match self {
            Expr::Null | Expr::Int(_) | Expr::Real(_) => 0,
            Expr::Str(s) => s.as_ptr() as usize,
            Expr::Symbol(s) => s.address(),
            Expr::Node(n) => n.address(),
        }
    }
}

/// Total order on reals: ordinary comparison where it is defined,
/// bit-level order for the NaN cases, `-0.0 == 0.0`.
fn cmp_real(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// Symbols order by name; distinct allocations under one name (possible
/// across table teardowns) fall back to address order so the result is
/// still total.
fn cmp_symbols(a: &Symbol, b: &Symbol) -> Ordering {
    a.name()
        .cmp(b.name())
        .then_with(|| a.address().cmp(&b.address()))
}

impl PartialEq for Expr {
    /// Structural equality. Short-circuits on identity and on length
    /// mismatch; views are transparent.
    fn eq(&self, other: &Expr) -> bool {
        ensure_deep_stack(|| {
            if self.same(other) {
                return true;
            }
            match (self, other) {
                (Expr::Node(a), Expr::Node(b)) => {
                    a.len() == b.len()
                        && a.head_ref() == b.head_ref()
                        && a.children() == b.children()
                }
                _ => false,
            }
        })
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    /// Structural hash, consistent with `==` across encodings: a view
    /// hashes like the owning node it is equal to.
    fn hash<H: Hasher>(&self, state: &mut H) {
        ensure_deep_stack(|| match self {
            Expr::Null => state.write_u8(0),
            Expr::Int(n) => {
                state.write_u8(1);
                n.hash(state);
            }
            Expr::Real(r) => {
                state.write_u8(2);
                // Normalize the one equal-but-differently-bitted pair.
                let bits = if *r == 0.0 { 0u64 } else { r.to_bits() };
                bits.hash(state);
            }
            Expr::Str(s) => {
                state.write_u8(3);
                s.hash(state);
            }
            Expr::Symbol(s) => {
                state.write_u8(4);
                // Identity-equal implies name-equal, so hashing the name
                // is consistent and stable.
                s.name().hash(state);
            }
            Expr::Node(node) => {
                state.write_u8(5);
                state.write_usize(node.len());
                node.head_ref().hash(state);
                for child in node.children() {
                    child.hash(state);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(e: &Expr) -> u64 {
        let mut h = DefaultHasher::new();
        e.hash(&mut h);
        h.finish()
    }

    #[test]
    fn same_is_identity_not_structure() {
        let table = SymbolTable::new();
        let f = Expr::symbol(table.intern("f"));
        let a = Expr::node(f.clone(), vec![Expr::int(1)]);
        let b = Expr::node(f.clone(), vec![Expr::int(1)]);

        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_structural_and_recursive() {
        let table = SymbolTable::new();
        let f = Expr::symbol(table.intern("f"));
        let g = Expr::symbol(table.intern("g"));

        let nested1 = Expr::node(f.clone(), vec![Expr::node(g.clone(), vec![Expr::int(2)])]);
        let nested2 = Expr::node(f.clone(), vec![Expr::node(g.clone(), vec![Expr::int(2)])]);
        let different = Expr::node(f.clone(), vec![Expr::node(g.clone(), vec![Expr::int(3)])]);

        assert_eq!(nested1, nested2);
        assert_ne!(nested1, different);
        assert_ne!(nested1, Expr::node(f, vec![Expr::int(2), Expr::int(2)]));
    }

    #[test]
    fn views_are_structurally_transparent() {
        let table = SymbolTable::new();
        let f = Expr::symbol(table.intern("f"));
        let full = Expr::node(
            f.clone(),
            vec![Expr::int(1), Expr::int(2), Expr::int(3), Expr::int(4)],
        );

        let view = full.item_range(2, 2);
        let owned = Expr::node(f, vec![Expr::int(2), Expr::int(3)]);
        assert_eq!(view, owned);
        assert_eq!(hash_of(&view), hash_of(&owned));
    }

    #[test]
    fn real_equality_is_bit_normalized() {
        assert_eq!(Expr::real(0.0), Expr::real(-0.0));
        assert_eq!(hash_of(&Expr::real(0.0)), hash_of(&Expr::real(-0.0)));
        assert_eq!(Expr::real(f64::NAN), Expr::real(f64::NAN));
        assert_ne!(Expr::real(1.0), Expr::int(1));
    }

    #[test]
    fn class_ranking_orders_kinds() {
        let table = SymbolTable::new();
        let complex = Expr::node(
            Expr::symbol(table.intern("Complex")),
            vec![Expr::int(1), Expr::int(2)],
        );
        let symbol = Expr::symbol(table.intern("x"));
        let composite = Expr::node(Expr::symbol(table.intern("f")), vec![Expr::int(1)]);
        let number = Expr::int(7);
        let string = Expr::string("s");

        assert_eq!(number.canonical_cmp(&string), Ordering::Less);
        assert_eq!(string.canonical_cmp(&complex), Ordering::Less);
        assert_eq!(complex.canonical_cmp(&symbol), Ordering::Less);
        assert_eq!(symbol.canonical_cmp(&composite), Ordering::Less);
        assert_eq!(composite.canonical_cmp(&complex), Ordering::Greater);
    }

    #[test]
    fn symbols_order_by_name() {
        let table = SymbolTable::new();
        let a = Expr::symbol(table.intern("Apple"));
        let b = Expr::symbol(table.intern("Banana"));
        assert_eq!(a.canonical_cmp(&b), Ordering::Less);
        assert_eq!(b.canonical_cmp(&a), Ordering::Greater);
        assert_eq!(a.canonical_cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn same_named_symbols_still_order_totally() {
        use crate::symbol::Symbol;
        let a = Expr::symbol(Symbol::new("x"));
        let b = Expr::symbol(Symbol::new("x"));

        let ab = a.canonical_cmp(&b);
        assert_ne!(ab, Ordering::Equal);
        assert_eq!(ab, b.canonical_cmp(&a).reverse());
    }

    #[test]
    fn composites_order_by_length_then_head_then_children() {
        let table = SymbolTable::new();
        let f = Expr::symbol(table.intern("f"));
        let g = Expr::symbol(table.intern("g"));

        let short = Expr::node(f.clone(), vec![Expr::int(9)]);
        let long = Expr::node(f.clone(), vec![Expr::int(1), Expr::int(1)]);
        assert_eq!(short.canonical_cmp(&long), Ordering::Less);

        let fx = Expr::node(f.clone(), vec![Expr::int(1)]);
        let gx = Expr::node(g, vec![Expr::int(1)]);
        assert_eq!(fx.canonical_cmp(&gx), Ordering::Less);

        let f1 = Expr::node(f.clone(), vec![Expr::int(1)]);
        let f2 = Expr::node(f, vec![Expr::int(2)]);
        assert_eq!(f1.canonical_cmp(&f2), Ordering::Less);
    }

    #[test]
    fn numbers_order_by_value_with_int_before_real_on_ties() {
        assert_eq!(Expr::int(1).canonical_cmp(&Expr::int(2)), Ordering::Less);
        assert_eq!(Expr::int(2).canonical_cmp(&Expr::real(1.5)), Ordering::Greater);
        assert_eq!(Expr::int(1).canonical_cmp(&Expr::real(1.0)), Ordering::Less);
        assert_eq!(Expr::real(1.0).canonical_cmp(&Expr::int(1)), Ordering::Greater);
    }
}
