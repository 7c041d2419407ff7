//! Property tests for the canonical order.
//!
//! `canonical_cmp` must be a total order over arbitrary expressions —
//! antisymmetric, transitive, and consistent under swap — including the
//! class rule that complex-number constructions sort before symbols,
//! which sort before other composites.

use proptest::prelude::*;
use riven_expr::{Expr, Symbol};
use std::cmp::Ordering;

/// Strategy for arbitrary small expressions, including `Complex(..)`
/// constructions so the class ordering rule is exercised.
fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        Just(Expr::Null),
        (-100i64..100).prop_map(Expr::int),
        (-100i64..100).prop_map(|n| Expr::real(n as f64 / 4.0)),
        "[a-e]{1,3}".prop_map(|s| Expr::string(s)),
        prop_oneof![Just("x"), Just("y"), Just("Plus"), Just("List")]
            .prop_map(|name| Expr::symbol(Symbol::new(name))),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            prop_oneof![
                Just("f"),
                Just("g"),
                Just("Complex"),
                Just("List"),
            ],
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(head, items)| Expr::node(Expr::symbol(Symbol::new(head)), items))
    })
}

proptest! {
    #[test]
    fn reflexive(a in arb_expr()) {
        prop_assert_eq!(a.canonical_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn antisymmetric(a in arb_expr(), b in arb_expr()) {
        prop_assert_eq!(a.canonical_cmp(&b), b.canonical_cmp(&a).reverse());
    }

    #[test]
    fn transitive(a in arb_expr(), b in arb_expr(), c in arb_expr()) {
        let mut sorted = [a, b, c];
        sorted.sort_by(|x, y| x.canonical_cmp(y));
        // After sorting by the order, every adjacent and skipping pair
        // must agree with it.
        prop_assert_ne!(sorted[0].canonical_cmp(&sorted[1]), Ordering::Greater);
        prop_assert_ne!(sorted[1].canonical_cmp(&sorted[2]), Ordering::Greater);
        prop_assert_ne!(sorted[0].canonical_cmp(&sorted[2]), Ordering::Greater);
    }

    #[test]
    fn structural_equality_implies_order_equality(a in arb_expr()) {
        let b = a.clone();
        prop_assert_eq!(a.canonical_cmp(&b), Ordering::Equal);
    }

    #[test]
    fn class_rule_holds(items in prop::collection::vec(arb_expr(), 1..8)) {
        // Complex constructions < symbols < other composites, whatever
        // the values involved.
        let complex = Expr::node(
            Expr::symbol(Symbol::new("Complex")),
            vec![Expr::int(0), Expr::int(1)],
        );
        let symbol = Expr::symbol(Symbol::new("m"));
        let composite = Expr::node(Expr::symbol(Symbol::new("f")), vec![Expr::int(0)]);

        prop_assert_eq!(complex.canonical_cmp(&symbol), Ordering::Less);
        prop_assert_eq!(symbol.canonical_cmp(&composite), Ordering::Less);

        // And sorting a mixed batch never panics and is idempotent.
        let mut batch = items;
        batch.sort_by(|x, y| x.canonical_cmp(y));
        let again = {
            let mut b = batch.clone();
            b.sort_by(|x, y| x.canonical_cmp(y));
            b
        };
        for (x, y) in batch.iter().zip(&again) {
            prop_assert_eq!(x.canonical_cmp(y), Ordering::Equal);
        }
    }
}
