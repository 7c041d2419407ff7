//! Canonical argument sorting.
//!
//! Symmetric and orderless heads keep their arguments in canonical order
//! so structurally equal expressions are also representationally equal.
//! The sort is stable on the canonical order with the elements' storage
//! addresses as the final tie-break, which pins down one result even for
//! distinct elements that compare equal.
//!
//! A node remembers that its arguments are sorted in its flag word, so
//! re-sorting is O(n) at worst (one verification scan) and O(1) once the
//! flag is set. Any mutation clears the flag.

use crate::expr::Expr;
use crate::node::{NodeRef, NodeRepr};
use std::cmp::Ordering;
use std::sync::Arc;

fn in_canonical_order(children: &[Expr]) -> bool {
    children
        .windows(2)
        .all(|pair| pair[0].canonical_cmp(&pair[1]) != Ordering::Greater)
}

fn canonical_with_address(a: &Expr, b: &Expr) -> Ordering {
    a.canonical_cmp(b)
        .then_with(|| a.storage_address().cmp(&b.storage_address()))
}

impl Expr {
    /// Sort the arguments into canonical order, consuming the receiver.
    ///
    /// Already-sorted nodes (knowingly so via the flag, or found so by a
    /// verification scan) come back as the same allocation; otherwise the
    /// node is sorted in place when uniquely owned, or rebuilt sorted.
    pub fn sorted(self) -> Expr {
        if !self.is_node() {
            return self;
        }
        if self.flag_sorted() {
            return self;
        }
        if in_canonical_order(self.children()) {
            self.set_flag_sorted();
            return self;
        }
        match self {
            Expr::Node(NodeRef(NodeRepr::Owning(mut arc))) => {
                if let Some(own) = Arc::get_mut(&mut arc) {
                    own.invalidate_caches();
                    own.items.sort_by(canonical_with_address);
                } else {
                    let mut items: Vec<Expr> = arc.items.to_vec();
                    items.sort_by(canonical_with_address);
                    let fresh = Expr::node(arc.head.clone(), items);
                    fresh.set_flag_sorted();
                    return fresh;
                }
                let sorted = Expr::Node(NodeRef(NodeRepr::Owning(arc)));
                sorted.set_flag_sorted();
                sorted
            }
            Expr::Node(NodeRef(NodeRepr::View(view))) => {
                let visible = &view.buffer.items[view.start..view.start + view.length];
                let mut items: Vec<Expr> = visible.to_vec();
                items.sort_by(canonical_with_address);
                let fresh = Expr::node(view.head.clone(), items);
                fresh.set_flag_sorted();
                fresh
            }
            atom => atom,
        }
    }
}
