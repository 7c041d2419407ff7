//! Associative splicing.
//!
//! `f(a, g(b, g(c, d)), e)` flattened over `g` inlines every direct or
//! nested `g(...)` child into `f`'s argument list, up to a caller-chosen
//! nesting depth. This is the workhorse behind the associative attribute:
//! the evaluator flattens `Plus(1, Plus(2, 3))` into `Plus(1, 2, 3)`
//! before dispatch.
//!
//! The rewrite runs in two passes over one shared traversal: the first
//! counts the leaves (and notices whether anything matched at all), the
//! second writes them into a buffer sized by the first. Sharing the
//! traversal is what makes "counted equals written" hold by construction.

use crate::expr::Expr;
use riven_stack::ensure_deep_stack;

/// Visit the would-be argument list of `children` flattened over
/// `target`, calling `emit` once per resulting argument in final order.
/// Returns whether any child was spliced.
fn walk(children: &[Expr], target: &Expr, depth: usize, emit: &mut dyn FnMut(&Expr)) -> bool {
    let mut spliced = false;
    for child in children {
        if depth > 0 && child.head_is(target) {
            spliced = true;
            ensure_deep_stack(|| {
                walk(child.children(), target, depth - 1, &mut *emit);
            });
        } else {
            emit(child);
        }
    }
    spliced
}

impl Expr {
    /// Inline children (and their children, up to `max_depth` levels)
    /// whose head is identical to `target_head` into this node's argument
    /// list, consuming the receiver.
    ///
    /// `max_depth == 0` and inputs with no matching child are returned
    /// unchanged. Pass `usize::MAX` for unbounded splicing.
    pub fn flattened(self, target_head: &Expr, max_depth: usize) -> Expr {
        if !self.is_node() || max_depth == 0 {
            return self;
        }

        let mut count = 0usize;
        let spliced = walk(self.children(), target_head, max_depth, &mut |_| count += 1);
        if !spliced {
            return self;
        }

        let mut items = crate::pool::buffer(count);
        walk(self.children(), target_head, max_depth, &mut |leaf| {
            items.push(leaf.clone());
        });
        debug_assert_eq!(items.len(), count);

        Expr::node(self.head(), items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;
    use pretty_assertions::assert_eq;

    /// `f(a, g(b, g(c, d)), e)` from the module docs.
    fn nested_example(table: &SymbolTable) -> (Expr, Expr) {
        let f = Expr::symbol(table.intern("f"));
        let g = Expr::symbol(table.intern("g"));
        let [a, b, c, d, e] =
            ["a", "b", "c", "d", "e"].map(|n| Expr::symbol(table.intern(n)));

        let inner = Expr::node(g.clone(), vec![c, d]);
        let outer = Expr::node(g.clone(), vec![b, inner]);
        (Expr::node(f, vec![a, outer, e]), g)
    }

    #[test]
    fn depth_two_splices_both_levels() {
        let table = SymbolTable::new();
        let (input, g) = nested_example(&table);
        let [f, a, b, c, d, e] =
            ["f", "a", "b", "c", "d", "e"].map(|n| Expr::symbol(table.intern(n)));

        assert_eq!(
            input.flattened(&g, 2),
            Expr::node(f, vec![a, b, c, d, e])
        );
    }

    #[test]
    fn depth_one_keeps_the_inner_nest() {
        let table = SymbolTable::new();
        let (input, g) = nested_example(&table);
        let [f, a, b, c, d, e] =
            ["f", "a", "b", "c", "d", "e"].map(|n| Expr::symbol(table.intern(n)));

        let kept = Expr::node(g.clone(), vec![c, d]);
        assert_eq!(input.flattened(&g, 1), Expr::node(f, vec![a, b, kept, e]));
    }

    #[test]
    fn depth_zero_is_identity() {
        let table = SymbolTable::new();
        let (input, g) = nested_example(&table);
        let reference = input.clone();

        let result = input.flattened(&g, 0);
        assert!(result.same(&reference));
    }

    #[test]
    fn no_matching_child_returns_same_allocation() {
        let table = SymbolTable::new();
        let f = Expr::symbol(table.intern("f"));
        let h = Expr::symbol(table.intern("h"));
        let input = Expr::node(f, vec![Expr::int(1), Expr::int(2)]);
        let reference = input.clone();

        assert!(input.flattened(&h, usize::MAX).same(&reference));
    }

    #[test]
    fn atoms_flatten_to_themselves() {
        let table = SymbolTable::new();
        let g = Expr::symbol(table.intern("g"));
        assert_eq!(Expr::int(3).flattened(&g, 5), Expr::int(3));
    }

    #[test]
    fn head_matching_is_identity_based() {
        let table = SymbolTable::new();
        let g_interned = Expr::symbol(table.intern("g"));
        let g_temporary = Expr::symbol(crate::symbol::Symbol::new("g"));
        let f = Expr::symbol(table.intern("f"));

        let nest = Expr::node(g_interned.clone(), vec![Expr::int(1), Expr::int(2)]);
        let input = Expr::node(f, vec![nest]);
        let reference = input.clone();

        // Same name, different symbol: nothing to splice.
        assert!(input.flattened(&g_temporary, 3).same(&reference));
    }
}
