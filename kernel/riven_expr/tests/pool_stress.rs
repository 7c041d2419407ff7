//! Leak check for the node lifecycle.
//!
//! Builds and drops a large number of randomly shaped trees and verifies
//! the live-node counter returns to where it started. Runs as its own
//! test binary with a single test function: the counter is process-global,
//! so anything creating expressions concurrently would perturb it.

use riven_expr::{pool, Expr, SymbolTable};

/// Small deterministic generator; splitmix64.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

fn random_tree(rng: &mut Rng, table: &SymbolTable, depth: usize) -> Expr {
    if depth == 0 || rng.below(4) == 0 {
        return match rng.below(3) {
            0 => Expr::int(rng.next() as i64),
            1 => Expr::real(rng.below(1000) as f64 / 7.0),
            _ => Expr::symbol(table.intern(&format!("s{}", rng.below(16)))),
        };
    }
    let arity = rng.below(5) as usize;
    let head = Expr::symbol(table.intern(&format!("h{}", rng.below(8))));
    let items = (0..arity)
        .map(|_| random_tree(rng, table, depth - 1))
        .collect();
    Expr::node(head, items)
}

#[test]
fn live_node_count_returns_to_baseline() {
    let table = SymbolTable::new();
    let mut rng = Rng(0x5eed);

    // Random shapes through every shared path: views, copies, rewrites.
    let baseline = pool::live_node_count();
    for round in 0..200i64 {
        let mut kept = Vec::new();
        for _ in 0..50 {
            let tree = random_tree(&mut rng, &table, 5);

            let viewed = tree.item_range(2, 3);
            let rewritten = tree.clone().with_item(1, Expr::int(round));
            let widened = tree.clone().resized(tree.len() + 2);

            kept.push((tree, viewed, rewritten, widened));
        }
        drop(kept);
    }
    assert_eq!(pool::live_node_count(), baseline);

    // A degenerate chain must tear down iteratively, not by recursing
    // once per level.
    let head = Expr::symbol(table.intern("h"));
    let baseline = pool::live_node_count();
    {
        let mut chain = Expr::int(0);
        for _ in 0..200_000 {
            chain = Expr::node(head.clone(), vec![chain]);
        }
        drop(chain);
    }
    assert_eq!(pool::live_node_count(), baseline);
}
