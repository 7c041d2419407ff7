//! Elementwise broadcasting over list-shaped arguments.
//!
//! Threading `pivot(list(1,2,3), list(4,5,6))` over the head `list`
//! produces `list(pivot(1,4), pivot(2,5), pivot(3,6))`: every argument
//! whose head matches the pivot head is replaced position by position,
//! the rest ride along unchanged. This is what the listable attribute
//! means. Whether the produced children are then re-evaluated depends on
//! the head's hold attributes and is the evaluator's decision; this
//! module only builds the structure.

use crate::error::ThreadError;
use crate::expr::Expr;
use smallvec::SmallVec;

impl Expr {
    /// Broadcast arguments `start ..= end` (1-based, clamped) whose head
    /// is identical to `pivot_head`, consuming the receiver.
    ///
    /// With no qualifying argument the receiver comes back unchanged.
    /// Qualifying arguments of unequal lengths fail with
    /// [`ThreadError::LengthMismatch`], which carries the unmodified
    /// receiver.
    pub fn threaded(
        self,
        pivot_head: &Expr,
        start: usize,
        end: usize,
    ) -> Result<Expr, ThreadError> {
        if !self.is_node() {
            return Ok(self);
        }
        let length = self.len();
        let start = start.max(1);
        let end = end.min(length);

        let mut qualifying: SmallVec<[usize; 8]> = SmallVec::new();
        let mut common: Option<usize> = None;
        let mut mismatch: Option<(usize, usize)> = None;
        for index in start..=end {
            let child = &self.children()[index - 1];
            if !child.head_is(pivot_head) {
                continue;
            }
            let child_length = child.len();
            match common {
                None => common = Some(child_length),
                Some(expected) if expected != child_length => {
                    mismatch = Some((expected, child_length));
                    break;
                }
                Some(_) => {}
            }
            qualifying.push(index);
        }

        if let Some((expected, found)) = mismatch {
            return Err(ThreadError::LengthMismatch {
                expected,
                found,
                original: self,
            });
        }
        let Some(common) = common else {
            return Ok(self);
        };

        let children = self.children();
        let head = self.head();
        let mut result_items = crate::pool::buffer(common);

        if let [single] = qualifying[..] {
            // One qualifying argument: map its children into that slot.
            let pivot_arg = &children[single - 1];
            for i in 1..=common {
                let mut items = crate::pool::buffer(length);
                items.extend(children.iter().cloned());
                items[single - 1] = pivot_arg.item(i);
                result_items.push(Expr::node(head.clone(), items));
            }
        } else {
            for i in 1..=common {
                let mut items = crate::pool::buffer(length);
                items.extend(children.iter().cloned());
                for &q in &qualifying {
                    items[q - 1] = children[q - 1].item(i);
                }
                result_items.push(Expr::node(head.clone(), items));
            }
        }

        Ok(Expr::node(pivot_head.clone(), result_items))
    }
}
