//! Physical storage of composite expressions.
//!
//! A composite expression is either **owning** (head plus a contiguous
//! child buffer) or a **view** (a window into another owning node's buffer
//! under its own head). Views are how sub-ranges are taken without
//! copying; they hold a strong reference to the buffer and never mutate
//! it. The buffer of a view is an owning node by type, so view-of-view
//! chains cannot be built: taking a range of a view re-anchors on the
//! underlying buffer.
//!
//! Mutation anywhere in this module requires unique ownership
//! (`Arc::get_mut`); shared nodes are copied instead. The two exceptions
//! are caches that do not alter content: the flag word and the metadata
//! slot, both safe to update through shared references.

use crate::clock::LogicalTime;
use crate::expr::Expr;
use crate::metadata::MetadataSlot;
use crate::pool;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

/// Flag bit: the children are known to be in canonical order.
pub(crate) const FLAG_SORTED: u32 = 1 << 0;

/// An owning composite node: head plus contiguous children.
pub struct OwningNode {
    pub(crate) head: Expr,
    pub(crate) items: Vec<Expr>,
    /// Logical time of the last change to this node's own head or
    /// children. Changes inside children do not restamp the parent.
    pub(crate) last_change: AtomicI64,
    /// Cached derived properties (`FLAG_*`), cleared on mutation.
    pub(crate) flags: AtomicU32,
    pub(crate) metadata: MetadataSlot,
}

impl OwningNode {
    pub(crate) fn new(head: Expr, items: Vec<Expr>) -> OwningNode {
        pool::note_node_created();
        OwningNode {
            head,
            items,
            last_change: AtomicI64::new(LogicalTime::now().raw()),
            flags: AtomicU32::new(0),
            metadata: MetadataSlot::empty(),
        }
    }

    /// Forget every cached fact about this node's content: called before
    /// any in-place mutation of head or children.
    pub(crate) fn invalidate_caches(&mut self) {
        self.flags.store(0, Ordering::Release);
        self.metadata.clear();
        self.last_change
            .store(LogicalTime::now().raw(), Ordering::Release);
    }
}

impl Drop for OwningNode {
    /// Iterative teardown. A degenerate chain of uniquely-owned nodes
    /// would otherwise recurse once per level and overflow the stack;
    /// instead, every uniquely-owned descendant is dismantled onto a
    /// worklist and its emptied child buffer goes back to the pool.
    fn drop(&mut self) {
        // Nodes already dismantled by an enclosing drop (and plain calls
        // with an atomic head and no children) have nothing to walk.
        if self.items.is_empty() && !matches!(self.head, Expr::Node(_)) {
            pool::release(std::mem::take(&mut self.items));
            pool::note_node_dropped();
            return;
        }

        let mut items = std::mem::take(&mut self.items);
        let mut work: Vec<Expr> = Vec::with_capacity(items.len() + 1);
        work.push(std::mem::take(&mut self.head));
        work.append(&mut items);
        pool::release(items);

        while let Some(expr) = work.pop() {
            match expr {
                Expr::Node(NodeRef(NodeRepr::Owning(arc))) => {
                    if let Ok(mut node) = Arc::try_unwrap(arc) {
                        let mut inner = std::mem::take(&mut node.items);
                        work.push(std::mem::take(&mut node.head));
                        work.append(&mut inner);
                        pool::release(inner);
                        // `node` drops here with empty buffers.
                    }
                }
                Expr::Node(NodeRef(NodeRepr::View(arc))) => {
                    if let Ok(view) = Arc::try_unwrap(arc) {
                        work.push(view.head);
                        work.push(Expr::Node(NodeRef(NodeRepr::Owning(view.buffer))));
                    }
                }
                _ => {}
            }
        }

        pool::note_node_dropped();
    }
}

/// A window into an owning node's child buffer, under its own head.
pub struct ViewNode {
    pub(crate) head: Expr,
    /// Offset of the first visible child within `buffer.items`.
    pub(crate) start: usize,
    pub(crate) length: usize,
    pub(crate) buffer: Arc<OwningNode>,
    pub(crate) last_change: AtomicI64,
    pub(crate) flags: AtomicU32,
    pub(crate) metadata: MetadataSlot,
}

impl ViewNode {
    pub(crate) fn new(head: Expr, start: usize, length: usize, buffer: Arc<OwningNode>) -> ViewNode {
        debug_assert!(start + length <= buffer.items.len());
        ViewNode {
            head,
            start,
            length,
            buffer,
            last_change: AtomicI64::new(LogicalTime::now().raw()),
            flags: AtomicU32::new(0),
            metadata: MetadataSlot::empty(),
        }
    }
}

pub(crate) enum NodeRepr {
    Owning(Arc<OwningNode>),
    View(Arc<ViewNode>),
}

/// Shared reference to a composite node, owning or view.
pub struct NodeRef(pub(crate) NodeRepr);

impl Clone for NodeRef {
    fn clone(&self) -> NodeRef {
        match &self.0 {
            NodeRepr::Owning(arc) => NodeRef(NodeRepr::Owning(Arc::clone(arc))),
            NodeRepr::View(arc) => NodeRef(NodeRepr::View(Arc::clone(arc))),
        }
    }
}

impl NodeRef {
    pub(crate) fn owning(node: OwningNode) -> NodeRef {
        NodeRef(NodeRepr::Owning(Arc::new(node)))
    }

    pub(crate) fn view(view: ViewNode) -> NodeRef {
        NodeRef(NodeRepr::View(Arc::new(view)))
    }

    /// Number of children (the head not included).
    #[inline]
    pub fn len(&self) -> usize {
        match &self.0 {
            NodeRepr::Owning(n) => n.items.len(),
            NodeRepr::View(v) => v.length,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub(crate) fn head_ref(&self) -> &Expr {
        match &self.0 {
            NodeRepr::Owning(n) => &n.head,
            NodeRepr::View(v) => &v.head,
        }
    }

    /// The visible children as one slice, whichever encoding backs them.
    #[inline]
    pub(crate) fn children(&self) -> &[Expr] {
        match &self.0 {
            NodeRepr::Owning(n) => &n.items,
            NodeRepr::View(v) => &v.buffer.items[v.start..v.start + v.length],
        }
    }

    /// Child `index` with 0 meaning the head; out of range is `None`.
    #[inline]
    pub(crate) fn child_ref(&self, index: usize) -> Option<&Expr> {
        if index == 0 {
            Some(self.head_ref())
        } else {
            self.children().get(index - 1)
        }
    }

    pub(crate) fn last_change_cell(&self) -> &AtomicI64 {
        match &self.0 {
            NodeRepr::Owning(n) => &n.last_change,
            NodeRepr::View(v) => &v.last_change,
        }
    }

    pub(crate) fn flags_cell(&self) -> &AtomicU32 {
        match &self.0 {
            NodeRepr::Owning(n) => &n.flags,
            NodeRepr::View(v) => &v.flags,
        }
    }

    pub(crate) fn metadata_slot(&self) -> &MetadataSlot {
        match &self.0 {
            NodeRepr::Owning(n) => &n.metadata,
            NodeRepr::View(v) => &v.metadata,
        }
    }

    /// Whether `self` and `other` are the same allocation.
    #[inline]
    pub(crate) fn same(&self, other: &NodeRef) -> bool {
        match (&self.0, &other.0) {
            (NodeRepr::Owning(a), NodeRepr::Owning(b)) => Arc::ptr_eq(a, b),
            (NodeRepr::View(a), NodeRepr::View(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn address(&self) -> usize {
        match &self.0 {
            NodeRepr::Owning(a) => Arc::as_ptr(a) as usize,
            NodeRepr::View(a) => Arc::as_ptr(a) as usize,
        }
    }
}
