//! The expression value type and its operations.
//!
//! Everything the kernel manipulates is an [`Expr`]: atoms (`Null`,
//! machine integers, reals, strings, symbols) and composite nodes. The
//! whole tree is immutable by convention — values are shared freely
//! across threads by reference counting — and copy-on-write in practice:
//! operations that "change" an expression consume their receiver and
//! return a node that is mutated in place when the receiver was the only
//! reference, or a fresh node otherwise. Children move by reference
//! increment, never by deep copy.
//!
//! Child indexing is 1-based; index 0 addresses the head. Out-of-range
//! access yields [`Expr::Null`], never an error.

use crate::clock::LogicalTime;
use crate::metadata::{DebugInfo, DispatchHint};
use crate::node::{NodeRef, NodeRepr, OwningNode, ViewNode};
use crate::pool;
use crate::symbol::Symbol;
use crate::{abort, node};
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// A symbolic expression: an atom or a reference to a composite node.
///
/// Cloning is cheap (a reference-count increment for heap-backed
/// variants). Structural equality is `==`; allocation identity is
/// [`Expr::same`].
#[derive(Clone, Default)]
pub enum Expr {
    /// The empty sentinel. Returned by out-of-range access and used as
    /// the placeholder in freshly sized nodes.
    #[default]
    Null,
    /// Machine integer. The arbitrary-precision tower lives outside this
    /// crate.
    Int(i64),
    /// Machine real.
    Real(f64),
    /// String atom.
    Str(Arc<str>),
    /// Interned (or temporary) symbol atom.
    Symbol(Symbol),
    /// Composite node, owning or view encoding.
    Node(NodeRef),
}

/// Reject child counts whose buffer could not even be addressed. The
/// check runs before any allocation; a failing request raises the abort
/// flag so the surrounding computation can unwind cooperatively.
fn length_is_representable(length: usize) -> bool {
    length
        .checked_add(1)
        .and_then(|n| n.checked_mul(std::mem::size_of::<Expr>()))
        .is_some_and(|bytes| bytes <= isize::MAX as usize)
}

fn overflow_guard(length: usize) -> bool {
    if length_is_representable(length) {
        return true;
    }
    tracing::warn!(length, "expression size overflows; requesting abort");
    abort::request();
    false
}

impl Expr {
    // Constructors

    #[inline]
    pub fn int(value: i64) -> Expr {
        Expr::Int(value)
    }

    #[inline]
    pub fn real(value: f64) -> Expr {
        Expr::Real(value)
    }

    pub fn string(value: impl Into<Arc<str>>) -> Expr {
        Expr::Str(value.into())
    }

    #[inline]
    pub fn symbol(symbol: Symbol) -> Expr {
        Expr::Symbol(symbol)
    }

    /// Build a composite node from a head and its children.
    pub fn node(head: Expr, items: Vec<Expr>) -> Expr {
        Expr::Node(NodeRef::owning(OwningNode::new(head, items)))
    }

    /// Build a composite node of `length` children, all `Null`.
    ///
    /// An unrepresentable `length` raises the abort flag and yields
    /// `Null`.
    pub fn node_sized(head: Expr, length: usize) -> Expr {
        if !overflow_guard(length) {
            return Expr::Null;
        }
        let mut items = pool::buffer(length);
        items.resize(length, Expr::Null);
        Expr::node(head, items)
    }

    // Predicates and cheap accessors

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Expr::Null)
    }

    #[inline]
    pub fn is_node(&self) -> bool {
        matches!(self, Expr::Node(_))
    }

    #[inline]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Number of children. Atoms have none.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Expr::Node(node) => node.len(),
            _ => 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The head as a new reference; `Null` for atoms.
    pub fn head(&self) -> Expr {
        match self {
            Expr::Node(node) => node.head_ref().clone(),
            _ => Expr::Null,
        }
    }

    /// Whether this is a composite node whose head is identical to
    /// `target` (see [`Expr::same`]).
    pub fn head_is(&self, target: &Expr) -> bool {
        match self {
            Expr::Node(node) => node.head_ref().same(target),
            _ => false,
        }
    }

    /// The visible children as a slice; empty for atoms.
    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Node(node) => node.children(),
            _ => &[],
        }
    }

    // Item access

    /// Child `index` as a new reference (0 is the head). Out of range
    /// yields `Null`.
    pub fn item(&self, index: usize) -> Expr {
        match self {
            Expr::Node(node) => node.child_ref(index).cloned().unwrap_or(Expr::Null),
            _ => Expr::Null,
        }
    }

    /// Like [`Expr::item`], but when this is the only reference the child
    /// is moved out and its slot left `Null`. The caller must overwrite
    /// or discard the slot before the node is observed again.
    pub fn extract_item(&mut self, index: usize) -> Expr {
        if let Expr::Node(NodeRef(NodeRepr::Owning(arc))) = self {
            if let Some(own) = Arc::get_mut(arc) {
                let slot = if index == 0 {
                    Some(&mut own.head)
                } else {
                    own.items.get_mut(index - 1)
                };
                if let Some(slot) = slot {
                    let taken = std::mem::take(slot);
                    // The placeholder falsifies any cached facts.
                    own.flags.store(0, Ordering::Release);
                    return taken;
                }
                return Expr::Null;
            }
        }
        self.item(index)
    }

    fn child_same(&self, index: usize, value: &Expr) -> bool {
        match self {
            Expr::Node(node) => node.child_ref(index).is_some_and(|c| c.same(value)),
            _ => false,
        }
    }

    /// Replace child `index` (0 is the head), consuming the receiver.
    ///
    /// Out-of-range indices and values identical to the current child
    /// return the receiver unchanged (the supplied value is dropped). A
    /// uniquely owned node mutates in place, clearing cached flags and
    /// metadata and restamping its last-change time; a shared node or a
    /// view is copied with the replacement applied.
    pub fn with_item(self, index: usize, value: Expr) -> Expr {
        let length = self.len();
        if !self.is_node() || index > length {
            return self;
        }
        if self.child_same(index, &value) {
            return self;
        }
        match self {
            Expr::Node(NodeRef(NodeRepr::Owning(mut arc))) => {
                if let Some(own) = Arc::get_mut(&mut arc) {
                    own.invalidate_caches();
                    if index == 0 {
                        own.head = value;
                    } else {
                        own.items[index - 1] = value;
                    }
                    return Expr::Node(NodeRef(NodeRepr::Owning(arc)));
                }
                let head;
                let mut items = pool::buffer(length);
                if index == 0 {
                    head = value;
                    items.extend(arc.items.iter().cloned());
                } else {
                    head = arc.head.clone();
                    items.extend(arc.items.iter().cloned());
                    items[index - 1] = value;
                }
                Expr::node(head, items)
            }
            Expr::Node(NodeRef(NodeRepr::View(view))) => {
                let visible = &view.buffer.items[view.start..view.start + view.length];
                let head;
                let mut items = pool::buffer(view.length);
                if index == 0 {
                    head = value;
                    items.extend(visible.iter().cloned());
                } else {
                    head = view.head.clone();
                    items.extend(visible.iter().cloned());
                    items[index - 1] = value;
                }
                Expr::node(head, items)
            }
            atom => atom,
        }
    }

    /// Children `start ..= start + length - 1` as a new node under the
    /// same head, sharing the receiver's buffer when possible.
    ///
    /// The range is clamped to the available children. A range covering
    /// the whole node returns the node itself; atoms return `Null`.
    pub fn item_range(&self, start: usize, length: usize) -> Expr {
        let Expr::Node(node) = self else {
            return Expr::Null;
        };
        let own_length = node.len();
        // Clamp to the available children; a start past the end is an
        // empty window anchored at the end.
        let offset = (start.max(1) - 1).min(own_length);
        let take = length.min(own_length - offset);

        if offset == 0 && take == own_length {
            return self.clone();
        }

        match &node.0 {
            NodeRepr::Owning(arc) => Expr::Node(NodeRef::view(ViewNode::new(
                arc.head.clone(),
                offset,
                take,
                Arc::clone(arc),
            ))),
            // A range of a view re-anchors on the underlying buffer, so
            // views never stack.
            NodeRepr::View(view) => Expr::Node(NodeRef::view(ViewNode::new(
                view.head.clone(),
                view.start + offset,
                take,
                Arc::clone(&view.buffer),
            ))),
        }
    }

    /// Change the child count, consuming the receiver. Growth fills with
    /// `Null`; shrinking drops the tail. In place when uniquely owned
    /// and owning; otherwise a copy of `min(old, new)` children.
    ///
    /// An unrepresentable `new_length` raises the abort flag and returns
    /// the receiver unchanged.
    pub fn resized(self, new_length: usize) -> Expr {
        if !self.is_node() {
            return self;
        }
        if !overflow_guard(new_length) {
            return self;
        }
        match self {
            Expr::Node(NodeRef(NodeRepr::Owning(mut arc))) => {
                if let Some(own) = Arc::get_mut(&mut arc) {
                    own.invalidate_caches();
                    own.items.resize(new_length, Expr::Null);
                    return Expr::Node(NodeRef(NodeRepr::Owning(arc)));
                }
                let mut items = pool::buffer(new_length);
                let keep = arc.items.len().min(new_length);
                items.extend(arc.items[..keep].iter().cloned());
                items.resize(new_length, Expr::Null);
                Expr::node(arc.head.clone(), items)
            }
            Expr::Node(NodeRef(NodeRepr::View(view))) => {
                let visible = &view.buffer.items[view.start..view.start + view.length];
                let keep = visible.len().min(new_length);
                let mut items = pool::buffer(new_length);
                items.extend(visible[..keep].iter().cloned());
                items.resize(new_length, Expr::Null);
                Expr::node(view.head.clone(), items)
            }
            atom => atom,
        }
    }

    /// Append trailing children, consuming the receiver. In place when
    /// uniquely owned and owning. Atoms are returned unchanged.
    pub fn append(self, values: impl IntoIterator<Item = Expr>) -> Expr {
        if !self.is_node() {
            return self;
        }
        match self {
            Expr::Node(NodeRef(NodeRepr::Owning(mut arc))) => {
                if let Some(own) = Arc::get_mut(&mut arc) {
                    own.invalidate_caches();
                    own.items.extend(values);
                    return Expr::Node(NodeRef(NodeRepr::Owning(arc)));
                }
                let mut items: Vec<Expr> = arc.items.to_vec();
                items.extend(values);
                Expr::node(arc.head.clone(), items)
            }
            Expr::Node(NodeRef(NodeRepr::View(view))) => {
                let visible = &view.buffer.items[view.start..view.start + view.length];
                let mut items: Vec<Expr> = visible.to_vec();
                items.extend(values);
                Expr::node(view.head.clone(), items)
            }
            atom => atom,
        }
    }

    // Staleness

    /// Logical time of the last change to this value's own head or
    /// children. Atoms never change.
    pub fn last_change(&self) -> LogicalTime {
        match self {
            Expr::Node(node) => {
                LogicalTime::from_raw(node.last_change_cell().load(Ordering::Acquire))
            }
            _ => LogicalTime::ZERO,
        }
    }

    /// Restamp this node's last-change time to now without altering
    /// content. Safe through shared references; used after an in-place
    /// change performed above this crate. No-op for atoms.
    pub fn touch(&self) {
        if let Expr::Node(node) = self {
            node.last_change_cell()
                .store(LogicalTime::now().raw(), Ordering::Release);
        }
    }

    /// Whether neither this value nor any descendant changed after
    /// `reference`. Symbol atoms count as changed when their value cell
    /// was written after `reference`; a provisional (negative) stamp is
    /// never up to date.
    pub fn is_updated(&self, reference: LogicalTime) -> bool {
        riven_stack::ensure_deep_stack(|| match self {
            Expr::Node(node) => {
                let stamp = self.last_change();
                stamp.is_visible()
                    && stamp <= reference
                    && node.head_ref().is_updated(reference)
                    && node.children().iter().all(|c| c.is_updated(reference))
            }
            Expr::Symbol(symbol) => {
                let stamp = symbol.last_update();
                stamp.is_visible() && stamp <= reference
            }
            _ => true,
        })
    }

    // Metadata channel

    /// Attach source-location debug info. Merges with (never displaces)
    /// other metadata kinds. No-op for atoms.
    pub fn attach_debug_info(&self, info: DebugInfo) {
        if let Expr::Node(node) = self {
            node.metadata_slot().attach_debug(info);
        }
    }

    pub fn debug_info(&self) -> Option<DebugInfo> {
        match self {
            Expr::Node(node) => node.metadata_slot().debug(),
            _ => None,
        }
    }

    /// Attach the rule dispatcher's cached annotation. Merges with
    /// (never displaces) other metadata kinds. No-op for atoms.
    pub fn attach_dispatch_hint(&self, hint: DispatchHint) {
        if let Expr::Node(node) = self {
            node.metadata_slot().attach_hint(hint);
        }
    }

    pub fn dispatch_hint(&self) -> Option<DispatchHint> {
        match self {
            Expr::Node(node) => node.metadata_slot().hint(),
            _ => None,
        }
    }

    // Internal cache plumbing shared by the algorithm modules.

    pub(crate) fn flag_sorted(&self) -> bool {
        match self {
            Expr::Node(n) => n.flags_cell().load(Ordering::Acquire) & node::FLAG_SORTED != 0,
            _ => false,
        }
    }

    /// Record the sorted-children fact. A cache of a derived property, so
    /// setting it through a shared reference is sound.
    pub(crate) fn set_flag_sorted(&self) {
        if let Expr::Node(n) = self {
            n.flags_cell().fetch_or(node::FLAG_SORTED, Ordering::AcqRel);
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Null => f.write_str("Null"),
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Real(r) => write!(f, "{r:?}"),
            Expr::Str(s) => write!(f, "{s:?}"),
            Expr::Symbol(s) => f.write_str(s.name()),
            Expr::Node(node) => {
                write!(f, "{}(", node.head_ref())?;
                for (i, child) in node.children().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
