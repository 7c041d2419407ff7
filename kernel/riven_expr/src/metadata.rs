//! Out-of-band metadata attached to expression nodes.
//!
//! Two kinds of side-values ride along with a node without being part of
//! its structural identity: source-location debug info (attached by the
//! parser, consumed by error reporting) and an opaque dispatch hint (a
//! cached annotation the rule dispatcher stores to avoid recompiling rule
//! indices for the same node). Both kinds may coexist on one node;
//! attaching one kind never displaces the other, and attaching a kind that
//! is already present replaces that kind only.
//!
//! Metadata does not survive mutation: any operation that changes a node's
//! own head or children clears its slot, since the side-values describe
//! content that no longer exists.

use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

/// Byte range into an original source buffer.
///
/// Layout: 8 bytes total.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SourceSpan {
    pub start: u32,
    pub end: u32,
}

impl SourceSpan {
    /// Span for generated expressions with no source location.
    pub const DUMMY: SourceSpan = SourceSpan { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> SourceSpan {
        SourceSpan { start, end }
    }
}

/// Source-location debug info for one expression node.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DebugInfo {
    /// Name of the originating source (file path, "<input>", ...).
    pub origin: Option<Arc<str>>,
    /// Byte range within the origin.
    pub span: SourceSpan,
}

impl DebugInfo {
    #[inline]
    pub fn new(origin: Option<Arc<str>>, span: SourceSpan) -> DebugInfo {
        DebugInfo { origin, span }
    }
}

/// Opaque per-node annotation cached by the rule dispatcher.
///
/// The payload's type is the dispatcher's business; this core only stores
/// and returns it.
pub type DispatchHint = Arc<dyn Any + Send + Sync>;

/// The side-values currently attached to a node, at most one per kind.
#[derive(Clone, Default)]
pub(crate) struct Metadata {
    pub(crate) debug: Option<DebugInfo>,
    pub(crate) hint: Option<DispatchHint>,
}

impl Metadata {
    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.debug.is_none() && self.hint.is_none()
    }
}

/// The exclusive metadata slot carried by every expression node.
///
/// Nodes without metadata pay one word plus an uncontended lock; the
/// `Metadata` record is boxed so the empty case stays small.
pub(crate) struct MetadataSlot(Mutex<Option<Box<Metadata>>>);

impl MetadataSlot {
    #[inline]
    pub(crate) const fn empty() -> MetadataSlot {
        MetadataSlot(Mutex::new(None))
    }

    pub(crate) fn attach_debug(&self, info: DebugInfo) {
        let mut slot = self.0.lock();
        slot.get_or_insert_with(Box::default).debug = Some(info);
    }

    pub(crate) fn debug(&self) -> Option<DebugInfo> {
        self.0.lock().as_ref().and_then(|m| m.debug.clone())
    }

    pub(crate) fn attach_hint(&self, hint: DispatchHint) {
        let mut slot = self.0.lock();
        slot.get_or_insert_with(Box::default).hint = Some(hint);
    }

    pub(crate) fn hint(&self) -> Option<DispatchHint> {
        self.0.lock().as_ref().and_then(|m| m.hint.clone())
    }

    /// Drop all attached side-values. Called when the owning node mutates.
    pub(crate) fn clear(&self) {
        *self.0.lock() = None;
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.lock().as_ref().is_none_or(|m| m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_coexist() {
        let slot = MetadataSlot::empty();
        assert!(slot.is_empty());

        slot.attach_debug(DebugInfo::new(None, SourceSpan::new(3, 9)));
        slot.attach_hint(Arc::new(42_u32));

        assert_eq!(slot.debug().unwrap().span, SourceSpan::new(3, 9));
        let hint = slot.hint().unwrap();
        assert_eq!(hint.downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn attaching_same_kind_replaces_only_that_kind() {
        let slot = MetadataSlot::empty();
        slot.attach_hint(Arc::new("first".to_string()));
        slot.attach_debug(DebugInfo::new(None, SourceSpan::new(0, 1)));
        slot.attach_debug(DebugInfo::new(None, SourceSpan::new(5, 7)));

        assert_eq!(slot.debug().unwrap().span, SourceSpan::new(5, 7));
        assert!(slot.hint().is_some());
    }

    #[test]
    fn clear_empties_the_slot() {
        let slot = MetadataSlot::empty();
        slot.attach_debug(DebugInfo::new(None, SourceSpan::DUMMY));
        slot.clear();
        assert!(slot.is_empty());
        assert_eq!(slot.debug(), None);
    }
}
