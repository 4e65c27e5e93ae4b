//! Node records stored in a [`Tree`](crate::Tree) pool: the kind bitmask,
//! the scalar slots, and the hierarchy links.

use core::fmt;

use bitflags::bitflags;

use crate::arena::Span;

/// Position of a node in the tree pool.
///
/// Ids are dense and stable across insertions and removals, but are
/// invalidated by [`Tree::reorder`](crate::Tree::reorder) and
/// [`Tree::clear`](crate::Tree::clear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// The kind of a node, a mask of orthogonal structural and style bits.
    ///
    /// Structural bits say what the node is (`MAP`, `SEQ`, `DOC`, ...);
    /// style bits record how its scalars were written (`KEYQUO`) or what
    /// decorates them (`KEYANCH`, `VALREF`). The composed constants are the
    /// shapes that actually occur in a well-formed tree.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct NodeType: u16 {
        /// Has a value scalar
        const VAL = 1 << 0;
        /// Has a key scalar; only valid under a map
        const KEY = 1 << 1;
        /// A mapping container
        const MAP = 1 << 2;
        /// A sequence container
        const SEQ = 1 << 3;
        /// A document
        const DOC = 1 << 4;
        /// A stream: a sequence of documents
        const STREAM = (1 << 5) | Self::SEQ.bits();
        /// The key scalar is a `*reference`
        const KEYREF = 1 << 6;
        /// The value scalar is a `*reference`
        const VALREF = 1 << 7;
        /// The key scalar carries an `&anchor`
        const KEYANCH = 1 << 8;
        /// The value scalar carries an `&anchor`
        const VALANCH = 1 << 9;
        /// The key scalar was quoted in the source
        const KEYQUO = 1 << 10;
        /// The value scalar was quoted in the source
        const VALQUO = 1 << 11;

        const KEYVAL = Self::KEY.bits() | Self::VAL.bits();
        const KEYMAP = Self::KEY.bits() | Self::MAP.bits();
        const KEYSEQ = Self::KEY.bits() | Self::SEQ.bits();
        const DOCMAP = Self::DOC.bits() | Self::MAP.bits();
        const DOCSEQ = Self::DOC.bits() | Self::SEQ.bits();
        const DOCVAL = Self::DOC.bits() | Self::VAL.bits();
    }
}

impl NodeType {
    pub fn is_stream(self) -> bool {
        self.contains(NodeType::STREAM)
    }

    pub fn is_doc(self) -> bool {
        self.contains(NodeType::DOC)
    }

    pub fn is_map(self) -> bool {
        self.contains(NodeType::MAP)
    }

    pub fn is_seq(self) -> bool {
        self.contains(NodeType::SEQ)
    }

    pub fn is_container(self) -> bool {
        self.intersects(NodeType::MAP | NodeType::SEQ | NodeType::STREAM)
    }

    pub fn has_key(self) -> bool {
        self.contains(NodeType::KEY)
    }

    pub fn has_val(self) -> bool {
        self.contains(NodeType::VAL)
    }

    /// A value that is not a map entry.
    pub fn is_val(self) -> bool {
        (self & NodeType::KEYVAL) == NodeType::VAL
    }

    pub fn is_keyval(self) -> bool {
        self.contains(NodeType::KEYVAL)
    }

    pub fn is_key_ref(self) -> bool {
        self.contains(NodeType::KEYREF)
    }

    pub fn is_val_ref(self) -> bool {
        self.contains(NodeType::VALREF)
    }

    pub fn is_ref(self) -> bool {
        self.intersects(NodeType::KEYREF | NodeType::VALREF)
    }

    pub fn has_key_anchor(self) -> bool {
        self.contains(NodeType::KEYANCH)
    }

    pub fn has_val_anchor(self) -> bool {
        self.contains(NodeType::VALANCH)
    }

    pub fn has_anchor(self) -> bool {
        self.intersects(NodeType::KEYANCH | NodeType::VALANCH)
    }

    pub fn is_quoted(self) -> bool {
        self.intersects(NodeType::KEYQUO | NodeType::VALQUO)
    }
}

/// The three text slots attached to one side (key or value) of a node.
///
/// `None` means the slot is absent; a present zero-length span is an empty
/// string. The distinction is observable in emission: an absent value
/// scalar prints as `~`, an empty one as `''`. For a `*reference` the name
/// is held in the `anchor` slot of the referring side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeScalar {
    pub scalar: Option<Span>,
    pub tag: Option<Span>,
    pub anchor: Option<Span>,
}

impl NodeScalar {
    pub(crate) fn clear(&mut self) {
        *self = NodeScalar::default();
    }
}

/// One fixed-size record of the node pool.
///
/// Hierarchy is kept as intrusive links: a doubly linked sibling list plus
/// first/last child endpoints on the parent. Free pool slots are chained
/// through `next_sibling`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeData {
    pub(crate) kind: NodeType,
    pub(crate) key: NodeScalar,
    pub(crate) val: NodeScalar,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
}

impl NodeData {
    /// Reset kind, scalars and parent/child links. Sibling links are left
    /// alone: they double as the free-list chain.
    pub(crate) fn clear_props(&mut self) {
        self.kind = NodeType::empty();
        self.key.clear();
        self.val.clear();
        self.parent = None;
        self.first_child = None;
        self.last_child = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_shapes() {
        assert!(NodeType::DOCVAL.is_doc());
        assert!(NodeType::DOCVAL.has_val());
        assert!(!NodeType::DOCVAL.is_keyval());
        assert!(NodeType::STREAM.is_seq());
        assert!(NodeType::STREAM.is_container());
        assert!(!NodeType::SEQ.is_stream());
        assert!(NodeType::KEYSEQ.is_container());
    }

    #[test]
    fn val_excludes_keyval() {
        assert!(NodeType::VAL.is_val());
        assert!(!NodeType::KEYVAL.is_val());
        assert!(NodeType::KEYVAL.has_val());
    }
}
