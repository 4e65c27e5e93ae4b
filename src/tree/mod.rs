//! The document tree: a flat, index-addressed pool of [`NodeData`] records
//! whose scalar text lives in a single [`Arena`].
//!
//! Hierarchy is intrusive (parent/first/last/prev/next links per node), so
//! every structural operation is link surgery and never moves scalar bytes.
//! Unused pool slots are chained into a free list through their
//! `next_sibling` link.

mod lookup;

use itertools::Itertools;
use tracing::debug;

use crate::arena::{Arena, Span};
use crate::errors::Result;
use crate::node::{NodeData, NodeId, NodeScalar, NodeType};

pub use lookup::LookupResult;

/// An arena-backed YAML document tree.
///
/// Nodes are addressed by [`NodeId`]. Ids are stable under insertion and
/// removal; [`Tree::reorder`], [`Tree::swap`] and [`Tree::clear`] invalidate
/// ids held outside the tree.
#[derive(Debug, Clone)]
pub struct Tree {
    /// All pool slots; free ones are chained into the free list
    nodes: Vec<NodeData>,
    /// Number of live nodes
    size: usize,
    free_head: Option<NodeId>,
    free_tail: Option<NodeId>,
    arena: Arena,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// An empty tree holding only the root node.
    pub fn new() -> Self {
        Self::with_capacity(16, 0)
    }

    /// An empty tree with room for `nodes` nodes and `arena` bytes of
    /// scalar text.
    pub fn with_capacity(nodes: usize, arena: usize) -> Self {
        let mut tree = Tree {
            nodes: Vec::new(),
            size: 0,
            free_head: None,
            free_tail: None,
            arena: Arena::with_capacity(arena),
        };
        tree.reserve(nodes.max(1));
        tree
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of pool slots (live and free).
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// The arena holding all scalar text of this tree.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Grow the pool to at least `cap` slots; new slots join the free list
    /// at its tail, so pending claims are unaffected.
    pub fn reserve(&mut self, cap: usize) {
        let first = self.nodes.len();
        if cap <= first {
            return;
        }
        self.nodes.resize(cap, NodeData::default());
        for i in first..cap {
            self.nodes[i].prev_sibling = (i > first).then(|| NodeId(i - 1));
            self.nodes[i].next_sibling = (i + 1 < cap).then(|| NodeId(i + 1));
        }
        if self.free_head.is_some() {
            let tail = self.free_tail.expect("free list has a tail when non-empty");
            self.nodes[tail.index()].next_sibling = Some(NodeId(first));
            self.nodes[first].prev_sibling = Some(tail);
        } else {
            self.free_head = Some(NodeId(first));
        }
        self.free_tail = Some(NodeId(cap - 1));
        if self.size == 0 {
            self._claim_root();
        }
    }

    /// Grow the arena reservation to at least `cap` bytes.
    pub fn reserve_arena(&mut self, cap: usize) {
        self.arena.reserve(cap);
    }

    /// Release every node and re-claim an empty root. The arena cursor is
    /// untouched; see [`Tree::clear_arena`].
    pub fn clear(&mut self) {
        let cap = self.nodes.len();
        for i in 0..cap {
            self.nodes[i] = NodeData::default();
            self.nodes[i].prev_sibling = (i > 0).then(|| NodeId(i - 1));
            self.nodes[i].next_sibling = (i + 1 < cap).then(|| NodeId(i + 1));
        }
        self.size = 0;
        if cap > 0 {
            self.free_head = Some(NodeId(0));
            self.free_tail = Some(NodeId(cap - 1));
            self._claim_root();
        } else {
            self.free_head = None;
            self.free_tail = None;
        }
    }

    /// Reset the arena write cursor. Only sound after [`Tree::clear`]: any
    /// live span would be left dangling.
    pub fn clear_arena(&mut self) {
        self.arena.clear();
    }

    /// Intern `text`, growing the arena (doubling) as needed.
    pub fn copy_to_arena(&mut self, text: &str) -> Span {
        if text.len() > self.arena.remaining() {
            let needed = self.arena.pos() + text.len();
            self.arena.reserve((2 * self.arena.capacity()).max(needed));
        }
        self.arena.alloc_str(text).expect("arena reserved above")
    }

    /// Intern `text` within the existing reservation; the raw ingestion
    /// surface. Unlike [`Tree::copy_to_arena`] this never grows.
    pub fn alloc_arena(&mut self, text: &str) -> Result<Span> {
        self.arena.alloc_str(text)
    }

    // ------------------------------------------------------------------
    // pool internals

    fn _claim_root(&mut self) {
        let root = self._claim();
        debug_assert_eq!(root, NodeId::ROOT);
        self._set_hierarchy(root, None, None);
    }

    /// Take a slot off the free list, doubling the pool if exhausted.
    pub(crate) fn _claim(&mut self) -> NodeId {
        if self.free_head.is_none() {
            let cap = if self.nodes.is_empty() { 16 } else { 2 * self.nodes.len() };
            self.reserve(cap);
        }
        let id = self.free_head.expect("free list refilled by reserve");
        self.size += 1;
        self.free_head = self.nodes[id.index()].next_sibling;
        match self.free_head {
            Some(head) => self.nodes[head.index()].prev_sibling = None,
            None => {
                self.free_tail = None;
                debug_assert_eq!(self.size, self.nodes.len());
            }
        }
        let node = &mut self.nodes[id.index()];
        node.clear_props();
        node.prev_sibling = None;
        node.next_sibling = None;
        id
    }

    /// Unlink a node and hand its slot back to the free list.
    fn _release(&mut self, id: NodeId) {
        self._rem_hierarchy(id);
        self._free_list_add(id);
        self.nodes[id.index()].clear_props();
        self.size -= 1;
    }

    /// Push a slot onto the front of the free list.
    fn _free_list_add(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = self.free_head;
        if let Some(head) = self.free_head {
            self.nodes[head.index()].prev_sibling = Some(id);
        }
        self.free_head = Some(id);
        if self.free_tail.is_none() {
            self.free_tail = self.free_head;
        }
    }

    /// Take a specific slot out of the free list (it is about to hold a
    /// live node moved there by [`Tree::swap`]).
    fn _free_list_rem(&mut self, id: NodeId) {
        if self.free_head == Some(id) {
            self.free_head = self.nodes[id.index()].next_sibling;
        }
        if self.free_tail == Some(id) {
            self.free_tail = self.nodes[id.index()].prev_sibling;
        }
        self._rem_hierarchy(id);
    }

    // ------------------------------------------------------------------
    // hierarchy links

    /// Insert `child` under `parent` immediately after `prev_sibling`
    /// (at the front when `prev_sibling` is `None`). Only link fields are
    /// touched.
    fn _set_hierarchy(&mut self, child: NodeId, parent: Option<NodeId>, prev_sibling: Option<NodeId>) {
        {
            let c = &mut self.nodes[child.index()];
            c.parent = parent;
            c.prev_sibling = None;
            c.next_sibling = None;
        }
        let Some(parent) = parent else {
            debug_assert_eq!(child, NodeId::ROOT);
            debug_assert!(prev_sibling.is_none());
            return;
        };
        let next_sibling = match prev_sibling {
            Some(prev) => self.next_sibling(prev),
            None => self.first_child(parent),
        };
        if let Some(prev) = prev_sibling {
            self.nodes[child.index()].prev_sibling = Some(prev);
            self.nodes[prev.index()].next_sibling = Some(child);
        }
        if let Some(next) = next_sibling {
            self.nodes[child.index()].next_sibling = Some(next);
            self.nodes[next.index()].prev_sibling = Some(child);
        }
        if self.nodes[parent.index()].first_child.is_none() {
            debug_assert!(self.nodes[parent.index()].last_child.is_none());
            self.nodes[parent.index()].first_child = Some(child);
            self.nodes[parent.index()].last_child = Some(child);
        } else {
            if self.nodes[child.index()].next_sibling == self.nodes[parent.index()].first_child {
                self.nodes[parent.index()].first_child = Some(child);
            }
            if self.nodes[child.index()].prev_sibling == self.nodes[parent.index()].last_child {
                self.nodes[parent.index()].last_child = Some(child);
            }
        }
    }

    /// Unlink `id` from its parent's child list, repairing the endpoints.
    /// The node's own links are left in place for the caller.
    fn _rem_hierarchy(&mut self, id: NodeId) {
        let node = self.nodes[id.index()];
        if let Some(parent) = node.parent {
            if self.nodes[parent.index()].first_child == Some(id) {
                self.nodes[parent.index()].first_child = node.next_sibling;
            }
            if self.nodes[parent.index()].last_child == Some(id) {
                self.nodes[parent.index()].last_child = node.prev_sibling;
            }
        }
        if let Some(prev) = node.prev_sibling {
            self.nodes[prev.index()].next_sibling = node.next_sibling;
        }
        if let Some(next) = node.next_sibling {
            self.nodes[next.index()].prev_sibling = node.prev_sibling;
        }
    }

    // ------------------------------------------------------------------
    // navigation

    pub fn root_id(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].last_child
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].prev_sibling
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].next_sibling
    }

    /// The children of `id`, in sibling order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.first_child(id), move |&c| self.next_sibling(c))
    }

    pub fn num_children(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// The child at ordinal `pos`.
    pub fn child(&self, id: NodeId, pos: usize) -> Option<NodeId> {
        self.children(id).nth(pos)
    }

    /// The ordinal of `ch` among the children of `id`.
    pub fn child_pos(&self, id: NodeId, ch: NodeId) -> Option<usize> {
        self.children(id).position(|c| c == ch)
    }

    pub fn has_child(&self, id: NodeId, ch: NodeId) -> bool {
        self.children(id).contains(&ch)
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.first_child(id).is_some()
    }

    /// The first child of map `id` whose key equals `name`.
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        debug_assert!(self.is_map(id));
        self.children(id).find(|&c| self.key(c) == Some(name))
    }

    // ------------------------------------------------------------------
    // predicates

    pub fn kind(&self, id: NodeId) -> NodeType {
        self.nodes[id.index()].kind
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes[id.index()].parent.is_none()
    }

    pub fn is_stream(&self, id: NodeId) -> bool {
        self.kind(id).is_stream()
    }

    pub fn is_doc(&self, id: NodeId) -> bool {
        self.kind(id).is_doc()
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        self.kind(id).is_container()
    }

    pub fn is_map(&self, id: NodeId) -> bool {
        self.kind(id).is_map()
    }

    pub fn is_seq(&self, id: NodeId) -> bool {
        self.kind(id).is_seq()
    }

    pub fn is_val(&self, id: NodeId) -> bool {
        self.kind(id).is_val()
    }

    pub fn is_keyval(&self, id: NodeId) -> bool {
        self.kind(id).is_keyval()
    }

    pub fn has_key(&self, id: NodeId) -> bool {
        self.kind(id).has_key()
    }

    pub fn has_val(&self, id: NodeId) -> bool {
        self.kind(id).has_val()
    }

    pub fn has_key_anchor(&self, id: NodeId) -> bool {
        self.kind(id).has_key_anchor()
    }

    pub fn has_val_anchor(&self, id: NodeId) -> bool {
        self.kind(id).has_val_anchor()
    }

    pub fn is_key_ref(&self, id: NodeId) -> bool {
        self.kind(id).is_key_ref()
    }

    pub fn is_val_ref(&self, id: NodeId) -> bool {
        self.kind(id).is_val_ref()
    }

    pub fn has_key_tag(&self, id: NodeId) -> bool {
        self.nodes[id.index()].key.tag.is_some()
    }

    pub fn has_val_tag(&self, id: NodeId) -> bool {
        self.nodes[id.index()].val.tag.is_some()
    }

    pub fn parent_is_map(&self, id: NodeId) -> bool {
        self.parent(id).is_some_and(|p| self.is_map(p))
    }

    pub fn parent_is_seq(&self, id: NodeId) -> bool {
        self.parent(id).is_some_and(|p| self.is_seq(p))
    }

    /// Whether either side of `id` declares the anchor `name`.
    pub fn has_anchor(&self, id: NodeId, name: &str) -> bool {
        self.key_anchor(id) == Some(name) || self.val_anchor(id) == Some(name)
    }

    // ------------------------------------------------------------------
    // accessors

    fn span_str(&self, span: Option<Span>) -> Option<&str> {
        span.map(|s| self.arena.get(s))
    }

    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.span_str(self.nodes[id.index()].key.scalar)
    }

    pub fn val(&self, id: NodeId) -> Option<&str> {
        self.span_str(self.nodes[id.index()].val.scalar)
    }

    pub fn key_tag(&self, id: NodeId) -> Option<&str> {
        self.span_str(self.nodes[id.index()].key.tag)
    }

    pub fn val_tag(&self, id: NodeId) -> Option<&str> {
        self.span_str(self.nodes[id.index()].val.tag)
    }

    pub fn key_anchor(&self, id: NodeId) -> Option<&str> {
        self.span_str(self.nodes[id.index()].key.anchor)
    }

    pub fn val_anchor(&self, id: NodeId) -> Option<&str> {
        self.span_str(self.nodes[id.index()].val.anchor)
    }

    /// The name referenced by a `*ref` key; held in the key anchor slot.
    pub fn key_ref(&self, id: NodeId) -> Option<&str> {
        debug_assert!(self.is_key_ref(id));
        self.key_anchor(id)
    }

    /// The name referenced by a `*ref` value; held in the value anchor slot.
    pub fn val_ref(&self, id: NodeId) -> Option<&str> {
        debug_assert!(self.is_val_ref(id));
        self.val_anchor(id)
    }

    pub(crate) fn key_scalar(&self, id: NodeId) -> NodeScalar {
        self.nodes[id.index()].key
    }

    pub(crate) fn val_scalar(&self, id: NodeId) -> NodeScalar {
        self.nodes[id.index()].val
    }

    /// Point the key scalar of `id` at an existing arena span.
    pub(crate) fn set_key_scalar_span(&mut self, id: NodeId, span: Option<Span>) {
        debug_assert!(span.is_none_or(|s| self.arena.contains(s)));
        self.nodes[id.index()].key.scalar = span;
    }

    /// Point the value scalar of `id` at an existing arena span.
    pub(crate) fn set_val_scalar_span(&mut self, id: NodeId, span: Option<Span>) {
        debug_assert!(span.is_none_or(|s| self.arena.contains(s)));
        self.nodes[id.index()].val.scalar = span;
    }

    // ------------------------------------------------------------------
    // flag surgery

    fn _set_flags(&mut self, id: NodeId, kind: NodeType) {
        self.nodes[id.index()].kind = kind;
    }

    /// Add kind bits to a node, e.g. `VALQUO` on a value set earlier.
    pub fn add_flags(&mut self, id: NodeId, more: NodeType) {
        self.nodes[id.index()].kind |= more;
    }

    /// Drop every anchor and reference marker from both sides of `id`.
    pub fn rem_anchor_ref(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.kind -= NodeType::KEYREF | NodeType::VALREF | NodeType::KEYANCH | NodeType::VALANCH;
        node.key.anchor = None;
        node.val.anchor = None;
    }

    // ------------------------------------------------------------------
    // typed mutators
    //
    // All of these require the node to have no children: reshaping a
    // populated container would orphan the child list.

    pub fn to_val(&mut self, id: NodeId, val: &str) {
        debug_assert!(!self.has_children(id));
        debug_assert!(self.parent(id).is_none() || !self.parent_is_map(id));
        let v = self.copy_to_arena(val);
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::VAL;
        node.key.clear();
        node.val = NodeScalar { scalar: Some(v), ..NodeScalar::default() };
    }

    pub fn to_keyval(&mut self, id: NodeId, key: &str, val: &str) {
        debug_assert!(!self.has_children(id));
        debug_assert!(self.parent(id).is_none() || self.parent_is_map(id));
        let k = self.copy_to_arena(key);
        let v = self.copy_to_arena(val);
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::KEYVAL;
        node.key = NodeScalar { scalar: Some(k), ..NodeScalar::default() };
        node.val = NodeScalar { scalar: Some(v), ..NodeScalar::default() };
    }

    pub fn to_map(&mut self, id: NodeId) {
        debug_assert!(!self.has_children(id));
        debug_assert!(self.parent(id).is_none() || !self.parent_is_map(id));
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::MAP;
        node.key.clear();
        node.val.clear();
    }

    pub fn to_keymap(&mut self, id: NodeId, key: &str) {
        debug_assert!(!self.has_children(id));
        debug_assert!(self.parent(id).is_none() || self.parent_is_map(id));
        let k = self.copy_to_arena(key);
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::KEYMAP;
        node.key = NodeScalar { scalar: Some(k), ..NodeScalar::default() };
        node.val.clear();
    }

    pub fn to_seq(&mut self, id: NodeId) {
        debug_assert!(!self.has_children(id));
        debug_assert!(self.parent(id).is_none() || self.parent_is_seq(id));
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::SEQ;
        node.key.clear();
        node.val.clear();
    }

    pub fn to_keyseq(&mut self, id: NodeId, key: &str) {
        debug_assert!(!self.has_children(id));
        debug_assert!(self.parent(id).is_none() || self.parent_is_map(id));
        let k = self.copy_to_arena(key);
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::KEYSEQ;
        node.key = NodeScalar { scalar: Some(k), ..NodeScalar::default() };
        node.val.clear();
    }

    pub fn to_doc(&mut self, id: NodeId) {
        debug_assert!(!self.has_children(id));
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::DOC;
        node.key.clear();
        node.val.clear();
    }

    pub fn to_stream(&mut self, id: NodeId) {
        debug_assert!(!self.has_children(id));
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::STREAM;
        node.key.clear();
        node.val.clear();
    }

    /// Turn a childless node into a map, keeping its key scalar if it has
    /// one. Used where a path or merge descends through a node that is not
    /// a container yet.
    fn _change_to_map_keeping_key(&mut self, id: NodeId) {
        debug_assert!(!self.has_children(id));
        let node = &mut self.nodes[id.index()];
        let key = node.key.scalar;
        node.kind = if key.is_some() { NodeType::KEYMAP } else { NodeType::MAP };
        node.key = NodeScalar { scalar: key, ..NodeScalar::default() };
        node.val.clear();
    }

    /// Turn a childless node into a seq, keeping its key scalar if it has
    /// one.
    fn _change_to_seq_keeping_key(&mut self, id: NodeId) {
        debug_assert!(!self.has_children(id));
        let node = &mut self.nodes[id.index()];
        let key = node.key.scalar;
        node.kind = if key.is_some() { NodeType::KEYSEQ } else { NodeType::SEQ };
        node.key = NodeScalar { scalar: key, ..NodeScalar::default() };
        node.val.clear();
    }

    /// A value node with an absent scalar; emits as `~`.
    pub(crate) fn to_val_null(&mut self, id: NodeId) {
        debug_assert!(!self.has_children(id));
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::VAL;
        node.key.clear();
        node.val.clear();
    }

    pub(crate) fn to_keyval_null(&mut self, id: NodeId) {
        debug_assert!(!self.has_children(id));
        let node = &mut self.nodes[id.index()];
        node.kind = NodeType::KEYVAL;
        node.key.clear();
        node.val.clear();
    }

    // ------------------------------------------------------------------
    // anchors, refs, tags

    pub fn set_key_anchor(&mut self, id: NodeId, anchor: &str) {
        let a = self.copy_to_arena(anchor);
        self.nodes[id.index()].key.anchor = Some(a);
        self.add_flags(id, NodeType::KEYANCH);
    }

    pub fn set_val_anchor(&mut self, id: NodeId, anchor: &str) {
        let a = self.copy_to_arena(anchor);
        self.nodes[id.index()].val.anchor = Some(a);
        self.add_flags(id, NodeType::VALANCH);
    }

    /// Mark the key of `id` as a `*reference` to `name`.
    pub fn set_key_ref(&mut self, id: NodeId, name: &str) {
        let a = self.copy_to_arena(name);
        self.nodes[id.index()].key.anchor = Some(a);
        self.add_flags(id, NodeType::KEYREF);
    }

    /// Mark the value of `id` as a `*reference` to `name`.
    pub fn set_val_ref(&mut self, id: NodeId, name: &str) {
        let a = self.copy_to_arena(name);
        self.nodes[id.index()].val.anchor = Some(a);
        self.add_flags(id, NodeType::VALREF);
    }

    pub fn set_key_tag(&mut self, id: NodeId, tag: &str) {
        let t = self.copy_to_arena(tag);
        self.nodes[id.index()].key.tag = Some(t);
    }

    pub fn set_val_tag(&mut self, id: NodeId, tag: &str) {
        let t = self.copy_to_arena(tag);
        self.nodes[id.index()].val.tag = Some(t);
    }

    // ------------------------------------------------------------------
    // insertion and removal

    /// Claim a new node and link it under `parent`, after sibling `after`
    /// (at the front when `after` is `None`).
    pub fn insert_child(&mut self, parent: NodeId, after: Option<NodeId>) -> NodeId {
        debug_assert!(after.is_none_or(|a| self.has_child(parent, a)));
        let child = self._claim();
        self._set_hierarchy(child, Some(parent), after);
        child
    }

    pub fn prepend_child(&mut self, parent: NodeId) -> NodeId {
        self.insert_child(parent, None)
    }

    pub fn append_child(&mut self, parent: NodeId) -> NodeId {
        let last = self.last_child(parent);
        self.insert_child(parent, last)
    }

    /// Claim a new node next to `node`, after sibling `after`.
    pub fn insert_sibling(&mut self, node: NodeId, after: Option<NodeId>) -> NodeId {
        let parent = self.parent(node).expect("cannot add a sibling to the root");
        self.insert_child(parent, after)
    }

    pub fn prepend_sibling(&mut self, node: NodeId) -> NodeId {
        self.insert_sibling(node, None)
    }

    pub fn append_sibling(&mut self, node: NodeId) -> NodeId {
        let parent = self.parent(node).expect("cannot add a sibling to the root");
        let last = self.last_child(parent);
        self.insert_child(parent, last)
    }

    /// Remove the whole branch rooted at `node`.
    pub fn remove(&mut self, node: NodeId) {
        debug_assert!(!self.is_root(node));
        self.remove_children(node);
        self._release(node);
    }

    /// Remove every child branch of `node`, keeping the node itself.
    pub fn remove_children(&mut self, node: NodeId) {
        while let Some(child) = self.first_child(node) {
            self.remove(child);
        }
    }

    // ------------------------------------------------------------------
    // movement

    /// Move `node` to a different position under the same parent.
    pub fn move_node(&mut self, node: NodeId, after: Option<NodeId>) {
        debug_assert!(!self.is_root(node));
        let parent = self.parent(node).expect("moved node has a parent");
        self._rem_hierarchy(node);
        self._set_hierarchy(node, Some(parent), after);
    }

    /// Move `node` (and its branch) under `new_parent`, after `after`.
    pub fn move_to(&mut self, node: NodeId, new_parent: NodeId, after: Option<NodeId>) {
        debug_assert!(!self.is_root(node));
        self._rem_hierarchy(node);
        self._set_hierarchy(node, Some(new_parent), after);
    }

    /// Move a branch from another tree: duplicate it here, then remove it
    /// from `src`.
    pub fn move_from(&mut self, src: &mut Tree, node: NodeId, new_parent: NodeId, after: Option<NodeId>) -> NodeId {
        let dup = self.duplicate_from(src, node, new_parent, after);
        src.remove(node);
        dup
    }

    // ------------------------------------------------------------------
    // property blocks

    fn _copy_props(&mut self, dst: NodeId, src: NodeId) {
        let s = self.nodes[src.index()];
        let d = &mut self.nodes[dst.index()];
        d.kind = s.kind;
        d.key = s.key;
        d.val = s.val;
    }

    /// Copy kind and value side only; the destination keeps its own key
    /// scalar and key-side flags.
    fn _copy_props_wo_key(&mut self, dst: NodeId, src: NodeId) {
        let keybits = NodeType::KEY | NodeType::KEYREF | NodeType::KEYANCH | NodeType::KEYQUO;
        let s = self.nodes[src.index()];
        let d = &mut self.nodes[dst.index()];
        d.kind = (d.kind & keybits) | (s.kind - keybits);
        d.val = s.val;
    }

    /// Re-intern a scalar block from another tree's arena into ours.
    fn _intern_scalar(&mut self, src: &Tree, scalar: NodeScalar) -> NodeScalar {
        NodeScalar {
            scalar: scalar.scalar.map(|s| self.copy_to_arena(src.arena.get(s))),
            tag: scalar.tag.map(|s| self.copy_to_arena(src.arena.get(s))),
            anchor: scalar.anchor.map(|s| self.copy_to_arena(src.arena.get(s))),
        }
    }

    fn _copy_props_from(&mut self, dst: NodeId, src: &Tree, src_node: NodeId) {
        let kind = src.kind(src_node);
        let key = self._intern_scalar(src, src.key_scalar(src_node));
        let val = self._intern_scalar(src, src.val_scalar(src_node));
        let d = &mut self.nodes[dst.index()];
        d.kind = kind;
        d.key = key;
        d.val = val;
    }

    fn _copy_props_wo_key_from(&mut self, dst: NodeId, src: &Tree, src_node: NodeId) {
        let keybits = NodeType::KEY | NodeType::KEYREF | NodeType::KEYANCH | NodeType::KEYQUO;
        let kind = src.kind(src_node);
        let val = self._intern_scalar(src, src.val_scalar(src_node));
        let d = &mut self.nodes[dst.index()];
        d.kind = (d.kind & keybits) | (kind - keybits);
        d.val = val;
    }

    fn _swap_props(&mut self, a: NodeId, b: NodeId) {
        let sa = self.nodes[a.index()];
        let sb = self.nodes[b.index()];
        let na = &mut self.nodes[a.index()];
        na.kind = sb.kind;
        na.key = sb.key;
        na.val = sb.val;
        let nb = &mut self.nodes[b.index()];
        nb.kind = sa.kind;
        nb.key = sa.key;
        nb.val = sa.val;
    }

    // ------------------------------------------------------------------
    // swapping

    /// Exchange two pool slots entirely: property blocks and hierarchy
    /// positions. When one side is a free slot the operation degenerates to
    /// moving the live node into it.
    pub fn swap(&mut self, a: NodeId, b: NodeId) {
        debug_assert!(self.parent(a).is_some() || self.kind(a).is_empty());
        debug_assert!(self.parent(b).is_some() || self.kind(b).is_empty());
        let ta = self.kind(a);
        let tb = self.kind(b);
        if !ta.is_empty() && !tb.is_empty() {
            self._swap_props(a, b);
            self._swap_hierarchy(a, b);
        } else if ta.is_empty() && !tb.is_empty() {
            self._move_to_free_slot(a, b);
        } else if !ta.is_empty() && tb.is_empty() {
            self._move_to_free_slot(b, a);
        } else {
            unreachable!("swap of two free slots");
        }
    }

    /// Move the live node `src` into the free slot `dst`.
    fn _move_to_free_slot(&mut self, dst: NodeId, src: NodeId) {
        self._copy_props(dst, src);
        self._free_list_rem(dst);
        self._copy_hierarchy(dst, src);
        self.nodes[src.index()].clear_props();
        self._free_list_add(src);
    }

    /// Give `dst` the hierarchy position of `src` and repoint every
    /// neighbor of `src` at `dst`.
    fn _copy_hierarchy(&mut self, dst: NodeId, src: NodeId) {
        let s = self.nodes[src.index()];
        let mut child = s.first_child;
        while let Some(c) = child {
            self.nodes[c.index()].parent = Some(dst);
            child = self.nodes[c.index()].next_sibling;
        }
        if let Some(prev) = s.prev_sibling {
            self.nodes[prev.index()].next_sibling = Some(dst);
        }
        if let Some(next) = s.next_sibling {
            self.nodes[next.index()].prev_sibling = Some(dst);
        }
        if let Some(parent) = s.parent {
            if self.nodes[parent.index()].first_child == Some(src) {
                self.nodes[parent.index()].first_child = Some(dst);
            }
            if self.nodes[parent.index()].last_child == Some(src) {
                self.nodes[parent.index()].last_child = Some(dst);
            }
        }
        let d = &mut self.nodes[dst.index()];
        d.parent = s.parent;
        d.first_child = s.first_child;
        d.last_child = s.last_child;
        d.prev_sibling = s.prev_sibling;
        d.next_sibling = s.next_sibling;
    }

    /// Exchange the hierarchy positions of two live nodes.
    ///
    /// Exchanging the link blocks and then substituting `a` for `b` (and
    /// vice versa) in every link of the two nodes and their neighbors covers
    /// all the delicate cases at once: adjacent siblings, shared parents,
    /// and one node being the other's parent.
    fn _swap_hierarchy(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let mut affected = vec![a, b];
        for id in [a, b] {
            let node = self.nodes[id.index()];
            for link in [node.parent, node.prev_sibling, node.next_sibling] {
                if let Some(l) = link {
                    if !affected.contains(&l) {
                        affected.push(l);
                    }
                }
            }
            let mut child = node.first_child;
            while let Some(c) = child {
                if !affected.contains(&c) {
                    affected.push(c);
                }
                child = self.nodes[c.index()].next_sibling;
            }
        }

        let sa = self.nodes[a.index()];
        let sb = self.nodes[b.index()];
        {
            let na = &mut self.nodes[a.index()];
            na.parent = sb.parent;
            na.first_child = sb.first_child;
            na.last_child = sb.last_child;
            na.prev_sibling = sb.prev_sibling;
            na.next_sibling = sb.next_sibling;
        }
        {
            let nb = &mut self.nodes[b.index()];
            nb.parent = sa.parent;
            nb.first_child = sa.first_child;
            nb.last_child = sa.last_child;
            nb.prev_sibling = sa.prev_sibling;
            nb.next_sibling = sa.next_sibling;
        }

        let transpose = |link: Option<NodeId>| match link {
            Some(l) if l == a => Some(b),
            Some(l) if l == b => Some(a),
            other => other,
        };
        for id in affected {
            let node = &mut self.nodes[id.index()];
            node.parent = transpose(node.parent);
            node.first_child = transpose(node.first_child);
            node.last_child = transpose(node.last_child);
            node.prev_sibling = transpose(node.prev_sibling);
            node.next_sibling = transpose(node.next_sibling);
        }
    }

    // ------------------------------------------------------------------
    // reordering

    /// Swap pool slots so that increasing id equals document order.
    ///
    /// Invalidates every id held outside the tree.
    pub fn reorder(&mut self) {
        debug!(live = self.size, "reordering pool into document order");
        let mut root = self.root_id();
        self._do_reorder(&mut root, 0);
    }

    fn _do_reorder(&mut self, node: &mut NodeId, mut count: usize) -> usize {
        if node.index() != count {
            self.swap(*node, NodeId(count));
            *node = NodeId(count);
        }
        count += 1;
        let mut child = self.first_child(*node);
        while let Some(mut c) = child {
            // the child may be relocated while its branch is processed
            count = self._do_reorder(&mut c, count);
            child = self.next_sibling(c);
        }
        count
    }

    // ------------------------------------------------------------------
    // duplication

    /// Deep-copy the branch at `node` to a new child of `parent`, inserted
    /// after `after`. Scalar spans are shared: the arena is append-only.
    pub fn duplicate(&mut self, node: NodeId, parent: NodeId, after: Option<NodeId>) -> NodeId {
        debug_assert!(!self.is_root(node));
        let copy = self._claim();
        self._copy_props(copy, node);
        self._set_hierarchy(copy, Some(parent), after);
        self.duplicate_children(node, copy, None);
        copy
    }

    /// Deep-copy every child of `node` under `parent`, starting after
    /// `after`. Returns the last node inserted (or `after` if there were no
    /// children).
    pub fn duplicate_children(&mut self, node: NodeId, parent: NodeId, after: Option<NodeId>) -> Option<NodeId> {
        debug_assert!(after.is_none_or(|a| self.has_child(parent, a)));
        let mut prev = after;
        let mut child = self.first_child(node);
        while let Some(c) = child {
            prev = Some(self.duplicate(c, parent, prev));
            child = self.next_sibling(c);
        }
        prev
    }

    /// Copy the value properties and children of `node` onto the existing
    /// node `dst`, which keeps its key.
    pub fn duplicate_contents(&mut self, node: NodeId, dst: NodeId) {
        self._copy_props_wo_key(dst, node);
        let last = self.last_child(dst);
        self.duplicate_children(node, dst, last);
    }

    /// Like [`Tree::duplicate`], but the branch comes from another tree and
    /// all of its scalar text is re-interned into this tree's arena.
    pub fn duplicate_from(&mut self, src: &Tree, node: NodeId, parent: NodeId, after: Option<NodeId>) -> NodeId {
        debug_assert!(!src.is_root(node));
        let copy = self._claim();
        self._copy_props_from(copy, src, node);
        self._set_hierarchy(copy, Some(parent), after);
        self.duplicate_children_from(src, node, copy, None);
        copy
    }

    pub fn duplicate_children_from(
        &mut self,
        src: &Tree,
        node: NodeId,
        parent: NodeId,
        after: Option<NodeId>,
    ) -> Option<NodeId> {
        debug_assert!(after.is_none_or(|a| self.has_child(parent, a)));
        let mut prev = after;
        let mut child = src.first_child(node);
        while let Some(c) = child {
            prev = Some(self.duplicate_from(src, c, parent, prev));
            child = src.next_sibling(c);
        }
        prev
    }

    pub fn duplicate_contents_from(&mut self, src: &Tree, node: NodeId, dst: NodeId) {
        self._copy_props_wo_key_from(dst, src, node);
        let last = self.last_child(dst);
        self.duplicate_children_from(src, node, dst, last);
    }

    /// Deep-copy the children of `node` into the map (or seq) `parent`
    /// without repeating keys, starting after `after`.
    ///
    /// For each source child whose key already exists in the destination:
    /// a repetition sitting before the insertion point is overridden by the
    /// copy (removed and replaced); one sitting at or after it wins and is
    /// moved into the insertion position instead, discarding the copy. This
    /// is the YAML merge-key rule: later mentions override earlier ones.
    pub fn duplicate_children_no_rep(&mut self, node: NodeId, parent: NodeId, after: Option<NodeId>) -> Option<NodeId> {
        debug_assert!(after.is_none_or(|a| self.has_child(parent, a)));
        let after_pos = after.map(|a| {
            self.child_pos(parent, a).expect("insertion point is a child of parent")
        });

        let mut prev = after;
        let mut child = self.first_child(node);
        while let Some(c) = child {
            child = self.next_sibling(c);
            if self.is_seq(parent) {
                prev = Some(self.duplicate(c, parent, prev));
                continue;
            }
            debug_assert!(self.is_map(parent));
            // does the destination already have a child with this key?
            let rep = self
                .children(parent)
                .find_position(|&j| self.key(j) == self.key(c))
                .map(|(pos, j)| (j, pos));
            match rep {
                None => {
                    prev = Some(self.duplicate(c, parent, prev));
                }
                Some((rep, rep_pos)) if after_pos.is_some_and(|ap| rep_pos < ap) => {
                    // overridden by the copy: replace it
                    self.remove(rep);
                    prev = Some(self.duplicate(c, parent, prev));
                }
                Some((rep, _)) => {
                    // the existing child wins; move it into place
                    if Some(rep) != prev {
                        self.move_node(rep, prev);
                        prev = Some(rep);
                    }
                }
            }
        }
        prev
    }

    // ------------------------------------------------------------------
    // merging

    /// Recursively merge the branch at `src_node` of `src` into `dst_node`
    /// of this tree (roots when `None`).
    ///
    /// A source value overwrites the destination; a source seq appends; a
    /// source map merges entries by key, recursing into matches.
    pub fn merge_with(&mut self, src: &Tree, src_node: Option<NodeId>, dst_node: Option<NodeId>) {
        let sn = src_node.unwrap_or_else(|| src.root_id());
        let dn = dst_node.unwrap_or_else(|| self.root_id());
        debug!(src = %sn, dst = %dn, "merging subtree");
        self._merge(src, sn, dn);
    }

    fn _merge(&mut self, src: &Tree, sn: NodeId, dn: NodeId) {
        debug_assert!(src.has_val(sn) || src.is_seq(sn) || src.is_map(sn));
        if src.has_val(sn) {
            if !self.has_val(dn) && self.has_children(dn) {
                self.remove_children(dn);
            }
            if src.is_keyval(sn) {
                self._copy_props_from(dn, src, sn);
            } else {
                self._copy_props_wo_key_from(dn, src, sn);
            }
        } else if src.is_seq(sn) {
            if !self.is_seq(dn) {
                if self.has_children(dn) {
                    self.remove_children(dn);
                }
                // keep the destination key; fall back to the source's
                if !self.has_key(dn) {
                    if let Some(k) = src.key(sn) {
                        let key = self.copy_to_arena(k);
                        self.nodes[dn.index()].key.scalar = Some(key);
                        self.add_flags(dn, NodeType::KEY);
                    }
                }
                self._change_to_seq_keeping_key(dn);
            }
            let mut child = src.first_child(sn);
            while let Some(c) = child {
                let dch = self.append_child(dn);
                self._copy_props_wo_key_from(dch, src, c);
                self._merge(src, c, dch);
                child = src.next_sibling(c);
            }
        } else {
            if !self.is_map(dn) {
                if self.has_children(dn) {
                    self.remove_children(dn);
                }
                if !self.has_key(dn) {
                    if let Some(k) = src.key(sn) {
                        let key = self.copy_to_arena(k);
                        self.nodes[dn.index()].key.scalar = Some(key);
                        self.add_flags(dn, NodeType::KEY);
                    }
                }
                self._change_to_map_keeping_key(dn);
            }
            let mut child = src.first_child(sn);
            while let Some(c) = child {
                let dch = match src.key(c).and_then(|k| self.find_child(dn, k)) {
                    Some(existing) => existing,
                    None => {
                        let fresh = self.append_child(dn);
                        self._copy_props_from(fresh, src, c);
                        fresh
                    }
                };
                self._merge(src, c, dch);
                child = src.next_sibling(c);
            }
        }
    }

    // ------------------------------------------------------------------
    // stream promotion

    /// Wrap the root into a stream with a single document that inherits the
    /// root's properties and children. A bare value root becomes a
    /// single-document stream carrying that value. No-op if the root
    /// already is a stream.
    pub fn set_root_as_stream(&mut self) {
        let root = self.root_id();
        if self.is_stream(root) {
            return;
        }
        if !self.has_children(root) {
            if self.is_val(root) {
                let doc = self.append_child(root);
                let r = self.nodes[root.index()];
                let d = &mut self.nodes[doc.index()];
                d.kind = r.kind | NodeType::DOC;
                d.val = r.val;
            }
            self._set_flags(root, NodeType::STREAM);
            return;
        }
        debug_assert!(!self.has_key(root));
        let next_doc = self.append_child(root);
        self._copy_props_wo_key(next_doc, root);
        self.add_flags(next_doc, NodeType::DOC);
        let mut prev: Option<NodeId> = None;
        let mut child = self.first_child(root);
        while let Some(c) = child {
            if c == next_doc {
                break;
            }
            let next = self.next_sibling(c);
            self.move_to(c, next_doc, prev);
            prev = Some(c);
            child = next;
        }
        self._set_flags(root, NodeType::STREAM);
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn small_map(tree: &mut Tree) -> (NodeId, NodeId, NodeId) {
        let root = tree.root_id();
        tree.to_map(root);
        let a = tree.append_child(root);
        tree.to_keyval(a, "a", "1");
        let b = tree.append_child(root);
        tree.to_keyval(b, "b", "2");
        (root, a, b)
    }

    #[test]
    fn insertion_keeps_sibling_order() {
        let mut tree = Tree::new();
        let (root, a, b) = small_map(&mut tree);
        let front = tree.prepend_child(root);
        tree.to_keyval(front, "front", "0");
        let mid = tree.insert_child(root, Some(a));
        tree.to_keyval(mid, "mid", "9");

        let keys = tree.children(root).map(|c| tree.key(c).unwrap()).collect_vec();
        assert_eq!(keys, ["front", "a", "mid", "b"]);
        assert_eq!(tree.first_child(root), Some(front));
        assert_eq!(tree.last_child(root), Some(b));
        assert_eq!(tree.child_pos(root, mid), Some(2));
        assert_eq!(tree.child(root, 3), Some(b));
        assert_eq!(tree.find_child(root, "mid"), Some(mid));
        assert_eq!(tree.find_child(root, "nope"), None);
    }

    #[test]
    fn removal_recycles_slots() {
        let mut tree = Tree::new();
        let (root, a, b) = small_map(&mut tree);
        let before = tree.len();
        tree.remove(a);
        assert_eq!(tree.len(), before - 1);
        assert_eq!(tree.first_child(root), Some(b));
        // the freed slot is handed out again
        let again = tree.append_child(root);
        assert_eq!(again, a);
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn move_node_repositions_within_parent() {
        let mut tree = Tree::new();
        let (root, a, b) = small_map(&mut tree);
        tree.move_node(b, None);
        let keys = tree.children(root).map(|c| tree.key(c).unwrap()).collect_vec();
        assert_eq!(keys, ["b", "a"]);
        tree.move_node(b, Some(a));
        let keys = tree.children(root).map(|c| tree.key(c).unwrap()).collect_vec();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn swap_handles_adjacent_siblings() {
        let mut tree = Tree::new();
        let (root, a, b) = small_map(&mut tree);
        tree.swap(a, b);
        // props moved with the slots: document order is unchanged, the
        // slots now hold the other node
        assert_eq!(tree.key(tree.first_child(root).unwrap()), Some("a"));
        let keys = tree.children(root).map(|c| tree.key(c).unwrap()).collect_vec();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(tree.first_child(root), Some(b));
        assert_eq!(tree.last_child(root), Some(a));
    }

    #[test]
    fn swap_handles_parent_child() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        tree.to_map(root);
        let m = tree.append_child(root);
        tree.to_keymap(m, "m");
        let inner = tree.append_child(m);
        tree.to_keyval(inner, "inner", "1");

        tree.swap(m, inner);
        // the slot that held the map now holds the scalar, and hangs below
        // the slot that now holds the map
        assert_eq!(tree.parent(m), Some(inner));
        assert_eq!(tree.parent(inner), Some(root));
        assert_eq!(tree.key(inner), Some("m"));
        assert_eq!(tree.key(m), Some("inner"));
        assert_eq!(tree.first_child(inner), Some(m));
        assert!(!tree.has_children(m));
    }

    #[test]
    fn reorder_yields_document_order_ids() {
        let mut tree = Tree::new();
        let (root, a, _b) = small_map(&mut tree);
        tree.remove(a);
        let c = tree.append_child(root);
        tree.to_keymap(c, "c");
        let nested = tree.append_child(c);
        tree.to_keyval(nested, "nested", "3");
        // c reused a freed low slot, so ids are out of document order now

        tree.reorder();
        fn dfs(tree: &Tree, id: NodeId, out: &mut Vec<usize>) {
            out.push(id.index());
            for ch in tree.children(id).collect_vec() {
                dfs(tree, ch, out);
            }
        }
        let mut ids = Vec::new();
        dfs(&tree, tree.root_id(), &mut ids);
        assert_eq!(ids, (0..tree.len()).collect_vec());
        let keys = tree
            .children(tree.root_id())
            .map(|ch| tree.key(ch).unwrap())
            .collect_vec();
        assert_eq!(keys, ["b", "c"]);
    }

    #[test]
    fn duplicate_copies_branches_deeply() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        tree.to_map(root);
        let m = tree.append_child(root);
        tree.to_keymap(m, "m");
        let x = tree.append_child(m);
        tree.to_keyval(x, "x", "1");

        let copy = tree.duplicate(m, root, Some(m));
        assert_eq!(tree.key(copy), Some("m"));
        assert_eq!(tree.num_children(copy), 1);
        let cx = tree.first_child(copy).unwrap();
        assert_eq!(tree.key(cx), Some("x"));
        assert_eq!(tree.val(cx), Some("1"));
        // the copy is independent
        tree.remove(x);
        assert_eq!(tree.num_children(copy), 1);
    }

    #[test]
    fn duplicate_children_no_rep_prefers_existing_later_entries() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        tree.to_map(root);
        let dst = tree.append_child(root);
        tree.to_keymap(dst, "dst");
        for (k, v) in [("x", "1"), ("y", "2")] {
            let ch = tree.append_child(dst);
            tree.to_keyval(ch, k, v);
        }
        let src = tree.append_child(root);
        tree.to_keymap(src, "src");
        for (k, v) in [("y", "20"), ("z", "30")] {
            let ch = tree.append_child(src);
            tree.to_keyval(ch, k, v);
        }

        tree.duplicate_children_no_rep(src, dst, None);
        let entries = tree
            .children(dst)
            .map(|c| (tree.key(c).unwrap(), tree.val(c).unwrap()))
            .collect_vec();
        // with no insertion anchor the existing y wins and moves into place
        assert_eq!(entries, [("y", "2"), ("z", "30"), ("x", "1")]);
    }

    #[test]
    fn merge_with_recurses_into_matching_keys() {
        let mut dst = Tree::new();
        let droot = dst.root_id();
        dst.to_map(droot);
        let b = dst.append_child(droot);
        dst.to_keymap(b, "b");
        let d = dst.append_child(b);
        dst.to_keyval(d, "d", "3");
        let e = dst.append_child(droot);
        dst.to_keyval(e, "e", "4");

        let mut src = Tree::new();
        let sroot = src.root_id();
        src.to_map(sroot);
        let a = src.append_child(sroot);
        src.to_keyval(a, "a", "1");
        let sb = src.append_child(sroot);
        src.to_keymap(sb, "b");
        let c = src.append_child(sb);
        src.to_keyval(c, "c", "2");

        dst.merge_with(&src, None, None);
        let keys = dst.children(droot).map(|ch| dst.key(ch).unwrap()).collect_vec();
        assert_eq!(keys, ["b", "e", "a"]);
        let b_entries = dst
            .children(b)
            .map(|ch| (dst.key(ch).unwrap(), dst.val(ch).unwrap()))
            .collect_vec();
        assert_eq!(b_entries, [("d", "3"), ("c", "2")]);
    }

    #[test]
    fn set_root_as_stream_wraps_children_in_a_doc() {
        let mut tree = Tree::new();
        let (root, a, b) = small_map(&mut tree);
        tree.set_root_as_stream();
        assert!(tree.is_stream(root));
        assert_eq!(tree.num_children(root), 1);
        let doc = tree.first_child(root).unwrap();
        assert!(tree.is_doc(doc));
        assert!(tree.is_map(doc));
        let keys = tree.children(doc).map(|c| tree.key(c).unwrap()).collect_vec();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(tree.parent(a), Some(doc));
        assert_eq!(tree.parent(b), Some(doc));
        // promoting twice is a no-op
        tree.set_root_as_stream();
        assert_eq!(tree.num_children(root), 1);
    }

    #[test]
    fn set_root_as_stream_keeps_a_bare_value() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        tree.to_val(root, "solo");
        tree.set_root_as_stream();
        assert!(tree.is_stream(root));
        let doc = tree.first_child(root).unwrap();
        assert!(tree.is_doc(doc));
        assert!(tree.has_val(doc));
        assert_eq!(tree.val(doc), Some("solo"));
    }

    #[test]
    fn cross_tree_duplication_reinterns_text() {
        let mut src = Tree::new();
        let sroot = src.root_id();
        src.to_map(sroot);
        let m = src.append_child(sroot);
        src.to_keymap(m, "payload");
        let x = src.append_child(m);
        src.to_keyval(x, "x", "1");

        let mut dst = Tree::new();
        let droot = dst.root_id();
        dst.to_map(droot);
        let copy = dst.duplicate_from(&src, m, droot, None);
        assert_eq!(dst.key(copy), Some("payload"));
        let cx = dst.first_child(copy).unwrap();
        assert_eq!((dst.key(cx), dst.val(cx)), (Some("x"), Some("1")));
        // the copy must not depend on the source arena
        drop(src);
        assert_eq!(dst.key(copy), Some("payload"));
    }

    #[test]
    fn lookup_path_reports_closest_and_unresolved() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        tree.to_map(root);
        let a = tree.append_child(root);
        tree.to_keymap(a, "a");
        let b = tree.append_child(a);
        tree.to_keyseq(b, "b");
        for v in ["v0", "v1"] {
            let ch = tree.append_child(b);
            tree.to_val(ch, v);
        }

        let hit = tree.lookup_path("a.b[1]", None);
        assert_eq!(hit.target, tree.child(b, 1));

        let miss = tree.lookup_path("a.z", None);
        assert_eq!(miss.target, None);
        assert_eq!(miss.closest, Some(a));
        assert_eq!(miss.resolved(), "a");
        assert_eq!(miss.unresolved(), "z");
    }
}
