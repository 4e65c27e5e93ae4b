//! Anchor and alias resolution.
//!
//! A `*alias` refers to the most recent node in the serialization carrying
//! the matching `&anchor` (YAML 1.2, §7.1). Resolution therefore runs in
//! passes: collect every anchor and reference in document order, chain each
//! record to the most recent preceding anchor, look the targets up by
//! walking those chains backward, and only then splice the results into the
//! tree. Merge keys (`<<`, including the `<<: [*a, *b]` form) inject the
//! target's entries into the containing map.

use tracing::debug;

use crate::errors::{Result, TreeError};
use crate::node::{NodeId, NodeType};
use crate::tree::Tree;

/// One anchor or reference occurrence, in document order.
#[derive(Debug, Clone, Copy)]
struct RefData {
    /// `KEYREF`, `VALREF`, `KEYANCH` or `VALANCH`
    kind: NodeType,
    node: NodeId,
    /// Index of the most recent anchor record before this one
    prev_anchor: Option<usize>,
    /// Resolved target node, filled in by the lookup pass
    target: Option<NodeId>,
    /// For elements of a `<<: [*a, *b]` seq: the seq node itself
    parent_ref: Option<NodeId>,
}

impl RefData {
    fn new(kind: NodeType, node: NodeId, parent_ref: Option<NodeId>) -> Self {
        RefData {
            kind,
            node,
            prev_anchor: None,
            target: None,
            parent_ref,
        }
    }
}

#[derive(Debug, Default)]
struct ReferenceResolver {
    refs: Vec<RefData>,
}

impl ReferenceResolver {
    /// DFS the tree, emitting records in document order.
    fn collect(&mut self, t: &Tree, n: NodeId) {
        let merge_key = t.has_key(n) && t.key(n) == Some("<<");
        if t.is_key_ref(n) || t.is_val_ref(n) || merge_key {
            if t.is_seq(n) {
                // merging multiple targets: <<: [*a, *b]
                let mut child = t.first_child(n);
                while let Some(c) = child {
                    debug_assert_eq!(t.num_children(c), 0);
                    self.refs.push(RefData::new(NodeType::VALREF, c, Some(n)));
                    child = t.next_sibling(c);
                }
                return;
            }
            // key refs go in before val refs of the same node
            if t.is_key_ref(n) && !merge_key {
                self.refs.push(RefData::new(NodeType::KEYREF, n, None));
            }
            if t.is_val_ref(n) {
                self.refs.push(RefData::new(NodeType::VALREF, n, None));
            }
        }
        if t.has_key_anchor(n) {
            debug_assert!(t.has_key(n));
            self.refs.push(RefData::new(NodeType::KEYANCH, n, None));
        }
        if t.has_val_anchor(n) {
            debug_assert!(t.has_val(n) || t.is_container(n));
            self.refs.push(RefData::new(NodeType::VALANCH, n, None));
        }
        let mut child = t.first_child(n);
        while let Some(c) = child {
            self.collect(t, c);
            child = t.next_sibling(c);
        }
    }

    /// Point every record at the most recent anchor record before it.
    fn chain_anchors(&mut self) {
        let mut prev: Option<usize> = None;
        for (i, rd) in self.refs.iter_mut().enumerate() {
            rd.prev_anchor = prev;
            if rd.kind.has_anchor() {
                prev = Some(i);
            }
        }
    }

    /// Walk the anchor chain upward from record `i` until a matching
    /// anchor name is found.
    fn lookup_target(&self, t: &Tree, i: usize) -> Result<NodeId> {
        let rd = &self.refs[i];
        let name = if rd.kind.is_val_ref() {
            t.val_ref(rd.node)
        } else {
            t.key_ref(rd.node)
        };
        let name = name.expect("reference record carries a name");
        let mut cur = rd.prev_anchor;
        while let Some(pi) = cur {
            let anchor = &self.refs[pi];
            if t.has_anchor(anchor.node, name) {
                return Ok(anchor.node);
            }
            cur = anchor.prev_anchor;
        }
        Err(TreeError::AnchorNotFound(name.to_string()))
    }
}

impl Tree {
    /// Resolve every `*alias` and merge key against the anchors of this
    /// tree, then clear all anchor and reference markers.
    ///
    /// Fails with [`TreeError::AnchorNotFound`] when an alias has no
    /// preceding matching anchor; mutations applied before the failure are
    /// left in place. Once no references remain the call is a no-op.
    pub fn resolve(&mut self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let mut rr = ReferenceResolver::default();
        rr.collect(self, self.root_id());
        if rr.refs.is_empty() {
            return Ok(());
        }
        rr.chain_anchors();
        for i in 0..rr.refs.len() {
            if !rr.refs[i].kind.is_ref() {
                continue;
            }
            let target = rr.lookup_target(self, i)?;
            rr.refs[i].target = Some(target);
        }
        debug!(records = rr.refs.len(), "splicing resolved references");

        // splice the resolved references into the tree. successive elements
        // of one merge seq chain their insertion point so the targets land
        // in order.
        let mut prev_parent_ref: Option<NodeId> = None;
        let mut prev_parent_ref_after: Option<NodeId> = None;
        for rd in rr.refs.iter().copied() {
            if !rd.kind.is_ref() {
                continue;
            }
            let target = rd.target.expect("targets were resolved above");
            if let Some(pref) = rd.parent_ref {
                debug_assert!(self.is_seq(pref));
                let parent = self.parent(pref).expect("merge seq sits in a map entry");
                let after = if prev_parent_ref != Some(pref) {
                    Some(pref)
                } else {
                    prev_parent_ref_after
                };
                prev_parent_ref = Some(pref);
                prev_parent_ref_after = self.duplicate_children_no_rep(target, parent, after);
                self.remove(rd.node);
            } else if self.has_key(rd.node) && self.key(rd.node) == Some("<<") {
                // bare merge: <<: *a
                debug_assert!(self.is_keyval(rd.node));
                let parent = self.parent(rd.node).expect("merge keyval sits in a map");
                let after = self.prev_sibling(rd.node);
                self.duplicate_children_no_rep(target, parent, after);
                self.remove(rd.node);
            } else if rd.kind.is_key_ref() {
                debug_assert!(self.is_key_ref(rd.node));
                debug_assert!(self.has_key_anchor(target) || self.has_val_anchor(target));
                let span = if self.has_val_anchor(target) && self.val_anchor(target) == self.key_ref(rd.node) {
                    debug_assert!(!self.is_container(target));
                    debug_assert!(self.has_val(target));
                    self.val_scalar(target).scalar
                } else {
                    debug_assert!(self.key_anchor(target) == self.key_ref(rd.node));
                    self.key_scalar(target).scalar
                };
                self.set_key_scalar_span(rd.node, span);
                self.add_flags(rd.node, NodeType::KEY);
            } else {
                debug_assert!(rd.kind.is_val_ref());
                if self.has_key_anchor(target) && self.key_anchor(target) == self.val_ref(rd.node) {
                    debug_assert!(!self.is_container(target));
                    let span = self.key_scalar(target).scalar;
                    self.set_val_scalar_span(rd.node, span);
                    self.add_flags(rd.node, NodeType::VAL);
                } else {
                    // scalar or container target: graft its contents here
                    self.duplicate_contents(target, rd.node);
                }
            }
        }

        // clear anchors and reference markers
        for rd in rr.refs.iter() {
            self.rem_anchor_ref(rd.node);
            if let Some(pref) = rd.parent_ref {
                if !self.kind(pref).is_empty() {
                    self.remove(pref);
                }
            }
        }
        Ok(())
    }
}
