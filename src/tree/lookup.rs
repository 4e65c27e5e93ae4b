//! Dotted-path lookup over a [`Tree`]: `"a.b[2].c"` descends map keys with
//! `.` and sequence ordinals with `[N]`.
//!
//! [`Tree::lookup_path`] is read-only and reports how far a path resolved;
//! [`Tree::lookup_path_or_modify`] creates the missing interior on the way,
//! padding sequences with null placeholders.

use super::Tree;
use crate::errors::{Result, TreeError};
use crate::node::{NodeId, NodeScalar, NodeType};

/// Outcome of a path lookup.
#[derive(Debug, Clone, Copy)]
pub struct LookupResult<'p> {
    /// The node the full path resolved to
    pub target: Option<NodeId>,
    /// The deepest node any prefix of the path resolved to
    pub closest: Option<NodeId>,
    /// How far into the path the match extended, in bytes
    pub path_pos: usize,
    path: &'p str,
}

impl<'p> LookupResult<'p> {
    fn new(path: &'p str, start: NodeId) -> Self {
        LookupResult {
            target: None,
            closest: Some(start),
            path_pos: 0,
            path,
        }
    }

    /// The prefix of the path that resolved.
    pub fn resolved(&self) -> &'p str {
        let p = &self.path[..self.path_pos];
        p.strip_suffix('.').unwrap_or(p)
    }

    /// The tail of the path that did not resolve.
    pub fn unresolved(&self) -> &'p str {
        &self.path[self.path_pos..]
    }
}

/// One parsed path segment. The kind says what the segment must resolve
/// to: `MAP`/`SEQ` for `name.`/`name[`, `KEY` for a `[N]` ordinal, and
/// `VAL`/`KEYVAL` for a trailing bare name.
#[derive(Debug, Clone, Copy)]
struct PathToken<'p> {
    value: &'p str,
    kind: NodeType,
}

impl PathToken<'_> {
    fn valid(&self) -> bool {
        !self.kind.is_empty()
    }
}

impl Tree {
    /// Resolve `path` starting at `start` (the root when `None`).
    ///
    /// Never mutates: an unmatched tail is reported through
    /// [`LookupResult::unresolved`] and the deepest match through
    /// [`LookupResult::closest`].
    pub fn lookup_path<'p>(&self, path: &'p str, start: Option<NodeId>) -> LookupResult<'p> {
        let start = start.unwrap_or_else(|| self.root_id());
        let mut r = LookupResult::new(path, start);
        if path.is_empty() {
            return r;
        }
        self._lookup_path(&mut r);
        if r.target.is_none() && r.closest == Some(start) {
            r.closest = None;
        }
        r
    }

    /// Resolve `path`, creating every missing node along the way, and set
    /// the target to `default_value`. Returns the target id.
    pub fn lookup_path_or_modify(&mut self, default_value: &str, path: &str, start: Option<NodeId>) -> Result<NodeId> {
        let target = self._lookup_path_or_create(path, start)?;
        let val = Some(self.copy_to_arena(default_value));
        debug_assert!(!self.has_children(target));
        let keep_key = self.parent_is_map(target);
        let node = &mut self.nodes[target.index()];
        if keep_key {
            node.kind = NodeType::KEYVAL;
            node.key = NodeScalar { scalar: node.key.scalar, ..NodeScalar::default() };
        } else {
            node.kind = NodeType::VAL;
            node.key.clear();
        }
        node.val = NodeScalar { scalar: val, ..NodeScalar::default() };
        Ok(target)
    }

    /// Resolve `path`, creating every missing node along the way, and merge
    /// the branch at `src_node` of `src` into the target.
    pub fn lookup_path_or_merge(
        &mut self,
        src: &Tree,
        src_node: NodeId,
        path: &str,
        start: Option<NodeId>,
    ) -> Result<NodeId> {
        let target = self._lookup_path_or_create(path, start)?;
        self.merge_with(src, Some(src_node), Some(target));
        Ok(target)
    }

    fn _lookup_path_or_create(&mut self, path: &str, start: Option<NodeId>) -> Result<NodeId> {
        let start = start.unwrap_or_else(|| self.root_id());
        if path.is_empty() {
            return Ok(start);
        }
        let mut r = LookupResult::new(path, start);
        self._lookup_path(&mut r);
        if let Some(target) = r.target {
            debug_assert!(r.unresolved().is_empty());
            return Ok(target);
        }
        self._lookup_path_modify(&mut r)?;
        r.target.ok_or(TreeError::PathIndexInvalid(r.path_pos))
    }

    fn _lookup_path(&self, r: &mut LookupResult<'_>) {
        debug_assert!(!r.unresolved().is_empty());
        let closest = r.closest.expect("lookup starts somewhere");
        let mut parent = PathToken { value: "", kind: self.kind(closest) };
        loop {
            let node = self._next_node(r, &mut parent);
            if node.is_some() {
                r.closest = node;
            }
            if r.unresolved().is_empty() {
                r.target = node;
                return;
            }
            if node.is_none() {
                return;
            }
        }
    }

    fn _lookup_path_modify(&mut self, r: &mut LookupResult<'_>) -> Result<()> {
        debug_assert!(!r.unresolved().is_empty());
        let closest = r.closest.expect("lookup starts somewhere");
        let mut parent = PathToken { value: "", kind: self.kind(closest) };
        loop {
            let node = self._next_node_modify(r, &mut parent)?;
            if node.is_some() {
                r.closest = node;
            }
            if r.unresolved().is_empty() {
                r.target = node;
                return Ok(());
            }
            if node.is_none() {
                return Ok(());
            }
        }
    }

    fn _next_node<'a>(&self, r: &mut LookupResult<'a>, parent: &mut PathToken<'a>) -> Option<NodeId> {
        let Some(token) = Self::_next_token(r, parent) else {
            return None;
        };
        let closest = r.closest.expect("lookup cursor is set");
        let prev_len = token.value.len();

        let node = if token.kind.is_map() || token.kind.is_seq() {
            debug_assert!(!token.value.starts_with('['));
            if self.is_map(closest) {
                self.find_child(closest, token.value)
            } else {
                None
            }
        } else if token.kind.has_val() {
            // trailing bare name
            debug_assert!(r.unresolved().is_empty());
            if self.is_map(closest) {
                self.find_child(closest, token.value)
            } else {
                None
            }
        } else {
            // a [N] ordinal
            debug_assert!(token.value.starts_with('[') && token.value.ends_with(']'));
            let inner = token.value[1..token.value.len() - 1].trim();
            match inner.parse::<usize>() {
                Ok(idx) => self.child(closest, idx),
                Err(_) => None,
            }
        };

        if node.is_some() {
            *parent = token;
        } else {
            // back the cursor up over the unmatched token
            let before = &r.path[r.path_pos.saturating_sub(1)..];
            r.path_pos -= prev_len;
            if before.starts_with('.') {
                r.path_pos -= 1;
            }
        }
        node
    }

    fn _next_node_modify<'a>(&mut self, r: &mut LookupResult<'a>, parent: &mut PathToken<'a>) -> Result<Option<NodeId>> {
        let Some(token) = Self::_next_token(r, parent) else {
            return Ok(None);
        };
        let closest = r.closest.expect("lookup cursor is set");

        let node = if token.kind.is_map() || token.kind.is_seq() {
            debug_assert!(!token.value.starts_with('['));
            let mut node = None;
            if !self.is_container(closest) {
                self._change_to_map_keeping_key(closest);
            } else if self.is_map(closest) {
                node = self.find_child(closest, token.value);
            } else {
                let idx = token
                    .value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| TreeError::PathIndexInvalid(r.path_pos))?;
                node = self.child(closest, idx);
            }
            match node {
                Some(n) => n,
                None => {
                    debug_assert!(self.is_map(closest));
                    let n = self.append_child(closest);
                    let key = self.copy_to_arena(token.value);
                    self.nodes[n.index()].key.scalar = Some(key);
                    self.add_flags(n, NodeType::KEY);
                    n
                }
            }
        } else if token.kind.has_val() {
            debug_assert!(r.unresolved().is_empty());
            let n = if self.is_map(closest) {
                match self.find_child(closest, token.value) {
                    Some(found) => found,
                    None => self.append_child(closest),
                }
            } else {
                debug_assert!(!self.is_seq(closest));
                self.add_flags(closest, NodeType::MAP);
                self.append_child(closest)
            };
            let key = self.copy_to_arena(token.value);
            let val = self.copy_to_arena("");
            self.nodes[n.index()].key.scalar = Some(key);
            self.nodes[n.index()].val.scalar = Some(val);
            self.add_flags(n, NodeType::KEYVAL);
            n
        } else {
            debug_assert!(token.value.starts_with('[') && token.value.ends_with(']'));
            let inner = token.value[1..token.value.len() - 1].trim();
            let idx = inner
                .parse::<usize>()
                .map_err(|_| TreeError::PathIndexInvalid(r.path_pos))?;
            if !self.is_container(closest) {
                self._change_to_seq_keeping_key(closest);
            }
            debug_assert!(self.is_container(closest));
            match self.child(closest, idx) {
                Some(n) => n,
                None => {
                    // pad with null placeholders up to the ordinal
                    debug_assert!(self.num_children(closest) <= idx);
                    let mut node = None;
                    for i in self.num_children(closest)..=idx {
                        let n = self.append_child(closest);
                        if i < idx {
                            if self.is_map(closest) {
                                self.to_keyval_null(n);
                            } else {
                                self.to_val_null(n);
                            }
                        }
                        node = Some(n);
                    }
                    node.expect("at least the indexed child was appended")
                }
            }
        };

        *parent = token;
        Ok(Some(node))
    }

    fn _advance(r: &mut LookupResult<'_>, more: usize) {
        r.path_pos += more;
        if r.unresolved().starts_with('.') {
            r.path_pos += 1;
        }
    }

    fn _next_token<'p>(r: &mut LookupResult<'p>, parent: &PathToken<'_>) -> Option<PathToken<'p>> {
        let unres = r.unresolved();
        if unres.is_empty() {
            return None;
        }

        // an ordinal like [0], [1], ...?
        if unres.starts_with('[') {
            let pos = unres.find(']')?;
            let value = &unres[..pos + 1];
            Self::_advance(r, pos + 1);
            return Some(PathToken { value, kind: NodeType::KEY });
        }

        // no. so it must be a name
        match unres.find(['.', '[']) {
            None => {
                Self::_advance(r, unres.len());
                let kind = if !parent.valid() || parent.kind.is_seq() {
                    NodeType::VAL
                } else {
                    NodeType::KEYVAL
                };
                Some(PathToken { value: unres, kind })
            }
            Some(pos) if unres.as_bytes()[pos] == b'.' => {
                debug_assert!(pos != 0);
                Self::_advance(r, pos + 1);
                Some(PathToken { value: &unres[..pos], kind: NodeType::MAP })
            }
            Some(pos) => {
                Self::_advance(r, pos);
                Some(PathToken { value: &unres[..pos], kind: NodeType::SEQ })
            }
        }
    }
}
