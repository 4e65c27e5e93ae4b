//! ## About
//!
//! An arena-backed document object model for YAML 1.2: a flat,
//! index-addressed pool of nodes whose scalar text lives in one contiguous
//! arena, an anchor/alias resolver covering the merge key (`<<`), and a
//! canonical emitter producing block YAML or flow JSON.
//!
//! Trees are built through the mutation API (typically by a parser feeding
//! [`Tree::append_child`] and the `to_*` shape mutators), resolved with
//! [`Tree::resolve`], and serialized with [`emit_yaml`] / [`emit_json`] or a
//! custom [`Writer`] sink:
//!
//! ```
//! use yamltree::{emit_yaml, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.root_id();
//! tree.to_map(root);
//! let child = tree.append_child(root);
//! tree.to_keyval(child, "greeting", "hello");
//! assert_eq!(emit_yaml(&tree).unwrap(), "greeting: hello\n");
//! ```
//!
//! ## Naming conventions
//! * Ids – [`NodeId`] indexes are dense and stable across insertion and
//!   removal, but invalidated by [`Tree::reorder`] and [`Tree::clear`]
//! * Methods – imperative forms with the exception of getters, which omit a
//!   `get_` prefix much like the standard library
//! * `to_*` – reshape a node in place; `set_*` – decorate it

pub mod arena;
pub mod emit;
pub mod errors;
pub mod node;
mod resolve;
pub mod tag;
pub mod tree;

pub use arena::{Arena, Span};
pub use emit::{emit_json, emit_yaml, EmitType, Emitter, SliceWriter, StringWriter, Writer};
pub use errors::{Result, TreeError};
pub use node::{NodeData, NodeId, NodeScalar, NodeType};
pub use tag::{from_tag, normalize_tag, to_tag, YamlTag};
pub use tree::{LookupResult, Tree};
