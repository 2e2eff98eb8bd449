//! # Quill Schema
//!
//! Shared document model for the reconciliation engine.
//!
//! ## Overview
//!
//! ```text
//! Node ──┬── Element { kind, attributes, children }
//!        └── Text    { content, marks }
//!
//! Path      = child indices from the root: [block, child, grandchild, ..]
//! Operation = Insert | Remove | Update | Replace | Text   (+ batch priority)
//! ```
//!
//! Nodes carry no identity beyond their position. The optional content hash
//! and `settled` flag let the differ skip content that is known to be final.
//!
//! The JSON shape mirrors the editor's wire format: elements serialize as
//! `{"type": "paragraph", "children": [..], ..attributes}` and text leaves as
//! `{"text": "..", ..marks}`.

mod node;
mod operation;
mod path;
mod selection;

pub use node::{find, find_mut, Element, Mark, Node, NodeMeta, Text};
pub use operation::{Operation, OperationKind, Properties};
pub use path::Path;
pub use selection::{Point, Selection};

/// Re-exported so downstream crates build attribute values without naming serde_json.
pub use serde_json::Value;
