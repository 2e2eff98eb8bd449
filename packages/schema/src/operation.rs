//! # Reconciliation Operations
//!
//! One atomic edit against the live tree. Operations are produced by the
//! differ, ordered by the executor and applied through the host's mutation
//! primitives.
//!
//! ## Ordering
//!
//! `priority` only orders operations inside a single batch. Ties are broken
//! by [`OperationKind::rank`]: destructive kinds run before constructive ones.

use crate::{Node, NodeMeta, Path};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    /// Insert `node` so that it ends up at `path`
    Insert {
        path: Path,
        node: Node,
        priority: i32,
    },

    /// Remove the node at `path` and its subtree
    Remove { path: Path, priority: i32 },

    /// Targeted property merge on the node at `path`
    Update {
        path: Path,
        properties: Properties,
        priority: i32,
    },

    /// Swap the node at `path` for `node`
    Replace {
        path: Path,
        node: Node,
        priority: i32,
    },

    /// Overwrite the content of the text leaf at `path`
    Text {
        path: Path,
        text: String,
        priority: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Remove,
    Replace,
    Update,
    Text,
    Insert,
}

impl OperationKind {
    /// Tie-break rank among equal priorities (lower runs first)
    pub fn rank(self) -> u8 {
        match self {
            OperationKind::Remove => 0,
            OperationKind::Replace => 1,
            OperationKind::Update => 2,
            OperationKind::Text => 3,
            OperationKind::Insert => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Remove => "remove",
            OperationKind::Replace => "replace",
            OperationKind::Update => "update",
            OperationKind::Text => "text",
            OperationKind::Insert => "insert",
        }
    }
}

impl Operation {
    pub fn path(&self) -> &Path {
        match self {
            Operation::Insert { path, .. }
            | Operation::Remove { path, .. }
            | Operation::Update { path, .. }
            | Operation::Replace { path, .. }
            | Operation::Text { path, .. } => path,
        }
    }

    pub fn priority(&self) -> i32 {
        match self {
            Operation::Insert { priority, .. }
            | Operation::Remove { priority, .. }
            | Operation::Update { priority, .. }
            | Operation::Replace { priority, .. }
            | Operation::Text { priority, .. } => *priority,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Insert { .. } => OperationKind::Insert,
            Operation::Remove { .. } => OperationKind::Remove,
            Operation::Update { .. } => OperationKind::Update,
            Operation::Replace { .. } => OperationKind::Replace,
            Operation::Text { .. } => OperationKind::Text,
        }
    }
}

/// Changed properties carried by an `Update`.
///
/// Only keys that differ are present. `None` unsets the key. For elements the
/// keys are attributes; for text leaves they are marks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changed: BTreeMap<String, Option<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<NodeMeta>,
}

impl Properties {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.meta.is_none()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changed.insert(key.into(), Some(value.into()));
        self
    }

    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.changed.insert(key.into(), None);
        self
    }
}
