//! # Positional Tree Differ
//!
//! Compares a target forest against the live forest and produces the flat
//! list of operations that turns live into target.
//!
//! ## Design
//!
//! Children are matched by index, never by key. For every index:
//!
//! ```text
//! target only        → Insert  (priority -1, -2, .. in emission order)
//! live only          → Remove
//! kind mismatch      → Replace
//! both "table"       → table comparator
//! both element       → Update for changed attributes, then recurse
//! both text          → Text for content, Update for marks
//! ```
//!
//! Removals only ever hit the tail of a child list and insertions only append
//! to it, so sibling paths emitted for shared positions stay valid no matter
//! how the executor interleaves them.

use crate::table::TABLE;
use crate::{DiffConfig, DiffError};
use quill_schema::{Element, Node, NodeMeta, Operation, Path, Properties, Text, Value};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Operations turning `live` into `target`
    #[instrument(skip_all, fields(target = target.len(), live = live.len()))]
    pub fn diff(&self, target: &[Node], live: &[Node]) -> Result<Vec<Operation>, DiffError> {
        let mut walk = Walk::new(&self.config);
        walk.list(target, live, &Path::root(), 0)?;

        debug!(operations = walk.ops.len(), "Diff complete");
        Ok(walk.ops)
    }

    /// Diff a batch of target nodes against the live nodes starting at `offset`.
    ///
    /// Live nodes past the window are left alone; call [`DiffEngine::truncate`]
    /// once every batch has been applied.
    #[instrument(skip_all, fields(batch = batch.len(), offset))]
    pub fn diff_window(
        &self,
        batch: &[Node],
        live: &[Node],
        offset: usize,
    ) -> Result<Vec<Operation>, DiffError> {
        let mut walk = Walk::new(&self.config);
        for (i, target) in batch.iter().enumerate() {
            let path = Path::root().child(offset + i);
            match live.get(offset + i) {
                Some(existing) => walk.node(target, existing, &path, 1)?,
                None => walk.insert(path, target),
            }
        }
        Ok(walk.ops)
    }

    /// Removals for every live root past `len`, deepest index first
    pub fn truncate(&self, live: &[Node], len: usize) -> Vec<Operation> {
        (len..live.len())
            .rev()
            .map(|index| Operation::Remove {
                path: Path::root().child(index),
                priority: 0,
            })
            .collect()
    }
}

/// One diff pass. Owns the output and the insert counter.
pub(crate) struct Walk<'a> {
    pub(crate) config: &'a DiffConfig,
    pub(crate) ops: Vec<Operation>,
    inserts: i32,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(config: &'a DiffConfig) -> Self {
        Self {
            config,
            ops: Vec::new(),
            inserts: 0,
        }
    }

    pub(crate) fn list(
        &mut self,
        target: &[Node],
        live: &[Node],
        parent: &Path,
        depth: usize,
    ) -> Result<(), DiffError> {
        if depth > self.config.max_depth {
            return Err(DiffError::DepthExceeded {
                path: parent.clone(),
                limit: self.config.max_depth,
            });
        }

        let len = target.len().max(live.len());
        for i in 0..len {
            let path = parent.child(i);
            match (target.get(i), live.get(i)) {
                (Some(target), Some(live)) => self.node(target, live, &path, depth + 1)?,
                (Some(target), None) => self.insert(path, target),
                (None, Some(_)) => self.remove(path),
                (None, None) => {}
            }
        }

        // Tail removals run deepest index first
        let removed_from = target.len();
        if live.len() > removed_from + 1 {
            let start = self.ops.len() - (live.len() - removed_from);
            self.ops[start..].reverse();
        }

        Ok(())
    }

    pub(crate) fn node(
        &mut self,
        target: &Node,
        live: &Node,
        path: &Path,
        depth: usize,
    ) -> Result<(), DiffError> {
        if target.meta().short_circuits(&live.meta()) {
            return Ok(());
        }

        match (target, live) {
            (Node::Text(target), Node::Text(live)) => {
                self.text(target, live, path);
                Ok(())
            }
            (Node::Element(t), Node::Element(l)) if t.kind == l.kind => {
                if t.kind == TABLE {
                    self.table(t, l, path, depth)
                } else {
                    self.element_update(t, l, path);
                    self.list(&t.children, &l.children, path, depth)
                }
            }
            _ => {
                self.replace(path.clone(), target);
                Ok(())
            }
        }
    }

    fn text(&mut self, target: &Text, live: &Text, path: &Path) {
        if target.content != live.content {
            self.ops.push(Operation::Text {
                path: path.clone(),
                text: target.content.clone(),
                priority: 0,
            });
        }

        let mut properties = Properties::default();
        for (key, mark) in &target.marks {
            if live.marks.get(key) != Some(mark) {
                properties
                    .changed
                    .insert(key.clone(), Some(Value::from(mark.clone())));
            }
        }
        for key in live.marks.keys() {
            if !target.marks.contains_key(key) {
                properties.changed.insert(key.clone(), None);
            }
        }
        properties.meta = changed_meta(target.meta(), live.meta());

        self.update(path, properties);
    }

    /// Shallow attribute comparison plus metadata
    pub(crate) fn element_update(&mut self, target: &Element, live: &Element, path: &Path) {
        let mut properties = Properties::default();
        for (key, value) in &target.attributes {
            if live.attributes.get(key) != Some(value) {
                properties.changed.insert(key.clone(), Some(value.clone()));
            }
        }
        for key in live.attributes.keys() {
            if !target.attributes.contains_key(key) {
                properties.changed.insert(key.clone(), None);
            }
        }
        properties.meta = changed_meta(target.meta(), live.meta());

        self.update(path, properties);
    }

    fn update(&mut self, path: &Path, properties: Properties) {
        if properties.is_empty() {
            return;
        }
        self.ops.push(Operation::Update {
            path: path.clone(),
            properties,
            priority: 0,
        });
    }

    pub(crate) fn insert(&mut self, path: Path, node: &Node) {
        self.inserts += 1;
        self.ops.push(Operation::Insert {
            path,
            node: node.clone(),
            priority: -self.inserts,
        });
    }

    pub(crate) fn remove(&mut self, path: Path) {
        self.ops.push(Operation::Remove { path, priority: 0 });
    }

    pub(crate) fn replace(&mut self, path: Path, node: &Node) {
        self.ops.push(Operation::Replace {
            path,
            node: node.clone(),
            priority: 0,
        });
    }
}

fn changed_meta(target: NodeMeta, live: NodeMeta) -> Option<NodeMeta> {
    if target == live {
        None
    } else {
        Some(target)
    }
}
