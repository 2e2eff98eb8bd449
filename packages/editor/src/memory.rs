//! # In-Memory Host
//!
//! A plain `Vec<Node>` behind the [`HostEditor`] primitives. Used as the live
//! document by the CLI and by tests.

use crate::{HostEditor, HostError};
use quill_schema::{find_mut, Mark, Node, Path, Properties};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryEditor {
    children: Vec<Node>,
}

impl MemoryEditor {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    /// Child list that `path` is an index into
    fn siblings_mut(&mut self, path: &Path) -> Result<(&mut Vec<Node>, usize), HostError> {
        let index = path
            .last()
            .ok_or_else(|| HostError::PathNotFound(path.clone()))?;
        let parent = path
            .parent()
            .ok_or_else(|| HostError::PathNotFound(path.clone()))?;

        if parent.is_root() {
            return Ok((&mut self.children, index));
        }

        match find_mut(&mut self.children, &parent) {
            Some(Node::Element(element)) => Ok((&mut element.children, index)),
            Some(Node::Text(_)) => Err(HostError::NotAnElement(parent)),
            None => Err(HostError::PathNotFound(parent)),
        }
    }
}

impl HostEditor for MemoryEditor {
    fn children(&self) -> &[Node] {
        &self.children
    }

    fn insert_at(&mut self, path: &Path, node: Node) -> Result<(), HostError> {
        let (siblings, index) = self.siblings_mut(path)?;
        if index > siblings.len() {
            return Err(HostError::PathNotFound(path.clone()));
        }
        siblings.insert(index, node);
        Ok(())
    }

    fn remove_at(&mut self, path: &Path) -> Result<(), HostError> {
        let (siblings, index) = self.siblings_mut(path)?;
        if index >= siblings.len() {
            return Err(HostError::PathNotFound(path.clone()));
        }
        siblings.remove(index);
        Ok(())
    }

    fn set_properties(&mut self, path: &Path, properties: &Properties) -> Result<(), HostError> {
        let node =
            find_mut(&mut self.children, path).ok_or_else(|| HostError::PathNotFound(path.clone()))?;

        match &mut *node {
            Node::Element(element) => {
                for (key, value) in &properties.changed {
                    match value {
                        Some(value) => {
                            element.attributes.insert(key.clone(), value.clone());
                        }
                        None => {
                            element.attributes.remove(key);
                        }
                    }
                }
            }
            Node::Text(text) => {
                // Validate every mark before touching the leaf
                let mut marks = text.marks.clone();
                for (key, value) in &properties.changed {
                    match value {
                        Some(value) => {
                            let mark = Mark::try_from(value).map_err(|_| HostError::InvalidMark {
                                path: path.clone(),
                                key: key.clone(),
                            })?;
                            marks.insert(key.clone(), mark);
                        }
                        None => {
                            marks.remove(key);
                        }
                    }
                }
                text.marks = marks;
            }
        }

        if let Some(meta) = properties.meta {
            node.set_meta(meta);
        }
        Ok(())
    }

    fn set_text(&mut self, path: &Path, text: &str) -> Result<(), HostError> {
        match find_mut(&mut self.children, path) {
            Some(Node::Text(leaf)) => {
                leaf.content = text.to_string();
                Ok(())
            }
            Some(Node::Element(_)) => Err(HostError::NotText(path.clone())),
            None => Err(HostError::PathNotFound(path.clone())),
        }
    }
}
