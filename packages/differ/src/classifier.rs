//! # Node Classifier
//!
//! Advisory filter applied to a target forest before diffing. Drops nodes
//! that would render as nothing: empty paragraphs and lists, code blocks
//! with malformed metadata and no body, media without a source.
//!
//! Only top-level nodes are judged. The classifier never mutates.

use quill_schema::{Element, Node, Value};

const PARAGRAPH_KINDS: &[&str] = &["p", "paragraph"];
const LIST_KINDS: &[&str] = &["list", "listItem", "list-item"];
const MEDIA_KINDS: &[&str] = &["image", "video", "audio", "media"];
const SOURCE_KEYS: &[&str] = &["src", "url"];

pub struct NodeClassifier;

impl NodeClassifier {
    pub fn is_valid(node: &Node) -> bool {
        let element = match node {
            Node::Element(element) => element,
            Node::Text(_) => return true,
        };

        let kind = element.kind.as_str();
        if PARAGRAPH_KINDS.contains(&kind) || LIST_KINDS.contains(&kind) {
            return !is_hollow(element) || !element.attributes.is_empty();
        }

        if kind == "code" {
            return !(has_malformed_code_meta(element) && body_is_empty(element));
        }

        if MEDIA_KINDS.contains(&kind) {
            return has_source(element);
        }

        true
    }

    /// Keep only the valid top-level nodes, preserving order
    pub fn filter(nodes: &[Node]) -> Vec<Node> {
        nodes
            .iter()
            .filter(|node| Self::is_valid(node))
            .cloned()
            .collect()
    }
}

/// No children, or a single empty text child
fn is_hollow(element: &Element) -> bool {
    match element.children.as_slice() {
        [] => true,
        [only] => only.is_empty_text(),
        _ => false,
    }
}

fn has_malformed_code_meta(element: &Element) -> bool {
    let bad_language = element
        .attributes
        .get("language")
        .map_or(false, |language| !language.is_string() && !language.is_null());
    let bad_props = element
        .attributes
        .get("otherProps")
        .map_or(false, |props| !props.is_object());
    bad_language || bad_props
}

fn body_is_empty(element: &Element) -> bool {
    element
        .children
        .iter()
        .all(|child| child.text_content().trim().is_empty())
}

fn has_source(element: &Element) -> bool {
    SOURCE_KEYS.iter().any(|key| match element.attributes.get(*key) {
        Some(Value::String(source)) => !source.trim().is_empty(),
        _ => false,
    })
}
