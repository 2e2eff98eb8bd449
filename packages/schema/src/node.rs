use crate::Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Rich-text document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Block or inline container (paragraph, table, list, ...)
    Element(Element),

    /// Leaf text run
    Text(Text),
}

/// Container node. `kind` is the block type ("paragraph", "table", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: String,

    pub children: Vec<Node>,

    /// Content hash stamped by the producer (see [`NodeMeta`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<u64>,

    /// Streaming-complete flag
    #[serde(default, rename = "finished", skip_serializing_if = "is_false")]
    pub settled: bool,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

/// Text leaf with formatting marks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    #[serde(rename = "text")]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<u64>,

    #[serde(default, rename = "finished", skip_serializing_if = "is_false")]
    pub settled: bool,

    #[serde(flatten)]
    pub marks: BTreeMap<String, Mark>,
}

/// Formatting mark value: either a toggle (`bold: true`) or a label (`url: "..."`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mark {
    Flag(bool),
    Label(String),
}

impl From<Mark> for Value {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::Flag(flag) => Value::Bool(flag),
            Mark::Label(label) => Value::String(label),
        }
    }
}

impl TryFrom<&Value> for Mark {
    type Error = ();

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(flag) => Ok(Mark::Flag(*flag)),
            Value::String(label) => Ok(Mark::Label(label.clone())),
            _ => Err(()),
        }
    }
}

/// Settled-content metadata shared by both node variants.
///
/// Two nodes with equal hashes that are both settled are treated as equal
/// without looking at their content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<u64>,

    #[serde(default, rename = "finished")]
    pub settled: bool,
}

impl NodeMeta {
    /// True when both sides are settled and carry the same hash
    pub fn short_circuits(&self, other: &NodeMeta) -> bool {
        self.settled && other.settled && self.hash.is_some() && self.hash == other.hash
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Element {
    pub fn meta(&self) -> NodeMeta {
        NodeMeta {
            hash: self.hash,
            settled: self.settled,
        }
    }
}

impl Text {
    pub fn meta(&self) -> NodeMeta {
        NodeMeta {
            hash: self.hash,
            settled: self.settled,
        }
    }
}

impl Node {
    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(Element {
            kind: kind.into(),
            children,
            hash: None,
            settled: false,
            attributes: BTreeMap::new(),
        })
    }

    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(Text {
            content: content.into(),
            hash: None,
            settled: false,
            marks: BTreeMap::new(),
        })
    }

    /// Paragraph with a single unmarked text run
    pub fn paragraph(content: impl Into<String>) -> Self {
        Node::element("paragraph", vec![Node::text(content)])
    }

    /// The canonical empty block: a paragraph holding one empty text leaf
    pub fn placeholder() -> Self {
        Node::paragraph("")
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Node::Element(ref mut element) = self {
            element.attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_mark(mut self, key: impl Into<String>, mark: Mark) -> Self {
        if let Node::Text(ref mut text) = self {
            text.marks.insert(key.into(), mark);
        }
        self
    }

    pub fn with_meta(mut self, meta: NodeMeta) -> Self {
        self.set_meta(meta);
        self
    }

    /// Stamp the node with its own content hash and mark it settled
    pub fn sealed(self) -> Self {
        let hash = self.content_hash();
        self.with_meta(NodeMeta {
            hash: Some(hash),
            settled: true,
        })
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Node::Element(element) => Some(element.kind.as_str()),
            Node::Text(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// Children of an element, empty for text leaves
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    pub fn meta(&self) -> NodeMeta {
        match self {
            Node::Element(element) => element.meta(),
            Node::Text(text) => text.meta(),
        }
    }

    pub fn set_meta(&mut self, meta: NodeMeta) {
        match self {
            Node::Element(element) => {
                element.hash = meta.hash;
                element.settled = meta.settled;
            }
            Node::Text(text) => {
                text.hash = meta.hash;
                text.settled = meta.settled;
            }
        }
    }

    /// Concatenated text of every leaf below this node
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&text.content),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// An unmarked text leaf with no content
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.content.is_empty() && text.marks.is_empty())
    }

    /// Structural hash over kind, attributes, marks and children.
    ///
    /// Metadata is excluded. The value is only stable within one build of
    /// the program; it is never persisted.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_content(&mut hasher);
        hasher.finish()
    }

    fn hash_content<H: Hasher>(&self, state: &mut H) {
        match self {
            Node::Element(element) => {
                0u8.hash(state);
                element.kind.hash(state);
                for (key, value) in &element.attributes {
                    key.hash(state);
                    value.to_string().hash(state);
                }
                element.children.len().hash(state);
                for child in &element.children {
                    child.hash_content(state);
                }
            }
            Node::Text(text) => {
                1u8.hash(state);
                text.content.hash(state);
                for (key, mark) in &text.marks {
                    key.hash(state);
                    mark.hash(state);
                }
            }
        }
    }
}

/// Look up the node at `path` inside a forest
pub fn find<'a>(nodes: &'a [Node], path: &Path) -> Option<&'a Node> {
    let (first, rest) = path.as_slice().split_first()?;
    let mut node = nodes.get(*first)?;
    for index in rest {
        node = node.children().get(*index)?;
    }
    Some(node)
}

pub fn find_mut<'a>(nodes: &'a mut [Node], path: &Path) -> Option<&'a mut Node> {
    let (first, rest) = path.as_slice().split_first()?;
    let mut node = nodes.get_mut(*first)?;
    for index in rest {
        node = match node {
            Node::Element(element) => element.children.get_mut(*index)?,
            Node::Text(_) => return None,
        };
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_element_json_shape() {
        let node = Node::paragraph("hello").with_attr("align", "center");
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(
            value,
            json!({ "type": "paragraph", "align": "center", "children": [{ "text": "hello" }] })
        );
    }

    #[test]
    fn test_text_marks_deserialize() {
        let node: Node =
            serde_json::from_value(json!({ "text": "bold", "bold": true, "url": "https://x" }))
                .unwrap();

        let text = node.as_text().expect("Expected text leaf");
        assert_eq!(text.content, "bold");
        assert_eq!(text.marks.get("bold"), Some(&Mark::Flag(true)));
        assert_eq!(text.marks.get("url"), Some(&Mark::Label("https://x".to_string())));
    }

    #[test]
    fn test_meta_fields_not_captured_as_attributes() {
        let node: Node = serde_json::from_value(json!({
            "type": "paragraph",
            "hash": 42,
            "finished": true,
            "children": [{ "text": "a" }]
        }))
        .unwrap();

        let element = node.as_element().unwrap();
        assert!(element.attributes.is_empty());
        assert_eq!(node.meta(), NodeMeta { hash: Some(42), settled: true });
    }

    #[test]
    fn test_content_hash_ignores_meta() {
        let plain = Node::paragraph("same");
        let sealed = Node::paragraph("same").sealed();

        assert_eq!(plain.content_hash(), sealed.content_hash());
        assert_ne!(plain.content_hash(), Node::paragraph("other").content_hash());
        assert!(sealed.meta().settled);
    }

    #[test]
    fn test_find_nested() {
        let nodes = vec![
            Node::paragraph("a"),
            Node::element("list", vec![Node::element("list-item", vec![Node::text("b")])]),
        ];

        let leaf = find(&nodes, &Path::from(vec![1, 0, 0])).unwrap();
        assert_eq!(leaf.as_text().unwrap().content, "b");
        assert!(find(&nodes, &Path::from(vec![1, 0, 0, 0])).is_none());
        assert!(find(&nodes, &Path::root()).is_none());
    }
}
