use quill_schema::Node;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed markdown: {0}")]
    Syntax(String),

    #[error("Cannot serialize node of type '{0}'")]
    Unsupported(String),
}

/// Markdown → top-level blocks
pub trait MarkdownParser {
    fn parse(&self, source: &str) -> Result<Vec<Node>, ParseError>;
}

/// Top-level blocks → Markdown
pub trait MarkdownSerializer {
    fn serialize(&self, nodes: &[Node]) -> Result<String, ParseError>;
}
