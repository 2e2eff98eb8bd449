pub mod apply;
pub mod diff;
pub mod split;

pub use apply::{apply, ApplyArgs};
pub use diff::{diff, DiffArgs};
pub use split::{split, SplitArgs};

use anyhow::{Context, Result};
use quill_ingest::{CommonMarkCodec, MarkdownParser};
use quill_schema::Node;
use std::path::Path;

/// Read a document: `.json` files hold a node array, anything else is Markdown
pub fn load_document(path: &Path) -> Result<Vec<Node>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    parse_document(path, &source)
}

pub fn parse_document(path: &Path, source: &str) -> Result<Vec<Node>> {
    if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        return serde_json::from_str(source)
            .with_context(|| format!("{} is not a node array", path.display()));
    }
    CommonMarkCodec::default()
        .parse(source)
        .with_context(|| format!("Cannot parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_and_markdown_inputs() {
        let json = parse_document(
            Path::new("doc.json"),
            r#"[{ "type": "paragraph", "children": [{ "text": "hi" }] }]"#,
        )
        .unwrap();
        let markdown = parse_document(Path::new("doc.md"), "hi").unwrap();
        assert_eq!(json, markdown);
    }

    #[test]
    fn test_bad_json_reports_file() {
        let err = parse_document(Path::new("broken.json"), "{").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
