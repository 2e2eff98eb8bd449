//! # CommonMark Codec
//!
//! `pulldown-cmark` backed [`MarkdownParser`] and [`MarkdownSerializer`].
//!
//! ## Node Mapping
//!
//! ```text
//! paragraph            → paragraph
//! # .. ######          → heading { level }
//! > ..                 → blockquote
//! ``` / ~~~ / indented → code { language? }
//! - / 1.               → list { ordered, start? } > list-item { checked? }
//! | a | b |            → table > table-row { header? } > table-cell { align? }
//! ---                  → thematic-break
//! ![alt](src)          → image { src, alt, title? }
//! **b** *i* `c` ~~s~~  → text marks bold / italic / code / strikethrough
//! [text](url)          → text mark url
//! ```
//!
//! Every element the parser produces has at least one child; containers
//! that would otherwise be empty get a single empty text leaf.

use crate::parser::{MarkdownParser, MarkdownSerializer, ParseError};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag};
use quill_schema::{Element, Mark, Node, Text, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct CommonMarkCodec {
    options: Options,
}

impl Default for CommonMarkCodec {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        }
    }
}

impl MarkdownParser for CommonMarkCodec {
    fn parse(&self, source: &str) -> Result<Vec<Node>, ParseError> {
        let mut builder = TreeBuilder::default();
        for event in Parser::new_ext(source, self.options) {
            builder.event(event)?;
        }
        builder.finish()
    }
}

impl MarkdownSerializer for CommonMarkCodec {
    fn serialize(&self, nodes: &[Node]) -> Result<String, ParseError> {
        let blocks = nodes.iter().map(block).collect::<Result<Vec<_>, _>>()?;
        Ok(blocks.join("\n\n"))
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────

/// One open tag
enum Frame {
    Element(Element),
    Code { language: Option<String>, body: String },
    Mark(&'static str),
    Link(String),
    Image { src: String, title: String, alt: String },
    Skip,
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    roots: Vec<Node>,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

fn open(kind: &str) -> Frame {
    Frame::Element(Element {
        kind: kind.to_string(),
        children: Vec::new(),
        hash: None,
        settled: false,
        attributes: BTreeMap::new(),
    })
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) -> Result<(), ParseError> {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => return self.end(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.leaf(&code, Some("code")),
            Event::Html(html) | Event::InlineHtml(html) => self.leaf(&html, None),
            Event::SoftBreak | Event::HardBreak => self.text("\n"),
            Event::Rule => self.attach(Node::element("thematic-break", vec![Node::text("")])),
            Event::TaskListMarker(checked) => {
                if let Some(item) = self.innermost_element() {
                    item.attributes.insert("checked".to_string(), Value::Bool(checked));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => open("paragraph"),
            Tag::Heading { level, .. } => with_attr(open("heading"), "level", Value::from(level as u8)),
            Tag::BlockQuote(_) => open("blockquote"),
            Tag::CodeBlock(kind) => Frame::Code {
                language: match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                },
                body: String::new(),
            },
            Tag::HtmlBlock => open("html"),
            Tag::List(start) => {
                let list = with_attr(open("list"), "ordered", Value::Bool(start.is_some()));
                match start {
                    Some(start) => with_attr(list, "start", Value::from(start)),
                    None => list,
                }
            }
            Tag::Item => open("list-item"),
            Tag::Table(alignments) => {
                self.alignments = alignments;
                open("table")
            }
            Tag::TableHead => {
                self.cell_index = 0;
                with_attr(open("table-row"), "header", Value::Bool(true))
            }
            Tag::TableRow => {
                self.cell_index = 0;
                open("table-row")
            }
            Tag::TableCell => {
                let align = self.alignments.get(self.cell_index).and_then(|align| match align {
                    Alignment::Left => Some("left"),
                    Alignment::Center => Some("center"),
                    Alignment::Right => Some("right"),
                    Alignment::None => None,
                });
                self.cell_index += 1;
                match align {
                    Some(align) => with_attr(open("table-cell"), "align", Value::from(align)),
                    None => open("table-cell"),
                }
            }
            Tag::Emphasis => Frame::Mark("italic"),
            Tag::Strong => Frame::Mark("bold"),
            Tag::Strikethrough => Frame::Mark("strikethrough"),
            Tag::Link { dest_url, .. } => Frame::Link(dest_url.to_string()),
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                src: dest_url.to_string(),
                title: title.to_string(),
                alt: String::new(),
            },
            _ => Frame::Skip,
        };
        self.stack.push(frame);
    }

    fn end(&mut self) -> Result<(), ParseError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| ParseError::Syntax("closing tag without an opening tag".to_string()))?;

        match frame {
            Frame::Element(mut element) => {
                if element.children.is_empty() {
                    element.children.push(Node::text(""));
                }
                self.attach(Node::Element(element));
            }
            Frame::Code { language, mut body } => {
                if body.ends_with('\n') {
                    body.pop();
                }
                let code = Node::element("code", vec![Node::text(body)]);
                self.attach(match language {
                    Some(language) => code.with_attr("language", language),
                    None => code,
                });
            }
            Frame::Image { src, title, alt } => {
                let mut image = Node::element("image", vec![Node::text("")])
                    .with_attr("src", src)
                    .with_attr("alt", alt);
                if !title.is_empty() {
                    image = image.with_attr("title", title);
                }
                self.attach(image);
            }
            Frame::Mark(_) | Frame::Link(_) | Frame::Skip => {}
        }
        Ok(())
    }

    fn text(&mut self, content: &str) {
        match self.stack.last_mut() {
            Some(Frame::Code { body, .. }) => body.push_str(content),
            Some(Frame::Image { alt, .. }) => alt.push_str(content),
            _ => self.leaf(content, None),
        }
    }

    /// Append a text run carrying the currently open marks
    fn leaf(&mut self, content: &str, extra: Option<&'static str>) {
        let mut marks = BTreeMap::new();
        for frame in &self.stack {
            match frame {
                Frame::Mark(key) => {
                    marks.insert(key.to_string(), Mark::Flag(true));
                }
                Frame::Link(url) => {
                    marks.insert("url".to_string(), Mark::Label(url.clone()));
                }
                _ => {}
            }
        }
        if let Some(key) = extra {
            marks.insert(key.to_string(), Mark::Flag(true));
        }

        if let Some(parent) = self.innermost_element() {
            if let Some(Node::Text(last)) = parent.children.last_mut() {
                if last.marks == marks {
                    last.content.push_str(content);
                    return;
                }
            }
        }

        self.attach(Node::Text(Text {
            content: content.to_string(),
            hash: None,
            settled: false,
            marks,
        }));
    }

    fn innermost_element(&mut self) -> Option<&mut Element> {
        self.stack.iter_mut().rev().find_map(|frame| match frame {
            Frame::Element(element) => Some(element),
            _ => None,
        })
    }

    fn attach(&mut self, node: Node) {
        match self.innermost_element() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn finish(self) -> Result<Vec<Node>, ParseError> {
        if !self.stack.is_empty() {
            return Err(ParseError::Syntax(format!(
                "{} tag(s) left open at end of input",
                self.stack.len()
            )));
        }
        Ok(self.roots)
    }
}

fn with_attr(frame: Frame, key: &str, value: Value) -> Frame {
    match frame {
        Frame::Element(mut element) => {
            element.attributes.insert(key.to_string(), value);
            Frame::Element(element)
        }
        other => other,
    }
}

// ── Serialization ───────────────────────────────────────────────────────

fn block(node: &Node) -> Result<String, ParseError> {
    let element = match node {
        Node::Text(text) => return Ok(inline_text(text)),
        Node::Element(element) => element,
    };

    let out = match element.kind.as_str() {
        "paragraph" | "p" => inline(&element.children),
        "heading" => {
            let level = attr_u64(element, "level").unwrap_or(1).clamp(1, 6) as usize;
            format!("{} {}", "#".repeat(level), inline(&element.children))
        }
        "blockquote" => {
            let inner = element
                .children
                .iter()
                .map(block)
                .collect::<Result<Vec<_>, _>>()?
                .join("\n\n");
            inner
                .lines()
                .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {}", line) })
                .collect::<Vec<_>>()
                .join("\n")
        }
        "code" => {
            let body = node.text_content();
            let fence = if body.contains("```") { "~~~~" } else { "```" };
            let language = element
                .attributes
                .get("language")
                .and_then(Value::as_str)
                .unwrap_or("");
            format!("{}{}\n{}\n{}", fence, language, body, fence)
        }
        "list" => list(element)?,
        "list-item" | "listItem" => item("- ", element)?,
        "table" => table(element),
        "thematic-break" => "---".to_string(),
        "image" => image(element),
        "html" => node.text_content(),
        other => return Err(ParseError::Unsupported(other.to_string())),
    };
    Ok(out)
}

fn list(element: &Element) -> Result<String, ParseError> {
    let ordered = element
        .attributes
        .get("ordered")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let start = attr_u64(element, "start").unwrap_or(1);

    let mut lines = Vec::with_capacity(element.children.len());
    for (i, child) in element.children.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", start + i as u64)
        } else {
            "- ".to_string()
        };
        match child {
            Node::Element(child) => lines.push(item(&marker, child)?),
            Node::Text(text) => lines.push(format!("{}{}", marker, inline_text(text))),
        }
    }
    Ok(lines.join("\n"))
}

fn item(marker: &str, element: &Element) -> Result<String, ParseError> {
    let task = match element.attributes.get("checked").and_then(Value::as_bool) {
        Some(true) => "[x] ",
        Some(false) => "[ ] ",
        None => "",
    };

    let body = if element.children.iter().all(is_inline) {
        inline(&element.children)
    } else {
        element
            .children
            .iter()
            .map(|child| if is_inline(child) { Ok(inline(std::slice::from_ref(child))) } else { block(child) })
            .collect::<Result<Vec<_>, _>>()?
            .join("\n")
    };

    let indent = " ".repeat(marker.len());
    let mut out = format!("{}{}", marker, task);
    for (i, line) in body.lines().enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        }
        out.push_str(line);
    }
    Ok(out)
}

fn table(element: &Element) -> String {
    let rows: Vec<Vec<String>> = element
        .children
        .iter()
        .map(|row| {
            row.children()
                .iter()
                .map(|cell| inline(cell.children()).replace('|', "\\|"))
                .collect()
        })
        .collect();

    let Some(first) = element.children.first() else {
        return String::new();
    };
    let delimiter: Vec<&str> = first
        .children()
        .iter()
        .map(|cell| {
            let align = cell
                .as_element()
                .and_then(|cell| cell.attributes.get("align"))
                .and_then(Value::as_str);
            match align {
                Some("left") => ":---",
                Some("center") => ":---:",
                Some("right") => "---:",
                _ => "---",
            }
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, cells) in rows.iter().enumerate() {
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            lines.push(format!("| {} |", delimiter.join(" | ")));
        }
    }
    lines.join("\n")
}

fn image(element: &Element) -> String {
    let text = |key: &str| {
        element
            .attributes
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    let title = text("title");
    if title.is_empty() {
        format!("![{}]({})", text("alt"), text("src"))
    } else {
        format!("![{}]({} \"{}\")", text("alt"), text("src"), title)
    }
}

fn is_inline(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Element(element) => element.kind == "image",
    }
}

fn inline(children: &[Node]) -> String {
    let mut out = String::new();
    for child in children {
        match child {
            Node::Text(text) => out.push_str(&inline_text(text)),
            Node::Element(element) if element.kind == "image" => out.push_str(&image(element)),
            Node::Element(element) => out.push_str(&inline(&element.children)),
        }
    }
    out
}

fn inline_text(text: &Text) -> String {
    let flag = |key: &str| matches!(text.marks.get(key), Some(Mark::Flag(true)));

    let mut out = if flag("code") {
        format!("`{}`", text.content)
    } else {
        text.content.clone()
    };
    if flag("strikethrough") {
        out = format!("~~{}~~", out);
    }
    if flag("italic") {
        out = format!("*{}*", out);
    }
    if flag("bold") {
        out = format!("**{}**", out);
    }
    if let Some(Mark::Label(url)) = text.marks.get("url") {
        out = format!("[{}]({})", out, url);
    }
    out
}

fn attr_u64(element: &Element, key: &str) -> Option<u64> {
    element.attributes.get(key).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(source: &str) -> Vec<Node> {
        CommonMarkCodec::default().parse(source).unwrap()
    }

    fn serialize(nodes: &[Node]) -> String {
        CommonMarkCodec::default().serialize(nodes).unwrap()
    }

    #[test]
    fn test_heading_and_marked_paragraph() {
        let nodes = parse("# Title\n\nSome **bold** and *italic* text.");

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind(), Some("heading"));
        assert_eq!(
            nodes[0].as_element().unwrap().attributes.get("level"),
            Some(&json!(1))
        );

        let runs = nodes[1].children();
        assert_eq!(runs.len(), 5);
        assert_eq!(runs[1].as_text().unwrap().content, "bold");
        assert_eq!(runs[1].as_text().unwrap().marks.get("bold"), Some(&Mark::Flag(true)));
        assert_eq!(runs[3].as_text().unwrap().marks.get("italic"), Some(&Mark::Flag(true)));
    }

    #[test]
    fn test_fenced_code() {
        let nodes = parse("```rust\nfn main() {}\n```");
        let code = nodes[0].as_element().unwrap();
        assert_eq!(code.kind, "code");
        assert_eq!(code.attributes.get("language"), Some(&json!("rust")));
        assert_eq!(nodes[0].text_content(), "fn main() {}");
    }

    #[test]
    fn test_lists() {
        let nodes = parse("- one\n- two");
        let list = nodes[0].as_element().unwrap();
        assert_eq!(list.attributes.get("ordered"), Some(&json!(false)));
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.children[1].kind(), Some("list-item"));
        assert_eq!(list.children[1].text_content(), "two");

        let ordered = parse("3. a\n4. b");
        assert_eq!(
            ordered[0].as_element().unwrap().attributes.get("start"),
            Some(&json!(3))
        );
    }

    #[test]
    fn test_table_structure() {
        let nodes = parse("| a | b |\n| --- | :-: |\n| 1 | 2 |");
        let table = nodes[0].as_element().unwrap();
        assert_eq!(table.kind, "table");
        assert_eq!(table.children.len(), 2);

        let header = table.children[0].as_element().unwrap();
        assert_eq!(header.kind, "table-row");
        assert_eq!(header.attributes.get("header"), Some(&json!(true)));

        let body = &table.children[1];
        assert_eq!(body.children().len(), 2);
        assert_eq!(body.children()[1].text_content(), "2");
        assert_eq!(
            body.children()[1].as_element().unwrap().attributes.get("align"),
            Some(&json!("center"))
        );
    }

    #[test]
    fn test_link_mark() {
        let nodes = parse("[site](https://x.io)");
        let run = nodes[0].children()[0].as_text().unwrap();
        assert_eq!(run.content, "site");
        assert_eq!(run.marks.get("url"), Some(&Mark::Label("https://x.io".to_string())));
    }

    #[test]
    fn test_elements_never_empty() {
        let nodes = parse("---\n\n![logo](a.png)");
        assert_eq!(nodes[0].kind(), Some("thematic-break"));
        assert_eq!(nodes[0].children().len(), 1);

        let image = nodes[1].children()[0].as_element().unwrap();
        assert_eq!(image.kind, "image");
        assert_eq!(image.attributes.get("src"), Some(&json!("a.png")));
        assert_eq!(image.attributes.get("alt"), Some(&json!("logo")));
    }

    #[test]
    fn test_serialize_round_trips_simple_documents() {
        for source in [
            "# Title\n\nSome **bold** and *italic* text.",
            "```rust\nfn main() {}\n```",
            "- one\n- two",
            "1. a\n2. b",
            "[site](https://x.io) and `code`",
            "> quoted",
        ] {
            assert_eq!(serialize(&parse(source)), source);
        }
    }

    #[test]
    fn test_serialize_rejects_unknown_blocks() {
        let result = CommonMarkCodec::default().serialize(&[Node::element("chart", vec![Node::text("")])]);
        assert_eq!(result, Err(ParseError::Unsupported("chart".to_string())));
    }
}
