//! # Markdown Splitter
//!
//! Cuts oversized Markdown into chunks that can be parsed independently.
//!
//! ## Rules
//!
//! - Cut only at separator matches (blank lines by default).
//! - Never cut inside a fenced code region. A fence opens on a line whose
//!   first non-blank characters are three or more backticks or tildes, and
//!   closes on a line holding only the same character, repeated at least as
//!   many times. Indentation is ignored on both lines so fences nested in
//!   list items count too. An unclosed fence runs to the end of the text.
//! - Merge consecutive pieces while the merged chunk stays within
//!   `chunk_size` bytes. A single piece larger than that becomes its own
//!   chunk.
//! - Trim every chunk and drop the empty ones.

use regex::Regex;
use std::ops::Range;

#[derive(Debug, Clone)]
pub enum Separator {
    Literal(String),
    Pattern(Regex),
}

impl Default for Separator {
    fn default() -> Self {
        Separator::Literal("\n\n".to_string())
    }
}

impl From<&str> for Separator {
    fn from(literal: &str) -> Self {
        Separator::Literal(literal.to_string())
    }
}

impl From<Regex> for Separator {
    fn from(pattern: Regex) -> Self {
        Separator::Pattern(pattern)
    }
}

/// An opening or closing fence line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub marker: char,
    pub len: usize,
    /// Byte offset of the newline ending the fence line (or the text length)
    pub line_end: usize,
}

/// Every separator occurrence, in order. Zero-width matches are reported once
/// per position.
pub fn collect_separator_matches(text: &str, separator: &Separator) -> Vec<Range<usize>> {
    match separator {
        Separator::Literal(literal) if literal.is_empty() => Vec::new(),
        Separator::Literal(literal) => text
            .match_indices(literal.as_str())
            .map(|(start, found)| start..start + found.len())
            .collect(),
        Separator::Pattern(pattern) => pattern.find_iter(text).map(|found| found.range()).collect(),
    }
}

/// Fence opening at `line_start`, if the line is a fence line
pub fn match_fence(text: &str, line_start: usize) -> Option<Fence> {
    let line = &text[line_start..find_line_end(text, line_start)];

    let rest = line.trim_start_matches([' ', '\t']);
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.len() - rest.trim_start_matches(marker).len();
    if len < 3 {
        return None;
    }

    Some(Fence {
        marker,
        len,
        line_end: find_line_end(text, line_start),
    })
}

/// Offset of the next `\n` at or after `from`, or the text length
pub fn find_line_end(text: &str, from: usize) -> usize {
    text[from..]
        .find('\n')
        .map(|offset| from + offset)
        .unwrap_or(text.len())
}

/// Byte ranges covered by fenced code, fences included
pub fn fenced_regions(text: &str) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut open: Option<(Fence, usize)> = None;
    let mut pos = 0;

    while pos < text.len() {
        let line_end = find_line_end(text, pos);
        match open {
            None => {
                if let Some(fence) = match_fence(text, pos) {
                    open = Some((fence, pos));
                }
            }
            Some((opening, start)) => {
                if let Some(fence) = match_fence(text, pos) {
                    let only_marker = text[pos..line_end]
                        .trim()
                        .chars()
                        .all(|c| c == opening.marker);
                    if fence.marker == opening.marker && fence.len >= opening.len && only_marker {
                        regions.push(start..line_end);
                        open = None;
                    }
                }
            }
        }
        pos = line_end + 1;
    }

    if let Some((_, start)) = open {
        regions.push(start..text.len());
    }
    regions
}

fn inside_region(cut: &Range<usize>, regions: &[Range<usize>]) -> bool {
    regions.iter().any(|region| {
        if cut.is_empty() {
            region.start < cut.start && cut.start < region.end
        } else {
            cut.start < region.end && cut.end > region.start
        }
    })
}

/// Split `text` into fence-safe chunks of at most `chunk_size` bytes where possible
pub fn split_markdown(text: &str, separator: &Separator, chunk_size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let regions = fenced_regions(text);
    let cuts: Vec<_> = collect_separator_matches(text, separator)
        .into_iter()
        .filter(|cut| !inside_region(cut, &regions))
        .collect();

    // (separator text before the piece, piece)
    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut last = 0;
    let mut glue = "";
    for cut in cuts {
        if cut.start < last {
            continue;
        }
        pieces.push((glue, &text[last..cut.start]));
        glue = &text[cut.clone()];
        last = cut.end;
    }
    pieces.push((glue, &text[last..]));

    let mut chunks = Vec::new();
    let mut current = String::new();
    for (glue, piece) in pieces {
        if piece.trim().is_empty() {
            continue;
        }
        if !current.is_empty() && current.len() + glue.len() + piece.len() > chunk_size {
            flush(&mut current, &mut chunks);
        }
        if !current.is_empty() {
            current.push_str(glue);
        }
        current.push_str(piece);
    }
    flush(&mut current, &mut chunks);

    chunks
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_unmatched() {
        assert!(split_markdown("", &Separator::from("\n\n"), 10).is_empty());
        assert_eq!(split_markdown("abc", &Separator::from("---"), 1), vec!["abc"]);
    }

    #[test]
    fn test_zero_width_pattern_terminates() {
        let pattern = Regex::new("(?m)^").unwrap();
        let matches = collect_separator_matches("abc", &Separator::from(pattern.clone()));
        assert!(!matches.is_empty());
        assert!(matches[0].is_empty());

        let chunks = split_markdown("a\nb\nc", &Separator::from(pattern), 1);
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_literal_never_matches() {
        assert!(collect_separator_matches("abc", &Separator::from("")).is_empty());
    }

    #[test]
    fn test_match_fence() {
        let fence = match_fence("   ```js\nx", 0).unwrap();
        assert_eq!(fence.marker, '`');
        assert_eq!(fence.len, 3);
        assert_eq!(fence.line_end, 8);

        assert!(match_fence("   ", 0).is_none());
        assert!(match_fence("``\n", 0).is_none());
        assert_eq!(match_fence("    ```\n", 0).map(|f| f.len), Some(3));
        assert_eq!(match_fence("\t~~~\n", 0).map(|f| f.marker), Some('~'));
        assert_eq!(match_fence("x\n~~~~\n", 2).map(|f| (f.marker, f.len)), Some(('~', 4)));
    }

    #[test]
    fn test_find_line_end() {
        assert_eq!(find_line_end("line-without-newline", 0), 20);
        assert_eq!(find_line_end("ab\ncd", 0), 2);
        assert_eq!(find_line_end("ab\ncd", 3), 5);
    }

    #[test]
    fn test_fence_regions() {
        let text = "intro\n\n```\na\n\nb\n```\n\noutro";
        let regions = fenced_regions(text);
        assert_eq!(regions.len(), 1);
        assert_eq!(&text[regions[0].clone()], "```\na\n\nb\n```");
    }

    #[test]
    fn test_closing_fence_must_match() {
        let text = "````\n```\nstill code\n~~~~\n````\nafter";
        let regions = fenced_regions(text);
        assert_eq!(&text[regions[0].clone()], "````\n```\nstill code\n~~~~\n````");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let text = "a\n\n~~~\nx\n\ny";
        assert_eq!(fenced_regions(text), vec![3..text.len()]);
    }

    #[test]
    fn test_never_splits_inside_fence() {
        let text = "```js\nconsole.log(1);\n\nconsole.log(3);\n```\n\nend";
        let chunks = split_markdown(text, &Separator::default(), 1);
        assert_eq!(
            chunks,
            vec!["```js\nconsole.log(1);\n\nconsole.log(3);\n```", "end"]
        );
    }

    #[test]
    fn test_never_splits_fence_nested_in_list() {
        let text = "- a\n  - b\n\n    ```\n    x\n\n    y\n    ```\n\nend";
        let regions = fenced_regions(text);
        assert_eq!(&text[regions[0].clone()], "    ```\n    x\n\n    y\n    ```");

        let chunks = split_markdown(text, &Separator::default(), 1);
        assert_eq!(chunks, vec!["- a\n  - b", "```\n    x\n\n    y\n    ```", "end"]);
    }

    #[test]
    fn test_pieces_merge_up_to_chunk_size() {
        let text = "aaaa\n\nbbbb\n\ncccc\n\ndddd";
        let chunks = split_markdown(text, &Separator::default(), 10);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb", "cccc\n\ndddd"]);
    }

    #[test]
    fn test_blank_pieces_skipped() {
        let chunks = split_markdown("\n\n\n\na\n\n\n\n", &Separator::default(), 1);
        assert_eq!(chunks, vec!["a"]);
    }
}
