//! # Text Search
//!
//! Literal search and replace over the text-leaf layer. Matching never
//! crosses a leaf boundary: a word split across two differently marked runs
//! is not found.
//!
//! The search string is always escaped, so it is matched literally even when
//! it contains regex syntax. `whole_word` wraps it in `\b` boundaries and the
//! replacement is inserted verbatim (`$1` is not expanded).

use crate::HostEditor;
use quill_schema::{Node, Path, Selection};
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    /// When false, only the first occurrence in the first matching leaf is replaced
    pub replace_all: bool,
    /// Restrict to leaves intersecting this selection
    pub scope: Option<Selection>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_word: false,
            replace_all: true,
            scope: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub max_results: usize,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_word: false,
            max_results: 100,
        }
    }
}

/// One occurrence inside a text leaf. `start..end` is a byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub path: Path,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

pub struct TextSearchEngine;

impl TextSearchEngine {
    /// Replace occurrences of `search`, returning how many were replaced
    pub fn replace<H: HostEditor + ?Sized>(
        host: &mut H,
        search: &str,
        replacement: &str,
        options: &SearchOptions,
    ) -> usize {
        if search.is_empty() {
            return 0;
        }
        if let Some(scope) = &options.scope {
            if host.selection_is_collapsed(scope) {
                return 0;
            }
        }

        let Some(pattern) = build_pattern(search, options.case_sensitive, options.whole_word) else {
            return 0;
        };

        let mut leaves = Vec::new();
        collect_leaves(host.children(), &Path::root(), &mut leaves);
        if let Some(scope) = &options.scope {
            leaves.retain(|(path, _)| scope.intersects(path));
        }

        let mut count = 0;
        for (path, content) in leaves {
            if options.replace_all {
                let found = pattern.find_iter(&content).count();
                if found == 0 {
                    continue;
                }
                let updated = pattern.replace_all(&content, NoExpand(replacement));
                match host.set_text(&path, &updated) {
                    Ok(()) => count += found,
                    Err(err) => warn!(%path, %err, "Replace failed for leaf"),
                }
            } else if pattern.is_match(&content) {
                let updated = pattern.replace(&content, NoExpand(replacement));
                return match host.set_text(&path, &updated) {
                    Ok(()) => 1,
                    Err(err) => {
                        warn!(%path, %err, "Replace failed for leaf");
                        0
                    }
                };
            }
        }

        debug!(search, count, "Replace complete");
        count
    }

    /// Find occurrences in the subtree at `root` (the whole document for the root path)
    pub fn find<H: HostEditor + ?Sized>(
        host: &H,
        root: &Path,
        search: &str,
        options: &FindOptions,
    ) -> Vec<SearchMatch> {
        if search.trim().is_empty() || options.max_results == 0 {
            return Vec::new();
        }
        let Some(pattern) = build_pattern(search, options.case_sensitive, options.whole_word) else {
            return Vec::new();
        };

        let mut leaves = Vec::new();
        if root.is_root() {
            collect_leaves(host.children(), root, &mut leaves);
        } else if let Some(node) = host.node_at(root) {
            collect_leaf(node, root.clone(), &mut leaves);
        }

        let mut matches = Vec::new();
        for (path, content) in leaves {
            for found in pattern.find_iter(&content) {
                matches.push(SearchMatch {
                    path: path.clone(),
                    start: found.start(),
                    end: found.end(),
                    text: found.as_str().to_string(),
                });
                if matches.len() >= options.max_results {
                    return matches;
                }
            }
        }
        matches
    }
}

fn build_pattern(search: &str, case_sensitive: bool, whole_word: bool) -> Option<Regex> {
    let escaped = regex::escape(search);
    let source = if whole_word {
        format!(r"\b{}\b", escaped)
    } else {
        escaped
    };

    match RegexBuilder::new(&source)
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            warn!(%err, "Search pattern rejected");
            None
        }
    }
}

/// Text leaves in document order, with their contents
fn collect_leaves(nodes: &[Node], parent: &Path, out: &mut Vec<(Path, String)>) {
    for (index, node) in nodes.iter().enumerate() {
        collect_leaf(node, parent.child(index), out);
    }
}

fn collect_leaf(node: &Node, path: Path, out: &mut Vec<(Path, String)>) {
    match node {
        Node::Text(text) => out.push((path, text.content.clone())),
        Node::Element(element) => collect_leaves(&element.children, &path, out),
    }
}
