//! Small helpers shared by the script, web-script, and markup parsers.

use tree_sitter::Node;

/// Convert a tree-sitter node's 0-based row range into a 1-based inclusive
/// line span, matching `spec.md` §3's line numbering convention.
pub fn line_span(node: &Node) -> (usize, usize) {
    (
        node.start_position().row + 1,
        node.end_position().row + 1,
    )
}

/// Bounds-safe UTF-8 slice of `src` covered by `node`.
pub fn node_text<'a>(src: &'a str, node: Node) -> &'a str {
    let start = node.start_byte().min(src.len());
    let end = node.end_byte().min(src.len()).max(start);
    &src[start..end]
}

/// Generates unique, parser-local provisional ids. Replaced with final
/// content-addressed `stable_id`s by [`crate::core::enrich::enrich_file`].
#[derive(Default)]
pub struct IdGen(u64);

impl IdGen {
    pub fn next(&mut self) -> String {
        self.0 += 1;
        format!("tmp{}", self.0)
    }
}

/// Collapse runs of whitespace for stable, compact `name` fields (e.g. HTML
/// tag display text), without altering `content`.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Verbatim join of whole source lines `[start_line-1, end_line)`, matching
/// `spec.md` §4.5's content-consistency rule. Unlike [`node_text`], this
/// includes a statement's leading indentation and any other tokens sharing
/// its first/last line.
pub fn slice_lines(src: &str, start_line: usize, end_line: usize) -> String {
    src.lines()
        .skip(start_line.saturating_sub(1))
        .take(end_line.saturating_sub(start_line) + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A generic/unclassified statement's display kind: its tree-sitter node kind
/// with underscores rewritten to spaces, except `variable_declaration` which
/// keeps its underscore form.
pub fn normalized_node_kind(kind: &str) -> String {
    if kind == "variable_declaration" {
        return kind.to_string();
    }
    kind.replace('_', " ")
}
