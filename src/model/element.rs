//! The core unit of the source model: [`Element`].
//!
//! Every parser (script, web-script, markup) emits a tree of `Element`s. The
//! shape is deliberately uniform across languages so that the enricher, index,
//! alias resolver, and call graph builder can stay language-agnostic.

use crate::model::span::Span;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of an [`Element`]. Kept flat (no nested enums) so it serializes
/// to a single snake_case string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Import,
    Function,
    Class,
    ClassVariable,
    VariableDefinition,
    StatementBlock,
    CommentBlock,
    DomElementDefinition,
    EventListener,
    UiElement,
    GenericBlock,
    Error,
}

/// Metadata is kind-specific and free-form; we keep it as a string-keyed map
/// rather than one struct-per-kind so the wire shape matches `spec.md` §3
/// exactly (callers read whichever keys their kind defines).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A single syntactic unit extracted from a source file.
///
/// `stable_id` is content-addressed (see [`crate::core::ids`]) so that two
/// parses of byte-identical content produce the same id, independent of
/// surrounding whitespace elsewhere in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub stable_id: String,
    pub kind: ElementKind,
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// `stable_id` of the syntactic parent, if any.
    pub parent: Option<String>,
    /// `stable_id`s of direct children, in source order.
    #[serde(default)]
    pub children: Vec<String>,
}

impl Element {
    /// Truncate `name` to 80 characters with a `...` ellipsis, matching the
    /// convention the original prototype applies uniformly to element names.
    pub fn truncate_name(name: &str) -> String {
        const MAX: usize = 80;
        if name.chars().count() <= MAX {
            return name.to_string();
        }
        let truncated: String = name.chars().take(MAX.saturating_sub(3)).collect();
        format!("{truncated}...")
    }

    pub fn span(&self) -> Span {
        Span::new(self.start_line, self.end_line, 0, 0)
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_name_leaves_short_names_alone() {
        assert_eq!(Element::truncate_name("handle_click"), "handle_click");
    }

    #[test]
    fn truncate_name_ellipsizes_long_names() {
        let long = "a".repeat(120);
        let truncated = Element::truncate_name(&long);
        assert_eq!(truncated.chars().count(), 80);
        assert!(truncated.ends_with("..."));
    }
}
