//! L2c Markup Parser: HTML-like templates.
//!
//! Only elements that actually matter for interaction or text content
//! qualify as a `ui_element` (`spec.md` §4.4): interactive controls, text-
//! bearing headings/labels/paragraphs, and `div` containers with a child or
//! text of their own. Everything else (`html`, `head`, `body`, a bare `span`
//! with no `onclick`, …) produces no element of its own — its qualifying
//! descendants are simply reparented to the nearest qualifying ancestor.

use crate::languages::common::{IdGen, collapse_whitespace, line_span, node_text};
use crate::model::element::{Element, ElementKind, Metadata};
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

pub struct MarkupParseResult {
    pub roots: Vec<String>,
    pub elements: HashMap<String, Element>,
}

pub fn parse(content: &str) -> Result<MarkupParseResult> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_html::LANGUAGE.into())
        .map_err(|e| anyhow!("failed to load html grammar: {e}"))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| anyhow!("tree-sitter failed to produce a tree"))?;

    let mut ids = IdGen::default();
    let mut elements = HashMap::new();
    let roots = walk_siblings(content, tree.root_node(), None, &mut ids, &mut elements);
    Ok(MarkupParseResult { roots, elements })
}

fn walk_siblings(
    src: &str,
    parent_node: Node,
    parent_id: Option<&str>,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> Vec<String> {
    let mut roots = Vec::new();
    let mut cursor = parent_node.walk();
    for child in parent_node.children(&mut cursor) {
        match child.kind() {
            "element" | "script_element" | "style_element" => match extract_element(src, child, parent_id, ids, out) {
                Some(id) => roots.push(id),
                None => roots.extend(walk_siblings(src, child, parent_id, ids, out)),
            },
            "comment" => roots.push(extract_comment(src, child, parent_id, ids, out)),
            _ => {}
        }
    }
    roots
}

/// Returns `None` when the tag does not qualify (`spec.md` §4.4); the caller
/// then recurses into its children without inserting an element for it.
fn extract_element(
    src: &str,
    node: Node,
    parent: Option<&str>,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> Option<String> {
    let start_tag = node.child(0).filter(|n| n.kind() == "start_tag" || n.kind() == "self_closing_tag");
    let tag_name = start_tag
        .and_then(|t| t.child_by_field_name("name"))
        .map(|n| node_text(src, n).to_string())
        .unwrap_or_else(|| node.kind().trim_end_matches("_element").to_string());

    let attributes = start_tag.map(|t| collect_attributes(src, t)).unwrap_or_default();
    let display_text = display_text_for(src, node);

    if !qualifies(&tag_name, &attributes, &display_text, node) {
        return None;
    }

    let (start_line, end_line) = line_span(&node);
    let content = node_text(src, node).to_string();
    let id_attr = attributes.get("id").cloned();
    let name = build_name(&tag_name, id_attr.as_deref(), &display_text, start_line);

    let mut metadata = Metadata::new();
    metadata.insert("tag".to_string(), serde_json::json!(tag_name));
    if let Some(id) = &id_attr {
        metadata.insert("id".to_string(), serde_json::json!(id));
    }
    if let Some(class) = attributes.get("class") {
        let classes: Vec<&str> = class.split_whitespace().collect();
        if !classes.is_empty() {
            metadata.insert("classes".to_string(), serde_json::json!(classes));
        }
    }
    if let Some(onclick) = attributes.get("onclick") {
        metadata.insert("onclick".to_string(), serde_json::json!(onclick));
    }
    if tag_name == "a" {
        if let Some(href) = attributes.get("href") {
            metadata.insert("href".to_string(), serde_json::json!(href));
        }
    }
    if tag_name == "input" {
        if let Some(t) = attributes.get("type") {
            metadata.insert("type".to_string(), serde_json::json!(t));
        }
        if let Some(v) = attributes.get("value") {
            metadata.insert("value".to_string(), serde_json::json!(v));
        }
    }
    if tag_name == "label" {
        if let Some(f) = attributes.get("for") {
            metadata.insert("for".to_string(), serde_json::json!(f));
        }
    }

    let id = ids.next();
    let children = walk_siblings(src, node, Some(&id), ids, out);

    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::UiElement,
            name: Element::truncate_name(&name),
            start_line,
            end_line,
            content,
            metadata,
            parent: parent.map(str::to_string),
            children,
        },
    );
    Some(id)
}

fn qualifies(tag: &str, attrs: &HashMap<String, String>, display_text: &str, node: Node) -> bool {
    if attrs.contains_key("onclick") {
        return true;
    }
    match tag {
        "button" | "select" | "textarea" => true,
        "input" => !attrs.get("type").map(|t| t.eq_ignore_ascii_case("hidden")).unwrap_or(false),
        "a" => match attrs.get("href") {
            Some(href) => href.is_empty() || href == "#" || href.starts_with("javascript:"),
            None => true,
        },
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "label" | "p" => !display_text.is_empty(),
        "div" => has_child_element(node) || !display_text.is_empty(),
        _ => false,
    }
}

fn has_child_element(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| matches!(c.kind(), "element" | "script_element" | "style_element"))
}

fn build_name(tag: &str, id: Option<&str>, display_text: &str, start_line: usize) -> String {
    let mut parts = vec![tag.to_string()];
    if let Some(id) = id {
        parts.push(format!("id='{id}'"));
    }
    if !display_text.is_empty() {
        parts.push(format!("'{display_text}'"));
    }
    parts.push(format!("(L{start_line})"));
    parts.join(" ")
}

fn collect_attributes(src: &str, start_tag: Node) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let mut cursor = start_tag.walk();
    for child in start_tag.children(&mut cursor) {
        if child.kind() != "attribute" {
            continue;
        }
        let mut acursor = child.walk();
        let mut key = None;
        let mut value = None;
        for part in child.children(&mut acursor) {
            match part.kind() {
                "attribute_name" => key = Some(node_text(src, part).to_string()),
                "quoted_attribute_value" | "attribute_value" => {
                    value = Some(node_text(src, part).trim_matches(['"', '\'']).to_string())
                }
                _ => {}
            }
        }
        if let Some(key) = key {
            attrs.insert(key, value.unwrap_or_default());
        }
    }
    attrs
}

/// First 40 characters of the element's direct text content, ellipsized if
/// truncated (`spec.md` §4.4).
fn display_text_for(src: &str, node: Node) -> String {
    let mut cursor = node.walk();
    let mut text = String::new();
    for child in node.children(&mut cursor) {
        if child.kind() == "text" {
            text.push_str(node_text(src, child));
            text.push(' ');
        }
    }
    let collapsed = collapse_whitespace(&text);
    if collapsed.chars().count() > 40 {
        let truncated: String = collapsed.chars().take(40).collect();
        format!("{truncated}...")
    } else {
        collapsed
    }
}

fn extract_comment(
    src: &str,
    node: Node,
    parent: Option<&str>,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> String {
    let (start_line, end_line) = line_span(&node);
    let content = node_text(src, node).to_string();
    let id = ids.next();
    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::CommentBlock,
            name: content.lines().next().unwrap_or("").trim().to_string(),
            start_line,
            end_line,
            content,
            metadata: Metadata::new(),
            parent: parent.map(str::to_string),
            children: vec![],
        },
    );
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_with_id_and_onclick_qualify() {
        let src = "<div><button id=\"x\" onclick=\"go()\">Go</button></div>";
        let result = parse(src).expect("parse");
        let all: Vec<&Element> = result.elements.values().collect();
        let button = all.iter().find(|e| e.metadata_str("tag") == Some("button")).expect("button");
        assert_eq!(button.kind, ElementKind::UiElement);
        assert!(button.name.contains("button"));
        assert!(button.name.contains("id='x'"));
        assert!(button.name.contains("'Go'"));
        assert!(button.name.contains("(L1)"));
        assert_eq!(button.metadata_str("onclick"), Some("go()"));

        let div = all.iter().find(|e| e.metadata_str("tag") == Some("div")).expect("div");
        assert_eq!(div.kind, ElementKind::UiElement);
        assert_eq!(div.children.len(), 1);
    }

    #[test]
    fn span_without_onclick_does_not_qualify() {
        let src = "<div><span>hi</span><button onclick=\"x()\">Go</button></div>";
        let result = parse(src).expect("parse");
        assert!(result.elements.values().all(|e| e.metadata_str("tag") != Some("span")));
        let button = result.elements.values().find(|e| e.metadata_str("tag") == Some("button")).expect("button");
        // span produced no element, so button reparents directly under div
        assert_eq!(button.parent.as_deref().and_then(|p| result.elements.get(p)).and_then(|e| e.metadata_str("tag")), Some("div"));
    }

    #[test]
    fn empty_paragraph_does_not_qualify() {
        let src = "<div><p>   </p></div>";
        let result = parse(src).expect("parse");
        assert!(result.elements.values().all(|e| e.metadata_str("tag") != Some("p")));
    }

    #[test]
    fn hidden_input_does_not_qualify_visible_one_does() {
        let src = "<form><input type=\"hidden\" name=\"csrf\"><input type=\"text\" name=\"q\"></form>";
        let result = parse(src).expect("parse");
        let inputs: Vec<&Element> = result.elements.values().filter(|e| e.metadata_str("tag") == Some("input")).collect();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].metadata_str("type"), Some("text"));
    }

    #[test]
    fn anchor_qualifies_only_for_empty_hash_or_js_href() {
        let src = "<div><a href=\"/page\">real</a><a href=\"#\">anchor</a><a href=\"javascript:void(0)\">js</a></div>";
        let result = parse(src).expect("parse");
        let anchors: Vec<&Element> = result.elements.values().filter(|e| e.metadata_str("tag") == Some("a")).collect();
        assert_eq!(anchors.len(), 2);
    }
}
