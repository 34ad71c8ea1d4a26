//! L2a Script Parser: Python-like source files.
//!
//! Builds an [`Element`] tree via direct tree-sitter node walking (no `.scm`
//! queries), following the same `node.kind()` dispatch style as the dart
//! extractor this crate is grounded on.

use crate::languages::common::{IdGen, line_span, node_text, slice_lines};
use crate::model::element::{Element, ElementKind, Metadata};
use anyhow::{Result, anyhow};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tree_sitter::{Node, Parser};

pub struct ScriptParseResult {
    pub roots: Vec<String>,
    pub elements: HashMap<String, Element>,
}

pub fn parse(content: &str) -> Result<ScriptParseResult> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| anyhow!("failed to load python grammar: {e}"))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| anyhow!("tree-sitter failed to produce a tree"))?;

    let mut ids = IdGen::default();
    let mut elements = HashMap::new();
    let root = tree.root_node();
    let mut cursor = root.walk();
    let roots = walk_block(content, root, None, &mut cursor, &mut ids, &mut elements);
    Ok(ScriptParseResult { roots, elements })
}

/// Walk the direct children of a block-like node (module body, function body,
/// class body), grouping runs of comment lines into a single comment_block
/// and everything else into the most specific kind we recognize.
fn walk_block(
    src: &str,
    block: Node,
    parent: Option<&str>,
    _cursor: &mut tree_sitter::TreeCursor,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> Vec<String> {
    let mut roots = Vec::new();
    let mut pending_decorators: Vec<Node> = Vec::new();
    let mut comment_run: Vec<Node> = Vec::new();

    let mut walker = block.walk();
    for child in block.children(&mut walker) {
        match child.kind() {
            "comment" => {
                comment_run.push(child);
                continue;
            }
            "decorator" => {
                flush_comment_run(src, &mut comment_run, parent, ids, out, &mut roots);
                pending_decorators.push(child);
                continue;
            }
            _ => {}
        }
        flush_comment_run(src, &mut comment_run, parent, ids, out, &mut roots);

        let decorators: Vec<Node> = std::mem::take(&mut pending_decorators);
        if let Some(id) = dispatch_statement(src, child, parent, &decorators, ids, out) {
            roots.push(id);
        }
    }
    flush_comment_run(src, &mut comment_run, parent, ids, out, &mut roots);
    roots
}

fn flush_comment_run(
    src: &str,
    run: &mut Vec<Node>,
    parent: Option<&str>,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
    roots: &mut Vec<String>,
) {
    if run.is_empty() {
        return;
    }
    let first = run[0];
    let last = *run.last().unwrap();
    let (start_line, _) = line_span(&first);
    let (_, end_line) = line_span(&last);
    let content = src_between(src, first, last);
    let id = ids.next();
    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::CommentBlock,
            name: collapse_first_line(&content),
            start_line,
            end_line,
            content,
            metadata: Metadata::new(),
            parent: parent.map(str::to_string),
            children: vec![],
        },
    );
    roots.push(id);
    run.clear();
}

fn src_between(src: &str, first: Node, last: Node) -> String {
    let start = first.start_byte().min(src.len());
    let end = last.end_byte().min(src.len()).max(start);
    src[start..end].to_string()
}

fn collapse_first_line(s: &str) -> String {
    s.lines().next().unwrap_or("").trim().to_string()
}

fn dispatch_statement(
    src: &str,
    node: Node,
    parent: Option<&str>,
    decorators: &[Node],
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> Option<String> {
    match node.kind() {
        "import_statement" | "import_from_statement" => Some(extract_import(src, node, parent, ids, out)),
        "function_definition" => Some(extract_function(src, node, parent, decorators, ids, out)),
        "class_definition" => Some(extract_class(src, node, parent, decorators, ids, out)),
        "expression_statement" => Some(match extract_assignment(src, node, parent, ids, out) {
            Some(id) => id,
            None => extract_generic_block(src, node, parent, ids, out),
        }),
        _ => Some(extract_generic_block(src, node, parent, ids, out)),
    }
}

fn extract_import(
    src: &str,
    node: Node,
    parent: Option<&str>,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> String {
    let (start_line, end_line) = line_span(&node);
    let content = slice_lines(src, start_line, end_line);

    let mut metadata = Metadata::new();
    let (module, names) = parse_import_text(&content);
    if let Some(module) = &module {
        metadata.insert("module".to_string(), serde_json::json!(module));
    }
    metadata.insert("names".to_string(), serde_json::json!(names));

    let name = module.clone().unwrap_or_else(|| names.first().cloned().unwrap_or_default());
    let id = ids.next();
    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::Import,
            name,
            start_line,
            end_line,
            content,
            metadata,
            parent: parent.map(str::to_string),
            children: vec![],
        },
    );
    id
}

/// `import a.b.c` / `import a.b.c as d` / `from a.b import c, d as e`.
/// Returns `(module, imported_names)`.
fn parse_import_text(text: &str) -> (Option<String>, Vec<String>) {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("from ") {
        let mut parts = rest.splitn(2, " import ");
        let module = parts.next().map(|s| s.trim().to_string());
        let names = parts
            .next()
            .unwrap_or("")
            .split(',')
            .map(|n| n.split(" as ").next().unwrap_or("").trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        (module, names)
    } else if let Some(rest) = text.strip_prefix("import ") {
        let names: Vec<String> = rest
            .split(',')
            .map(|n| n.split(" as ").next().unwrap_or("").trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        (names.first().cloned(), names)
    } else {
        (None, vec![])
    }
}

fn extract_function(
    src: &str,
    node: Node,
    parent: Option<&str>,
    decorators: &[Node],
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> String {
    let (start_line, end_line) = line_span(&node);
    let (decorator_start, _) = decorators.first().map(line_span).unwrap_or((start_line, start_line));
    let content = slice_lines(src, decorator_start, end_line);

    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(src, n).to_string())
        .unwrap_or_default();

    let mut metadata = Metadata::new();
    let decorator_texts: Vec<String> = decorators.iter().map(|d| node_text(src, *d).trim().to_string()).collect();
    if !decorator_texts.is_empty() {
        metadata.insert("decorators".to_string(), serde_json::json!(decorator_texts));
    }
    let routes = find_route_decorators(&decorator_texts);
    if !routes.is_empty() {
        let routes: Vec<serde_json::Value> = routes.into_iter().map(|(method, path)| serde_json::json!({ "method": method, "path": path })).collect();
        metadata.insert("api_routes".to_string(), serde_json::json!(routes));
    }

    let id = ids.next();
    let mut children = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        children = walk_block(src, body, Some(&id), &mut cursor, ids, out);
    }

    let internal_calls = collect_internal_calls(node.child_by_field_name("body"), src);
    if !internal_calls.is_empty() {
        metadata.insert("internal_calls".to_string(), serde_json::json!(internal_calls));
    }

    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::Function,
            name,
            start_line: decorator_start,
            end_line,
            content,
            metadata,
            parent: parent.map(str::to_string),
            children,
        },
    );
    id
}

const ROUTE_VERBS: [&str; 8] = ["get", "post", "put", "delete", "patch", "options", "head", "trace"];

/// Recognize `<identifier>.<verb>(<string>, …)` decorator patterns
/// (`spec.md` §4.2b): `@app.route("/x", methods=["GET", "POST"])`-style
/// decorators emit one tuple per listed method, `@app.get("/x")`-style
/// shorthand forms emit one tuple for that verb.
fn find_route_decorators(decorators: &[String]) -> Vec<(String, String)> {
    let mut routes = Vec::new();
    for raw in decorators {
        let text = raw.trim_start_matches('@');
        let Some(open) = text.find('(') else { continue };
        let (head, args) = text.split_at(open);
        let args = args.trim_start_matches('(').trim_end_matches(')');

        let Some(path) = first_string_literal(args) else { continue };
        if head.ends_with(".route") {
            let methods: Vec<String> = ROUTE_VERBS
                .iter()
                .filter(|v| args.to_ascii_lowercase().contains(&format!("\"{v}\"")) || args.to_ascii_lowercase().contains(&format!("'{v}'")))
                .map(|v| v.to_ascii_uppercase())
                .collect();
            if methods.is_empty() {
                routes.push(("GET".to_string(), path));
            } else {
                routes.extend(methods.into_iter().map(|m| (m, path.clone())));
            }
            continue;
        }
        if let Some(verb) = ROUTE_VERBS.iter().find(|v| head.to_ascii_lowercase().ends_with(&format!(".{v}"))) {
            routes.push((verb.to_ascii_uppercase(), path));
        }
    }
    routes
}

fn callable_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

/// Walk a function body's verbatim source for every directly-callable
/// identifier (plain calls and method names), sorted and de-duplicated
/// (`spec.md` §4.2c).
fn collect_internal_calls(body: Option<Node>, src: &str) -> Vec<String> {
    let Some(body) = body else { return Vec::new() };
    let text = node_text(src, body);
    const KEYWORDS: &[&str] = &["if", "elif", "while", "for", "with", "except", "return", "not", "and", "or", "lambda", "print"];
    let mut calls: Vec<String> = callable_pattern()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|name| !KEYWORDS.contains(&name.as_str()))
        .collect();
    calls.sort();
    calls.dedup();
    calls
}

fn first_string_literal(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let quote = bytes[i];
        if quote == b'"' || quote == b'\'' {
            let start = i + 1;
            if let Some(end) = s[start..].find(quote as char) {
                return Some(s[start..start + end].to_string());
            }
        }
        i += 1;
    }
    None
}

fn extract_class(
    src: &str,
    node: Node,
    parent: Option<&str>,
    decorators: &[Node],
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> String {
    let (start_line, end_line) = line_span(&node);
    let (decorator_start, _) = decorators.first().map(line_span).unwrap_or((start_line, start_line));
    let content = slice_lines(src, decorator_start, end_line);

    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(src, n).to_string())
        .unwrap_or_default();

    let mut metadata = Metadata::new();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        metadata.insert("bases".to_string(), serde_json::json!(node_text(src, superclasses)));
    }

    let id = ids.next();
    let mut children = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        children = walk_class_body(src, body, &id, &mut cursor, ids, out);
    }

    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::Class,
            name,
            start_line: decorator_start,
            end_line,
            content,
            metadata,
            parent: parent.map(str::to_string),
            children,
        },
    );
    id
}

/// Like [`walk_block`], but module-level assignment statements inside a class
/// body become `class_variable` elements instead of `variable_definition`.
fn walk_class_body(
    src: &str,
    block: Node,
    owner_id: &str,
    cursor: &mut tree_sitter::TreeCursor,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> Vec<String> {
    let mut roots = Vec::new();
    let mut pending_decorators: Vec<Node> = Vec::new();
    let mut comment_run: Vec<Node> = Vec::new();
    let mut walker = block.walk();
    for child in block.children(&mut walker) {
        match child.kind() {
            "comment" => {
                comment_run.push(child);
                continue;
            }
            "decorator" => {
                flush_comment_run(src, &mut comment_run, Some(owner_id), ids, out, &mut roots);
                pending_decorators.push(child);
                continue;
            }
            _ => {}
        }
        flush_comment_run(src, &mut comment_run, Some(owner_id), ids, out, &mut roots);
        let decorators = std::mem::take(&mut pending_decorators);
        let id = match child.kind() {
            "function_definition" => extract_function(src, child, Some(owner_id), &decorators, ids, out),
            "expression_statement" => match extract_assignment_node(src, child, Some(owner_id), ids, out, ElementKind::ClassVariable) {
                Some(id) => id,
                None => extract_generic_block(src, child, Some(owner_id), ids, out),
            },
            _ => extract_generic_block(src, child, Some(owner_id), ids, out),
        };
        roots.push(id);
        let _ = cursor;
    }
    flush_comment_run(src, &mut comment_run, Some(owner_id), ids, out, &mut roots);
    roots
}

fn extract_assignment(
    src: &str,
    node: Node,
    parent: Option<&str>,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> Option<String> {
    extract_assignment_node(src, node, parent, ids, out, ElementKind::VariableDefinition)
}

fn extract_assignment_node(
    src: &str,
    node: Node,
    parent: Option<&str>,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
    kind: ElementKind,
) -> Option<String> {
    let mut walker = node.walk();
    let assignment = node.children(&mut walker).find(|c| c.kind() == "assignment")?;
    let name = assignment
        .child_by_field_name("left")
        .map(|n| node_text(src, n).trim().to_string())?;
    // Only simple `identifier = ...` targets qualify; tuple/attribute targets
    // fall through to a generic block.
    if name.contains(['.', '(', ',', '[']) {
        return None;
    }

    let (start_line, end_line) = line_span(&node);
    let content = slice_lines(src, start_line, end_line);
    let id = ids.next();
    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind,
            name,
            start_line,
            end_line,
            content,
            metadata: Metadata::new(),
            parent: parent.map(str::to_string),
            children: vec![],
        },
    );
    Some(id)
}

fn extract_generic_block(
    src: &str,
    node: Node,
    parent: Option<&str>,
    ids: &mut IdGen,
    out: &mut HashMap<String, Element>,
) -> String {
    let (start_line, end_line) = line_span(&node);
    let content = slice_lines(src, start_line, end_line);
    let kind = if matches!(node.kind(), "if_statement" | "for_statement" | "while_statement" | "try_statement" | "with_statement") {
        ElementKind::StatementBlock
    } else {
        ElementKind::GenericBlock
    };
    let id = ids.next();
    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind,
            name: node.kind().to_string(),
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
    fn extracts_top_level_function_and_class() {
        let src = "def foo():\n    pass\n\nclass Bar:\n    def baz(self):\n        pass\n";
        let result = parse(src).expect("parse");
        let names: Vec<&str> = result
            .roots
            .iter()
            .filter_map(|id| result.elements.get(id))
            .map(|e| e.name.as_str())
            .collect();
        assert!(names.contains(&"foo"));
        assert!(names.contains(&"Bar"));
    }

    #[test]
    fn recognizes_flask_style_route_decorator() {
        let src = "@app.route(\"/users/<id>\", methods=[\"POST\"])\ndef create_user(id):\n    pass\n";
        let result = parse(src).expect("parse");
        let func = result.roots.iter().find_map(|id| result.elements.get(id)).expect("function");
        let routes = func.metadata.get("api_routes").and_then(|v| v.as_array()).expect("api_routes");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0]["method"], "POST");
        assert_eq!(routes[0]["path"], "/users/<id>");
    }

    #[test]
    fn collects_internal_calls_from_function_body() {
        let src = "def handler():\n    logger.info(\"x\")\n    helper(1)\n";
        let result = parse(src).expect("parse");
        let func = result.roots.iter().find_map(|id| result.elements.get(id)).expect("function");
        let calls = func.metadata.get("internal_calls").and_then(|v| v.as_array()).expect("internal_calls");
        let names: Vec<&str> = calls.iter().map(|v| v.as_str().unwrap()).collect();
        assert!(names.contains(&"info"));
        assert!(names.contains(&"helper"));
    }

    #[test]
    fn non_assignment_expression_statement_becomes_generic_block() {
        let src = "def handler():\n    logger.info(\"hello\")\n";
        let result = parse(src).expect("parse");
        let func = result.roots.iter().find_map(|id| result.elements.get(id)).expect("function");
        assert_eq!(func.children.len(), 1);
        let child = result.elements.get(&func.children[0]).expect("child element");
        assert_eq!(child.kind, ElementKind::GenericBlock);
    }
}
