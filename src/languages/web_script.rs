//! L2b Web-Script Parser: browser-side JavaScript/TypeScript.
//!
//! Implements the pass pipeline a browser script needs beyond a plain
//! top-down walk:
//!
//! - Pass 0: unwrap a dominant `DOMContentLoaded` handler so its body becomes
//!   the effective module root, when that handler's span covers more than
//!   80% of the file.
//! - main walk: imports, function/arrow declarations, `document.*` DOM
//!   lookups (both `const x = document.getElementById(...)` and bare
//!   statement forms), event listeners (`addEventListener` and `X.onEVENT =`
//!   assignment), and call sites (`fetch`/`axios`) recorded as metadata for
//!   the endpoint/call-site extractor (L7) to pick up later.
//! - finalize pass: once the whole file's elements are known, back-fills
//!   `event_listeners` metadata onto the functions each listener's handler
//!   resolves to (and onto functions that handler itself calls), and
//!   synthesizes a `submit`→`click` listener alongside any `submit` one.

use crate::languages::common::{IdGen, line_span, node_text, normalized_node_kind, slice_lines};
use crate::model::element::{Element, ElementKind, Metadata};
use anyhow::{Result, anyhow};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tree_sitter::{Node, Parser};

pub struct WebScriptParseResult {
    pub roots: Vec<String>,
    pub elements: HashMap<String, Element>,
}

/// `is_typescript` selects the TypeScript grammar (needed for `.ts`/`.tsx`
/// type syntax); otherwise the plain JavaScript grammar is used.
pub fn parse(content: &str, is_typescript: bool) -> Result<WebScriptParseResult> {
    let mut parser = Parser::new();
    let language = if is_typescript {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    } else {
        tree_sitter_javascript::LANGUAGE.into()
    };
    parser
        .set_language(&language)
        .map_err(|e| anyhow!("failed to load javascript/typescript grammar: {e}"))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| anyhow!("tree-sitter failed to produce a tree"))?;

    let mut ids = IdGen::default();
    let mut elements = HashMap::new();
    let effective_root = unwrap_dom_loaded(content, tree.root_node());
    let roots = walk_block(content, effective_root, None, &mut ids, &mut elements);
    finalize(&mut elements);
    Ok(WebScriptParseResult { roots, elements })
}

/// Pass 0: find `document.addEventListener("DOMContentLoaded", fn)` and, if
/// the handler function's span covers more than 80% of the file's bytes,
/// return the handler's body node instead of the file's program node — the
/// rest of the file is effectively just that one registration.
fn unwrap_dom_loaded<'a>(src: &str, program: Node<'a>) -> Node<'a> {
    let file_len = src.len().max(1);
    let mut stack = vec![program];
    while let Some(node) = stack.pop() {
        if node.kind() == "call_expression" {
            if let Some(handler_body) = match_dom_content_loaded(src, node) {
                let span = handler_body.end_byte().saturating_sub(handler_body.start_byte());
                if (span as f64) / (file_len as f64) > 0.8 {
                    return handler_body;
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    program
}

fn match_dom_content_loaded<'a>(src: &str, call: Node<'a>) -> Option<Node<'a>> {
    let callee = call.child_by_field_name("function")?;
    let callee_text = node_text(src, callee);
    if !callee_text.ends_with(".addEventListener") {
        return None;
    }
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let mut children = args.named_children(&mut cursor);
    let event_arg = children.next()?;
    let event_text = node_text(src, event_arg);
    if !event_text.contains("DOMContentLoaded") {
        return None;
    }
    let handler = children.next()?;
    function_body(handler)
}

fn function_body(node: Node) -> Option<Node> {
    match node.kind() {
        "function" | "function_expression" | "arrow_function" => node.child_by_field_name("body"),
        _ => None,
    }
}

fn walk_block(src: &str, block: Node, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> Vec<String> {
    let mut roots = Vec::new();
    let mut comment_run: Vec<Node> = Vec::new();
    let mut walker = block.walk();
    for child in block.children(&mut walker) {
        if child.kind() == "comment" {
            comment_run.push(child);
            continue;
        }
        flush_comment_run(src, &mut comment_run, parent, ids, out, &mut roots);
        if let Some(id) = dispatch_statement(src, child, parent, ids, out) {
            roots.push(id);
        }
    }
    flush_comment_run(src, &mut comment_run, parent, ids, out, &mut roots);
    roots
}

fn flush_comment_run(src: &str, run: &mut Vec<Node>, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>, roots: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    let first = run[0];
    let last = *run.last().unwrap();
    let (start_line, _) = line_span(&first);
    let (_, end_line) = line_span(&last);
    let content = slice_lines(src, start_line, end_line);
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
    roots.push(id);
    run.clear();
}

fn dispatch_statement(src: &str, node: Node, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> Option<String> {
    match node.kind() {
        "import_statement" => Some(extract_import(src, node, parent, ids, out)),
        "function_declaration" => Some(extract_function(src, node, node.child_by_field_name("name"), node.child_by_field_name("body"), parent, ids, out)),
        "lexical_declaration" | "variable_declaration" => extract_variable_or_function(src, node, parent, ids, out),
        "expression_statement" => extract_expression_statement(src, node, parent, ids, out),
        _ => Some(extract_generic_block(src, node, parent, ids, out)),
    }
}

fn extract_import(src: &str, node: Node, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> String {
    let (start_line, end_line) = line_span(&node);
    let content = slice_lines(src, start_line, end_line);
    let module = content.rfind("from").map(|idx| content[idx + 4..].trim()).and_then(first_quoted).unwrap_or_default();

    let mut metadata = Metadata::new();
    metadata.insert("module".to_string(), serde_json::json!(module));

    let id = ids.next();
    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::Import,
            name: module,
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

fn first_quoted(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'"' || b == b'\'' {
            if let Some(end) = s[i + 1..].find(b as char) {
                return Some(s[i + 1..i + 1 + end].to_string());
            }
        }
    }
    None
}

/// `const handler = () => {...}` / `let x = function() {...}` become
/// functions; `const btn = document.getElementById(...)`-style lookups
/// become `dom_element_definition`, span-widened to the whole declaration;
/// everything else becomes a `variable_definition`.
fn extract_variable_or_function(src: &str, node: Node, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> Option<String> {
    let mut walker = node.walk();
    let declarator = node.named_children(&mut walker).find(|c| c.kind() == "variable_declarator")?;
    let name_node = declarator.child_by_field_name("name")?;
    let name = node_text(src, name_node).to_string();
    let value = declarator.child_by_field_name("value");

    if let Some(value) = value {
        if matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
            let body = value.child_by_field_name("body");
            return Some(extract_function(src, node, Some(name_node), body, parent, ids, out));
        }
        if let Some((selector, method)) = dom_lookup_call(src, value) {
            return Some(emit_dom_element_definition(src, node, name, selector, method, parent, ids, out));
        }
    }

    let (start_line, end_line) = line_span(&node);
    let content = slice_lines(src, start_line, end_line);
    let id = ids.next();
    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::VariableDefinition,
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

/// `document.getElementById(...)` / `document.querySelector(...)` /
/// `document.querySelectorAll(...)` (`spec.md` §4.3 Pass 2).
fn dom_lookup_call(src: &str, node: Node) -> Option<(String, String)> {
    if node.kind() != "call_expression" {
        return None;
    }
    let callee = node.child_by_field_name("function")?;
    let callee_text = node_text(src, callee);
    let method = if callee_text.ends_with(".getElementById") {
        "getElementById"
    } else if callee_text.ends_with(".querySelectorAll") {
        "querySelectorAll"
    } else if callee_text.ends_with(".querySelector") {
        "querySelector"
    } else {
        return None;
    };
    let args = node.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let selector_arg = args.named_children(&mut cursor).next()?;
    let selector = strip_template_quotes(node_text(src, selector_arg));
    Some((selector, method.to_string()))
}

fn emit_dom_element_definition(src: &str, span: Node, name: String, selector: String, method: String, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> String {
    let (start_line, end_line) = line_span(&span);
    let content = slice_lines(src, start_line, end_line);
    let mut metadata = Metadata::new();
    metadata.insert("selector".to_string(), serde_json::json!(selector));
    metadata.insert("method".to_string(), serde_json::json!(method));
    let id = ids.next();
    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::DomElementDefinition,
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

fn extract_function(src: &str, node: Node, name_node: Option<Node>, body: Option<Node>, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> String {
    let (start_line, end_line) = line_span(&node);
    let content = slice_lines(src, start_line, end_line);
    let name = name_node.map(|n| node_text(src, n).to_string()).unwrap_or_else(|| format!("(anonymous) (L{start_line})"));

    let mut metadata = Metadata::new();
    let call_sites = find_http_call_sites(src, body.unwrap_or(node));
    if !call_sites.is_empty() {
        metadata.insert("api_calls".to_string(), serde_json::json!(call_sites));
    }
    let internal_calls = collect_internal_calls(src, body.unwrap_or(node));
    if !internal_calls.is_empty() {
        metadata.insert("internal_calls".to_string(), serde_json::json!(internal_calls));
    }

    let id = ids.next();
    let children = body.map(|b| walk_block(src, b, Some(&id), ids, out)).unwrap_or_default();

    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::Function,
            name,
            start_line,
            end_line,
            content,
            metadata,
            parent: parent.map(str::to_string),
            children,
        },
    );
    id
}

fn callable_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z_$][A-Za-z0-9_$]*)\s*\(").unwrap())
}

/// Every directly-callable identifier referenced in a function's body
/// (plain calls and method names), sorted and de-duplicated.
fn collect_internal_calls(src: &str, body: Node) -> Vec<String> {
    const KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "function"];
    let text = node_text(src, body);
    let mut calls: Vec<String> = callable_pattern().captures_iter(text).map(|c| c[1].to_string()).filter(|name| !KEYWORDS.contains(&name.as_str())).collect();
    calls.sort();
    calls.dedup();
    calls
}

/// Recognize `target.addEventListener("event", handler)` as its own
/// `event_listener` element, wherever it appears (top-level script setup or
/// nested inside another handler). `handler_name` is recorded as metadata so
/// the finalize pass and tracer can look the referenced function up by name
/// in the same file; an inline anonymous handler instead has its body walked
/// as this element's children, so listeners registered from within it nest
/// naturally.
fn try_extract_event_listener(src: &str, call: Node, statement_span: Node, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> Option<String> {
    let callee = call.child_by_field_name("function")?;
    let callee_text = node_text(src, callee);
    let selector_hint = callee_text.strip_suffix(".addEventListener")?.to_string();
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let mut children = args.named_children(&mut cursor);
    let event = first_quoted(node_text(src, children.next()?))?;
    let handler_arg = children.next()?;
    let handler_name = if handler_arg.kind() == "identifier" { node_text(src, handler_arg).to_string() } else { String::new() };

    let mut metadata = Metadata::new();
    metadata.insert("event".to_string(), serde_json::json!(event));
    metadata.insert("selector_hint".to_string(), serde_json::json!(selector_hint));
    metadata.insert("handler_name".to_string(), serde_json::json!(handler_name));

    let (start_line, end_line) = line_span(&statement_span);
    let content = slice_lines(src, start_line, end_line);
    let id = ids.next();
    let children_ids = function_body(handler_arg).map(|b| walk_block(src, b, Some(&id), ids, out)).unwrap_or_default();

    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::EventListener,
            name: event,
            start_line,
            end_line,
            content,
            metadata,
            parent: parent.map(str::to_string),
            children: children_ids,
        },
    );
    Some(id)
}

/// `target.onEVENT = handler` assignment-based listener registration
/// (`spec.md` §4.3 Pass 3, second shape).
fn try_extract_on_event_listener(src: &str, statement: Node, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> Option<String> {
    let mut walker = statement.walk();
    let assignment = statement.named_children(&mut walker).find(|c| c.kind() == "assignment_expression")?;
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "member_expression" {
        return None;
    }
    let object = left.child_by_field_name("object")?;
    let property = left.child_by_field_name("property")?;
    let event = node_text(src, property).strip_prefix("on")?;
    if event.is_empty() {
        return None;
    }
    let selector_hint = node_text(src, object).to_string();
    let right = assignment.child_by_field_name("right")?;
    let handler_name = if right.kind() == "identifier" { node_text(src, right).to_string() } else { String::new() };

    let mut metadata = Metadata::new();
    metadata.insert("event".to_string(), serde_json::json!(event));
    metadata.insert("selector_hint".to_string(), serde_json::json!(selector_hint));
    metadata.insert("handler_name".to_string(), serde_json::json!(handler_name));

    let (start_line, end_line) = line_span(&statement);
    let content = slice_lines(src, start_line, end_line);
    let id = ids.next();
    let children_ids = function_body(right).map(|b| walk_block(src, b, Some(&id), ids, out)).unwrap_or_default();

    out.insert(
        id.clone(),
        Element {
            stable_id: id.clone(),
            kind: ElementKind::EventListener,
            name: event.to_string(),
            start_line,
            end_line,
            content,
            metadata,
            parent: parent.map(str::to_string),
            children: children_ids,
        },
    );
    Some(id)
}

const AXIOS_VERBS: [&str; 8] = ["get", "post", "put", "delete", "patch", "options", "head", "trace"];

/// `fetch(path[, options])` / `axios.<verb>(path)` (`spec.md` §4.3 Pass 5).
fn find_http_call_sites(src: &str, body: Node) -> Vec<serde_json::Value> {
    let mut sites = Vec::new();
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if node.kind() == "call_expression" {
            if let Some(callee) = node.child_by_field_name("function") {
                let callee_text = node_text(src, callee);
                if callee_text == "fetch" {
                    if let Some(site) = fetch_call_site(src, node) {
                        sites.push(site);
                    }
                } else if let Some(verb) = callee_text.strip_prefix("axios.") {
                    if AXIOS_VERBS.contains(&verb) {
                        if let Some(path) = first_arg_path(src, node) {
                            sites.push(serde_json::json!({ "method": verb.to_ascii_uppercase(), "path": path, "library": "axios" }));
                        }
                    }
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    sites
}

fn fetch_call_site(src: &str, call: Node) -> Option<serde_json::Value> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let mut named = args.named_children(&mut cursor);
    let path_arg = named.next()?;
    let path = resolve_path_literal(src, path_arg);
    let mut method = "GET".to_string();
    if let Some(options) = named.next() {
        if options.kind() == "object" {
            if let Some(m) = object_string_prop(src, options, "method") {
                method = m.to_ascii_uppercase();
            }
        }
    }
    Some(serde_json::json!({ "method": method, "path": path, "library": "fetch" }))
}

fn first_arg_path(src: &str, call: Node) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let path_arg = args.named_children(&mut cursor).next()?;
    Some(resolve_path_literal(src, path_arg))
}

fn object_string_prop(src: &str, object: Node, key: &str) -> Option<String> {
    let mut cursor = object.walk();
    for pair in object.named_children(&mut cursor) {
        if pair.kind() != "pair" {
            continue;
        }
        let k = pair.child_by_field_name("key")?;
        if node_text(src, k).trim_matches(|c| c == '"' || c == '\'' || c == '`') != key {
            continue;
        }
        let v = pair.child_by_field_name("value")?;
        if matches!(v.kind(), "string" | "template_string") {
            return Some(strip_template_quotes(node_text(src, v)));
        }
    }
    None
}

/// Strips surrounding quotes/backticks; if the literal embeds an
/// `API_BASE_URL` placeholder, returns only the substring following the
/// first `}` (`spec.md` §4.3 Pass 5).
fn resolve_path_literal(src: &str, node: Node) -> String {
    let text = strip_template_quotes(node_text(src, node));
    if text.contains("API_BASE_URL") {
        if let Some(brace_idx) = text.find('}') {
            return text[brace_idx + 1..].to_string();
        }
    }
    text
}

fn strip_template_quotes(s: &str) -> String {
    let s = s.trim();
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

/// `document.querySelector(...)`/`addEventListener(...)`/`X.onEVENT = ...`
/// expression statements get their own element kinds; everything else falls
/// back to a `generic_block` (`spec.md` §4.3 Pass 4) instead of being
/// silently dropped.
fn extract_expression_statement(src: &str, node: Node, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> Option<String> {
    let mut walker = node.walk();
    if let Some(call) = node.named_children(&mut walker).find(|c| c.kind() == "call_expression") {
        if let Some(id) = try_extract_event_listener(src, call, node, parent, ids, out) {
            return Some(id);
        }
        if let Some((selector, method)) = dom_lookup_call(src, call) {
            return Some(emit_dom_element_definition(src, node, selector.clone(), selector, method, parent, ids, out));
        }
    }
    if let Some(id) = try_extract_on_event_listener(src, node, parent, ids, out) {
        return Some(id);
    }
    Some(extract_generic_block(src, node, parent, ids, out))
}

fn extract_generic_block(src: &str, node: Node, parent: Option<&str>, ids: &mut IdGen, out: &mut HashMap<String, Element>) -> String {
    let (start_line, end_line) = line_span(&node);
    let content = slice_lines(src, start_line, end_line);
    let kind = if matches!(node.kind(), "if_statement" | "for_statement" | "while_statement" | "try_statement" | "switch_statement") {
        ElementKind::StatementBlock
    } else {
        ElementKind::GenericBlock
    };
    let name = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim().to_string();
    let mut metadata = Metadata::new();
    metadata.insert("node_kind".to_string(), serde_json::json!(normalized_node_kind(node.kind())));
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
            metadata,
            parent: parent.map(str::to_string),
            children: vec![],
        },
    );
    id
}

/// Post-pass over the whole file's elements (`spec.md` §4.3 Pass 3 back-fill
/// and Pass 7): for every `event_listener`, find the function its
/// `handler_name` names and append `event_listeners += { event,
/// selector_hint }` to that function's metadata (renaming it if it was
/// anonymous), propagating the same entry to every function it in turn
/// calls; then, for any function carrying a `submit` listener, append a
/// synthetic `click` listener on the same selector plus `button[type=submit]`.
fn finalize(elements: &mut HashMap<String, Element>) {
    let listeners: Vec<(String, String, String)> = elements
        .values()
        .filter(|e| e.kind == ElementKind::EventListener)
        .filter_map(|e| {
            let handler = e.metadata_str("handler_name")?.to_string();
            if handler.is_empty() {
                return None;
            }
            Some((e.metadata_str("event").unwrap_or_default().to_string(), e.metadata_str("selector_hint").unwrap_or_default().to_string(), handler))
        })
        .collect();

    for (event, selector_hint, handler_name) in &listeners {
        let matches: Vec<String> = elements.values().filter(|e| e.kind == ElementKind::Function && e.name == *handler_name).map(|e| e.stable_id.clone()).collect();
        for func_id in matches {
            backfill_event_listener(elements, &func_id, event, selector_hint);
            if let Some(func) = elements.get(&func_id) {
                if let Some(names) = func.metadata.get("internal_calls").and_then(|v| v.as_array()) {
                    let callee_names: Vec<String> = names.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
                    for callee_name in callee_names {
                        let callee_ids: Vec<String> = elements.values().filter(|e| e.kind == ElementKind::Function && e.name == callee_name).map(|e| e.stable_id.clone()).collect();
                        for callee_id in callee_ids {
                            backfill_event_listener(elements, &callee_id, event, selector_hint);
                        }
                    }
                }
            }
        }
    }

    let func_ids: Vec<String> = elements.values().filter(|e| e.kind == ElementKind::Function).map(|e| e.stable_id.clone()).collect();
    for func_id in func_ids {
        let submit_hints: Vec<String> = elements
            .get(&func_id)
            .and_then(|e| e.metadata.get("event_listeners"))
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter(|entry| entry.get("event").and_then(|v| v.as_str()) == Some("submit"))
                    .filter_map(|entry| entry.get("selector_hint").and_then(|v| v.as_str()).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        for selector_hint in submit_hints {
            let synthetic = serde_json::json!({ "event": "click", "selector_hint": format!("{selector_hint} button[type=submit]"), "synthetic": true });
            if let Some(el) = elements.get_mut(&func_id) {
                let arr = el.metadata.entry("event_listeners".to_string()).or_insert_with(|| serde_json::json!([]));
                if let Some(arr) = arr.as_array_mut() {
                    if !arr.contains(&synthetic) {
                        arr.push(synthetic);
                    }
                }
            }
        }
    }
}

fn backfill_event_listener(elements: &mut HashMap<String, Element>, func_id: &str, event: &str, selector_hint: &str) {
    let Some(el) = elements.get_mut(func_id) else { return };
    let entry = serde_json::json!({ "event": event, "selector_hint": selector_hint });
    let arr = el.metadata.entry("event_listeners".to_string()).or_insert_with(|| serde_json::json!([]));
    if let Some(arr) = arr.as_array_mut() {
        if !arr.contains(&entry) {
            arr.push(entry);
        }
    }
    if el.name.starts_with("(anonymous) ") {
        el.name = format!("(handler for '{event}') (L{})", el.start_line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_declaration_and_call_site() {
        let src = "function loadUsers() {\n  fetch('/api/users');\n}\n";
        let result = parse(src, false).expect("parse");
        let func = result.roots.iter().find_map(|id| result.elements.get(id)).expect("function");
        assert_eq!(func.name, "loadUsers");
        let calls = func.metadata.get("api_calls").and_then(|v| v.as_array()).expect("api_calls");
        assert_eq!(calls[0]["library"], "fetch");
        assert_eq!(calls[0]["method"], "GET");
    }

    #[test]
    fn fetch_options_object_overrides_method() {
        let src = "function save() {\n  fetch('/api/x', {method: 'POST'});\n}\n";
        let result = parse(src, false).expect("parse");
        let func = result.roots.iter().find_map(|id| result.elements.get(id)).expect("function");
        let calls = func.metadata.get("api_calls").and_then(|v| v.as_array()).expect("api_calls");
        assert_eq!(calls[0]["method"], "POST");
    }

    #[test]
    fn dom_lookup_in_declarator_becomes_dom_element_definition() {
        let src = "const btn = document.getElementById(\"b\");\n";
        let result = parse(src, false).expect("parse");
        let el = result.roots.iter().find_map(|id| result.elements.get(id)).expect("element");
        assert_eq!(el.kind, ElementKind::DomElementDefinition);
        assert_eq!(el.name, "btn");
        assert_eq!(el.metadata_str("selector"), Some("b"));
        assert_eq!(el.metadata_str("method"), Some("getElementById"));
    }

    #[test]
    fn on_event_assignment_becomes_event_listener() {
        let src = "btn.onclick = doThing;\nfunction doThing() {}\n";
        let result = parse(src, false).expect("parse");
        let listener = result.roots.iter().find_map(|id| result.elements.get(id)).filter(|e| e.kind == ElementKind::EventListener).expect("listener");
        assert_eq!(listener.metadata_str("event"), Some("click"));
        assert_eq!(listener.metadata_str("selector_hint"), Some("btn"));
        assert_eq!(listener.metadata_str("handler_name"), Some("doThing"));
    }

    #[test]
    fn submit_listener_gets_synthetic_click_sibling() {
        let src = "form.addEventListener('submit', onSubmit);\nfunction onSubmit() {}\n";
        let result = parse(src, false).expect("parse");
        let func = result.elements.values().find(|e| e.kind == ElementKind::Function && e.name == "onSubmit").expect("function");
        let listeners = func.metadata.get("event_listeners").and_then(|v| v.as_array()).expect("event_listeners");
        assert!(listeners.iter().any(|l| l["event"] == "submit"));
        assert!(listeners.iter().any(|l| l["event"] == "click" && l["synthetic"] == true && l["selector_hint"] == "form button[type=submit]"));
    }

    #[test]
    fn non_dom_expression_statement_becomes_generic_block() {
        let src = "console.log('hello');\n";
        let result = parse(src, false).expect("parse");
        let el = result.roots.iter().find_map(|id| result.elements.get(id)).expect("element");
        assert_eq!(el.kind, ElementKind::GenericBlock);
        assert_eq!(el.metadata_str("node_kind"), Some("expression statement"));
    }

    #[test]
    fn unwraps_dominant_dom_content_loaded_handler() {
        let body = "console.log('a');\n".repeat(20);
        let src = format!("document.addEventListener('DOMContentLoaded', function() {{\n{body}}});\n");
        let result = parse(&src, false).expect("parse");
        // the handler body's statements become top-level roots, not a single
        // wrapping function/call element
        assert!(result.roots.len() > 1);
    }
}
