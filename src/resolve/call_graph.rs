//! L6 Call Graph Builder.
//!
//! For every function/method in the project, tokenizes its body for
//! identifier-like references and resolves each one to a callee element via
//! the alias table, same-file top-level definitions, same-class sibling
//! methods (`self.m(...)`), and a member-call sweep over every class the
//! file imports (`A.m(...)`, independent of what `A` is — `spec.md` §4.8
//! rule 4). Unresolved references are simply not edges — this builder does
//! no semantic analysis and never reports an error for a name it cannot
//! place.

use crate::model::element::{Element, ElementKind};
use crate::model::graph::GraphEdgeLabel;
use crate::model::project::{AliasEntry, AliasResolution, Project};
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub type CallGraph = DiGraph<Element, GraphEdgeLabel>;

fn reference_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*\b").unwrap())
}

/// Build the call graph: one node per function/class/method in the project,
/// one `Calls` edge per resolved reference.
pub fn build_call_graph(project: &Project, aliases: &[AliasEntry]) -> CallGraph {
    let alias_index = crate::resolve::alias::index_by_local_name(aliases);
    let callables = collect_callables(project);

    let mut graph = CallGraph::new();
    let mut node_of: HashMap<String, NodeIndex> = HashMap::new();
    for (id, _) in &callables {
        let element = project.get(id).expect("callable ids come from project.elements").clone();
        node_of.insert(id.clone(), graph.add_node(element));
    }

    // definitions by (file_path, name) for same-file/simple resolution.
    let mut by_file_and_name: HashMap<(String, String), String> = HashMap::new();
    // methods grouped by (file_path, class_name) for `self.m` resolution.
    let mut methods_by_class: HashMap<(String, String), Vec<(String, String)>> = HashMap::new();
    for file in &project.files {
        for top_id in &file.elements {
            index_definitions(project, &file.path, top_id, None, &mut by_file_and_name, &mut methods_by_class);
        }
    }
    let imported_classes = imported_classes_by_file(aliases, project);

    for (caller_id, file_path) in &callables {
        let caller = project.get(caller_id).unwrap();
        let owning_class = owning_class_name(project, caller_id);
        let mut callee_ids: Vec<String> = Vec::new();

        for capture in reference_pattern().find_iter(&caller.content) {
            let reference = capture.as_str();
            let statement = line_containing(&caller.content, capture.start());
            callee_ids.extend(
                resolve_reference(
                    reference,
                    file_path,
                    owning_class.as_deref(),
                    &alias_index,
                    &by_file_and_name,
                    &methods_by_class,
                    &imported_classes,
                    statement,
                    project,
                )
                .into_iter()
                .filter(|id| id != caller_id),
            );
        }

        callee_ids.sort();
        callee_ids.dedup();
        let caller_idx = node_of[caller_id];
        for callee_id in callee_ids {
            if let Some(&callee_idx) = node_of.get(&callee_id) {
                graph.add_edge(caller_idx, callee_idx, GraphEdgeLabel::Calls);
            }
        }
    }

    graph
}

fn collect_callables(project: &Project) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for file in &project.files {
        for top_id in &file.elements {
            collect_callables_rec(project, &file.path, top_id, &mut out);
        }
    }
    out
}

fn collect_callables_rec(project: &Project, file_path: &str, id: &str, out: &mut Vec<(String, String)>) {
    let Some(element) = project.get(id) else { return };
    if matches!(element.kind, ElementKind::Function | ElementKind::EventListener) {
        out.push((id.to_string(), file_path.to_string()));
    }
    for child in &element.children {
        collect_callables_rec(project, file_path, child, out);
    }
}

fn index_definitions(
    project: &Project,
    file_path: &str,
    id: &str,
    owning_class: Option<&str>,
    by_file_and_name: &mut HashMap<(String, String), String>,
    methods_by_class: &mut HashMap<(String, String), Vec<(String, String)>>,
) {
    let Some(element) = project.get(id) else { return };
    if matches!(element.kind, ElementKind::Function | ElementKind::Class | ElementKind::VariableDefinition) {
        by_file_and_name
            .entry((file_path.to_string(), element.name.clone()))
            .or_insert_with(|| id.to_string());
    }
    if let Some(class_name) = owning_class {
        if element.kind == ElementKind::Function {
            methods_by_class
                .entry((file_path.to_string(), class_name.to_string()))
                .or_default()
                .push((element.name.clone(), id.to_string()));
        }
    }
    let next_owner = if element.kind == ElementKind::Class { Some(element.name.as_str()) } else { owning_class };
    for child in &element.children {
        index_definitions(project, file_path, child, next_owner, by_file_and_name, methods_by_class);
    }
}

fn owning_class_name(project: &Project, id: &str) -> Option<String> {
    let element = project.get(id)?;
    let parent_id = element.parent.as_ref()?;
    let parent = project.get(parent_id)?;
    if parent.kind == ElementKind::Class {
        Some(parent.name.clone())
    } else {
        owning_class_name(project, parent_id)
    }
}

/// `importer_path -> [(local_name, class_element_id)]` for every import that
/// resolves to a class definition, used by rule 4 (`.m(` member-call sweep).
fn imported_classes_by_file(aliases: &[AliasEntry], project: &Project) -> HashMap<String, Vec<(String, String)>> {
    let mut map: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for entry in aliases {
        if let AliasResolution::Definition { element_id } = &entry.resolution {
            if project.get(element_id).map(|e| e.kind == ElementKind::Class).unwrap_or(false) {
                map.entry(entry.importer_path.clone()).or_default().push((entry.local_name.clone(), element_id.clone()));
            }
        }
    }
    map
}

/// The source line containing byte offset `at`, used as the "same statement"
/// window for rule 4's lexical-proximity tie-break.
fn line_containing(content: &str, at: usize) -> &str {
    let start = content[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = content[at..].find('\n').map(|i| at + i).unwrap_or(content.len());
    &content[start..end]
}

/// Rule 4: for every class imported by `file_path`, look for a method named
/// `method_name`. Multiple matches are tie-broken by preferring the class
/// whose local alias name appears lexically in `statement` (`spec.md` §9);
/// if still tied, the lowest method id wins for determinism.
fn resolve_member_call(
    method_name: &str,
    file_path: &str,
    imported_classes: &HashMap<String, Vec<(String, String)>>,
    statement: &str,
    project: &Project,
) -> Option<String> {
    let classes = imported_classes.get(file_path)?;
    let mut candidates: Vec<(&str, String)> = Vec::new();
    for (local_name, class_id) in classes {
        let Some(class_el) = project.get(class_id) else { continue };
        if let Some(method) = class_el.children.iter().filter_map(|c| project.get(c)).find(|m| m.kind == ElementKind::Function && m.name == method_name) {
            candidates.push((local_name.as_str(), method.stable_id.clone()));
        }
    }
    if candidates.is_empty() {
        return None;
    }
    if candidates.len() > 1 {
        if let Some((_, id)) = candidates.iter().find(|(local_name, _)| statement.contains(local_name)) {
            return Some(id.clone());
        }
        candidates.sort_by(|a, b| a.1.cmp(&b.1));
    }
    Some(candidates[0].1.clone())
}

#[allow(clippy::too_many_arguments)]
fn resolve_reference(
    reference: &str,
    file_path: &str,
    owning_class: Option<&str>,
    alias_index: &HashMap<(String, String), &AliasEntry>,
    by_file_and_name: &HashMap<(String, String), String>,
    methods_by_class: &HashMap<(String, String), Vec<(String, String)>>,
    imported_classes: &HashMap<String, Vec<(String, String)>>,
    statement: &str,
    project: &Project,
) -> Vec<String> {
    // `self.m(...)`: resolve within the caller's own class.
    if let Some(rest) = reference.strip_prefix("self.") {
        if let Some(class_name) = owning_class {
            if let Some(methods) = methods_by_class.get(&(file_path.to_string(), class_name.to_string())) {
                if let Some((_, id)) = methods.iter().find(|(name, _)| name == rest) {
                    return vec![id.clone()];
                }
            }
        }
        return Vec::new();
    }

    if let Some((head, tail)) = reference.split_once('.') {
        let mut found: Vec<String> = Vec::new();

        // Rule 3 — dotted reference: if `head` resolves to a module, look
        // for `tail` defined directly in that module; if it resolves to an
        // imported class instance, look for `tail` among its methods.
        if let Some(entry) = alias_index.get(&(file_path.to_string(), head.to_string())) {
            match &entry.resolution {
                AliasResolution::Module { path } => {
                    if let Some(id) = by_file_and_name.get(&(path.clone(), tail.to_string())) {
                        found.push(id.clone());
                    }
                }
                AliasResolution::Definition { element_id } => {
                    if let Some(class_el) = project.get(element_id) {
                        if class_el.kind == ElementKind::Class {
                            if let Some(m) = class_el.children.iter().filter_map(|c| project.get(c)).find(|m| m.kind == ElementKind::Function && m.name == tail) {
                                found.push(m.stable_id.clone());
                            }
                        }
                    }
                }
            }
        }

        // Rule 4 — member-call `.m(`: independent of what `head` is, sweep
        // every class this file imports for a method named `tail`.
        if let Some(id) = resolve_member_call(tail, file_path, imported_classes, statement, project) {
            found.push(id);
        }

        return found;
    }

    // Single-segment reference: alias table first, then same-file definition.
    if let Some(entry) = alias_index.get(&(file_path.to_string(), reference.to_string())) {
        if let AliasResolution::Definition { element_id } = &entry.resolution {
            return vec![element_id.clone()];
        }
    }
    by_file_and_name.get(&(file_path.to_string(), reference.to_string())).cloned().into_iter().collect()
}
