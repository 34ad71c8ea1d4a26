//! Public entry points.
//!
//! Two pure, synchronous functions cover the whole system: [`build_project`]
//! runs L1-L4 over a set of `(path, bytes)` pairs the host already collected
//! (no filesystem walking happens here), and [`trace_full_stack`] runs L5-L8
//! over the resulting [`Project`].

use crate::config::TraceConfig;
use crate::core::{classify, enrich, ids, index, normalize};
use crate::error::TraceError;
use crate::languages::{markup, script, web_script};
use crate::model::element::{Element, ElementKind, Metadata};
use crate::model::project::{ParserKind, Project};
use crate::model::trace::WorkflowTrace;
use crate::resolve::{alias, call_graph};
use crate::trace::{extractor, tracer};
use std::collections::HashMap;
use tracing::{info, warn};

/// Parse and enrich a set of source files into a [`Project`].
///
/// `files` is `(repo-relative path, file bytes)`; the host is responsible for
/// walking the filesystem and applying any ignore configuration beyond what
/// [`TraceConfig::filters`] expresses. Files whose path does not classify to
/// a known parser family (`spec.md` §4.1) are silently skipped, not errored.
///
/// A per-file parser failure is recoverable: the file becomes a single
/// `error` element and the project still commits. An invariant violation is
/// not: the whole call returns `Err` and no partial `Project` is produced.
#[tracing::instrument(level = "info", skip_all, fields(file_count = files.len()))]
pub fn build_project(files: &[(String, Vec<u8>)], config: &TraceConfig) -> Result<Project, TraceError> {
    config.validate().map_err(|e| TraceError::InvariantViolation { path: String::new(), message: e.to_string() })?;

    let mut sorted: Vec<&(String, Vec<u8>)> = files.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut parsed_files = Vec::with_capacity(sorted.len());
    for (path, bytes) in sorted {
        let rel_path = normalize::normalize_rel_path(path);
        let Some(parser_kind) = classify::classify(&rel_path, config) else {
            continue;
        };

        if bytes.len() > config.limits.max_file_bytes {
            warn!(path = %rel_path, size = bytes.len(), "file exceeds max_file_bytes, skipping");
            continue;
        }

        let content = match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(e) => {
                warn!(path = %rel_path, error = %e, "file is not valid utf-8, skipping");
                continue;
            }
        };

        let checksum = ids::hash_content(bytes);
        let (mut roots, mut elements) = parse_with_family(&rel_path, &content, parser_kind);
        enrich::enrich_file(&rel_path, &mut roots, &mut elements);

        info!(path = %rel_path, elements = elements.len(), "parsed file");
        parsed_files.push(index::ParsedFile { path: rel_path, parser: parser_kind, checksum, roots, elements });
    }

    Ok(index::build_project(parsed_files))
}

fn parse_with_family(rel_path: &str, content: &str, parser_kind: ParserKind) -> (Vec<String>, HashMap<String, Element>) {
    let result = match parser_kind {
        ParserKind::Script => script::parse(content).map(|r| (r.roots, r.elements)),
        ParserKind::WebScript => {
            let is_typescript = normalize::extension_of(rel_path).map(|e| e == "ts" || e == "tsx").unwrap_or(false);
            web_script::parse(content, is_typescript).map(|r| (r.roots, r.elements))
        }
        ParserKind::Markup => markup::parse(content).map(|r| (r.roots, r.elements)),
    };

    match result {
        Ok(pair) => pair,
        Err(e) => {
            warn!(path = %rel_path, error = %e, "parser error, recording as a single error element");
            error_element(rel_path, content, &e.to_string())
        }
    }
}

fn error_element(rel_path: &str, content: &str, message: &str) -> (Vec<String>, HashMap<String, Element>) {
    let mut metadata = Metadata::new();
    metadata.insert("message".to_string(), serde_json::json!(message));
    let line_count = content.lines().count().max(1);
    let id = format!("error:{rel_path}");
    let element = Element {
        stable_id: id.clone(),
        kind: ElementKind::Error,
        name: message.to_string(),
        start_line: 1,
        end_line: line_count,
        content: content.to_string(),
        metadata,
        parent: None,
        children: vec![],
    };
    let mut elements = HashMap::new();
    elements.insert(id.clone(), element);
    (vec![id], elements)
}

/// Run the alias resolver, call graph builder, endpoint/call-site extractor,
/// and full-stack tracer over an already-built [`Project`].
#[tracing::instrument(level = "info", skip_all)]
pub fn trace_full_stack(project: &Project, config: &TraceConfig) -> Vec<WorkflowTrace> {
    let aliases = alias::resolve_aliases(project);
    info!(count = aliases.len(), "resolved aliases");

    let graph = call_graph::build_call_graph(project, &aliases);
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "built call graph");

    let endpoints = extractor::extract_endpoints(project, config);
    let call_sites = extractor::extract_call_sites(project);
    info!(endpoints = endpoints.len(), call_sites = call_sites.len(), "extracted endpoints and call sites");

    let workflows = tracer::trace_full_stack(project, &graph, config, &endpoints, &call_sites);
    info!(workflows = workflows.len(), "traced full-stack workflows");
    workflows
}
