//! L5 Alias Resolver.
//!
//! Builds a `(importer_path, local_name) -> resolution` table so the call
//! graph builder (L6) and the endpoint/call-site extractor (L7) can follow a
//! name used in one file back to where it was actually defined, without
//! re-parsing import statements themselves.

use crate::model::element::{Element, ElementKind};
use crate::model::project::{AliasEntry, AliasResolution, Project};
use std::collections::HashMap;

/// Resolve every import in the project into an [`AliasEntry`].
///
/// Pure function: the output depends only on `project`'s contents, so
/// re-running it on an unchanged project is guaranteed deterministic (entries
/// are emitted in file order, then import order within a file).
pub fn resolve_aliases(project: &Project) -> Vec<AliasEntry> {
    let mut entries = Vec::new();

    for file in &project.files {
        for top_id in &file.elements {
            let Some(element) = project.get(top_id) else { continue };
            if element.kind != ElementKind::Import {
                continue;
            }
            entries.extend(resolve_one_import(project, &file.path, element));
        }
    }

    entries
}

fn resolve_one_import(project: &Project, importer_path: &str, import: &Element) -> Vec<AliasEntry> {
    let Some(module) = import.metadata_str("module").map(str::to_string) else {
        return Vec::new();
    };
    let names: Vec<String> = import
        .metadata
        .get("names")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let target_path = resolve_module_path(importer_path, &module, project);

    if names.is_empty() {
        // Bare `import module` style: the local name is the module itself.
        let local_name = module.rsplit(['.', '/']).next().unwrap_or(&module).to_string();
        let resolution = match &target_path {
            Some(path) => AliasResolution::Module { path: path.clone() },
            None => AliasResolution::Module { path: module.clone() },
        };
        return vec![AliasEntry {
            importer_path: importer_path.to_string(),
            local_name,
            resolution,
        }];
    }

    names
        .into_iter()
        .map(|local_name| {
            let resolution = target_path
                .as_ref()
                .and_then(|path| find_definition(project, path, &local_name))
                .map(|element_id| AliasResolution::Definition { element_id })
                .unwrap_or_else(|| AliasResolution::Module {
                    path: target_path.clone().unwrap_or_else(|| module.clone()),
                });
            AliasEntry { importer_path: importer_path.to_string(), local_name, resolution }
        })
        .collect()
}

/// Resolve a relative or absolute module specifier against the importer's
/// location, trying each file actually present in the project.
///
/// Relative specifiers use N leading dots: one dot means "this directory",
/// each additional dot moves one directory further up before resolving the
/// remainder.
fn resolve_module_path(importer_path: &str, module: &str, project: &Project) -> Option<String> {
    let importer_dir = importer_path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");

    let candidate_base = if let Some(stripped) = module.strip_prefix('.') {
        let mut dots = 1;
        let mut rest = stripped;
        while let Some(r) = rest.strip_prefix('.') {
            dots += 1;
            rest = r;
        }
        let rest = rest.trim_start_matches('/').replace('.', "/");
        let mut dir_parts: Vec<&str> = importer_dir.split('/').filter(|s| !s.is_empty()).collect();
        for _ in 0..dots.saturating_sub(1) {
            dir_parts.pop();
        }
        let base_dir = dir_parts.join("/");
        if rest.is_empty() {
            base_dir
        } else if base_dir.is_empty() {
            rest
        } else {
            format!("{base_dir}/{rest}")
        }
    } else if module.starts_with("./") || module.starts_with("../") {
        join_relative(importer_dir, module)
    } else {
        module.replace('.', "/")
    };

    find_matching_file(project, &candidate_base)
}

fn join_relative(importer_dir: &str, module: &str) -> String {
    let mut parts: Vec<&str> = importer_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in module.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn find_matching_file(project: &Project, candidate_base: &str) -> Option<String> {
    const SUFFIXES: [&str; 7] = ["", ".py", ".js", ".jsx", ".ts", ".tsx", "/index.js"];
    for suffix in SUFFIXES {
        let candidate = format!("{candidate_base}{suffix}");
        if project.files.iter().any(|f| f.path == candidate) {
            return Some(candidate);
        }
    }
    None
}

fn find_definition(project: &Project, file_path: &str, name: &str) -> Option<String> {
    let file = project.files.iter().find(|f| f.path == file_path)?;
    file.elements
        .iter()
        .filter_map(|id| project.get(id))
        .find(|el| el.name == name && matches!(el.kind, ElementKind::Function | ElementKind::Class | ElementKind::VariableDefinition))
        .map(|el| el.stable_id.clone())
}

/// Build a `(importer_path, local_name) -> AliasEntry` lookup table for O(1)
/// access by the call graph builder and the tracer.
pub fn index_by_local_name(entries: &[AliasEntry]) -> HashMap<(String, String), &AliasEntry> {
    entries
        .iter()
        .map(|e| ((e.importer_path.clone(), e.local_name.clone()), e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::{FileRecord, ParserKind};
    use std::collections::BTreeMap;

    fn function(id: &str, name: &str) -> Element {
        Element {
            stable_id: id.to_string(),
            kind: ElementKind::Function,
            name: name.to_string(),
            start_line: 1,
            end_line: 1,
            content: String::new(),
            metadata: Default::default(),
            parent: None,
            children: vec![],
        }
    }

    fn import(id: &str, module: &str, names: &[&str]) -> Element {
        let mut metadata = crate::model::element::Metadata::new();
        metadata.insert("module".to_string(), serde_json::json!(module));
        metadata.insert("names".to_string(), serde_json::json!(names));
        Element {
            stable_id: id.to_string(),
            kind: ElementKind::Import,
            name: module.to_string(),
            start_line: 1,
            end_line: 1,
            content: String::new(),
            metadata,
            parent: None,
            children: vec![],
        }
    }

    #[test]
    fn resolves_relative_import_to_sibling_file_definition() {
        let mut elements = BTreeMap::new();
        elements.insert("helper".to_string(), function("helper", "format_name"));
        elements.insert("imp".to_string(), import("imp", ".helpers", &["format_name"]));

        let project = Project {
            files: vec![
                FileRecord { path: "app/helpers.py".to_string(), parser: ParserKind::Script, checksum: String::new(), elements: vec!["helper".to_string()] },
                FileRecord { path: "app/views.py".to_string(), parser: ParserKind::Script, checksum: String::new(), elements: vec!["imp".to_string()] },
            ],
            elements,
        };

        let entries = resolve_aliases(&project);
        assert_eq!(entries.len(), 1);
        match &entries[0].resolution {
            AliasResolution::Definition { element_id } => assert_eq!(element_id, "helper"),
            other => panic!("expected a definition, got {other:?}"),
        }
    }
}
