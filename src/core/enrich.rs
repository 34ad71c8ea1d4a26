//! L3 Element Enricher.
//!
//! Parsers build trees with provisional, parser-local identity (a counter or
//! an empty string) and may stash scratch state in `metadata` under keys
//! prefixed with `_` (e.g. `_tree_sitter_kind`) to help later passes within
//! the same parser. The enricher is the single place that:
//!
//! 1. computes final content-addressed `stable_id`s (§9 "Cross-cutting
//!    identity") once the whole file's tree is known, so qualified names
//!    (`Outer.inner`) can be built from the parent chain;
//! 2. truncates `name` to the shared 80-character convention;
//! 3. strips every scratch (`_`-prefixed) metadata key before the element
//!    leaves the parser boundary — no parser-internal handle may leak past
//!    this stage.

use crate::core::ids;
use crate::model::element::Element;
use std::collections::HashMap;

/// Enrich every element of a freshly parsed file in place, replacing
/// provisional ids with final `stable_id`s and relinking `parent`/`children`
/// to match.
pub fn enrich_file(repo_rel_path: &str, roots: &mut [String], elements: &mut HashMap<String, Element>) {
    let mut remap: HashMap<String, String> = HashMap::new();
    for root in roots.iter() {
        assign_stable_ids(repo_rel_path, root, "", elements, &mut remap);
    }
    relink(roots, elements, &remap);
    for element in elements.values_mut() {
        strip_scratch_metadata(element);
        element.name = Element::truncate_name(&element.name);
    }
}

fn assign_stable_ids(
    repo_rel_path: &str,
    provisional_id: &str,
    parent_qualified_name: &str,
    elements: &HashMap<String, Element>,
    remap: &mut HashMap<String, String>,
) {
    if remap.contains_key(provisional_id) {
        return;
    }
    let Some(element) = elements.get(provisional_id) else {
        return;
    };
    let qualified_name = if parent_qualified_name.is_empty() {
        element.name.clone()
    } else {
        format!("{parent_qualified_name}.{}", element.name)
    };
    let final_id = ids::element_id(repo_rel_path, &qualified_name, element.kind, &element.content);
    remap.insert(provisional_id.to_string(), final_id);

    for child in element.children.clone() {
        assign_stable_ids(repo_rel_path, &child, &qualified_name, elements, remap);
    }
}

fn relink(roots: &mut [String], elements: &mut HashMap<String, Element>, remap: &HashMap<String, String>) {
    let old_keys: Vec<String> = elements.keys().cloned().collect();
    let mut rebuilt = HashMap::with_capacity(elements.len());
    for old_id in old_keys {
        let Some(mut element) = elements.remove(&old_id) else {
            continue;
        };
        let new_id = remap.get(&old_id).cloned().unwrap_or(old_id);
        element.stable_id = new_id.clone();
        element.parent = element.parent.and_then(|p| remap.get(&p).cloned());
        element.children = element
            .children
            .into_iter()
            .filter_map(|c| remap.get(&c).cloned())
            .collect();
        rebuilt.insert(new_id, element);
    }
    *elements = rebuilt;
    for root in roots.iter_mut() {
        if let Some(new_id) = remap.get(root) {
            *root = new_id.clone();
        }
    }
}

fn strip_scratch_metadata(element: &mut Element) {
    element.metadata.retain(|k, _| !k.starts_with('_'));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::element::ElementKind;

    fn leaf(id: &str, name: &str, parent: Option<&str>) -> Element {
        Element {
            stable_id: id.to_string(),
            kind: ElementKind::Function,
            name: name.to_string(),
            start_line: 1,
            end_line: 1,
            content: format!("def {name}(): pass"),
            metadata: Default::default(),
            parent: parent.map(str::to_string),
            children: vec![],
        }
    }

    #[test]
    fn qualified_names_disambiguate_same_named_siblings() {
        let mut elements = HashMap::new();
        let mut outer = leaf("p0", "Outer", None);
        outer.kind = ElementKind::Class;
        outer.children = vec!["p1".to_string(), "p2".to_string()];
        elements.insert("p0".to_string(), outer);
        elements.insert("p1".to_string(), leaf("p1", "run", Some("p0")));

        let mut other_outer = leaf("p2", "OtherOuter", None);
        other_outer.kind = ElementKind::Class;
        other_outer.children = vec!["p3".to_string()];
        elements.insert("p2".to_string(), other_outer);
        elements.insert("p3".to_string(), leaf("p3", "run", Some("p2")));

        let mut roots = vec!["p0".to_string(), "p2".to_string()];
        enrich_file("app/models.py", &mut roots, &mut elements);

        let ids: Vec<&String> = elements.keys().collect();
        assert_eq!(ids.len(), 4);
        // every id is now a uuid v5 string rather than the provisional "p*"
        assert!(elements.keys().all(|k| !k.starts_with('p')));
    }

    #[test]
    fn strips_scratch_metadata_keys() {
        let mut elements = HashMap::new();
        let mut el = leaf("p0", "run", None);
        el.metadata.insert("_ts_kind".to_string(), serde_json::json!("function_definition"));
        el.metadata.insert("returns".to_string(), serde_json::json!("None"));
        elements.insert("p0".to_string(), el);
        let mut roots = vec!["p0".to_string()];

        enrich_file("app/views.py", &mut roots, &mut elements);

        let enriched = elements.values().next().unwrap();
        assert!(!enriched.metadata.contains_key("_ts_kind"));
        assert!(enriched.metadata.contains_key("returns"));
    }
}
