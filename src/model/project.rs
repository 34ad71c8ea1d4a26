//! File- and project-level aggregates built on top of [`Element`].

use crate::model::element::Element;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which parser family a file belongs to (L1 Source Classifier's output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    Script,
    WebScript,
    Markup,
}

/// One source file after classification and parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repo-relative, `/`-separated path. Stable across hosts.
    pub path: String,
    pub parser: ParserKind,
    /// Content hash (FNV-1a 64-bit hex) used to detect unchanged files cheaply.
    pub checksum: String,
    /// Top-level `stable_id`s of the elements this file owns, in source order.
    pub elements: Vec<String>,
}

/// A fully parsed and enriched codebase: every file plus a flat element index.
///
/// `elements` is keyed by `stable_id` so every stage after L3 can resolve an
/// id to its element in O(1) without re-walking trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub files: Vec<FileRecord>,
    pub elements: BTreeMap<String, Element>,
}

impl Project {
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn file_for(&self, id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.elements.iter().any(|e| e == id) || f.owns(self, id))
    }
}

impl FileRecord {
    /// `true` if `id` is owned by this file, transitively (descendant of a
    /// top-level element, not just a direct top-level element itself).
    fn owns(&self, project: &Project, id: &str) -> bool {
        fn walk(project: &Project, current: &str, target: &str) -> bool {
            if current == target {
                return true;
            }
            project
                .get(current)
                .map(|el| el.children.iter().any(|c| walk(project, c, target)))
                .unwrap_or(false)
        }
        self.elements.iter().any(|top| walk(project, top, id))
    }
}

/// `(importer_path, local_name) -> resolution`, the output of L5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasEntry {
    pub importer_path: String,
    pub local_name: String,
    pub resolution: AliasResolution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AliasResolution {
    /// Resolved to a concrete element (function/class/variable) in a file.
    Definition { element_id: String },
    /// Resolved to a module (file) as a whole, e.g. `import foo` without a
    /// specific member, or an unresolved wildcard re-export.
    Module { path: String },
}
