//! L4 Project Index: merges every parsed file into one [`Project`].
//!
//! A pure function: given the already-enriched per-file element trees, it
//! performs no further mutation besides aggregation, so re-running it on the
//! same input is guaranteed to produce a byte-identical `Project` (modulo the
//! `BTreeMap`/`Vec` ordering guarantees the types already provide).

use crate::model::element::Element;
use crate::model::project::{FileRecord, ParserKind, Project};
use std::collections::BTreeMap;

/// One file's worth of enrichment output, ready to be folded into a [`Project`].
pub struct ParsedFile {
    pub path: String,
    pub parser: ParserKind,
    pub checksum: String,
    pub roots: Vec<String>,
    pub elements: std::collections::HashMap<String, Element>,
}

/// Fold every parsed file into a single [`Project`].
///
/// Files are kept in the order they were supplied; callers that need a
/// deterministic `Project` across runs should supply `files` pre-sorted by
/// path (the pipeline entry point does this).
pub fn build_project(files: Vec<ParsedFile>) -> Project {
    let mut elements = BTreeMap::new();
    let mut records = Vec::with_capacity(files.len());

    for file in files {
        for (id, element) in file.elements {
            elements.insert(id, element);
        }
        records.push(FileRecord {
            path: file.path,
            parser: file.parser,
            checksum: file.checksum,
            elements: file.roots,
        });
    }

    Project { files: records, elements }
}
