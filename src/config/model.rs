//! Configuration data structures for the tracing pipeline.
//!
//! Split into logical groups the way the teacher splits its own config:
//! - [`TraceConfig`]: top-level container
//! - [`Filters`]: which files to include/exclude
//! - [`Limits`]: size limits
//!
//! All structs are `serde`-friendly so a host can load them from JSON/YAML.

use crate::model::project::ParserKind;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    pub filters: Filters,
    pub limits: Limits,
    /// Extension (lowercase, no dot) -> parser family. Extensions absent from
    /// this map are classified by [`Filters::default_script_extensions`] etc.
    /// via [`crate::core::classify`].
    pub parser_mapping: BTreeMap<String, ParserKind>,
    /// Prefix stripped/matched when normalizing backend route paths and
    /// frontend call paths onto the same namespace (`spec.md` §4.9).
    pub api_prefix: String,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            limits: Limits::default(),
            parser_mapping: default_parser_mapping(),
            api_prefix: "/api".to_string(),
        }
    }
}

impl TraceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_file_bytes == 0 {
            return Err(anyhow!("max_file_bytes must be greater than 0"));
        }
        Ok(())
    }
}

fn default_parser_mapping() -> BTreeMap<String, ParserKind> {
    let mut m = BTreeMap::new();
    for ext in ["py", "pyw"] {
        m.insert(ext.to_string(), ParserKind::Script);
    }
    for ext in ["js", "jsx", "mjs", "cjs", "ts", "tsx"] {
        m.insert(ext.to_string(), ParserKind::WebScript);
    }
    for ext in ["html", "htm"] {
        m.insert(ext.to_string(), ParserKind::Markup);
    }
    m
}

/// File filtering rules (`spec.md` §6 Configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filters {
    pub ignored_directories: Vec<String>,
    pub ignored_file_extensions: Vec<String>,
    pub ignored_files: Vec<String>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            ignored_directories: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "__pycache__".to_string(),
                "venv".to_string(),
                "dist".to_string(),
                "build".to_string(),
            ],
            ignored_file_extensions: vec![],
            ignored_files: vec![],
        }
    }
}

/// Size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// A file larger than this is reported as `FileUnreadable` rather than parsed.
    pub max_file_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_bytes: 2 * 1024 * 1024,
        }
    }
}
