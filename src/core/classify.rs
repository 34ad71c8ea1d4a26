//! L1 Source Classifier: decides which parser family (if any) owns a file.

use crate::config::TraceConfig;
use crate::core::normalize::{extension_of, normalize_rel_path};
use crate::model::project::ParserKind;

/// Classify a single repo-relative path.
///
/// Returns `None` when the path should not be parsed at all: it falls under
/// an ignored directory, an ignored filename, an ignored extension, or an
/// extension with no configured parser mapping. None of these are errors —
/// they are simply outside this crate's input set, mirroring `spec.md`
/// §4.1's "silently skip" behavior for unrecognized files.
pub fn classify(path: &str, config: &TraceConfig) -> Option<ParserKind> {
    let rel = normalize_rel_path(path);

    if is_in_ignored_directory(&rel, &config.filters.ignored_directories) {
        return None;
    }

    let file_name = rel.rsplit('/').next().unwrap_or(&rel);
    if config
        .filters
        .ignored_files
        .iter()
        .any(|ignored| ignored == file_name || ignored == &rel)
    {
        return None;
    }

    let ext = extension_of(&rel)?;
    if config.filters.ignored_file_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
        return None;
    }

    config.parser_mapping.get(&ext).copied()
}

fn is_in_ignored_directory(rel_path: &str, ignored_dirs: &[String]) -> bool {
    rel_path
        .split('/')
        .rev()
        .skip(1) // the file name itself is never a directory component
        .any(|segment| ignored_dirs.iter().any(|d| d == segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_extensions_to_parser_families() {
        let cfg = TraceConfig::default();
        assert_eq!(classify("app/views.py", &cfg), Some(ParserKind::Script));
        assert_eq!(classify("src/app.jsx", &cfg), Some(ParserKind::WebScript));
        assert_eq!(classify("templates/index.html", &cfg), Some(ParserKind::Markup));
    }

    #[test]
    fn skips_ignored_directories() {
        let cfg = TraceConfig::default();
        assert_eq!(classify("node_modules/left-pad/index.js", &cfg), None);
    }

    #[test]
    fn skips_unknown_extensions() {
        let cfg = TraceConfig::default();
        assert_eq!(classify("README.md", &cfg), None);
    }

    #[test]
    fn skips_explicitly_ignored_files() {
        let mut cfg = TraceConfig::default();
        cfg.filters.ignored_files.push("settings.py".to_string());
        assert_eq!(classify("app/settings.py", &cfg), None);
    }
}
