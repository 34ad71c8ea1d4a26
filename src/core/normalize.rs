//! Path normalization helpers.
//!
//! The crate never walks the filesystem itself (the host does); these helpers
//! only operate on the repo-relative path strings the host hands in, so they
//! stay stable and portable across platforms without needing `dunce` or a
//! glob-matching crate.

/// Replace OS-specific separators with `/`.
///
/// # Example
/// ```
/// use fullstack_trace::core::normalize::to_unix_sep;
///
/// assert_eq!(to_unix_sep(r"src\views\index.py"), "src/views/index.py");
/// ```
pub fn to_unix_sep<S: AsRef<str>>(s: S) -> String {
    s.as_ref().replace('\\', "/")
}

/// Normalize a repo-relative path: unify separators and strip a leading `./`.
///
/// # Example
/// ```
/// use fullstack_trace::core::normalize::normalize_rel_path;
///
/// assert_eq!(normalize_rel_path("./src/app.py"), "src/app.py");
/// assert_eq!(normalize_rel_path(r".\src\app.py"), "src/app.py");
/// ```
pub fn normalize_rel_path<S: AsRef<str>>(s: S) -> String {
    let unified = to_unix_sep(s);
    unified.strip_prefix("./").map(str::to_string).unwrap_or(unified)
}

/// Extension of a repo-relative path, lowercased, without the leading dot.
///
/// # Example
/// ```
/// use fullstack_trace::core::normalize::extension_of;
///
/// assert_eq!(extension_of("src/app.PY"), Some("py".to_string()));
/// assert_eq!(extension_of("Makefile"), None);
/// ```
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || !file_name.contains('.') {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
