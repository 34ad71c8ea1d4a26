//! Stable identifiers and content hashing utilities.
//!
//! - UUID v5 (namespace/name-based) for deterministic `stable_id`s, so that
//!   re-parsing byte-identical content always produces the same id;
//! - a dependency-free FNV-1a 64-bit hash for cheap unchanged-file detection.

use crate::model::element::ElementKind;
use uuid::Uuid;

/// Compute a deterministic UUID v5 from a logical key.
#[inline]
pub fn uuid_v5_from_key(key: &str) -> String {
    Uuid::new_v5(&Uuid::nil(), key.as_bytes()).to_string()
}

/// Stable element id: repo-relative path + qualified name + kind + normalized
/// content, per the content-addressed identity strategy.
///
/// `qualified_name` should be the dotted path from the file root (e.g.
/// `MyClass.my_method`), so that two same-named siblings in different scopes
/// still get distinct ids.
pub fn element_id(
    repo_rel_path: &str,
    qualified_name: &str,
    kind: ElementKind,
    normalized_content: &str,
) -> String {
    let key = format!(
        "elem|{}|{}|{:?}|{}",
        repo_rel_path,
        qualified_name,
        kind,
        hash_content(normalized_content.as_bytes())
    );
    uuid_v5_from_key(&key)
}

/// Stable file id: normalized repo-relative path.
pub fn file_id(repo_rel_path: &str) -> String {
    uuid_v5_from_key(&format!("file|{repo_rel_path}"))
}

/// FNV-1a 64-bit content hash as a lowercase hex string.
pub fn hash_content(bytes: &[u8]) -> String {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_id() {
        let a = element_id("app/views.py", "index", ElementKind::Function, "def index(): pass");
        let b = element_id("app/views.py", "index", ElementKind::Function, "def index(): pass");
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_produces_different_id() {
        let a = element_id("app/views.py", "index", ElementKind::Function, "def index(): pass");
        let b = element_id("app/views.py", "index", ElementKind::Function, "def index(): return 1");
        assert_ne!(a, b);
    }
}
