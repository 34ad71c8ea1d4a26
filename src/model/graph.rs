//! Graph edge labels shared across the alias resolver and call graph builder.
//!
//! We model edges as a compact enum that serializes to snake_case strings,
//! making downstream processing stable and grep-friendly.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Unified graph edge label used by the alias resolver and call graph builder.
///
/// Avoid renaming existing variants, as they are part of exported artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphEdgeLabel {
    /// A file declares an element (ownership edge used by the project index).
    Declares,
    /// An importer references a module or a definition inside it.
    Imports,
    /// A caller element invokes a callee element (call graph, L6).
    Calls,
    /// An endpoint is linked to the call site(s) that invoke it (L7/L8).
    RoutesTo,
}

impl Display for GraphEdgeLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use GraphEdgeLabel::*;
        let s = match self {
            Declares => "declares",
            Imports => "imports",
            Calls => "calls",
            RoutesTo => "routes_to",
        };
        f.write_str(s)
    }
}
