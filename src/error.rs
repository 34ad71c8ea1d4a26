//! The error taxonomy surfaced to hosts. Internal plumbing still uses
//! `anyhow::Result`, the way the teacher pipeline does; this enum exists so a
//! host can `match` on *why* a file or project failed rather than parsing a
//! message string.

use crate::model::project::ParserKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("file unreadable: {path}")]
    FileUnreadable { path: String, #[source] source: std::io::Error },

    #[error("no parser available for {parser:?}")]
    ParserUnavailable { parser: ParserKind },

    /// Recoverable: the file becomes a single `error` element instead of a
    /// parsed tree, and the project as a whole still commits.
    #[error("parser error in {path}: {message}")]
    ParserError { path: String, message: String },

    #[error("unresolved import `{name}` in {importer}")]
    UnresolvedImport { importer: String, name: String },

    /// Fatal: the whole parse aborts, no partial project is committed.
    #[error("invariant violation in {path}: {message}")]
    InvariantViolation { path: String, message: String },
}
