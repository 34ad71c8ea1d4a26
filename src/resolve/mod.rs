//! Cross-file resolution stages (L5 alias resolver, L6 call graph builder).

pub mod alias;
pub mod call_graph;
