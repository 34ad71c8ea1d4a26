//! Endpoint / call-site (L7) and full-stack trace (L8) wire types.

use serde::{Deserialize, Serialize};

/// A backend route definition discovered in a script file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub element_id: String,
    pub method: String,
    /// Path with `{param}` segments normalized to `{VAR}`.
    pub path: String,
}

/// A frontend HTTP call discovered in a web-script file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    pub element_id: String,
    pub method: String,
    /// Path with `${expr}` segments normalized to `{VAR}`.
    pub path: String,
    pub library: String,
}

/// The `{id, name, kind, path}` shape shared by the `endpoint` summary and
/// every `TraceNode` (`spec.md` §6) — `path` is the repo-relative path of the
/// file that owns the referenced element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRef {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub path: String,
}

/// The DOM trigger a frontend trace node bottoms out at, when its content
/// names a known DOM element definition in the same file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomTrigger {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub selector: String,
}

/// One full-stack workflow: a DOM trigger, through the frontend call chain,
/// across the network, into the backend handler subtree.
///
/// This is the stable wire form produced by the tracer (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTrace {
    pub workflow_name: String,
    pub endpoint: ElementRef,
    pub python_trace: TraceNode,
    pub javascript_trace: Vec<TraceNode>,
}

/// One node in a trace tree. A node is one of three shapes, modeled as one
/// struct with fields omitted by shape: *full* (`callers`/`callees`
/// populated, optionally `triggered_by_dom_element`), *reference*
/// (`is_reference: true`, no callers/callees), or *recursive*
/// (`recursive: true`, no callers/callees).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceNode {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callers: Vec<TraceNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callees: Vec<TraceNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by_dom_element: Option<DomTrigger>,
    /// `true` if this node's subtree was already expanded elsewhere in the
    /// same trace and is shown here as a leaf reference instead of repeating it.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_reference: bool,
    /// `true` if expanding this node would re-enter an ancestor already being
    /// traced (a cycle); the node is cut here instead of recursing forever.
    #[serde(default, skip_serializing_if = "is_false")]
    pub recursive: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}
