//! L8 Full-Stack Tracer.
//!
//! Joins a frontend DOM trigger, through its event listener and the
//! functions it calls, across an HTTP call site, into the matching backend
//! endpoint's call subtree — one [`WorkflowTrace`] per Endpoint, carrying
//! every frontend entry point whose normalized call-site key matches it.
//!
//! The recursive expansion on each side keeps a three-state cache per
//! element: *tracing* (currently on the call stack — expanding it again
//! would recurse forever, so the node is cut and marked `recursive`),
//! *done* (already expanded once elsewhere in this trace document — shown
//! again as a leaf marked `is_reference` instead of repeating the whole
//! subtree), or absent (first visit, expand normally). The cache is shared
//! across `python_trace` and every `javascript_trace` entry of the same
//! workflow, per `spec.md` §4.10.

use crate::config::TraceConfig;
use crate::model::element::{Element, ElementKind};
use crate::model::project::Project;
use crate::model::trace::{CallSite, DomTrigger, ElementRef, Endpoint, TraceNode, WorkflowTrace};
use crate::resolve::call_graph::CallGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, PartialEq, Eq)]
enum CacheState {
    Tracing,
    Done,
}

/// Which side of the stack a node being expanded belongs to — governs the
/// backend "don't expand callees below a `statement_block`" rule and the
/// frontend DOM-trigger short-circuit.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Backend,
    Frontend,
}

struct Tracer<'a> {
    project: &'a Project,
    graph: &'a CallGraph,
    node_of: &'a HashMap<String, NodeIndex>,
    cache: HashMap<String, CacheState>,
}

impl<'a> Tracer<'a> {
    fn trace(&mut self, element_id: &str, side: Side) -> TraceNode {
        let node = self.leaf(element_id);
        match self.cache.get(element_id) {
            Some(CacheState::Tracing) => return TraceNode { recursive: true, ..node },
            Some(CacheState::Done) => return TraceNode { is_reference: true, ..node },
            None => {}
        }

        self.cache.insert(element_id.to_string(), CacheState::Tracing);

        if side == Side::Frontend {
            if let Some(trigger) = self.dom_trigger(element_id) {
                let node = TraceNode { triggered_by_dom_element: Some(trigger), ..node };
                self.cache.insert(element_id.to_string(), CacheState::Done);
                return node;
            }
        }

        let callers = self.expand(element_id, side, Direction::Callers);
        let callees = if side == Side::Backend && self.is_statement_block(element_id) {
            Vec::new()
        } else {
            self.expand(element_id, side, Direction::Callees)
        };

        self.cache.insert(element_id.to_string(), CacheState::Done);
        TraceNode { callers, callees, ..node }
    }

    fn expand(&mut self, element_id: &str, side: Side, direction: Direction) -> Vec<TraceNode> {
        let Some(&idx) = self.node_of.get(element_id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<(String, NodeIndex)> = match direction {
            Direction::Callees => self.graph.edges(idx).map(|e| (self.graph[e.target()].stable_id.clone(), e.target())).collect(),
            Direction::Callers => self
                .graph
                .edges_directed(idx, petgraph::Direction::Incoming)
                .map(|e| (self.graph[e.source()].stable_id.clone(), e.source()))
                .collect(),
        };
        neighbors.sort_by(|a, b| a.0.cmp(&b.0));
        neighbors.into_iter().map(|(id, _)| self.trace(&id, side)).collect()
    }

    fn is_statement_block(&self, element_id: &str) -> bool {
        self.node_of.get(element_id).map(|&idx| self.graph[idx].kind == ElementKind::StatementBlock).unwrap_or(false)
    }

    /// Frontend-only: if this element is a generic `expression statement`
    /// whose content names a `dom_element_definition` from the same file,
    /// it is the DOM trigger this trace bottoms out at.
    fn dom_trigger(&self, element_id: &str) -> Option<DomTrigger> {
        let element = self.node_of.get(element_id).map(|&idx| &self.graph[idx])?;
        if element.kind != ElementKind::GenericBlock || element.metadata_str("node_kind") != Some("expression statement") {
            return None;
        }
        let file_path = project_file_path_of(self.project, element_id)?;
        for dom_element in self.project.elements.values() {
            if dom_element.kind != ElementKind::DomElementDefinition {
                continue;
            }
            if project_file_path_of(self.project, &dom_element.stable_id).as_deref() != Some(file_path.as_str()) {
                continue;
            }
            if !dom_element.name.is_empty() && element.content.contains(&dom_element.name) {
                let selector = dom_element.metadata_str("selector").unwrap_or_default().to_string();
                return Some(DomTrigger {
                    id: dom_element.stable_id.clone(),
                    name: dom_element.name.clone(),
                    kind: kind_str(dom_element.kind),
                    selector,
                });
            }
        }
        None
    }

    fn leaf(&self, element_id: &str) -> TraceNode {
        let element = self.node_of.get(element_id).map(|&idx| &self.graph[idx]).cloned().unwrap_or_else(|| placeholder(element_id));
        let path = project_file_path_of(self.project, &element.stable_id).unwrap_or_default();
        TraceNode {
            id: element.stable_id.clone(),
            name: element.name.clone(),
            kind: kind_str(element.kind),
            path,
            callers: Vec::new(),
            callees: Vec::new(),
            triggered_by_dom_element: None,
            is_reference: false,
            recursive: false,
        }
    }
}

enum Direction {
    Callers,
    Callees,
}

fn placeholder(element_id: &str) -> Element {
    Element {
        stable_id: element_id.to_string(),
        kind: ElementKind::Error,
        name: String::new(),
        start_line: 0,
        end_line: 0,
        content: String::new(),
        metadata: Default::default(),
        parent: None,
        children: vec![],
    }
}

/// Serialize an `ElementKind` the same way the wire format does (snake_case),
/// for embedding in `TraceNode`/`ElementRef`/`DomTrigger`.
fn kind_str(kind: ElementKind) -> String {
    serde_json::to_value(kind).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default()
}

/// Build one `WorkflowTrace` per Endpoint, with `javascript_trace` containing
/// one node per distinct frontend function whose normalized call-site key
/// matches that endpoint (`spec.md` §4.10).
pub fn trace_full_stack(project: &Project, graph: &CallGraph, _config: &TraceConfig, endpoints: &[Endpoint], call_sites: &[CallSite]) -> Vec<WorkflowTrace> {
    let node_of: HashMap<String, NodeIndex> = graph.node_indices().map(|idx| (graph[idx].stable_id.clone(), idx)).collect();

    let mut workflows = Vec::new();
    for endpoint in endpoints {
        let matching: Vec<&CallSite> = call_sites.iter().filter(|cs| endpoint_key(endpoint) == call_site_key(cs)).collect();
        if matching.is_empty() {
            continue;
        }

        let mut tracer = Tracer { project, graph, node_of: &node_of, cache: HashMap::new() };
        let python_trace = tracer.trace(&endpoint.element_id, Side::Backend);

        let mut trigger_ids: Vec<String> = matching.iter().map(|cs| find_trigger(project, &cs.element_id).unwrap_or_else(|| cs.element_id.clone())).collect();
        trigger_ids.sort();
        trigger_ids.dedup();
        let javascript_trace: Vec<TraceNode> = trigger_ids.iter().map(|id| tracer.trace(id, Side::Frontend)).collect();

        let endpoint_ref = element_ref(project, &endpoint.element_id);
        let trigger_name = trigger_ids.first().and_then(|id| project.get(id)).map(|e| e.name.clone()).unwrap_or_else(|| endpoint.element_id.clone());

        workflows.push(WorkflowTrace {
            workflow_name: format!("{trigger_name} -> {} {}", endpoint.method, endpoint.path),
            endpoint: endpoint_ref,
            python_trace,
            javascript_trace,
        });
    }

    // Deterministic output ordering: same input always yields the same
    // workflow order, independent of HashMap iteration.
    workflows.sort_by(|a, b| a.workflow_name.cmp(&b.workflow_name));
    workflows
}

fn endpoint_key(endpoint: &Endpoint) -> String {
    format!("{} {}", endpoint.method.to_ascii_uppercase(), endpoint.path)
}

fn call_site_key(call_site: &CallSite) -> String {
    format!("{} {}", call_site.method.to_ascii_uppercase(), call_site.path)
}

fn element_ref(project: &Project, element_id: &str) -> ElementRef {
    let element = project.get(element_id);
    ElementRef {
        id: element_id.to_string(),
        name: element.map(|e| e.name.clone()).unwrap_or_default(),
        kind: element.map(|e| kind_str(e.kind)).unwrap_or_default(),
        path: project_file_path_of(project, element_id).unwrap_or_default(),
    }
}

/// Find the `event_listener` element, in the same file as the function
/// owning `call_site_element_id`, whose `handler_name` metadata names that
/// function — the DOM trigger that eventually leads to this HTTP call.
fn find_trigger(project: &Project, call_site_element_id: &str) -> Option<String> {
    let handler_file = project_file_path_of(project, call_site_element_id)?;
    let handler_name = project.get(call_site_element_id)?.name.clone();

    for element in project.elements.values() {
        if element.kind != ElementKind::EventListener {
            continue;
        }
        let Some(handler) = element.metadata_str("handler_name") else {
            continue;
        };
        if handler != handler_name {
            continue;
        }
        let this_file = project_file_path_of(project, &element.stable_id);
        if this_file.as_deref() == Some(handler_file.as_str()) {
            return Some(element.stable_id.clone());
        }
    }
    None
}

fn project_file_path_of(project: &Project, element_id: &str) -> Option<String> {
    project.files.iter().find(|f| file_owns(project, f, element_id)).map(|f| f.path.clone())
}

fn file_owns(project: &Project, file: &crate::model::project::FileRecord, target: &str) -> bool {
    fn walk(project: &Project, current: &str, target: &str) -> bool {
        if current == target {
            return true;
        }
        project.get(current).map(|el| el.children.iter().any(|c| walk(project, c, target))).unwrap_or(false)
    }
    file.elements.iter().any(|root| walk(project, root, target))
}

/// Exposed for hosts that want to inspect the endpoint/call-site join
/// without running the full recursive expansion.
pub fn matched_pairs(endpoints: &[Endpoint], call_sites: &[CallSite]) -> BTreeMap<String, Vec<String>> {
    let mut pairs: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for endpoint in endpoints {
        let key = endpoint_key(endpoint);
        for call_site in call_sites.iter().filter(|cs| call_site_key(cs) == key) {
            pairs.entry(key.clone()).or_default().push(call_site.element_id.clone());
        }
    }
    pairs
}
