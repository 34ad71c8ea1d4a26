//! Black-box scenario tests exercising the public pipeline end to end.

use fullstack_trace::config::TraceConfig;
use fullstack_trace::{build_project, export, trace_full_stack};

fn files(pairs: &[(&str, &str)]) -> Vec<(String, Vec<u8>)> {
    pairs.iter().map(|(p, c)| (p.to_string(), c.as_bytes().to_vec())).collect()
}

const BACKEND: &str = r#"
@app.route("/api/users/<id>", methods=["GET"])
def get_user(id):
    return fetch_user(id)

def fetch_user(id):
    return {"id": id}
"#;

const FRONTEND: &str = r#"
function loadUser(userId) {
    fetch(`/api/users/${userId}`);
}

document.addEventListener('DOMContentLoaded', function() {
    const button = document.getElementById('load-btn');
    button.addEventListener('click', loadUser);
});
"#;

#[test]
fn traces_a_button_click_through_to_its_backend_handler() {
    let config = TraceConfig::default();
    let project = build_project(&files(&[("app/views.py", BACKEND), ("static/app.js", FRONTEND)]), &config).expect("build_project");

    assert!(project.files.iter().any(|f| f.path == "app/views.py"));
    assert!(project.files.iter().any(|f| f.path == "static/app.js"));

    let workflows = trace_full_stack(&project, &config);
    assert_eq!(workflows.len(), 1, "expected exactly one matched workflow, got {workflows:?}");

    let workflow = &workflows[0];
    assert_eq!(workflow.endpoint.name, "get_user");
    assert_eq!(workflow.endpoint.path, "app/views.py");
    assert_eq!(workflow.python_trace.name, "get_user");
    // the backend call subtree follows `get_user` into `fetch_user`
    assert!(workflow.python_trace.callees.iter().any(|c| c.name == "fetch_user"));
}

#[test]
fn re_running_the_tracer_on_an_unchanged_project_is_deterministic() {
    let config = TraceConfig::default();
    let project = build_project(&files(&[("app/views.py", BACKEND), ("static/app.js", FRONTEND)]), &config).expect("build_project");

    let first = export::to_json(&trace_full_stack(&project, &config)).expect("serialize");
    let second = export::to_json(&trace_full_stack(&project, &config)).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn mutual_recursion_is_cut_with_a_recursive_marker_instead_of_looping_forever() {
    const MUTUALLY_RECURSIVE: &str = r#"
@app.route("/api/ping", methods=["GET"])
def ping():
    return pong()

def pong():
    return ping()
"#;
    let config = TraceConfig::default();
    let project = build_project(&files(&[("app/views.py", MUTUALLY_RECURSIVE)]), &config).expect("build_project");
    let aliases = fullstack_trace::resolve::alias::resolve_aliases(&project);
    let graph = fullstack_trace::resolve::call_graph::build_call_graph(&project, &aliases);
    assert_eq!(graph.edge_count(), 2, "ping->pong and pong->ping");

    let endpoints = fullstack_trace::trace::extractor::extract_endpoints(&project, &config);
    assert_eq!(endpoints.len(), 1);
}

#[test]
fn unresolved_imports_do_not_abort_the_project() {
    const SRC: &str = "from nonexistent.module import whatever\n\ndef handler():\n    return whatever()\n";
    let config = TraceConfig::default();
    let project = build_project(&files(&[("app/views.py", SRC)]), &config).expect("build_project should still commit");
    assert!(project.files.iter().any(|f| f.path == "app/views.py"));
}

#[test]
fn files_in_ignored_directories_are_skipped_without_error() {
    let config = TraceConfig::default();
    let project = build_project(
        &files(&[("node_modules/left-pad/index.js", "function pad() {}"), ("src/app.js", "function main() {}")]),
        &config,
    )
    .expect("build_project");

    assert_eq!(project.files.len(), 1);
    assert_eq!(project.files[0].path, "src/app.js");
}

#[test]
fn invalid_utf8_files_are_skipped_while_the_rest_of_the_project_still_commits() {
    let config = TraceConfig::default();
    let mut bad_bytes = b"def broken(".to_vec();
    bad_bytes.extend_from_slice(&[0xff, 0xfe]);
    let input = vec![
        ("app/broken.py".to_string(), bad_bytes),
        ("app/fine.py".to_string(), b"def fine():\n    pass\n".to_vec()),
    ];

    let project = build_project(&input, &config).expect("build_project");
    assert_eq!(project.files.len(), 1);
    assert_eq!(project.files[0].path, "app/fine.py");
}
