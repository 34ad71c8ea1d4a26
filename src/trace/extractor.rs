//! L7 Endpoint/Call-site Extractor.
//!
//! Reads the `api_routes` metadata the script parser attaches to route
//! handlers, and the `api_calls` metadata the web-script parser attaches to
//! functions that issue HTTP requests, and normalizes both into the shared
//! `{VAR}` placeholder form so a backend route and a frontend call can be
//! compared structurally.

use crate::config::TraceConfig;
use crate::model::element::ElementKind;
use crate::model::project::Project;
use crate::model::trace::{CallSite, Endpoint};
use regex::Regex;
use std::sync::OnceLock;

fn backend_var_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^}]+\}|<[^>]+>").unwrap())
}

fn frontend_var_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{[^}]+\}").unwrap())
}

/// Normalize a backend route path: any `{param}` or `<param>` segment becomes
/// `{VAR}`.
pub fn normalize_backend_path(path: &str) -> String {
    backend_var_pattern().replace_all(path, "{VAR}").to_string()
}

/// Normalize a frontend template literal path: any `${expr}` segment becomes
/// `{VAR}`. Static strings pass through unchanged.
pub fn normalize_frontend_path(path: &str) -> String {
    frontend_var_pattern().replace_all(path, "{VAR}").to_string()
}

/// Collect every backend route in the project, prefixed with
/// `config.api_prefix` before normalization (`spec.md` §4.9).
pub fn extract_endpoints(project: &Project, config: &TraceConfig) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    for element in project.elements.values() {
        if element.kind != ElementKind::Function {
            continue;
        }
        let Some(routes) = element.metadata.get("api_routes").and_then(|v| v.as_array()) else {
            continue;
        };
        for route in routes {
            let (Some(method), Some(path)) = (route.get("method").and_then(|v| v.as_str()), route.get("path").and_then(|v| v.as_str())) else {
                continue;
            };
            let prefixed = format!("{}{path}", config.api_prefix);
            endpoints.push(Endpoint {
                element_id: element.stable_id.clone(),
                method: method.to_string(),
                path: normalize_backend_path(&prefixed),
            });
        }
    }
    endpoints.sort_by(|a, b| (&a.path, &a.method).cmp(&(&b.path, &b.method)));
    endpoints
}

/// Collect every frontend HTTP call site in the project.
pub fn extract_call_sites(project: &Project) -> Vec<CallSite> {
    let mut call_sites = Vec::new();
    for element in project.elements.values() {
        let Some(sites) = element.metadata.get("api_calls").and_then(|v| v.as_array()) else {
            continue;
        };
        for site in sites {
            let (Some(method), Some(path)) = (site.get("method").and_then(|v| v.as_str()), site.get("path").and_then(|v| v.as_str())) else {
                continue;
            };
            let library = site.get("library").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            call_sites.push(CallSite {
                element_id: element.stable_id.clone(),
                method: method.to_string(),
                path: normalize_frontend_path(path),
                library,
            });
        }
    }
    call_sites.sort_by(|a, b| (&a.path, &a.method, &a.element_id).cmp(&(&b.path, &b.method, &b.element_id)));
    call_sites
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_flask_style_and_brace_style_params() {
        assert_eq!(normalize_backend_path("/users/<id>"), "/users/{VAR}");
        assert_eq!(normalize_backend_path("/users/{id}/posts/{post_id}"), "/users/{VAR}/posts/{VAR}");
    }

    #[test]
    fn normalizes_template_literal_params() {
        assert_eq!(normalize_frontend_path("/api/users/${userId}"), "/api/users/{VAR}");
    }
}
