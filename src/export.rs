//! Serializes the stable wire-form trace output (`spec.md` §6).

use crate::model::trace::WorkflowTrace;
use anyhow::{Context, Result};

/// Render a set of workflow traces as pretty-printed JSON, in the exact array
/// shape hosts consume: `[{"workflow_name", "endpoint", "python_trace",
/// "javascript_trace"}, ...]`.
///
/// Re-running the tracer on an unchanged `Project` and serializing the result
/// through this function produces byte-identical output, since both the
/// tracer's workflow ordering and `serde_json`'s struct field ordering are
/// stable.
pub fn to_json(workflows: &[WorkflowTrace]) -> Result<String> {
    serde_json::to_string_pretty(workflows).context("serialize workflow traces")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trace_set_serializes_to_empty_array() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }
}
