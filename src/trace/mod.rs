//! Endpoint/call-site extraction (L7) and full-stack tracing (L8).

pub mod extractor;
pub mod tracer;
