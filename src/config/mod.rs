//! Configuration loader and validator.
//!
//! Unlike the teacher's `GraphConfig`, there is no `load_from_env_or_default`:
//! environment/file loading is a host concern (this crate performs no I/O of
//! its own), so the host is expected to build [`TraceConfig`] directly.

pub mod model;

pub use model::TraceConfig;
