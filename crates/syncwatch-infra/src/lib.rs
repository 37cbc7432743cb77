//! Syncwatch Infrastructure Library
//!
//! Process-wide plumbing shared by the binaries: tracing subscriber setup.

pub mod telemetry;

pub use telemetry::{init_telemetry, LogFormat};
