//! Service plumbing shared by EchoSavvy binaries: config loading, tracing,
//! request ids and wire-format helpers.

pub mod config;
pub mod middleware;
pub mod serde;
pub mod tracing;
