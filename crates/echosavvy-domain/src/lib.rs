//! Domain types shared across EchoSavvy crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; `infra/` converts at the edge.

pub mod credential;
pub mod id;
