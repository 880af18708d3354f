//! Session types for EchoSavvy.
//!
//! Provides JWT issue/validation and the `SessionIdentity` bearer extractor.

pub mod identity;
pub mod token;
