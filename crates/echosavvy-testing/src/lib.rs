//! Test utilities for EchoSavvy services.
//!
//! Provides `MockSession` (bearer headers for a fake shopper) and
//! `TestAuthenticator` (a software ES256 authenticator that produces real
//! registration keys and login assertions).
//! Dev-dependency only.

pub mod auth;
pub mod authenticator;
