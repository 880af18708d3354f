//! Authenticator credential identifiers.
//!
//! Browsers hand the same credential id back in two spellings: `PublicKeyCredential.id`
//! is base64url without padding, while clients that encode `rawId` themselves usually
//! produce standard padded base64. [`CredentialId`] stores one canonical form so the
//! two compare equal.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

/// Errors returned when parsing binary fields sent as base64 text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("empty value")]
    Empty,
    #[error("not valid base64")]
    InvalidBase64,
}

/// Decode base64 text in either the standard or the url-safe alphabet,
/// with or without `=` padding.
pub fn decode_base64_lenient(value: &str) -> Result<Vec<u8>, EncodingError> {
    let trimmed = value.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(EncodingError::Empty);
    }
    let engine = if trimmed.contains(|c| c == '+' || c == '/') {
        &STANDARD_NO_PAD
    } else {
        &URL_SAFE_NO_PAD
    };
    engine
        .decode(trimmed)
        .map_err(|_| EncodingError::InvalidBase64)
}

/// Encode bytes as unpadded base64url, the canonical wire form.
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Canonical (unpadded base64url) credential identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(String);

impl CredentialId {
    /// Parse a credential id in any accepted base64 spelling.
    pub fn parse(value: &str) -> Result<Self, EncodingError> {
        let bytes = decode_base64_lenient(value)?;
        Ok(Self(encode_base64url(&bytes)))
    }

    /// Wrap a value already stored in canonical form.
    pub fn from_canonical(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
