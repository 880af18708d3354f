//! Session JWT issue and validation.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use echosavvy_domain::id::UserId;

/// Session token lifetime in seconds (3 days).
pub const SESSION_TOKEN_TTL_SECS: u64 = 3 * 24 * 60 * 60;

/// HMAC secret used to sign and verify session tokens.
///
/// Handlers never see the raw string; the extractor pulls it out of
/// application state via `FromRef`.
#[derive(Clone)]
pub struct TokenSecret(Arc<str>);

impl TokenSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenSecret(..)")
    }
}

/// Shopper identity extracted from a validated session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: UserId,
    pub username: String,
    pub exp: u64,
}

/// Errors returned by [`validate_session_token`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `user_id` | custom | `users.id` |
/// | `username` | custom | login name at issue time |
/// | `exp` | `exp` | seconds since epoch |
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i32,
    pub username: String,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Mint an HS256 session token. Returns the token and its expiry.
pub fn issue_session_token(
    user_id: UserId,
    username: &str,
    secret: &TokenSecret,
) -> Result<(String, u64), jsonwebtoken::errors::Error> {
    let exp = now_secs() + SESSION_TOKEN_TTL_SECS;
    let claims = SessionClaims {
        user_id: user_id.0,
        username: username.to_owned(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, exp))
}

/// Validate a bearer token, returning the session identity.
///
/// Validation: HS256, `exp` required and checked with the library's default
/// 60 s leeway.
pub fn validate_session_token(token: &str, secret: &TokenSecret) -> Result<TokenInfo, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(TokenInfo {
        user_id: UserId(data.claims.user_id),
        username: data.claims.username,
        exp: data.claims.exp,
    })
}
