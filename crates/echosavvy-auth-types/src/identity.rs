//! `Authorization: Bearer` session extractor.

use axum::Json;
use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::StatusCode;
use http::request::Parts;

use echosavvy_domain::id::UserId;

use crate::token::{AuthError, TokenSecret, validate_session_token};

/// Shopper identity taken from a validated bearer token.
///
/// Returns 401 when the header is absent or not a bearer credential, and 403
/// when the token is present but fails validation (bad signature, malformed,
/// expired).
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: UserId,
    pub username: String,
}

/// Rejection produced by [`SessionIdentity`].
#[derive(Debug, thiserror::Error)]
pub enum SessionRejection {
    #[error("unauthorized")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken(#[source] AuthError),
}

impl SessionRejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingToken => "UNAUTHORIZED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        if let Self::InvalidToken(ref e) = self {
            tracing::debug!(reason = %e, "rejected session token");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for SessionIdentity
where
    S: Send + Sync,
    TokenSecret: FromRef<S>,
{
    type Rejection = SessionRejection;

    // Validate synchronously and hand back a 'static future: axum-core 0.5 declares
    // this method as `fn -> impl Future + Send`, and an `async fn` would capture `parts`.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = TokenSecret::from_ref(state);
        let result = parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .filter(|auth| !auth.token().is_empty())
            .ok_or(SessionRejection::MissingToken)
            .and_then(|auth| {
                validate_session_token(auth.token(), &secret)
                    .map_err(SessionRejection::InvalidToken)
            })
            .map(|info| Self {
                user_id: info.user_id,
                username: info.username,
            });

        async move { result }
    }
}
