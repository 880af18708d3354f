use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Shop service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ShopServiceError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("quantity must be between 1 and 999")]
    InvalidQuantity,
    #[error("credential id is not valid base64")]
    InvalidCredentialId,
    #[error("public key is not a supported P-256 credential")]
    InvalidPublicKey,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("challenge expired or already used")]
    ChallengeExpired,
    #[error("assertion verification failed")]
    InvalidAssertion,
    #[error("user not found")]
    UserNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("cart item not found")]
    CartItemNotFound,
    #[error("username already taken")]
    UsernameTaken,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ShopServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELDS",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::InvalidCredentialId => "INVALID_CREDENTIAL_ID",
            Self::InvalidPublicKey => "INVALID_PUBLIC_KEY",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::ChallengeExpired => "CHALLENGE_EXPIRED",
            Self::InvalidAssertion => "INVALID_ASSERTION",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::CartItemNotFound => "CART_ITEM_NOT_FOUND",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_)
            | Self::MalformedBody(_)
            | Self::InvalidQuantity
            | Self::InvalidCredentialId
            | Self::InvalidPublicKey
            | Self::UsernameTaken => StatusCode::BAD_REQUEST,
            Self::InvalidCredential | Self::ChallengeExpired | Self::InvalidAssertion => {
                StatusCode::UNAUTHORIZED
            }
            Self::UserNotFound | Self::ProductNotFound | Self::CartItemNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ShopServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ShopServiceError {
    fn into_response(self) -> Response {
        // Only 500s are logged here; TraceLayer already records every request's status.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), axum::Json(body)).into_response()
    }
}
