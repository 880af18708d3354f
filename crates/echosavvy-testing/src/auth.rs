//! Bearer-session helpers for integration tests.
//!
//! Protected routes expect `Authorization: Bearer <jwt>`. `MockSession` mints a
//! genuine token with the test secret so requests pass the real extractor.

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

use echosavvy_auth_types::token::{TokenSecret, issue_session_token};
use echosavvy_domain::id::UserId;

/// Secret shared by test state and test tokens.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

pub fn test_secret() -> TokenSecret {
    TokenSecret::new(TEST_JWT_SECRET)
}

/// Configurable shopper identity injected into test requests.
pub struct MockSession {
    pub user_id: UserId,
    pub username: String,
}

impl MockSession {
    pub fn new(user_id: i32, username: &str) -> Self {
        Self {
            user_id: UserId(user_id),
            username: username.to_owned(),
        }
    }

    /// A session token signed with [`TEST_JWT_SECRET`].
    pub fn token(&self) -> String {
        issue_session_token(self.user_id, &self.username, &test_secret())
            .expect("sign test token")
            .0
    }

    /// `Authorization: Bearer …` value for this session.
    pub fn bearer(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", self.token())).expect("header value")
    }

    /// Return headers as a logged-in client would send them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, self.bearer());
        map
    }
}
