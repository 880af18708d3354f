use std::sync::Arc;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use echosavvy_auth_types::token::TokenSecret;

use crate::domain::webauthn::RelyingParty;
use crate::infra::db::{DbCartRepository, DbProductRepository, DbUserRepository};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub jwt_secret: TokenSecret,
    pub relying_party: Arc<RelyingParty>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: Arc::clone(&self.db),
        }
    }

    pub fn product_repo(&self) -> DbProductRepository {
        DbProductRepository {
            db: Arc::clone(&self.db),
        }
    }

    pub fn cart_repo(&self) -> DbCartRepository {
        DbCartRepository {
            db: Arc::clone(&self.db),
        }
    }
}

impl FromRef<AppState> for TokenSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}
