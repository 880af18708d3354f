#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use echosavvy_domain::id::{ProductId, UserId};

use crate::domain::types::{CartItem, NewUser, Product, User};
use crate::error::ShopServiceError;

/// Repository for shoppers and their login state.
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ShopServiceError>;

    /// Insert a new user. A unique-index collision yields `UsernameTaken`.
    async fn create(&self, user: &NewUser) -> Result<UserId, ShopServiceError>;

    /// Replace any outstanding challenge.
    async fn set_challenge(
        &self,
        id: UserId,
        challenge: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ShopServiceError>;

    /// Clear the challenge if it is still `challenge` and unexpired at `now`.
    /// Returns `true` if this call consumed it.
    async fn consume_challenge(
        &self,
        id: UserId,
        challenge: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError>;

    /// Record the last-issued session token.
    async fn set_token(&self, id: UserId, token: &str) -> Result<(), ShopServiceError>;
}

/// Read-only access to the product catalog.
pub trait ProductRepository: Send + Sync {
    /// All products ordered by id.
    async fn list(&self) -> Result<Vec<Product>, ShopServiceError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ShopServiceError>;

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ShopServiceError>;
}

/// Repository for per-user cart lines.
pub trait CartRepository: Send + Sync {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<CartItem>, ShopServiceError>;

    async fn find(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, ShopServiceError>;

    /// Insert the line or add `quantity` to the existing one, refreshing catalog
    /// fields and the total. Returns the resulting row.
    async fn add(
        &self,
        user_id: UserId,
        product: &Product,
        quantity: i32,
    ) -> Result<CartItem, ShopServiceError>;

    /// Overwrite quantity and total on an existing line.
    async fn set_quantity(
        &self,
        user_id: UserId,
        product: &Product,
        quantity: i32,
    ) -> Result<(), ShopServiceError>;

    /// Delete a line. Returns `true` if a row was removed.
    async fn remove(&self, user_id: UserId, product_id: ProductId)
    -> Result<bool, ShopServiceError>;

    /// Delete every line for the user. Returns the number removed.
    async fn clear(&self, user_id: UserId) -> Result<u64, ShopServiceError>;
}
