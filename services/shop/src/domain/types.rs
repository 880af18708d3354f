use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use echosavvy_domain::credential::CredentialId;
use echosavvy_domain::id::{ProductId, UserId};

use crate::error::ShopServiceError;

/// Login challenge time-to-live in seconds.
pub const CHALLENGE_TTL_SECS: i64 = 60;

/// Largest quantity accepted in a single cart request.
pub const MAX_QUANTITY: i64 = 999;

/// Registered shopper with their stored credential.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub phone: String,
    pub credential_id: CredentialId,
    /// SPKI DER, base64url.
    pub public_key: String,
    pub challenge: Option<String>,
    pub challenge_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The outstanding challenge, if one was issued and has not expired.
    pub fn live_challenge(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.challenge, self.challenge_expires_at) {
            (Some(challenge), Some(expires_at)) if expires_at > now => Some(challenge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub phone: String,
    pub credential_id: CredentialId,
    pub public_key: String,
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub description: String,
    pub image_url: String,
}

/// A line in a shopper's server-side cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: i32,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `price × quantity`, exact.
pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Accept a requested quantity in `1..=MAX_QUANTITY`.
pub fn validate_quantity(quantity: i64) -> Result<i32, ShopServiceError> {
    if (1..=MAX_QUANTITY).contains(&quantity) {
        i32::try_from(quantity).map_err(|_| ShopServiceError::InvalidQuantity)
    } else {
        Err(ShopServiceError::InvalidQuantity)
    }
}
