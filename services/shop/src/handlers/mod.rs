pub mod auth;
pub mod cart;
pub mod health;
pub mod products;

use crate::error::ShopServiceError;

/// Trimmed value of a required string field; absent or blank is `MISSING_FIELDS`.
pub(crate) fn required(
    value: Option<String>,
    field: &'static str,
) -> Result<String, ShopServiceError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(ShopServiceError::MissingField(field))
}
