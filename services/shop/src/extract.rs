use axum::extract::FromRequest;

use crate::error::ShopServiceError;

/// `axum::Json` whose rejections render as `MALFORMED_BODY` errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ShopServiceError))]
pub struct ApiJson<T>(pub T);
