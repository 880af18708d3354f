use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use echosavvy_auth_types::identity::SessionIdentity;
use echosavvy_core::serde::to_rfc3339_ms;
use echosavvy_domain::id::{ProductId, UserId};

use crate::domain::types::CartItem;
use crate::error::ShopServiceError;
use crate::extract::ApiJson;
use crate::state::AppState;
use crate::usecase::cart::{
    AddToCartUseCase, ClearCartUseCase, ListCartUseCase, MergeCartUseCase, MergeLine,
    RemoveCartItemUseCase, UpdateCartItemUseCase,
};

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: i32,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: String,
    pub total_amount: Decimal,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            user_id: item.user_id,
            product_id: item.product_id,
            product_name: item.product_name,
            price: item.price,
            quantity: item.quantity,
            image_url: item.image_url,
            total_amount: item.total_amount,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct CartItemEnvelope {
    pub success: bool,
    pub item: CartItemResponse,
}

fn cart_body(items: Vec<CartItem>) -> Json<Vec<CartItemResponse>> {
    Json(items.into_iter().map(CartItemResponse::from).collect())
}

fn product_id(value: Option<i32>) -> Result<ProductId, ShopServiceError> {
    value
        .map(ProductId)
        .ok_or(ShopServiceError::MissingField("product_id"))
}

// ── GET /api/cart ─────────────────────────────────────────────────────────────

pub async fn list_cart(
    State(state): State<AppState>,
    identity: SessionIdentity,
) -> Result<Json<Vec<CartItemResponse>>, ShopServiceError> {
    let usecase = ListCartUseCase {
        cart: state.cart_repo(),
    };
    let items = usecase.execute(identity.user_id).await?;
    Ok(cart_body(items))
}

// ── POST /api/cart/add ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<i32>,
    pub quantity: Option<i64>,
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    identity: SessionIdentity,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<Json<CartItemEnvelope>, ShopServiceError> {
    let product_id = product_id(body.product_id)?;
    let usecase = AddToCartUseCase {
        products: state.product_repo(),
        cart: state.cart_repo(),
    };
    let item = usecase
        .execute(identity.user_id, product_id, body.quantity.unwrap_or(1))
        .await?;
    Ok(Json(CartItemEnvelope {
        success: true,
        item: item.into(),
    }))
}

// ── PUT /api/cart/update ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCartItemRequest {
    pub product_id: Option<i32>,
    pub quantity: Option<i64>,
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    identity: SessionIdentity,
    ApiJson(body): ApiJson<UpdateCartItemRequest>,
) -> Result<Json<CartItemEnvelope>, ShopServiceError> {
    let product_id = product_id(body.product_id)?;
    let quantity = body
        .quantity
        .ok_or(ShopServiceError::MissingField("quantity"))?;
    let usecase = UpdateCartItemUseCase {
        products: state.product_repo(),
        cart: state.cart_repo(),
    };
    let item = usecase
        .execute(identity.user_id, product_id, quantity)
        .await?;
    Ok(Json(CartItemEnvelope {
        success: true,
        item: item.into(),
    }))
}

// ── DELETE /api/cart/remove ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RemoveCartItemRequest {
    pub product_id: Option<i32>,
}

#[derive(Serialize)]
pub struct RemovedResponse {
    pub success: bool,
    pub message: &'static str,
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    identity: SessionIdentity,
    ApiJson(body): ApiJson<RemoveCartItemRequest>,
) -> Result<Json<RemovedResponse>, ShopServiceError> {
    let product_id = product_id(body.product_id)?;
    let usecase = RemoveCartItemUseCase {
        cart: state.cart_repo(),
    };
    usecase.execute(identity.user_id, product_id).await?;
    Ok(Json(RemovedResponse {
        success: true,
        message: "item removed from cart",
    }))
}

// ── DELETE /api/cart ──────────────────────────────────────────────────────────

pub async fn clear_cart(
    State(state): State<AppState>,
    identity: SessionIdentity,
) -> Result<StatusCode, ShopServiceError> {
    let usecase = ClearCartUseCase {
        cart: state.cart_repo(),
    };
    usecase.execute(identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /api/cart/merge ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MergeCartLine {
    pub product_id: Option<i32>,
    pub quantity: Option<i64>,
}

#[derive(Deserialize)]
pub struct MergeCartRequest {
    pub items: Option<Vec<MergeCartLine>>,
}

pub async fn merge_cart(
    State(state): State<AppState>,
    identity: SessionIdentity,
    ApiJson(body): ApiJson<MergeCartRequest>,
) -> Result<Json<Vec<CartItemResponse>>, ShopServiceError> {
    let lines = body
        .items
        .ok_or(ShopServiceError::MissingField("items"))?
        .into_iter()
        .map(|line| {
            Ok(MergeLine {
                product_id: product_id(line.product_id)?,
                quantity: line.quantity.unwrap_or(1),
            })
        })
        .collect::<Result<Vec<_>, ShopServiceError>>()?;

    let usecase = MergeCartUseCase {
        products: state.product_repo(),
        cart: state.cart_repo(),
    };
    let items = usecase.execute(identity.user_id, lines).await?;
    Ok(cart_body(items))
}
