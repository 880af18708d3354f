use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Serialize;

use echosavvy_domain::id::ProductId;

use crate::domain::types::Product;
use crate::error::ShopServiceError;
use crate::state::AppState;
use crate::usecase::catalog::{GetProductUseCase, ListProductsUseCase};

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub description: String,
    pub image: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            category: p.category,
            price: p.price,
            description: p.description,
            image: p.image_url,
        }
    }
}

// ── GET /api/products ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductResponse>,
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, ShopServiceError> {
    let usecase = ListProductsUseCase {
        products: state.product_repo(),
    };
    let products = usecase.execute().await?;
    Ok(Json(ProductListResponse {
        success: true,
        products: products.into_iter().map(ProductResponse::from).collect(),
    }))
}

// ── GET /api/products/{id} ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProductDetailResponse {
    pub success: bool,
    pub product: ProductResponse,
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>, ShopServiceError> {
    // Non-numeric ids cannot name a product.
    let id: ProductId = id.parse().map_err(|_| ShopServiceError::ProductNotFound)?;
    let usecase = GetProductUseCase {
        products: state.product_repo(),
    };
    let product = usecase.execute(id).await?;
    Ok(Json(ProductDetailResponse {
        success: true,
        product: product.into(),
    }))
}
