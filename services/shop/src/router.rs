use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use url::Origin;

use echosavvy_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    auth::{get_challenge, login, register_challenge, signup},
    cart::{
        add_to_cart, clear_cart, list_cart, merge_cart, remove_cart_item, update_cart_item,
    },
    health::{healthz, readyz},
    products::{get_product, list_products},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.relying_party.origins());

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Credentials and session
        .route("/api/register-challenge", post(register_challenge))
        .route("/api/signup", post(signup))
        .route("/api/get-challenge", post(get_challenge))
        .route("/api/login", post(login))
        // Catalog
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        // Cart
        .route("/api/cart", get(list_cart).delete(clear_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/update", put(update_cart_item))
        .route("/api/cart/remove", delete(remove_cart_item))
        .route("/api/cart/merge", post(merge_cart))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[Origin]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(&origin.ascii_serialization()).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
