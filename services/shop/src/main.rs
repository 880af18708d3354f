use std::sync::Arc;

use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use echosavvy_auth_types::token::TokenSecret;
use echosavvy_core::config::Config as _;
use echosavvy_core::tracing::init_tracing;
use echosavvy_shop::config::ShopConfig;
use echosavvy_shop::domain::webauthn::RelyingParty;
use echosavvy_shop::router::build_router;
use echosavvy_shop::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("shop");

    let config = ShopConfig::from_env().context("load shop configuration")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let relying_party = RelyingParty::new(config.webauthn_rp_id, &config.allowed_origins)
        .context("invalid ALLOWED_ORIGINS")?;

    let state = AppState {
        db: Arc::new(db),
        jwt_secret: TokenSecret::new(config.jwt_secret),
        relying_party: Arc::new(relying_party),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.shop_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("shop service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
