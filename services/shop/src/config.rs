use serde::Deserialize;

use echosavvy_core::config::Config;

/// Shop service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct ShopConfig {
    /// MySQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    /// WebAuthn relying-party ID (default "localhost"). Env var: `WEBAUTHN_RP_ID`.
    #[serde(default = "default_rp_id")]
    pub webauthn_rp_id: String,
    /// Frontend origins, comma separated. Used for CORS and the WebAuthn origin check.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// TCP port to listen on (default 8082). Env var: `SHOP_PORT`.
    #[serde(default = "default_shop_port")]
    pub shop_port: u16,
}

impl Config for ShopConfig {}

fn default_rp_id() -> String {
    "localhost".to_owned()
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:5173",
        "http://localhost:5174",
        "http://localhost:5175",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

fn default_shop_port() -> u16 {
    8082
}
