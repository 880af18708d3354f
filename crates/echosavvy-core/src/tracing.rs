use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directives applied when `RUST_LOG` is unset. SQL statement logging from
/// sqlx is noisy at `info`, so it is held to warnings.
pub const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn,sea_orm=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the JSON stdout subscriber and log which service started.
///
/// Later calls are ignored, so tests may call this freely.
pub fn init_tracing(service: &str) {
    let installed = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_current_span(false))
        .try_init()
        .is_ok();
    if installed {
        ::tracing::info!(service, version = env!("CARGO_PKG_VERSION"), "tracing initialized");
    }
}
