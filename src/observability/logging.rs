//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//!
//! # Design Decisions
//! - `RUST_LOG` wins; the configured level is the fallback
//! - Pretty output in development, JSON in production

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to `level` for this crate
/// and tower-http.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ssr_render={level},tower_http={level}")))
}

/// Install the global subscriber.
pub fn init_logging(level: &str, development: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    if development {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    }
}
