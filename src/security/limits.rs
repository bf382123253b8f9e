//! Request limits.
//!
//! Pages never read a request body, so a small cap rejects oversized
//! uploads early with `413 Payload Too Large`.

use tower_http::limit::RequestBodyLimitLayer;

use crate::config::SecurityConfig;

pub fn body_limit(config: &SecurityConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_size)
}
