//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the render
//! server. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the render server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Defaults applied to every render before per-page options.
    pub render: RenderDefaults,

    /// Development live-reload channel settings.
    pub live_reload: LiveReloadConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request hardening settings.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Contextual defaults for the option normalizer.
///
/// Every render starts from these values; page options override them
/// field by field.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// HTTP status used when a page does not set one.
    pub status: u16,

    /// Folder holding page sources, carried through for page loaders.
    pub page_folder: String,

    /// Consult and populate the render cache.
    pub cache: bool,

    /// Development mode: live reload endpoints and client script.
    pub development: bool,

    /// Append the per-component hydration bundle to the body.
    pub hydrate: bool,

    /// Prefix for static assets. Scripts live under `{static_path}/js`.
    pub static_path: String,

    /// Buffered bytes before the stream renderer flushes a chunk.
    pub flush_threshold: usize,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            status: 200,
            page_folder: "pages".to_string(),
            cache: true,
            development: true,
            hydrate: true,
            static_path: "/static".to_string(),
            flush_threshold: 8 * 1024,
        }
    }
}

/// Live-reload channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Interval between build identifier emissions in milliseconds.
    pub interval_ms: u64,

    /// Reconnect delay advertised to the client in milliseconds.
    pub retry_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            retry_ms: 100,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce response headers, in seconds.
    /// Streamed bodies are not bounded by this.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Require a same-origin Referer on the bootstrap data endpoint.
    pub referer_check: bool,
    /// Add nosniff / frame / referrer-policy response headers.
    pub security_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            referer_check: true,
            security_headers: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.render.status, 200);
        assert_eq!(config.render.page_folder, "pages");
        assert!(config.render.cache);
        assert!(config.render.development);
        assert_eq!(config.live_reload.interval_ms, 500);
        assert_eq!(config.live_reload.retry_ms, 100);
    }

    #[test]
    fn test_partial_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            [render]
            development = false
            static_path = "/assets"

            [listener]
            bind_address = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert!(!config.render.development);
        assert_eq!(config.render.static_path, "/assets");
        // Untouched fields keep their defaults
        assert!(config.render.cache);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert!(config.security.referer_check);
    }
}
