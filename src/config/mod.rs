//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → render defaults shared via Arc<ArcSwap<RenderDefaults>>
//!
//! On file change (development):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the render defaults
//!     → next render normalizes against the new defaults
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only render defaults are hot-swappable

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::LiveReloadConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RenderDefaults;
pub use schema::SecurityConfig;
pub use schema::ServerConfig;
