//! Server-side rendering pipeline.
//!
//! Renders component trees to streamed HTML, memoizes assembled documents
//! per component and URL, hands encrypted page props to the client for
//! hydration, and serves a development live-reload channel.

// Core pipeline
pub mod render;
pub mod hydration;
pub mod live_reload;

// Serving
pub mod config;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ServerConfig;
pub use error::RenderError;
pub use http::{HttpServer, Page};
pub use lifecycle::Shutdown;
pub use render::component::{Component, ComponentError, FunctionComponent, Layout, PageComponent};
pub use render::options::RenderOptions;
pub use render::Renderer;
