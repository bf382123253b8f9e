//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → page route → pages.rs → render pipeline → streamed text/html
//!     → /health → JSON
//!     → anything else → RouteTable (endpoints registered while rendering)
//! ```

pub mod pages;
pub mod server;

pub use pages::Page;
pub use server::{AppState, HttpServer};
