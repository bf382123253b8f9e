//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Render pipeline (at render time):
//!     HydrationInjector → RouteRegistrar::register(method, path, handler)
//!
//! Incoming request with no static axum route:
//!     → axum fallback
//!     → RouteTable::dispatch (exact method + path)
//!     → handler response, or 404
//! ```

pub mod table;

pub use table::{handler, RouteHandler, RouteRegistrar, RouteTable};
