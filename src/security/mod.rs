//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → limits.rs (body size cap)
//!     → handler
//!     → headers.rs (security response headers, optional)
//!
//! Bootstrap requests (GET {static}/init.js):
//!     → referer.rs (same-origin check before any encryption)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing Referer is treated as foreign

pub mod headers;
pub mod limits;
pub mod referer;

pub use referer::{AllowAll, RefererGuard, SameOriginReferer};
