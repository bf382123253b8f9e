//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     root token cancelled
//!     → axum stops accepting, drains connections
//!     → live-reload streams end
//!     → in-flight page streams stop at the next node
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
