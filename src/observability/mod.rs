//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Render pipeline, route table, live reload:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty in development, JSON in production)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span via tower-http
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
