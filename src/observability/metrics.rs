//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define render pipeline metrics
//! - Expose a Prometheus scrape endpoint when enabled
//!
//! # Metrics
//! - `ssr_renders_total` (counter): finished streams by `outcome`
//! - `ssr_render_bytes` (histogram): bytes written per stream
//! - `ssr_cache_lookups_total` (counter): cache lookups by `result`
//! - `ssr_cache_entries` (gauge): entries held by the render cache
//! - `ssr_route_registrations_total` (counter): dynamic route registrations
//! - `ssr_live_reload_connections` (gauge): open live-reload streams
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::render::stream::StreamOutcome;

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn describe() {
    describe_counter!("ssr_renders_total", "Finished render streams by outcome");
    describe_histogram!("ssr_render_bytes", "Bytes written per render stream");
    describe_counter!("ssr_cache_lookups_total", "Render cache lookups by result");
    describe_gauge!("ssr_cache_entries", "Documents held by the render cache");
    describe_counter!("ssr_route_registrations_total", "Dynamic route registrations");
    describe_gauge!("ssr_live_reload_connections", "Open live-reload streams");
}

pub fn record_render(outcome: &StreamOutcome) {
    counter!("ssr_renders_total", "outcome" => outcome.label()).increment(1);
    histogram!("ssr_render_bytes").record(outcome.bytes() as f64);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("ssr_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("ssr_cache_entries").set(entries as f64);
}

pub fn record_route_registration() {
    counter!("ssr_route_registrations_total").increment(1);
}

pub fn live_reload_opened() {
    gauge!("ssr_live_reload_connections").increment(1.0);
}

pub fn live_reload_closed() {
    gauge!("ssr_live_reload_connections").decrement(1.0);
}
