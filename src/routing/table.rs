//! Dynamic route table.
//!
//! # Responsibilities
//! - Accept handler registrations from the render pipeline at runtime
//! - Serve requests whose method and path match a registration
//!
//! # Design Decisions
//! - Exact `(method, path)` lookup; no patterns
//! - Re-registering a route replaces its handler (last writer wins)
//! - The handler is cloned out of the map before it runs, so no shard lock
//!   is held across an await

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use dashmap::DashMap;
use futures_util::future::BoxFuture;

use crate::observability::metrics;

/// A type-erased async request handler.
pub type RouteHandler = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wrap an async function as a [`RouteHandler`].
pub fn handler<F, Fut>(f: F) -> RouteHandler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request| Box::pin(f(request)))
}

/// Something that accepts route registrations.
pub trait RouteRegistrar: Send + Sync {
    /// Register `handler` for `method path`, replacing any previous handler.
    fn register(&self, method: Method, path: &str, handler: RouteHandler);
}

/// Concurrent `(method, path) → handler` table.
#[derive(Default)]
pub struct RouteTable {
    routes: DashMap<(Method, String), RouteHandler>,
    registrations: AtomicUsize,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `request` from the table, or `None` when nothing is registered
    /// for its method and path.
    pub async fn dispatch(&self, request: Request<Body>) -> Option<Response> {
        let key = (request.method().clone(), request.uri().path().to_string());
        let handler = self.routes.get(&key).map(|entry| Arc::clone(entry.value()))?;
        Some(handler(request).await)
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.routes.contains_key(&(method.clone(), path.to_string()))
    }

    /// Total registrations so far, counting overwrites.
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::Relaxed)
    }

    /// Number of distinct routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteRegistrar for RouteTable {
    fn register(&self, method: Method, path: &str, handler: RouteHandler) {
        let replaced = self
            .routes
            .insert((method.clone(), path.to_string()), handler)
            .is_some();
        self.registrations.fetch_add(1, Ordering::Relaxed);
        metrics::record_route_registration();
        tracing::debug!(method = %method, path = %path, replaced, "Route registered");
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes.len())
            .field("registrations", &self.registrations())
            .finish()
    }
}
