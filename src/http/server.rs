//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: one GET route per page, `/health`, and a
//!   fallback into the dynamic route table
//! - Wire up middleware (tracing, request ID, timeout, body limit,
//!   security headers)
//! - Bind server to listener and shut down gracefully
//!
//! # Design Decisions
//! - Endpoints registered during rendering (`init.js`, `refresh.js`, the
//!   live-reload stream) live in the `RouteTable`, not in the Axum router,
//!   because Axum routers are immutable once serving
//! - The timeout bounds time to the response head only, so streamed pages
//!   and the live-reload stream are not cut off by it

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::pages::{render_page, Page};
use crate::hydration::{AesGcmProvider, BootstrapEncoder, HydrationInjector, KeyMaterial};
use crate::lifecycle::Shutdown;
use crate::live_reload::{BuildId, LiveReloadChannel};
use crate::render::Renderer;
use crate::routing::RouteTable;
use crate::security::{self, AllowAll, RefererGuard, SameOriginReferer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<Renderer>,
    pub routes: Arc<RouteTable>,
    pub build_id: BuildId,
    pub shutdown: Shutdown,
}

impl AppState {
    /// State with a fresh random bootstrap key and the AES-GCM provider.
    pub fn new(config: &ServerConfig, shutdown: Shutdown) -> Self {
        let material = KeyMaterial::generate(&AesGcmProvider::generate_key());
        let encoder = BootstrapEncoder::new(Arc::new(AesGcmProvider), material);
        Self::with_encoder(config, encoder, shutdown)
    }

    pub fn with_encoder(config: &ServerConfig, encoder: BootstrapEncoder, shutdown: Shutdown) -> Self {
        let routes = Arc::new(RouteTable::new());
        let build_id = BuildId::generate();

        let referer: Arc<dyn RefererGuard> = if config.security.referer_check {
            Arc::new(SameOriginReferer)
        } else {
            Arc::new(AllowAll)
        };
        let injector = HydrationInjector::new(
            routes.clone(),
            Arc::new(encoder),
            LiveReloadChannel::from_config(build_id.clone(), &config.live_reload),
            &config.render.static_path,
        )
        .with_referer_guard(referer)
        .with_shutdown(shutdown.subscribe());

        let defaults = Arc::new(ArcSwap::from_pointee(config.render.clone()));
        Self {
            renderer: Arc::new(Renderer::new(defaults, injector)),
            routes,
            build_id,
            shutdown,
        }
    }
}

/// HTTP server for the render pipeline.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server serving `pages`.
    pub fn new(config: ServerConfig, pages: Vec<Page>, shutdown: Shutdown) -> Self {
        let state = AppState::new(&config, shutdown);
        Self::with_state(config, pages, state)
    }

    pub fn with_state(config: ServerConfig, pages: Vec<Page>, state: AppState) -> Self {
        let router = Self::build_router(&config, pages, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, pages: Vec<Page>, state: AppState) -> Router {
        let mut router = Router::new().route("/health", get(health));

        for page in pages {
            tracing::info!(path = %page.path(), "Mounting page");
            let path = page.path().to_string();
            let page = Arc::new(page);
            router = router.route(
                &path,
                get(move |State(state): State<AppState>, request: Request<Body>| {
                    let page = Arc::clone(&page);
                    async move { render_page(&state, &page, request) }
                }),
            );
        }

        let router = router
            .fallback(dispatch_dynamic)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(security::limits::body_limit(&config.security))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if config.security.security_headers {
            security::headers::apply(router)
        } else {
            router
        }
    }

    /// The router, for serving or for `oneshot` tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until shutdown is triggered.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            build_id = %self.state.build_id,
            "HTTP server starting"
        );

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "build_id": state.build_id.as_str(),
    }))
}

/// Serve endpoints registered at render time.
async fn dispatch_dynamic(State(state): State<AppState>, request: Request<Body>) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match state.routes.dispatch(request).await {
        Some(response) => response,
        None => {
            tracing::debug!(method = %method, path = %path, "No route matched");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}
