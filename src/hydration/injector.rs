//! Script injection and endpoint registration for hydration.
//!
//! # Responsibilities
//! - Add the hydration bundle and `init.js` script entries for function
//!   components
//! - Add `refresh.js` and register the live-reload endpoints in development
//! - Register the handlers that serve those scripts
//!
//! # Design Decisions
//! - Registration overwrites: the latest render's props back `init.js`
//! - The key is imported during injection so key problems fail the render
//!   instead of every later `init.js` request
//! - `init.js` encrypts on each request; ciphertext is never stored
//! - The referer guard runs before any encryption

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::hydration::bootstrap::{BootstrapEncoder, EncodeError};
use crate::live_reload::{client_script, script_response, LiveReloadChannel, REFRESH_PATH};
use crate::render::component::FunctionComponent;
use crate::render::options::{RenderConfig, Script};
use crate::routing::{handler, RouteRegistrar};
use crate::security::{RefererGuard, SameOriginReferer};

/// Augments render configs and registers hydration endpoints.
pub struct HydrationInjector {
    registrar: Arc<dyn RouteRegistrar>,
    encoder: Arc<BootstrapEncoder>,
    referer: Arc<dyn RefererGuard>,
    live_reload: LiveReloadChannel,
    shutdown: CancellationToken,
    script_path: String,
}

impl HydrationInjector {
    /// `static_path` is the server's static prefix; scripts live under
    /// `{static_path}/js`.
    pub fn new(
        registrar: Arc<dyn RouteRegistrar>,
        encoder: Arc<BootstrapEncoder>,
        live_reload: LiveReloadChannel,
        static_path: &str,
    ) -> Self {
        Self {
            registrar,
            encoder,
            referer: Arc::new(SameOriginReferer),
            live_reload,
            shutdown: CancellationToken::new(),
            script_path: format!("{}/js", static_path.trim_end_matches('/')),
        }
    }

    pub fn with_referer_guard(mut self, guard: Arc<dyn RefererGuard>) -> Self {
        self.referer = guard;
        self
    }

    /// Live-reload streams end when `shutdown` is cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn script_path(&self) -> &str {
        &self.script_path
    }

    pub fn init_path(&self) -> String {
        format!("{}/init.js", self.script_path)
    }

    pub fn refresh_path(&self) -> String {
        format!("{}/refresh.js", self.script_path)
    }

    /// Hydration bundle path for a component.
    pub fn bundle_path(&self, component: &FunctionComponent) -> String {
        format!("{}/{}.js", self.script_path, component.name().to_lowercase())
    }

    /// Register `refresh.js` and the live-reload stream, and load the
    /// client script in `<head>`.
    pub fn inject_development(&self, config: &mut RenderConfig) {
        let refresh_path = self.refresh_path();

        let script = client_script(REFRESH_PATH, self.live_reload.build_id());
        self.registrar.register(
            Method::GET,
            &refresh_path,
            handler(move |_| {
                let script = script.clone();
                async move { script_response(script) }
            }),
        );

        let channel = self.live_reload.clone();
        let shutdown = self.shutdown.clone();
        self.registrar.register(
            Method::GET,
            REFRESH_PATH,
            handler(move |_| {
                let response = channel.response(shutdown.child_token());
                async move { response }
            }),
        );

        config.html.head.script.push(Script::src(refresh_path));
    }

    /// Add the bundle and `init.js` scripts for `component` and register
    /// the `init.js` handler.
    pub fn inject_hydration(
        &self,
        config: &mut RenderConfig,
        component: &FunctionComponent,
    ) -> Result<(), EncodeError> {
        if config.hydrate {
            config.html.body.script.push(Script::src(self.bundle_path(component)));
        }

        self.encoder.import_key()?;

        let init_path = self.init_path();
        let encoder = Arc::clone(&self.encoder);
        let referer = Arc::clone(&self.referer);
        let props = config.props.clone();
        self.registrar.register(
            Method::GET,
            &init_path,
            handler(move |request: Request<Body>| {
                let response = serve_init(&request, referer.as_ref(), &encoder, &props);
                async move { response }
            }),
        );

        tracing::debug!(component = %component.name(), path = %init_path, "Bootstrap endpoint registered");
        config.html.body.script.push(Script::src(init_path));
        Ok(())
    }
}

fn serve_init(
    request: &Request<Body>,
    referer: &dyn RefererGuard,
    encoder: &BootstrapEncoder,
    props: &Value,
) -> Response {
    if let Some(rejection) = referer.check(request) {
        return rejection;
    }
    match encoder.encode(props) {
        Ok(script) => ([(header::CONTENT_TYPE, "application/javascript")], script).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode bootstrap data");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl std::fmt::Debug for HydrationInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydrationInjector")
            .field("script_path", &self.script_path)
            .field("build_id", self.live_reload.build_id())
            .finish_non_exhaustive()
    }
}
