//! Page definitions mounted on the server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::http::server::AppState;
use crate::render::component::Component;
use crate::render::options::RenderOptions;

type OptionsFn = dyn Fn(&Request<Body>) -> RenderOptions + Send + Sync;

/// A component served at a fixed path, with per-request render options.
#[derive(Clone)]
pub struct Page {
    path: String,
    component: Component,
    options: Arc<OptionsFn>,
}

impl Page {
    pub fn new(path: impl Into<String>, component: impl Into<Component>) -> Self {
        Self {
            path: path.into(),
            component: component.into(),
            options: Arc::new(|_: &Request<Body>| RenderOptions::default()),
        }
    }

    /// Use the same options for every request.
    pub fn with_options(self, options: RenderOptions) -> Self {
        self.with_options_fn(move |_| options.clone())
    }

    /// Derive options from the request (query, headers, ...).
    pub fn with_options_fn<F>(mut self, options: F) -> Self
    where
        F: Fn(&Request<Body>) -> RenderOptions + Send + Sync + 'static,
    {
        self.options = Arc::new(options);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn component(&self) -> &Component {
        &self.component
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("path", &self.path)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

/// Render `page` for `request`.
///
/// Without an explicit cancel token the stream stops on server shutdown.
pub fn render_page(state: &AppState, page: &Page, request: Request<Body>) -> Response {
    let url = request.uri().to_string();
    let mut options = (page.options)(&request);
    if options.cancel.is_none() {
        options.cancel = Some(state.shutdown.subscribe());
    }

    match state.renderer.render(&page.component, options, &url) {
        Ok(rendered) => {
            tracing::debug!(url = %url, cache_hit = rendered.cache_hit, "Page rendered");
            rendered.into_response()
        }
        Err(e) => e.into_response(),
    }
}
