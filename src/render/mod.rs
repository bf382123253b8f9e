//! Render pipeline.
//!
//! # Data Flow
//! ```text
//! (Component, RenderOptions, request URL)
//!     → options.rs (normalize against current defaults)
//!     → component.rs (classify, cache key)
//!     → cache.rs lookup
//!         hit  → cached document
//!         miss → hydration injector (development, hydration, init.js)
//!              → page layouts wrap the content
//!              → document.rs (assemble <html>)
//!              → cache.rs store (when caching)
//!     → stream.rs (serialize into a streamed text/html body)
//! ```
//!
//! # Design Decisions
//! - One `RenderConfig` per render, threaded by `&mut` through a fixed
//!   order of steps; nothing else sees it
//! - A cache hit skips injection entirely, so no routes are re-registered
//! - Defaults are read through `ArcSwap` so a config reload applies to the
//!   next render without locking

pub mod cache;
pub mod component;
pub mod document;
pub mod markup;
pub mod options;
pub mod stream;

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::config::RenderDefaults;
use crate::error::RenderError;
use crate::hydration::HydrationInjector;
use crate::render::cache::RenderCache;
use crate::render::component::{resolve, Component, Resolved, ResolvedKind};
use crate::render::markup::Node;
use crate::render::options::{RenderConfig, RenderOptions};
use crate::render::stream::{StreamHandle, StreamOptions, StreamRenderer};

/// Result of a render: the streaming response plus a handle on the stream.
#[derive(Debug)]
pub struct RenderedPage {
    pub response: Response,
    pub stream: StreamHandle,
    pub cache_hit: bool,
}

impl IntoResponse for RenderedPage {
    fn into_response(self) -> Response {
        self.response
    }
}

/// Orchestrates normalization, caching, injection and streaming.
#[derive(Debug)]
pub struct Renderer {
    cache: RenderCache,
    injector: HydrationInjector,
    defaults: Arc<ArcSwap<RenderDefaults>>,
}

impl Renderer {
    pub fn new(defaults: Arc<ArcSwap<RenderDefaults>>, injector: HydrationInjector) -> Self {
        Self {
            cache: RenderCache::new(),
            injector,
            defaults,
        }
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn injector(&self) -> &HydrationInjector {
        &self.injector
    }

    /// Shared handle for hot-swapping defaults.
    pub fn defaults_handle(&self) -> Arc<ArcSwap<RenderDefaults>> {
        Arc::clone(&self.defaults)
    }

    /// Render `component` for `request_url`.
    ///
    /// Must be called within a Tokio runtime. Errors are only possible on a
    /// cache miss, before anything is streamed.
    pub fn render(
        &self,
        component: &Component,
        options: RenderOptions,
        request_url: &str,
    ) -> Result<RenderedPage, RenderError> {
        let defaults = self.defaults.load();
        let mut config = options.normalize(&defaults);
        let resolved = resolve(component, &mut config, request_url);

        let cached = if config.cache {
            self.cache.get(&resolved.key)
        } else {
            None
        };
        let cache_hit = cached.is_some();
        let document = match cached {
            Some(document) => {
                tracing::debug!(cache_key = %resolved.key, "Render cache hit");
                document
            }
            None => self.build(&mut config, resolved)?,
        };

        let stream_options = StreamOptions {
            cancel: config.cancel.clone(),
            on_error: config.on_error.clone(),
        };
        let (body, stream) = StreamRenderer::new(defaults.flush_threshold).render(document, stream_options);

        let response = Response::builder()
            .status(config.status)
            .header(header::CONTENT_TYPE, "text/html")
            .body(body)?;

        Ok(RenderedPage {
            response,
            stream,
            cache_hit,
        })
    }

    fn build(&self, config: &mut RenderConfig, resolved: Resolved) -> Result<Arc<Node>, RenderError> {
        let Resolved {
            key,
            kind,
            content,
            layouts,
        } = resolved;

        if config.development {
            self.injector.inject_development(config);
        }
        if let ResolvedKind::Function(component) = &kind {
            self.injector.inject_hydration(config, component)?;
        }

        let content = Resolved::laid_out(content, &layouts, &config.props)?;
        let document = Arc::new(document::assemble(&config.html, content));
        if config.cache {
            self.cache.put(key.clone(), Arc::clone(&document));
        }
        tracing::debug!(cache_key = %key, cached = config.cache, "Document assembled");
        Ok(document)
    }
}
