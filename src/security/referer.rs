//! Referer gating for bootstrap data.
//!
//! # Responsibilities
//! - Decide whether a request for `init.js` came from one of our own pages
//!
//! # Design Decisions
//! - A guard either lets the request through (`None`) or returns the exact
//!   response to serve instead
//! - Same-origin means the Referer's authority equals the request's Host

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

/// Gate in front of a registered handler.
pub trait RefererGuard: Send + Sync {
    /// `None` to proceed, or the response to serve instead.
    fn check(&self, request: &Request<Body>) -> Option<Response>;
}

/// Rejects requests whose `Referer` is missing or points at another host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameOriginReferer;

/// Lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RefererGuard for AllowAll {
    fn check(&self, _request: &Request<Body>) -> Option<Response> {
        None
    }
}

impl SameOriginReferer {
    fn referer_authority(request: &Request<Body>) -> Option<String> {
        let referer = request.headers().get(header::REFERER)?.to_str().ok()?;
        let url = Url::parse(referer).ok()?;
        let host = url.host_str()?;
        Some(match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    fn request_authority(request: &Request<Body>) -> Option<String> {
        request
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| request.uri().authority().map(|a| a.to_string()))
    }
}

impl RefererGuard for SameOriginReferer {
    fn check(&self, request: &Request<Body>) -> Option<Response> {
        let referer = Self::referer_authority(request);
        let host = Self::request_authority(request);

        match (referer, host) {
            (Some(referer), Some(host)) if referer.eq_ignore_ascii_case(&host) => None,
            (referer, host) => {
                tracing::warn!(
                    path = %request.uri().path(),
                    referer = ?referer,
                    host = ?host,
                    "Rejected cross-origin bootstrap request"
                );
                Some((StatusCode::FORBIDDEN, "Forbidden").into_response())
            }
        }
    }
}
