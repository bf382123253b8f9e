//! Error types for the render pipeline.
//!
//! Errors before the first byte is sent become an HTML error page. After
//! that, failures only truncate the stream (see `render::stream`).

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use maud::{html, DOCTYPE};

use crate::hydration::EncodeError;
use crate::render::component::{ComponentError, ResolveError};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The page handed the renderer something it cannot classify.
    #[error("resolve: {0}")]
    Resolve(#[from] ResolveError),

    /// A page layout failed while wrapping the content.
    #[error("layout: {0}")]
    Layout(#[from] ComponentError),

    /// Bootstrap key material could not be prepared.
    #[error("bootstrap: {0}")]
    Encode(#[from] EncodeError),

    /// The response head could not be built.
    #[error("response: {0}")]
    Response(#[from] axum::http::Error),
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Render failed");

        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { "Internal Server Error" }
                }
                body {
                    h1 { "500" }
                    p { "The page could not be rendered." }
                }
            }
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Html(markup.into_string())).into_response()
    }
}
