//! Browser side of live reload.

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::live_reload::BuildId;

/// Script that reloads the page once the server reports a different build.
pub fn client_script(refresh_url: &str, build_id: &BuildId) -> String {
    format!(
        r#"const es = new EventSource('{refresh_url}');
window.addEventListener("beforeunload", () => {{
  es.close();
}});
es.onmessage = function (e) {{
  if (e.data !== "{build_id}") {{
    location.reload();
  }}
}};"#
    )
}

/// `client_script` served as JavaScript.
pub fn script_response(script: String) -> Response {
    ([(header::CONTENT_TYPE, "application/javascript")], script).into_response()
}
