//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::json;
use tokio::net::TcpListener;

use ssr_render::config::ServerConfig;
use ssr_render::http::AppState;
use ssr_render::hydration::crypto::{CryptoError, CryptoProvider, KeyHandle, KeyUsage};
use ssr_render::hydration::{AesGcmProvider, BootstrapEncoder, KeyMaterial};
use ssr_render::render::markup::element;
use ssr_render::{ComponentError, FunctionComponent, HttpServer, Page, PageComponent, RenderOptions, Shutdown};

/// AES-GCM provider that counts `encrypt` calls.
#[derive(Clone, Default)]
pub struct CountingProvider {
    pub encrypts: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingProvider {
    pub fn count(&self) -> usize {
        self.encrypts.load(Ordering::SeqCst)
    }
}

impl CryptoProvider for CountingProvider {
    fn import_key(&self, raw: &[u8], usages: &[KeyUsage]) -> Result<KeyHandle, CryptoError> {
        AesGcmProvider.import_key(raw, usages)
    }

    fn encrypt(&self, key: &KeyHandle, plaintext: &str) -> Result<String, CryptoError> {
        self.encrypts.fetch_add(1, Ordering::SeqCst);
        AesGcmProvider.encrypt(key, plaintext)
    }
}

pub fn greet() -> FunctionComponent {
    FunctionComponent::new("Greet", |props| {
        let user = props["user"]
            .as_str()
            .ok_or_else(|| ComponentError::new("missing user"))?;
        Ok(element("h1").child(format!("Hello {user}")).into())
    })
}

/// `/greet` with props taken from the `x-user` header (default `ada`).
///
/// The header is not part of the URL, so it does not change the cache key.
pub fn greet_page() -> Page {
    Page::new("/greet", greet()).with_options_fn(user_props)
}

/// `/welcome`: `Greet` inside a page wrapper with a layout.
#[allow(dead_code)]
pub fn welcome_page() -> Page {
    let page = PageComponent::new(greet())
        .title("Welcome")
        .layout(|children, _| Ok(element("main").child(children).into()));
    Page::new("/welcome", page).with_options_fn(user_props)
}

/// `/info`: a static tree inside a page wrapper.
#[allow(dead_code)]
pub fn info_page() -> Page {
    Page::new("/info", PageComponent::new(element("p").child("Info")).title("Info"))
}

fn user_props(request: &Request<Body>) -> RenderOptions {
    let user = request
        .headers()
        .get("x-user")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("ada")
        .to_string();
    RenderOptions {
        props: json!({ "user": user }),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn about_page() -> Page {
    Page::new("/about", element("p").child("About us"))
}

/// Server with a counting crypto provider.
pub fn test_server(config: ServerConfig, pages: Vec<Page>) -> (HttpServer, CountingProvider) {
    let provider = CountingProvider::default();
    let encoder = BootstrapEncoder::new(
        Arc::new(provider.clone()),
        KeyMaterial::generate(&AesGcmProvider::generate_key()),
    );
    let state = AppState::with_encoder(&config, encoder, Shutdown::new());
    (HttpServer::with_state(config, pages, state), provider)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", "localhost")
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Bind an ephemeral port and serve until the state's shutdown fires.
#[allow(dead_code)]
pub async fn spawn_server(server: HttpServer) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });
    (addr, handle)
}
