//! Tests against a bound server over real TCP.

use std::time::Duration;

use ssr_render::config::ServerConfig;

mod common;
use common::{greet_page, spawn_server, test_server};

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_serve_page_and_bootstrap() {
    let (server, provider) = test_server(ServerConfig::default(), vec![greet_page()]);
    let shutdown = server.state().shutdown.clone();
    let (addr, handle) = spawn_server(server).await;
    let client = client();

    let page = client
        .get(format!("http://{addr}/greet"))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(page.status(), 200);
    assert_eq!(page.headers()["content-type"], "text/html");
    let html = page.text().await.unwrap();
    assert!(html.contains("Hello ada"));
    assert!(html.contains("/static/js/init.js"));

    let init = client
        .get(format!("http://{addr}/static/js/init.js"))
        .header("referer", format!("http://{addr}/greet"))
        .send()
        .await
        .unwrap();
    assert_eq!(init.status(), 200);
    let script = init.text().await.unwrap();
    assert!(script.contains("window.__INITIAL_DATA__"));
    assert!(!script.contains("ada"));
    assert_eq!(provider.count(), 1);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_ends_live_reload_stream() {
    let (server, _) = test_server(ServerConfig::default(), vec![greet_page()]);
    let shutdown = server.state().shutdown.clone();
    let (addr, handle) = spawn_server(server).await;
    let client = client();

    // Rendering a page in development registers the stream endpoint.
    client.get(format!("http://{addr}/greet")).send().await.unwrap();

    let mut events = client
        .get(format!("http://{addr}/___refresh___"))
        .send()
        .await
        .unwrap();
    assert_eq!(events.headers()["content-type"], "text/event-stream");
    let first = events.chunk().await.unwrap().unwrap();
    assert!(first.starts_with(b"data: "));

    shutdown.trigger();
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while let Ok(Some(_)) = events.chunk().await {}
    })
    .await;
    assert!(drained.is_ok(), "live-reload stream outlived shutdown");

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}
