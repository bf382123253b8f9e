//! End-to-end tests of the render pipeline through the Axum router.

use axum::http::{header, StatusCode};
use futures_util::StreamExt;
use tower::ServiceExt;

use ssr_render::config::ServerConfig;

mod common;
use common::{about_page, body_string, get, greet_page, info_page, test_server, welcome_page};

fn production() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.render.development = false;
    config
}

#[tokio::test]
async fn test_greet_renders_and_second_body_is_identical() {
    let (server, _) = test_server(ServerConfig::default(), vec![greet_page()]);
    let app = server.router();

    let first = app.clone().oneshot(get("/greet")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()[header::CONTENT_TYPE], "text/html");
    let first = body_string(first).await;
    assert!(first.starts_with("<!DOCTYPE html>"));
    assert!(first.contains("Hello ada"));

    let second = body_string(app.oneshot(get("/greet")).await.unwrap()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cache_hit_registers_nothing() {
    let (server, _) = test_server(ServerConfig::default(), vec![greet_page()]);
    let app = server.router();
    let routes = server.state().routes.clone();

    body_string(app.clone().oneshot(get("/greet")).await.unwrap()).await;
    let after_first = routes.registrations();
    // init.js, refresh.js and the live-reload stream
    assert_eq!(after_first, 3);

    body_string(app.oneshot(get("/greet")).await.unwrap()).await;
    assert_eq!(routes.registrations(), after_first);
}

#[tokio::test]
async fn test_cache_key_ignores_props() {
    let (server, _) = test_server(production(), vec![greet_page()]);
    let app = server.router();

    body_string(app.clone().oneshot(get("/greet")).await.unwrap()).await;

    let mut request = get("/greet");
    request.headers_mut().insert("x-user", "bob".parse().unwrap());
    let body = body_string(app.oneshot(request).await.unwrap()).await;

    assert!(body.contains("Hello ada"));
    assert!(!body.contains("Hello bob"));
}

#[tokio::test]
async fn test_tree_page_is_not_hydrated() {
    let (server, _) = test_server(production(), vec![about_page()]);
    let app = server.router();

    let body = body_string(app.clone().oneshot(get("/about")).await.unwrap()).await;
    assert!(body.contains("<p>About us</p>"));
    assert!(!body.contains("init.js"));
    assert!(server.state().routes.is_empty());

    let init = app.oneshot(get("/static/js/init.js")).await.unwrap();
    assert_eq!(init.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_page_wrapper_keeps_hydration_of_inner_function() {
    let (server, _) = test_server(production(), vec![welcome_page()]);
    let app = server.router();

    let body = body_string(app.clone().oneshot(get("/welcome")).await.unwrap()).await;
    assert!(body.contains("<title>Welcome</title>"));
    assert!(body.contains("<main><h1>Hello ada</h1></main>"));
    assert!(body.contains("<script src=\"/static/js/greet.js\"></script>"));
    assert!(body.contains("<script src=\"/static/js/init.js\"></script>"));

    let mut init = get("/static/js/init.js");
    init.headers_mut()
        .insert(header::REFERER, "http://localhost/welcome".parse().unwrap());
    assert_eq!(app.oneshot(init).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_page_wrapper_around_tree_is_not_hydrated() {
    let (server, _) = test_server(production(), vec![info_page()]);
    let app = server.router();

    let body = body_string(app.clone().oneshot(get("/info")).await.unwrap()).await;
    assert!(body.contains("<title>Info</title>"));
    assert!(body.contains("<p>Info</p>"));
    assert!(!body.contains("init.js"));
    assert!(server.state().routes.is_empty());

    let init = app.oneshot(get("/static/js/init.js")).await.unwrap();
    assert_eq!(init.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_init_script_requires_same_origin_referer() {
    let (server, provider) = test_server(production(), vec![greet_page()]);
    let app = server.router();
    body_string(app.clone().oneshot(get("/greet")).await.unwrap()).await;

    let rejected = app.clone().oneshot(get("/static/js/init.js")).await.unwrap();
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(rejected).await, "Forbidden");

    let mut foreign = get("/static/js/init.js");
    foreign
        .headers_mut()
        .insert(header::REFERER, "http://evil.example/greet".parse().unwrap());
    assert_eq!(app.clone().oneshot(foreign).await.unwrap().status(), StatusCode::FORBIDDEN);
    assert_eq!(provider.count(), 0);

    let mut own = get("/static/js/init.js");
    own.headers_mut()
        .insert(header::REFERER, "http://localhost/greet".parse().unwrap());
    let accepted = app.oneshot(own).await.unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(accepted.headers()[header::CONTENT_TYPE], "application/javascript");

    let script = body_string(accepted).await;
    assert!(script.starts_with("window.__") && script.contains("window.__INITIAL_DATA__ = \""));
    assert!(!script.contains("ada"));
    assert_eq!(provider.count(), 1);
}

#[tokio::test]
async fn test_referer_check_can_be_disabled() {
    let mut config = production();
    config.security.referer_check = false;
    let (server, _) = test_server(config, vec![greet_page()]);
    let app = server.router();
    body_string(app.clone().oneshot(get("/greet")).await.unwrap()).await;

    let response = app.oneshot(get("/static/js/init.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_live_reload_first_frame() {
    let (server, _) = test_server(ServerConfig::default(), vec![greet_page()]);
    let app = server.router();
    let build_id = server.state().build_id.clone();

    let page = body_string(app.clone().oneshot(get("/greet")).await.unwrap()).await;
    assert!(page.contains("<script src=\"/static/js/refresh.js\"></script>"));

    let refresh = body_string(app.clone().oneshot(get("/static/js/refresh.js")).await.unwrap()).await;
    assert!(refresh.contains(build_id.as_str()));

    let response = app.oneshot(get("/___refresh___")).await.unwrap();
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let mut frames = response.into_body().into_data_stream();
    let first = frames.next().await.unwrap().unwrap();
    assert_eq!(first, format!("data: {build_id}\nretry: 100\n\n").as_bytes());

    server.state().shutdown.trigger();
    while let Some(frame) = frames.next().await {
        assert_eq!(frame.unwrap(), format!("data: {build_id}\n\n").as_bytes());
    }
}

#[tokio::test]
async fn test_no_live_reload_in_production() {
    let (server, _) = test_server(production(), vec![greet_page()]);
    let app = server.router();

    let page = body_string(app.clone().oneshot(get("/greet")).await.unwrap()).await;
    assert!(!page.contains("refresh.js"));
    let response = app.oneshot(get("/___refresh___")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_headers() {
    let (server, _) = test_server(ServerConfig::default(), vec![]);
    let response = server.router().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["build_id"], server.state().build_id.as_str());
}
