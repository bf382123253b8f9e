//! SSR render server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ page route ──▶ render pipeline
//!                          │                          │
//!                          │              normalize → resolve → cache
//!                          │                          │ miss
//!                          │              inject hydration / live reload
//!                          │                          │
//!                          │              assemble → stream (text/html)
//!                          │
//!                          └──▶ fallback ──▶ route table
//!                                            {static}/js/init.js
//!                                            {static}/js/refresh.js
//!                                            /___refresh___ (SSE)
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use ssr_render::config::{load_config, watcher::ConfigWatcher, ServerConfig};
use ssr_render::lifecycle::{signals, Shutdown};
use ssr_render::observability::{logging, metrics};
use ssr_render::render::markup::{element, Node};
use ssr_render::{ComponentError, FunctionComponent, HttpServer, Page, PageComponent, RenderOptions};

#[derive(Parser, Debug)]
#[command(name = "ssr-render", version, about = "Server-side rendering server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(short, long)]
    bind: Option<String>,

    /// Disable development mode (live reload, config watching)
    #[arg(long)]
    production: bool,
}

fn greet() -> FunctionComponent {
    FunctionComponent::new("Greet", |props| {
        let user = props["user"]
            .as_str()
            .ok_or_else(|| ComponentError::new("`user` prop is required"))?;
        Ok(element("main")
            .child(element("h1").child(format!("Hello {user}")))
            .child(element("p").child("Rendered on the server."))
            .into())
    })
}

fn demo_pages() -> Vec<Page> {
    let greet = PageComponent::new(greet())
        .title("Greeting")
        .description("A server-rendered greeting");

    vec![
        Page::new("/", Node::from(element("p").child("It works."))),
        Page::new("/greet", greet).with_options_fn(|request| {
            let user = request
                .uri()
                .query()
                .and_then(|q| {
                    url::form_urlencoded::parse(q.as_bytes())
                        .find(|(k, _)| k == "user")
                        .map(|(_, v)| v.into_owned())
                })
                .unwrap_or_else(|| "ada".to_string());
            RenderOptions {
                props: json!({ "user": user }),
                ..Default::default()
            }
        }),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if args.production {
        config.render.development = false;
    }

    logging::init_logging(&config.observability.log_level, config.render.development);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        development = config.render.development,
        cache = config.render.cache,
        static_path = %config.render.static_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config.clone(), demo_pages(), shutdown.clone());

    // Dropping the watcher stops it, so it lives until main returns.
    let _watcher = match &args.config {
        Some(path) if config.render.development => {
            match ConfigWatcher::new(path, server.state().renderer.defaults_handle()).run() {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher disabled");
                    None
                }
            }
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tokio::spawn(signals::wait_for_signal(shutdown.clone()));

    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
