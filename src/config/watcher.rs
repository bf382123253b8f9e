//! Configuration file watcher for hot reload.
//!
//! Only the `[render]` section is applied live, except `static_path`, which
//! is baked into registered script paths. It and the listener, security and
//! live-reload settings are bound into the running server at startup and
//! need a restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::load_config;
use crate::config::schema::RenderDefaults;

/// Watches the configuration file and swaps in new render defaults.
pub struct ConfigWatcher {
    path: PathBuf,
    defaults: Arc<ArcSwap<RenderDefaults>>,
}

impl ConfigWatcher {
    /// Create a watcher that publishes into `defaults`.
    pub fn new(path: &Path, defaults: Arc<ArcSwap<RenderDefaults>>) -> Self {
        Self {
            path: path.to_path_buf(),
            defaults,
        }
    }

    /// Reload the file once and swap the render defaults if it validates.
    ///
    /// Returns `true` when new defaults were published.
    pub fn reload(&self) -> bool {
        match load_config(&self.path) {
            Ok(config) => {
                let mut render = config.render;
                let current = self.defaults.load();
                if render.static_path != current.static_path {
                    tracing::warn!(
                        path = ?self.path,
                        current = %current.static_path,
                        requested = %render.static_path,
                        "render.static_path changes need a restart, keeping current value"
                    );
                    render.static_path = current.static_path.clone();
                }
                if **current == render {
                    return false;
                }
                tracing::info!(
                    path = ?self.path,
                    cache = render.cache,
                    development = render.development,
                    "Render defaults reloaded"
                );
                self.defaults.store(Arc::new(render));
                true
            }
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to reload config, keeping current render defaults");
                false
            }
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let handler = Arc::new(self);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::debug!(kind = ?event.kind, "Config file change detected");
                    handler.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
