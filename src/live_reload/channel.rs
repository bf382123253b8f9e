//! Build-identifier event stream.
//!
//! # Data Flow
//! ```text
//! open(cancel)
//!     → Open: yield first event (id + retry hint), start interval
//!     → Emitting: on each tick yield the id again
//!     → cancelled or dropped: stream ends, interval released
//! ```
//!
//! # Design Decisions
//! - One `tokio::time::Interval` per connection, owned by the stream state,
//!   so dropping the stream is the only cleanup needed
//! - Cancellation wins over a ready tick (`biased` select)
//! - Ending on cancellation is normal termination, not an error

use std::convert::Infallible;
use std::fmt::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::LiveReloadConfig;
use crate::observability::metrics;

/// Path of the live-reload event stream.
pub const REFRESH_PATH: &str = "/___refresh___";

const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_RETRY: Duration = Duration::from_millis(100);

/// Identifier of the running build, chosen once at process start.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BuildId(Arc<str>);

impl BuildId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BuildId {
    fn from(id: &str) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One server-sent event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveReloadEvent {
    pub build_id: BuildId,
    /// Reconnect hint; only set on the first event.
    pub retry: Option<Duration>,
}

impl LiveReloadEvent {
    /// Wire form: `data: <id>\n`, `retry: <ms>\n` when set, then a blank line.
    pub fn frame(&self) -> Bytes {
        let mut frame = format!("data: {}\n", self.build_id);
        if let Some(retry) = self.retry {
            let _ = writeln!(frame, "retry: {}", retry.as_millis());
        }
        frame.push('\n');
        Bytes::from(frame)
    }
}

/// Counts the connection in the live-reload gauge while alive.
struct ConnectionGuard;

impl ConnectionGuard {
    fn new() -> Self {
        metrics::live_reload_opened();
        tracing::debug!("Live-reload stream opened");
        Self
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        metrics::live_reload_closed();
        tracing::debug!("Live-reload stream closed");
    }
}

enum State {
    Open(ConnectionGuard),
    Emitting {
        ticker: Interval,
        _guard: ConnectionGuard,
    },
}

/// Factory for live-reload streams.
#[derive(Clone, Debug)]
pub struct LiveReloadChannel {
    build_id: BuildId,
    interval: Duration,
    retry: Duration,
}

impl LiveReloadChannel {
    pub fn new(build_id: BuildId) -> Self {
        Self {
            build_id,
            interval: DEFAULT_INTERVAL,
            retry: DEFAULT_RETRY,
        }
    }

    pub fn from_config(build_id: BuildId, config: &LiveReloadConfig) -> Self {
        Self::new(build_id)
            .with_interval(Duration::from_millis(config.interval_ms))
            .with_retry(Duration::from_millis(config.retry_ms))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    pub fn build_id(&self) -> &BuildId {
        &self.build_id
    }

    /// Open a stream of build-identifier events that ends on `cancel`.
    pub fn open(&self, cancel: CancellationToken) -> impl Stream<Item = LiveReloadEvent> + Send + 'static {
        let build_id = self.build_id.clone();
        let period = self.interval;
        let retry = self.retry;

        futures_util::stream::unfold(State::Open(ConnectionGuard::new()), move |state| {
            let build_id = build_id.clone();
            let cancel = cancel.clone();
            async move {
                match state {
                    State::Open(guard) => {
                        if cancel.is_cancelled() {
                            return None;
                        }
                        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        let first = LiveReloadEvent {
                            build_id,
                            retry: Some(retry),
                        };
                        Some((first, State::Emitting { ticker, _guard: guard }))
                    }
                    State::Emitting { mut ticker, _guard } => {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            _ = ticker.tick() => {
                                let event = LiveReloadEvent { build_id, retry: None };
                                Some((event, State::Emitting { ticker, _guard }))
                            }
                        }
                    }
                }
            }
        })
    }

    /// The stream as a `text/event-stream` response.
    pub fn response(&self, cancel: CancellationToken) -> Response {
        let frames = self.open(cancel).map(|event| Ok::<_, Infallible>(event.frame()));
        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(frames),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> LiveReloadChannel {
        LiveReloadChannel::new(BuildId::from("v1"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_event_then_interval() {
        let cancel = CancellationToken::new();
        let mut stream = Box::pin(channel().open(cancel.clone()));

        let first = stream.next().await.unwrap();
        assert_eq!(first.build_id.as_str(), "v1");
        assert_eq!(first.retry, Some(Duration::from_millis(100)));

        let start = Instant::now();
        let second = stream.next().await.unwrap();
        assert_eq!(second.build_id.as_str(), "v1");
        assert_eq!(second.retry, None);
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_after_cancellation() {
        let cancel = CancellationToken::new();
        let mut stream = Box::pin(channel().open(cancel.clone()));
        stream.next().await.unwrap();

        cancel.cancel();
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_first_poll() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut stream = Box::pin(channel().open(cancel));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_interval() {
        let channel = channel().with_interval(Duration::from_millis(50));
        let mut stream = Box::pin(channel.open(CancellationToken::new()));
        stream.next().await.unwrap();

        let start = Instant::now();
        stream.next().await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_frames() {
        let first = LiveReloadEvent {
            build_id: BuildId::from("v1"),
            retry: Some(Duration::from_millis(100)),
        };
        assert_eq!(&first.frame()[..], b"data: v1\nretry: 100\n\n");

        let later = LiveReloadEvent {
            build_id: BuildId::from("v1"),
            retry: None,
        };
        assert_eq!(&later.frame()[..], b"data: v1\n\n");
    }

    #[test]
    fn test_build_ids_are_unique() {
        assert_ne!(BuildId::generate(), BuildId::generate());
    }
}
