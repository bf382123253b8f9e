//! Incremental HTML streaming.
//!
//! # Data Flow
//! ```text
//! Arc<Node> document
//!     → blocking task walks the tree, buffering serialized HTML
//!     → buffer ≥ flush threshold → chunk sent on a bounded channel
//!     → ReceiverStream.take_until(cancelled) → response Body
//!     → task result: StreamOutcome
//! ```
//!
//! # Design Decisions
//! - Component nodes are evaluated here, so component failures happen
//!   after headers are sent: they are reported and their subtree skipped
//! - Cancellation is checked before every node and every flush; a dropped
//!   body (client gone) counts as cancellation
//! - A flush waiting on a full channel also wakes on cancellation, so a
//!   client that stops reading cannot pin a blocking thread
//! - Cancellation never reaches the error hook

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use bytes::Bytes;
use futures_util::StreamExt;
use maud::Render;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::render::component::ComponentError;
use crate::render::markup::{is_valid_name, Element, Node};

/// Written before the document tree.
pub const DOCTYPE: &str = "<!DOCTYPE html>";

const CHANNEL_CAPACITY: usize = 16;

/// A component failure observed while streaming.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("component `{component}` failed: {source}")]
pub struct StreamError {
    pub component: String,
    pub source: ComponentError,
}

/// Observer called for each streaming error.
#[derive(Clone)]
pub struct ErrorHook(Arc<dyn Fn(&StreamError) + Send + Sync>);

impl ErrorHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn call(&self, error: &StreamError) {
        (self.0)(error)
    }
}

impl fmt::Debug for ErrorHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorHook")
    }
}

/// How a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every node rendered.
    Complete { bytes: usize },
    /// Finished, but some components failed and were skipped.
    Partial { bytes: usize, errors: Vec<StreamError> },
    /// Stopped early; `bytes` were already handed to the transport.
    Cancelled { bytes: usize },
}

impl StreamOutcome {
    pub fn bytes(&self) -> usize {
        match self {
            Self::Complete { bytes } | Self::Partial { bytes, .. } | Self::Cancelled { bytes } => *bytes,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "complete",
            Self::Partial { .. } => "partial",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Per-stream options.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    pub cancel: Option<CancellationToken>,
    pub on_error: Option<ErrorHook>,
}

/// Handle on the background serialization task.
#[derive(Debug)]
pub struct StreamHandle {
    task: JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    /// Wait for the stream to finish.
    ///
    /// Errors only if the serialization task panicked.
    pub async fn outcome(self) -> Result<StreamOutcome, JoinError> {
        self.task.await
    }
}

/// Turns documents into streamed bodies.
#[derive(Debug, Clone, Copy)]
pub struct StreamRenderer {
    flush_threshold: usize,
}

impl StreamRenderer {
    pub fn new(flush_threshold: usize) -> Self {
        Self {
            flush_threshold: flush_threshold.max(1),
        }
    }

    /// Start streaming `document`. Must be called within a Tokio runtime.
    pub fn render(&self, document: Arc<Node>, options: StreamOptions) -> (Body, StreamHandle) {
        let cancel = options.cancel.unwrap_or_default();
        let (tx, rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);

        let mut writer = DocumentWriter {
            buf: String::with_capacity(self.flush_threshold),
            tx,
            runtime: Handle::current(),
            cancel: cancel.clone(),
            threshold: self.flush_threshold,
            sent: 0,
            errors: Vec::new(),
            on_error: options.on_error,
        };
        let task = tokio::task::spawn_blocking(move || {
            let outcome = writer.run(&document);
            metrics::record_render(&outcome);
            match &outcome {
                StreamOutcome::Cancelled { bytes } => {
                    tracing::debug!(bytes, "Stream cancelled")
                }
                other => tracing::debug!(bytes = other.bytes(), outcome = other.label(), "Stream finished"),
            }
            outcome
        });

        let chunks = ReceiverStream::new(rx)
            .take_until(cancel.cancelled_owned())
            .map(Ok::<_, Infallible>);

        (Body::from_stream(chunks), StreamHandle { task })
    }
}

/// Marker for an early stop.
struct Cancelled;

struct DocumentWriter {
    buf: String,
    tx: mpsc::Sender<Bytes>,
    runtime: Handle,
    cancel: CancellationToken,
    threshold: usize,
    sent: usize,
    errors: Vec<StreamError>,
    on_error: Option<ErrorHook>,
}

impl DocumentWriter {
    fn run(&mut self, document: &Node) -> StreamOutcome {
        self.buf.push_str(DOCTYPE);
        let result = self.node(document).and_then(|()| self.flush());

        match result {
            Err(Cancelled) => StreamOutcome::Cancelled { bytes: self.sent },
            Ok(()) if self.errors.is_empty() => StreamOutcome::Complete { bytes: self.sent },
            Ok(()) => StreamOutcome::Partial {
                bytes: self.sent,
                errors: std::mem::take(&mut self.errors),
            },
        }
    }

    fn node(&mut self, node: &Node) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }

        match node {
            Node::Text(text) => {
                text.render_to(&mut self.buf);
                self.maybe_flush()
            }
            Node::Raw(html) => {
                self.buf.push_str(html);
                self.maybe_flush()
            }
            Node::Fragment(children) => children.iter().try_for_each(|child| self.node(child)),
            Node::Element(el) => self.element(el),
            Node::Component { component, props } => match component.call(props) {
                Ok(rendered) => self.node(&rendered),
                Err(source) => {
                    self.report(StreamError {
                        component: component.name().to_string(),
                        source,
                    });
                    Ok(())
                }
            },
        }
    }

    fn element(&mut self, el: &Element) -> Result<(), Cancelled> {
        if !is_valid_name(&el.tag) {
            tracing::warn!(tag = %el.tag, "Skipping element with invalid tag name");
            return Ok(());
        }
        self.buf.push('<');
        self.buf.push_str(&el.tag);
        for (name, value) in &el.attrs {
            if !is_valid_name(name) {
                tracing::warn!(tag = %el.tag, attribute = %name, "Skipping invalid attribute name");
                continue;
            }
            self.buf.push(' ');
            self.buf.push_str(name);
            self.buf.push_str("=\"");
            value.render_to(&mut self.buf);
            self.buf.push('"');
        }
        self.buf.push('>');

        if el.is_void() {
            return self.maybe_flush();
        }

        for child in &el.children {
            self.node(child)?;
        }

        self.buf.push_str("</");
        self.buf.push_str(&el.tag);
        self.buf.push('>');
        self.maybe_flush()
    }

    fn report(&mut self, error: StreamError) {
        match &self.on_error {
            Some(hook) => hook.call(&error),
            None => tracing::error!(component = %error.component, error = %error.source, "Component failed while streaming"),
        }
        self.errors.push(error);
    }

    fn maybe_flush(&mut self) -> Result<(), Cancelled> {
        if self.buf.len() >= self.threshold {
            self.flush()
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(std::mem::take(&mut self.buf));
        let len = chunk.len();
        let (tx, cancel) = (&self.tx, &self.cancel);
        self.runtime.block_on(async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Cancelled),
                // Receiver dropped: the client went away.
                sent = tx.send(chunk) => sent.map_err(|_| Cancelled),
            }
        })?;
        self.sent += len;
        Ok(())
    }
}
