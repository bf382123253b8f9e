//! Development live reload.
//!
//! # Data Flow
//! ```text
//! GET {static}/refresh.js → client.rs script (EventSource on /___refresh___)
//! GET /___refresh___      → channel.rs stream → text/event-stream
//!     first frame:  data: <build id>\nretry: 100\n\n
//!     then every interval: data: <build id>\n\n
//! Browser compares the id with the one baked into the script and reloads
//! when they differ (the server restarted with a new build).
//! ```

pub mod channel;
pub mod client;

pub use channel::{BuildId, LiveReloadChannel, LiveReloadEvent, REFRESH_PATH};
pub use client::{client_script, script_response};
