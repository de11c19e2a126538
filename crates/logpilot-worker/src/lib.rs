//! Client side of logpilot
//!
//! A [`Worker`] keeps a mirror of a server's log and runs the live search,
//! filter and preview scans over it in the background, reporting to the UI
//! through [`WorkerEvent`]s. [`ClientContext`] is the UI-side model fed by
//! those events.

mod backoff;
mod config;
mod connection;
mod context;
mod error;
mod mirror;
mod worker;

pub use backoff::Backoff;
pub use config::WorkerConfig;
pub use connection::{Inbound, spawn_connection, websocket_url};
pub use context::ClientContext;
pub use error::WorkerError;
pub use mirror::{LogMirror, render_html};
pub use worker::{SearchKey, Worker, WorkerHandle, spawn_worker};

pub use logpilot_types::{WorkerEvent, WorkerRequest};
