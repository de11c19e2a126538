//! Shared types for logpilot
//!
//! This crate contains the messages exchanged between the server and its
//! websocket clients, and between the client worker and the UI it feeds.
//! Every message is a tagged enum so that an unknown kind is a decode error
//! rather than a silently ignored payload.

use serde::{Deserialize, Serialize};

// ============================================================================
// Server <-> Client wire protocol
// ============================================================================

/// Messages pushed by the server over the websocket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Next slice of lines, the first of which has index `cursor`
    LogFrame {
        #[serde(default)]
        logs: Vec<String>,
        #[serde(default)]
        cursor: Option<usize>,
    },
    /// The store already holds lines; the client should show a loading
    /// state until the first frame lands
    AwaitingLogData,
    /// The child process was (re)started
    Started,
    /// The child process exited
    Stopped,
}

impl ServerMessage {
    /// Build a log frame starting at `cursor`
    pub fn frame(logs: Vec<String>, cursor: usize) -> Self {
        Self::LogFrame {
            logs,
            cursor: Some(cursor),
        }
    }

    /// Serialize to the JSON text sent over the socket
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a JSON text frame received from the server
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Messages sent by a client to the server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Stop the child process
    Stop,
    /// Restart the child process
    Restart,
}

impl ClientMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

// ============================================================================
// Worker <-> UI protocol
// ============================================================================

/// Requests from the UI to the background worker
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum WorkerRequest {
    /// Replace the live search query (empty clears it)
    Search {
        #[serde(default)]
        query: String,
        #[serde(default)]
        client_offset: Option<usize>,
    },
    /// Start (or restart) tracking a filter from `client_offset`
    GetFilteredLines { query: String, client_offset: usize },
    /// Count lines matching `query` from `client_offset` (preview)
    GetFilteredLinesCount { query: String, client_offset: usize },
    /// Stop tracking a filter
    RemoveFilter { query: String },
    /// Ask the server to restart the child process
    Restart,
    /// Ask the server to stop the child process
    Stop,
}

/// Events from the background worker to the UI
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum WorkerEvent {
    /// Lines flushed into the mirror, raw and rendered
    AppendLogs {
        logs: Vec<String>,
        html_logs: Vec<String>,
    },
    /// One batch of live search matches
    SearchResultSet {
        query: Option<String>,
        results: Vec<usize>,
    },
    /// One batch of matches for a filter
    FilteredLinesResult { query: String, results: Vec<usize> },
    /// Match count of one preview batch
    FilteredLinesCountResult { query: String, count: usize },
    Started,
    Stopped,
    AwaitingLogData,
}

impl WorkerEvent {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
