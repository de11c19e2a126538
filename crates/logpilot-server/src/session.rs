use std::sync::Arc;

use chrono::{DateTime, Local};
use logpilot_logs::LogStore;
use logpilot_types::{ClientMessage, ServerMessage};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::pool::{ClientId, ClientPool};

/// Length of a generated dashboard token
const TOKEN_LEN: usize = 24;

/// Remote request to control the input source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    Stop,
    Restart,
}

impl From<ClientMessage> for ControlRequest {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Stop => Self::Stop,
            ClientMessage::Restart => Self::Restart,
        }
    }
}

/// What the input source is doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    /// No source attached yet
    Waiting,
    /// Reading piped stdin
    Piped,
    Running { since: DateTime<Local> },
    Exited { code: Option<i32>, at: DateTime<Local> },
}

/// State of one server run: the log store, connected clients, the token
/// and the channel that carries client control requests to the input source.
pub struct Session {
    store: LogStore,
    pool: ClientPool,
    token: String,
    max_frame_lines: usize,
    status: RwLock<ProcessStatus>,
    control: mpsc::UnboundedSender<ControlRequest>,
}

impl Session {
    /// Create a session and the receiving end of its control channel
    pub fn new(config: &ServerConfig) -> (Arc<Self>, mpsc::UnboundedReceiver<ControlRequest>) {
        let (control, requests) = mpsc::unbounded_channel();
        let token = config.secret.clone().unwrap_or_else(generate_token);

        let session = Arc::new(Self {
            store: LogStore::new(),
            pool: ClientPool::new(),
            token,
            max_frame_lines: config.max_frame_lines.max(1),
            status: RwLock::new(ProcessStatus::Waiting),
            control,
        });
        (session, requests)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Split a raw chunk into lines and append them
    pub fn push_chunk(&self, chunk: &[u8]) -> usize {
        self.store.push_chunk(chunk)
    }

    /// Append one already-formed line
    pub fn push_line(&self, line: impl Into<String>) {
        self.store.append(std::iter::once(line.into()));
    }

    pub fn tail(&self, n: usize) -> Vec<String> {
        self.store.tail(n)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn client_count(&self) -> usize {
        self.pool.count()
    }

    pub fn status(&self) -> ProcessStatus {
        self.status.read().clone()
    }

    pub fn set_status(&self, status: ProcessStatus) {
        *self.status.write() = status;
    }

    /// Tell every client the process (re)started
    pub fn send_started(&self) {
        self.set_status(ProcessStatus::Running {
            since: Local::now(),
        });
        self.pool.broadcast(&ServerMessage::Started);
    }

    /// Tell every client the process exited
    pub fn send_stopped(&self, code: Option<i32>) {
        self.set_status(ProcessStatus::Exited {
            code,
            at: Local::now(),
        });
        self.pool.broadcast(&ServerMessage::Stopped);
    }

    /// Register a websocket client
    pub fn connect(&self) -> (ClientId, mpsc::UnboundedReceiver<ServerMessage>) {
        self.pool.add(&self.store)
    }

    pub fn disconnect(&self, id: ClientId) {
        self.pool.remove(id);
    }

    /// Push pending lines to every client that is behind
    pub fn deliver_frames(&self) -> usize {
        let sent = self.pool.deliver_frames(&self.store, self.max_frame_lines);
        if sent > 0 {
            debug!(frames = sent, lines = self.store.len(), "Delivered log frames");
        }
        sent
    }

    /// Forward a client's control request to the input source
    pub fn request(&self, request: ControlRequest) {
        if self.control.send(request).is_err() {
            debug!(?request, "No input source is listening for control requests");
        }
    }
}

/// Random hex token for the dashboard URL
pub fn generate_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(TOKEN_LEN);
    token
}

/// Highlighted status line, e.g. `~ process starting ~`
pub(crate) fn banner_line(text: &str) -> String {
    format!("\x1b[1;104m{text}\x1b[0m")
}

/// Highlighted warning line
pub(crate) fn alert_line(text: &str) -> String {
    format!("\x1b[1;101m{text}\x1b[0m")
}

/// Echo of the command being run
pub(crate) fn command_line(command: &[String]) -> String {
    format!("\x1b[1;92m$ \x1b[0m\x1b[2;37m{}\x1b[0m", command.join(" "))
}
