use chrono::{DateTime, Local};
use logpilot_logs::strip_ansi;
use logpilot_server::{ControlRequest, ProcessStatus, Session};

use super::Action;

/// Values read from the session on every tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub line_count: usize,
    pub client_count: usize,
    pub status: ProcessStatus,
    /// Last lines of the log with escape sequences removed
    pub tail: Vec<String>,
    pub taken_at: DateTime<Local>,
}

impl Snapshot {
    /// Read the session, keeping at most `rows` tail lines
    pub fn capture(session: &Session, rows: usize) -> Self {
        Self {
            line_count: session.len(),
            client_count: session.client_count(),
            status: session.status(),
            tail: session.tail(rows).iter().map(|line| strip_ansi(line)).collect(),
            taken_at: Local::now(),
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            line_count: 0,
            client_count: 0,
            status: ProcessStatus::Waiting,
            tail: Vec::new(),
            taken_at: Local::now(),
        }
    }
}

/// Dashboard state
pub struct DashboardState {
    /// Command being run, or a description of the source
    pub title: String,
    /// Address of the web dashboard, token included
    pub url: String,
    pub snapshot: Snapshot,
    /// Feedback for the last key press, cleared on the next tick
    pub notice: Option<String>,
    pub help_visible: bool,
    pub should_quit: bool,
}

impl DashboardState {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snapshot: Snapshot::default(),
            notice: None,
            help_visible: false,
            should_quit: false,
        }
    }

    /// Apply an action. Process control actions are returned for the caller
    /// to hand to the session.
    pub fn handle(&mut self, action: Action) -> Option<ControlRequest> {
        match action {
            Action::Quit => {
                self.should_quit = true;
                None
            }
            Action::Restart => {
                self.notice = Some("restart requested".to_string());
                Some(ControlRequest::Restart)
            }
            Action::Stop => {
                self.notice = Some("stop requested".to_string());
                Some(ControlRequest::Stop)
            }
            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
                None
            }
            Action::CloseHelp => {
                self.help_visible = false;
                None
            }
            Action::Tick => {
                self.notice = None;
                None
            }
            Action::Render => None,
        }
    }

    /// Short label for the process state shown in the header
    pub fn status_label(&self) -> String {
        match &self.snapshot.status {
            ProcessStatus::Waiting => "waiting".to_string(),
            ProcessStatus::Piped => "reading stdin".to_string(),
            ProcessStatus::Running { since } => {
                format!("running since {}", since.format("%H:%M:%S"))
            }
            ProcessStatus::Exited { code: Some(code), at } => {
                format!("exited with code {} at {}", code, at.format("%H:%M:%S"))
            }
            ProcessStatus::Exited { code: None, at } => {
                format!("exited at {}", at.format("%H:%M:%S"))
            }
        }
    }
}
