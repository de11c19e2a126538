//! Terminal dashboard for logpilot
//!
//! While the server runs, this crate shows where the web dashboard lives,
//! how many lines and clients there are, what the command is doing and the
//! last lines of its output. It also lets the user restart or stop the
//! command from the terminal.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, DashboardOptions, DashboardState, Snapshot, run_dashboard};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{DASHBOARD_HINTS, HelpOverlay, StatusBar};
pub use ui::screens::DashboardScreen;
pub use ui::{Layout, Theme};
