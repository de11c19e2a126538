mod action;
mod runner;
mod state;

pub use action::Action;
pub use runner::{DashboardOptions, run_dashboard};
pub use state::{DashboardState, Snapshot};
