//! Log fan-out server for logpilot
//!
//! A [`Session`] holds every line received from the input source (a child
//! process or piped stdin) and delivers them to websocket clients, each at
//! its own cursor, on a fixed tick.

mod bootstrap;
mod broadcast;
mod config;
mod error;
mod pipe;
mod pool;
mod routes;
mod runner;
mod session;

pub use bootstrap::{bind, dashboard_url, serve};
pub use broadcast::spawn_broadcaster;
pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::ServerError;
pub use pipe::run_pipe;
pub use pool::{ClientId, ClientPool};
pub use routes::router;
pub use runner::run_command;
pub use session::{ControlRequest, ProcessStatus, Session, generate_token};
