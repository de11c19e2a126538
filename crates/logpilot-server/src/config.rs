use serde::{Deserialize, Serialize};

/// Port tried first when none is given explicitly
pub const DEFAULT_PORT: u16 = 51515;

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name to bind and advertise
    pub host: String,

    /// Explicit port. When absent, [`DEFAULT_PORT`] is tried and an
    /// ephemeral port is used if it is taken.
    pub port: Option<u16>,

    /// Shared dashboard token. Generated when absent.
    pub secret: Option<String>,

    /// Broadcast tick in milliseconds
    pub frame_interval_ms: u64,

    /// Maximum lines per `log-frame`
    pub max_frame_lines: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            secret: None,
            frame_interval_ms: 100,
            max_frame_lines: 1000,
        }
    }
}
