use std::time::Duration;

use logpilot_logs::SearchTiming;
use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;

/// Client worker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Mirror flush tick in milliseconds
    pub flush_interval_ms: u64,

    /// Lines visited per search batch
    pub batch_size: usize,

    /// Delay between search batches in milliseconds
    pub batch_interval_ms: u64,

    /// Poll interval of a search with no query in milliseconds
    pub idle_interval_ms: u64,

    /// First reconnect delay in milliseconds
    pub reconnect_initial_ms: u64,

    /// Reconnect delay cap in milliseconds
    pub reconnect_max_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 50,
            batch_size: 10_000,
            batch_interval_ms: 50,
            idle_interval_ms: 1000,
            reconnect_initial_ms: 100,
            reconnect_max_ms: 30_000,
        }
    }
}

impl WorkerConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    pub fn search_timing(&self) -> SearchTiming {
        SearchTiming {
            batch_size: self.batch_size.max(1),
            batch_interval: Duration::from_millis(self.batch_interval_ms),
            idle_interval: Duration::from_millis(self.idle_interval_ms),
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.reconnect_initial_ms),
            Duration::from_millis(self.reconnect_max_ms),
        )
    }
}
