//! Incremental, interruptible scan over a growing line buffer
//!
//! A [`SearchInstance`] owns a query and a scan cursor. Each call to
//! [`SearchInstance::search_batch`] visits at most `batch_size` lines and
//! reports how long the caller should wait before the next batch. The caller
//! owns the timer; the instance only decides what to scan.

use std::time::Duration;

use tracing::warn;

use crate::query::Query;

/// Scan pacing for a search instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTiming {
    /// Maximum number of lines visited per batch
    pub batch_size: usize,

    /// Delay between batches while a query is set
    pub batch_interval: Duration,

    /// Delay between polls while no query is set
    pub idle_interval: Duration,
}

impl Default for SearchTiming {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            batch_interval: Duration::from_millis(50),
            idle_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No query; polling slowly
    Idle,
    /// Advancing the cursor batch by batch
    Scanning,
    /// Cancelled; cursor parked at the baseline
    Stopped,
}

/// Result of one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Matching indices found in this batch, ascending
    pub results: Vec<usize>,

    /// When to run the next batch. `None` once the instance is stopped.
    pub next_tick: Option<Duration>,
}

pub struct SearchInstance {
    query: Option<Query>,

    /// First index this instance is allowed to report
    baseline: usize,

    /// Next index to visit
    cursor: usize,

    stopped: bool,

    timing: SearchTiming,
}

impl SearchInstance {
    /// Create an idle instance scanning from index 0
    pub fn new(timing: SearchTiming) -> Self {
        Self {
            query: None,
            baseline: 0,
            cursor: 0,
            stopped: false,
            timing,
        }
    }

    /// Replace the query. Empty text clears it and the instance idles.
    ///
    /// A malformed `/pattern/flags` query is logged and also leaves the
    /// instance idle. The cursor is not touched.
    pub fn set_query(&mut self, text: &str) {
        self.query = match Query::parse(text) {
            Ok(query) => query,
            Err(e) => {
                warn!(query = text, error = %e, "Ignoring unusable search query");
                None
            }
        };
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_ref().map(Query::text)
    }

    /// Treat `offset` as the first visible index and rewind the cursor to it
    pub fn set_client_offset(&mut self, offset: usize) {
        self.baseline = offset;
        self.cursor = offset;
    }

    pub fn start(&mut self) {
        self.stopped = false;
    }

    /// Cancel the scan and park the cursor at the baseline, so a later
    /// `start` rescans from there
    pub fn stop(&mut self) {
        self.stopped = true;
        self.cursor = self.baseline;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn state(&self) -> SearchState {
        if self.stopped {
            SearchState::Stopped
        } else if self.query.is_none() {
            SearchState::Idle
        } else {
            SearchState::Scanning
        }
    }

    /// Next index the instance will visit
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Scan one batch of `lines`.
    ///
    /// The cursor stops at the end of the available data, so an index that is
    /// not yet written is offered again on the next batch.
    pub fn search_batch(&mut self, lines: &[String]) -> BatchOutcome {
        if self.stopped {
            return BatchOutcome {
                results: Vec::new(),
                next_tick: None,
            };
        }

        let Some(query) = &self.query else {
            return BatchOutcome {
                results: Vec::new(),
                next_tick: Some(self.timing.idle_interval),
            };
        };

        let start = self.cursor;
        let end = start.saturating_add(self.timing.batch_size).min(lines.len());

        let results = lines
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter(|(_, line)| query.matches(line))
            .map(|(offset, _)| start + offset)
            .collect();
        self.cursor = start.max(end);

        BatchOutcome {
            results,
            next_tick: Some(self.timing.batch_interval),
        }
    }
}
