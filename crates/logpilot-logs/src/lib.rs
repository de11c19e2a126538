//! Log engine for logpilot
//!
//! This crate turns raw process output into indexed lines and provides the
//! incremental search machinery that runs over them: query parsing, batched
//! search instances, filter match tracking, and display helpers.

mod ansi;
mod query;
mod schedule;
mod search;
mod splitter;
mod store;
mod tracker;

pub use ansi::{ansi_to_html, strip_ansi};
pub use query::{Query, QueryError};
pub use schedule::spawn_periodic;
pub use search::{BatchOutcome, SearchInstance, SearchState, SearchTiming};
pub use splitter::split_chunk;
pub use store::LogStore;
pub use tracker::{FilterTracker, SearchResults};
