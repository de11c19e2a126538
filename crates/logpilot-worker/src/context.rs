use logpilot_logs::{FilterTracker, SearchResults};
use logpilot_types::{WorkerEvent, WorkerRequest};

/// Everything a viewer knows about the log, built from worker events
///
/// Methods that need the worker return the request to send rather than
/// sending it, so the model stays independent of how requests travel.
#[derive(Debug, Default)]
pub struct ClientContext {
    lines: Vec<String>,
    html_lines: Vec<String>,
    search_query: Option<String>,
    search_results: SearchResults,
    filters: FilterTracker,
    preview_query: String,
    preview_count: usize,
    client_offset: usize,
    running: bool,
    awaiting: bool,
}

impl ClientContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one worker event into the model
    pub fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::AppendLogs { logs, html_logs } => {
                self.lines.extend(logs);
                self.html_lines.extend(html_logs);
                self.awaiting = false;
            }
            WorkerEvent::SearchResultSet { query, results } => {
                // Late batches from a superseded query are dropped
                if query == self.search_query {
                    self.search_results.extend(&results);
                }
                self.awaiting = false;
            }
            WorkerEvent::FilteredLinesResult { query, results } => {
                self.filters.append_results(&query, &results);
            }
            WorkerEvent::FilteredLinesCountResult { query, count } => {
                if query == self.preview_query {
                    self.preview_count += count;
                }
            }
            WorkerEvent::Started => {
                self.running = true;
                self.awaiting = false;
            }
            WorkerEvent::Stopped => {
                self.running = false;
                self.awaiting = false;
            }
            WorkerEvent::AwaitingLogData => self.awaiting = true,
        }
    }

    /// Replace the live search. Returns `None` when the query is unchanged.
    pub fn search(&mut self, query: &str) -> Option<WorkerRequest> {
        let query = (!query.is_empty()).then(|| query.to_string());
        if query == self.search_query {
            return None;
        }
        self.search_query = query;
        self.search_results.clear();
        Some(WorkerRequest::Search {
            query: self.search_query.clone().unwrap_or_default(),
            client_offset: Some(self.client_offset),
        })
    }

    pub fn add_filter(&mut self, query: &str) -> Option<WorkerRequest> {
        if !self.filters.add(query) {
            return None;
        }
        Some(WorkerRequest::GetFilteredLines {
            query: query.to_string(),
            client_offset: self.client_offset,
        })
    }

    pub fn remove_filter(&mut self, query: &str) -> Option<WorkerRequest> {
        if !self.filters.remove(query) {
            return None;
        }
        Some(WorkerRequest::RemoveFilter {
            query: query.to_string(),
        })
    }

    /// Start counting lines matching `query` from the client offset
    pub fn enqueue_preview_line_count(&mut self, query: &str) -> WorkerRequest {
        self.preview_query = query.to_string();
        self.preview_count = 0;
        WorkerRequest::GetFilteredLinesCount {
            query: self.preview_query.clone(),
            client_offset: self.client_offset,
        }
    }

    /// Hide everything received so far: the client offset moves to the
    /// current line count and the preview and every filter restart from it
    pub fn clear(&mut self) -> Vec<WorkerRequest> {
        self.client_offset = self.lines.len();
        self.preview_count = 0;
        self.filters.clear_matches();

        let mut requests = Vec::new();
        if !self.preview_query.is_empty() {
            requests.push(WorkerRequest::GetFilteredLinesCount {
                query: self.preview_query.clone(),
                client_offset: self.client_offset,
            });
        }
        requests.extend(
            self.filters
                .queries()
                .map(|query| WorkerRequest::GetFilteredLines {
                    query: query.to_string(),
                    client_offset: self.client_offset,
                }),
        );
        requests
    }

    pub fn restart(&self) -> WorkerRequest {
        WorkerRequest::Restart
    }

    pub fn stop(&self) -> WorkerRequest {
        WorkerRequest::Stop
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn html(&self, index: usize) -> Option<&str> {
        self.html_lines.get(index).map(String::as_str)
    }

    pub fn count(&self) -> usize {
        self.lines.len()
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    pub fn search_results(&self) -> &[usize] {
        self.search_results.as_slice()
    }

    /// Result after `current`, wrapping around
    pub fn next_result(&self, current: Option<usize>) -> Option<usize> {
        self.search_results.next_after(current)
    }

    /// Result before `current`, wrapping around
    pub fn previous_result(&self, current: Option<usize>) -> Option<usize> {
        self.search_results.previous_before(current)
    }

    pub fn is_filtered_out(&self, index: usize) -> bool {
        self.filters.is_filtered_out(index)
    }

    pub fn has_filters(&self) -> bool {
        self.filters.is_active()
    }

    pub fn filter_known_count(&self, query: &str) -> Option<usize> {
        self.filters.known_count(query)
    }

    pub fn preview_line_count(&self) -> usize {
        self.preview_count
    }

    pub fn client_offset(&self) -> usize {
        self.client_offset
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Indices a viewer would render: past the client offset and not
    /// hidden by filters
    pub fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (self.client_offset..self.lines.len()).filter(|&index| !self.is_filtered_out(index))
    }
}
