//! Background worker: log mirror plus every search and filter scan
//!
//! One task owns all state. Frames, UI requests, the flush tick and the
//! search timers are multiplexed with `select!`, so no two of them ever run
//! at the same time.

use std::collections::HashMap;
use std::time::Duration;

use futures::StreamExt;
use logpilot_logs::{SearchInstance, SearchTiming};
use logpilot_types::{ClientMessage, ServerMessage, WorkerEvent, WorkerRequest};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::time::{DelayQueue, delay_queue};
use tracing::{debug, info};

use crate::config::WorkerConfig;
use crate::connection::{Inbound, spawn_connection, websocket_url};
use crate::error::WorkerError;
use crate::mirror::{LogMirror, render_html};

/// Which scan a timer belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchKey {
    /// The interactive search
    Live,
    /// A filter, keyed by its query text
    Filter(String),
    /// Line count preview for a prospective filter
    PreviewCount,
}

struct ScheduledSearch {
    instance: SearchInstance,
    /// Query text as requested, even if it failed to compile
    query: String,
    timer: Option<delay_queue::Key>,
}

pub struct Worker {
    timing: SearchTiming,
    flush_interval: Duration,
    mirror: LogMirror,
    searches: HashMap<SearchKey, ScheduledSearch>,
    timers: DelayQueue<SearchKey>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    awaiting: bool,
}

impl Worker {
    pub fn new(
        config: &WorkerConfig,
        events: mpsc::UnboundedSender<WorkerEvent>,
        outbound: mpsc::UnboundedSender<ClientMessage>,
    ) -> Self {
        let timing = config.search_timing();
        let mut searches = HashMap::new();
        searches.insert(
            SearchKey::Live,
            ScheduledSearch {
                instance: SearchInstance::new(timing),
                query: String::new(),
                timer: None,
            },
        );

        Self {
            timing,
            flush_interval: config.flush_interval(),
            mirror: LogMirror::new(),
            searches,
            timers: DelayQueue::new(),
            events,
            outbound,
            awaiting: false,
        }
    }

    pub fn mirror(&self) -> &LogMirror {
        &self.mirror
    }

    /// Whether the server announced lines that have not been flushed yet
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    fn emit(&self, event: WorkerEvent) {
        // The UI side going away is handled by the request channel closing
        let _ = self.events.send(event);
    }

    pub fn handle_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Connected => debug!("Worker connected"),
            Inbound::Disconnected => self.awaiting = false,
            Inbound::Message(ServerMessage::LogFrame { logs, cursor }) => {
                self.mirror.receive_frame(logs, cursor);
            }
            Inbound::Message(ServerMessage::AwaitingLogData) => {
                self.awaiting = true;
                self.emit(WorkerEvent::AwaitingLogData);
            }
            Inbound::Message(ServerMessage::Started) => self.emit(WorkerEvent::Started),
            Inbound::Message(ServerMessage::Stopped) => self.emit(WorkerEvent::Stopped),
        }
    }

    /// Move pending frames into the mirror and announce them
    pub fn flush(&mut self) {
        if let Some(logs) = self.mirror.flush() {
            self.awaiting = false;
            let html_logs = logs.iter().map(|line| render_html(line)).collect();
            self.emit(WorkerEvent::AppendLogs { logs, html_logs });
        }
    }

    pub fn handle_request(&mut self, request: WorkerRequest) {
        match request {
            WorkerRequest::Search {
                query,
                client_offset,
            } => self.search(query, client_offset),
            WorkerRequest::GetFilteredLines {
                query,
                client_offset,
            } => self.replace(SearchKey::Filter(query.clone()), query, client_offset),
            WorkerRequest::GetFilteredLinesCount {
                query,
                client_offset,
            } => self.replace(SearchKey::PreviewCount, query, client_offset),
            WorkerRequest::RemoveFilter { query } => self.cancel(&SearchKey::Filter(query)),
            WorkerRequest::Restart => self.send(ClientMessage::Restart),
            WorkerRequest::Stop => self.send(ClientMessage::Stop),
        }
    }

    fn send(&self, message: ClientMessage) {
        if self.outbound.send(message).is_err() {
            debug!(?message, "Connection closed, dropping request");
        }
    }

    fn search(&mut self, query: String, client_offset: Option<usize>) {
        let Some(live) = self.searches.get_mut(&SearchKey::Live) else {
            return;
        };
        if live.query == query {
            return;
        }

        if let Some(timer) = live.timer.take() {
            self.timers.try_remove(&timer);
        }
        live.instance.stop();
        live.instance.set_query(&query);
        live.query = query;

        if live.query.is_empty() {
            return;
        }
        if let Some(offset) = client_offset {
            live.instance.set_client_offset(offset);
        }
        live.instance.start();
        self.schedule(SearchKey::Live, Duration::ZERO);
    }

    /// Cancel any scan under `key` and start a fresh one
    fn replace(&mut self, key: SearchKey, query: String, client_offset: usize) {
        self.cancel(&key);

        let mut instance = SearchInstance::new(self.timing);
        instance.set_query(&query);
        instance.set_client_offset(client_offset);
        instance.start();

        self.searches.insert(
            key.clone(),
            ScheduledSearch {
                instance,
                query,
                timer: None,
            },
        );
        self.schedule(key, Duration::ZERO);
    }

    fn cancel(&mut self, key: &SearchKey) {
        if let Some(mut scheduled) = self.searches.remove(key) {
            scheduled.instance.stop();
            if let Some(timer) = scheduled.timer.take() {
                self.timers.try_remove(&timer);
            }
        }
    }

    /// (Re)arm the timer for `key`, replacing any pending one
    fn schedule(&mut self, key: SearchKey, delay: Duration) {
        let Some(scheduled) = self.searches.get_mut(&key) else {
            return;
        };
        if let Some(timer) = scheduled.timer.take() {
            self.timers.try_remove(&timer);
        }
        scheduled.timer = Some(self.timers.insert(key, delay));
    }

    /// Run one batch for the scan whose timer fired
    fn on_timer(&mut self, key: SearchKey) {
        let Some(scheduled) = self.searches.get_mut(&key) else {
            return;
        };
        scheduled.timer = None;

        let outcome = scheduled.instance.search_batch(self.mirror.lines());
        if !outcome.results.is_empty() {
            let event = match &key {
                SearchKey::Live => WorkerEvent::SearchResultSet {
                    query: scheduled.instance.query().map(str::to_string),
                    results: outcome.results,
                },
                SearchKey::Filter(query) => WorkerEvent::FilteredLinesResult {
                    query: query.clone(),
                    results: outcome.results,
                },
                SearchKey::PreviewCount => WorkerEvent::FilteredLinesCountResult {
                    query: scheduled.query.clone(),
                    count: outcome.results.len(),
                },
            };
            self.emit(event);
        }

        if let Some(delay) = outcome.next_tick {
            self.schedule(key, delay);
        }
    }

    /// Drive the worker until cancelled or the request channel closes
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<Inbound>,
        mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
        cancel: CancellationToken,
    ) {
        let mut flush = tokio::time::interval(self.flush_interval);
        flush.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = flush.tick() => self.flush(),
                Some(message) = inbound.recv() => self.handle_inbound(message),
                request = requests.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
                Some(expired) = self.timers.next(), if !self.timers.is_empty() => {
                    self.on_timer(expired.into_inner());
                }
            }
        }

        info!(lines = self.mirror.len(), "Worker stopped");
    }
}

/// A running worker attached to a server
pub struct WorkerHandle {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    connection: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn send(&self, request: WorkerRequest) {
        let _ = self.requests.send(request);
    }

    /// Next event from the worker; `None` once it has stopped
    pub async fn recv(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.worker.await;
        let _ = self.connection.await;
    }
}

/// Connect to the dashboard at `dashboard_url` and start a worker for it
pub fn spawn_worker(
    dashboard_url: &str,
    config: &WorkerConfig,
    cancel: CancellationToken,
) -> Result<WorkerHandle, WorkerError> {
    let url = websocket_url(dashboard_url)?;

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let connection = spawn_connection(
        url,
        config.backoff(),
        outbound_rx,
        inbound_tx,
        cancel.clone(),
    );
    let worker = Worker::new(config, events_tx, outbound_tx);
    let worker = tokio::spawn(worker.run(inbound_rx, requests_rx, cancel.clone()));

    Ok(WorkerHandle {
        requests: requests_tx,
        events: events_rx,
        cancel,
        worker,
        connection,
    })
}
