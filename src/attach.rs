//! Attach mode: follow another logpilot server from the terminal
//!
//! Lines are printed as the worker mirrors them. With filters, only lines
//! matching at least one filter are printed, each once. Filters scan
//! independently, so output is in log order per filter: each batch prints in
//! index order, but a batch for one filter may land before an earlier match
//! of another. Live search hits are printed with their line index.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use logpilot_logs::strip_ansi;
use logpilot_worker::{ClientContext, WorkerConfig, WorkerEvent, spawn_worker};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What to show for one worker event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A log line, printed to stdout
    Line(String),
    /// A status note, printed to stderr
    Notice(String),
}

/// Turns worker events into output while keeping `ClientContext` current
#[derive(Debug, Default)]
pub struct Printer {
    printed: BTreeSet<usize>,
}

impl Printer {
    pub fn on_event(&mut self, ctx: &mut ClientContext, event: WorkerEvent) -> Vec<Output> {
        let mut output = Vec::new();

        match &event {
            WorkerEvent::AppendLogs { logs, .. } if !ctx.has_filters() => {
                output.extend(logs.iter().cloned().map(Output::Line));
            }
            WorkerEvent::AppendLogs { .. } => {}
            WorkerEvent::FilteredLinesResult { results, .. } => {
                let mut batch = results.clone();
                batch.sort_unstable();
                for index in batch {
                    let Some(line) = ctx.line(index) else { continue };
                    if self.printed.insert(index) {
                        output.push(Output::Line(line.to_string()));
                    }
                }
            }
            WorkerEvent::SearchResultSet { query, results } => {
                if query.as_deref() == ctx.search_query() {
                    for &index in results {
                        if ctx.search_results().binary_search(&index).is_ok() {
                            continue;
                        }
                        if let Some(line) = ctx.line(index) {
                            output.push(Output::Notice(format!(
                                "match {index}: {}",
                                strip_ansi(line)
                            )));
                        }
                    }
                }
            }
            WorkerEvent::FilteredLinesCountResult { .. } => {}
            WorkerEvent::Started => output.push(Output::Notice("~ process started ~".into())),
            WorkerEvent::Stopped => output.push(Output::Notice("~ process stopped ~".into())),
            WorkerEvent::AwaitingLogData => {
                output.push(Output::Notice("~ loading log data ~".into()))
            }
        }

        ctx.apply(event);
        output
    }
}

/// Follow the server at `url` until Ctrl-C or `cancel`
pub async fn run_attach(
    url: &str,
    config: &WorkerConfig,
    filters: &[String],
    search: Option<&str>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut handle = spawn_worker(url, config, cancel.child_token())
        .with_context(|| format!("Cannot attach to {url}"))?;
    let mut ctx = ClientContext::new();
    let mut printer = Printer::default();

    for filter in filters {
        if let Some(request) = ctx.add_filter(filter) {
            handle.send(request);
        }
    }
    if let Some(request) = search.and_then(|query| ctx.search(query)) {
        handle.send(request);
    }

    info!(url, filters = filters.len(), "Attached");

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::signal::ctrl_c() => break,
            event = handle.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        for output in printer.on_event(&mut ctx, event) {
            match output {
                Output::Line(line) => println!("{line}"),
                Output::Notice(note) => eprintln!("{note}"),
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append(lines: &[&str]) -> WorkerEvent {
        let logs: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        WorkerEvent::AppendLogs {
            html_logs: logs.clone(),
            logs,
        }
    }

    #[test]
    fn test_unfiltered_lines_are_printed() {
        let mut ctx = ClientContext::new();
        let mut printer = Printer::default();

        let output = printer.on_event(&mut ctx, append(&["a", "b"]));
        assert_eq!(
            output,
            vec![Output::Line("a".to_string()), Output::Line("b".to_string())]
        );
        assert_eq!(ctx.count(), 2);
    }

    #[test]
    fn test_filtered_lines_are_printed_once() {
        let mut ctx = ClientContext::new();
        let mut printer = Printer::default();
        ctx.add_filter("foo");
        ctx.add_filter("bar");

        assert!(printer.on_event(&mut ctx, append(&["foo", "x", "foobar"])).is_empty());

        let output = printer.on_event(
            &mut ctx,
            WorkerEvent::FilteredLinesResult {
                query: "foo".to_string(),
                results: vec![0, 2],
            },
        );
        assert_eq!(
            output,
            vec![Output::Line("foo".to_string()), Output::Line("foobar".to_string())]
        );

        let output = printer.on_event(
            &mut ctx,
            WorkerEvent::FilteredLinesResult {
                query: "bar".to_string(),
                results: vec![2],
            },
        );
        assert!(output.is_empty());
    }

    #[test]
    fn test_filtered_output_is_ordered_per_batch() {
        let mut ctx = ClientContext::new();
        let mut printer = Printer::default();
        ctx.add_filter("a");
        ctx.add_filter("b");
        printer.on_event(&mut ctx, append(&["a0", "b1", "a2", "b3", "a4"]));

        let output = printer.on_event(
            &mut ctx,
            WorkerEvent::FilteredLinesResult {
                query: "a".to_string(),
                results: vec![4, 0, 2],
            },
        );
        assert_eq!(
            output,
            vec![
                Output::Line("a0".to_string()),
                Output::Line("a2".to_string()),
                Output::Line("a4".to_string()),
            ]
        );

        // Another filter's earlier matches follow once its batch arrives
        let output = printer.on_event(
            &mut ctx,
            WorkerEvent::FilteredLinesResult {
                query: "b".to_string(),
                results: vec![1, 3],
            },
        );
        assert_eq!(
            output,
            vec![Output::Line("b1".to_string()), Output::Line("b3".to_string())]
        );
    }

    #[test]
    fn test_search_hits_are_new_only() {
        let mut ctx = ClientContext::new();
        let mut printer = Printer::default();
        ctx.search("err");
        printer.on_event(&mut ctx, append(&["\x1b[31merr\x1b[0m one", "ok", "err two"]));

        let hit = |results: Vec<usize>| WorkerEvent::SearchResultSet {
            query: Some("err".to_string()),
            results,
        };

        let output = printer.on_event(&mut ctx, hit(vec![0]));
        assert_eq!(output, vec![Output::Notice("match 0: err one".to_string())]);

        let output = printer.on_event(&mut ctx, hit(vec![0, 2]));
        assert_eq!(output, vec![Output::Notice("match 2: err two".to_string())]);

        // Superseded query
        let output = printer.on_event(
            &mut ctx,
            WorkerEvent::SearchResultSet {
                query: Some("old".to_string()),
                results: vec![1],
            },
        );
        assert!(output.is_empty());
    }

    #[test]
    fn test_lifecycle_notices() {
        let mut ctx = ClientContext::new();
        let mut printer = Printer::default();

        assert_eq!(
            printer.on_event(&mut ctx, WorkerEvent::Started),
            vec![Output::Notice("~ process started ~".to_string())]
        );
        assert!(ctx.is_running());
    }
}
