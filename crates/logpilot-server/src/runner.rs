//! Child process input source

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::ServerError;
use crate::pipe::pump;
use crate::session::{ControlRequest, Session, alert_line, banner_line, command_line};

/// How long output readers keep draining once the process is gone. A
/// background grandchild can hold the pipes open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// A spawned child and the task supervising it
struct RunningChild {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RunningChild {
    /// Kill the child (if still alive) and wait until its exit is reported
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Process supervisor failed");
        }
    }
}

/// Run `command`, feeding its output into the session, and serve stop and
/// restart requests until cancelled.
pub async fn run_command(
    session: Arc<Session>,
    command: Vec<String>,
    mut control: mpsc::UnboundedReceiver<ControlRequest>,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    if command.is_empty() {
        return Err(ServerError::EmptyCommand);
    }

    let mut running = start(&session, &command);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            request = control.recv() => match request {
                Some(ControlRequest::Stop) => {
                    if let Some(child) = running.take() {
                        child.stop().await;
                    }
                }
                Some(ControlRequest::Restart) => {
                    // The old exit line must land before the new banner
                    if let Some(child) = running.take() {
                        child.stop().await;
                    }
                    running = start(&session, &command);
                }
                None => break,
            },
        }
    }

    if let Some(child) = running.take() {
        child.stop().await;
    }
    Ok(())
}

fn start(session: &Arc<Session>, command: &[String]) -> Option<RunningChild> {
    session.send_started();
    session.push_line(command_line(command));
    session.push_line(banner_line("~ process starting ~"));

    match spawn(command) {
        Ok(child) => {
            info!(pid = child.id(), command = %command.join(" "), "Process started");
            let cancel = CancellationToken::new();
            let task = tokio::spawn(supervise(session.clone(), child, cancel.clone()));
            Some(RunningChild { cancel, task })
        }
        Err(e) => {
            error!(error = %e, "Failed to start process");
            session.push_line(alert_line(&format!("~ {e} ~")));
            session.send_stopped(None);
            None
        }
    }
}

fn spawn(command: &[String]) -> Result<Child, ServerError> {
    let (program, args) = command.split_first().ok_or(ServerError::EmptyCommand)?;
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ServerError::Spawn {
            command: command.join(" "),
            source,
        })
}

async fn supervise(session: Arc<Session>, mut child: Child, cancel: CancellationToken) {
    let readers: Vec<JoinHandle<()>> = [
        child.stdout.take().map(|out| tokio::spawn(pump(session.clone(), out))),
        child.stderr.take().map(|err| tokio::spawn(pump(session.clone(), err))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let code = tokio::select! {
        status = child.wait() => status.ok().and_then(|s| s.code()),
        _ = cancel.cancelled() => {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill process");
            }
            None
        }
    };

    // Keep whatever the process wrote before exiting
    drain(readers).await;

    info!(?code, "Process exited");
    session.send_stopped(code);
    session.push_line(banner_line(&exit_message(code)));
}

/// Wait for the readers to reach end of output, aborting any still open
/// after `DRAIN_GRACE`
async fn drain(readers: Vec<JoinHandle<()>>) {
    let deadline = tokio::time::Instant::now() + DRAIN_GRACE;
    for mut reader in readers {
        if tokio::time::timeout_at(deadline, &mut reader).await.is_err() {
            warn!("Process output still open after exit, detaching reader");
            reader.abort();
        }
    }
}

fn exit_message(code: Option<i32>) -> String {
    match code {
        Some(code) if code != 0 => format!("~ process exited with code {code} ~"),
        _ => "~ process exited ~".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::session::ProcessStatus;
    use logpilot_logs::strip_ansi;
    use logpilot_types::ServerMessage;
    use std::time::Duration;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn plain_lines(session: &Session) -> Vec<String> {
        session.tail(usize::MAX).iter().map(|l| strip_ansi(l)).collect()
    }

    async fn wait_for(session: &Session, text: &str, count: usize) {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let seen = plain_lines(session).iter().filter(|l| l.as_str() == text).count();
                if seen >= count {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_exit_message() {
        assert_eq!(exit_message(Some(3)), "~ process exited with code 3 ~");
        assert_eq!(exit_message(Some(0)), "~ process exited ~");
        assert_eq!(exit_message(None), "~ process exited ~");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_and_exit_code() {
        let (session, requests) = Session::new(&ServerConfig::default());
        let (_, mut messages) = session.connect();
        let cancel = CancellationToken::new();
        let command = sh("echo hello; exit 3");
        let task = tokio::spawn(run_command(session.clone(), command, requests, cancel.clone()));

        wait_for(&session, "~ process exited with code 3 ~", 1).await;
        assert_eq!(
            plain_lines(&session),
            vec![
                "$ sh -c echo hello; exit 3",
                "~ process starting ~",
                "hello",
                "~ process exited with code 3 ~",
            ]
        );
        assert!(matches!(
            session.status(),
            ProcessStatus::Exited { code: Some(3), .. }
        ));
        assert_eq!(messages.recv().await.unwrap(), ServerMessage::Started);
        assert_eq!(messages.recv().await.unwrap(), ServerMessage::Stopped);

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_restart_reports_exit_before_new_start() {
        let (session, requests) = Session::new(&ServerConfig::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_command(
            session.clone(),
            sh("sleep 30"),
            requests,
            cancel.clone(),
        ));

        wait_for(&session, "~ process starting ~", 1).await;
        session.request(ControlRequest::Restart);
        wait_for(&session, "~ process starting ~", 2).await;
        session.request(ControlRequest::Stop);
        wait_for(&session, "~ process exited ~", 2).await;

        let lines = plain_lines(&session);
        let banners: Vec<&str> = lines
            .iter()
            .filter(|l| l.starts_with('~'))
            .map(String::as_str)
            .collect();
        assert_eq!(
            banners,
            vec![
                "~ process starting ~",
                "~ process exited ~",
                "~ process starting ~",
                "~ process exited ~",
            ]
        );

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_keeps_late_output() {
        let (session, _requests) = Session::new(&ServerConfig::default());
        let late = {
            let session = session.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                session.push_line("last words".to_string());
            })
        };

        drain(vec![late]).await;
        assert_eq!(plain_lines(&session), vec!["last words"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_gives_up_on_open_output() {
        let stuck = tokio::spawn(std::future::pending::<()>());
        let started = tokio::time::Instant::now();

        drain(vec![stuck]).await;
        assert!(started.elapsed() >= DRAIN_GRACE);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_background_grandchild_does_not_block_exit() {
        let (session, requests) = Session::new(&ServerConfig::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_command(
            session.clone(),
            sh("sleep 20 & echo hi"),
            requests,
            cancel.clone(),
        ));

        wait_for(&session, "~ process exited ~", 1).await;
        assert!(plain_lines(&session).contains(&"hi".to_string()));
        assert!(matches!(
            session.status(),
            ProcessStatus::Exited { code: Some(0), .. }
        ));

        session.request(ControlRequest::Restart);
        wait_for(&session, "~ process exited ~", 2).await;

        session.request(ControlRequest::Stop);
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_program_is_reported() {
        let (session, requests) = Session::new(&ServerConfig::default());
        let cancel = CancellationToken::new();
        let command = vec!["logpilot-no-such-program".to_string()];
        let task = tokio::spawn(run_command(session.clone(), command, requests, cancel.clone()));

        tokio::time::timeout(Duration::from_secs(5), async {
            while session.len() < 3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(plain_lines(&session)[2].contains("failed to start"));
        assert!(matches!(session.status(), ProcessStatus::Exited { code: None, .. }));

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_empty_command_is_an_error() {
        let (session, requests) = Session::new(&ServerConfig::default());
        let result = run_command(session, Vec::new(), requests, CancellationToken::new()).await;
        assert!(matches!(result, Err(ServerError::EmptyCommand)));
    }
}
