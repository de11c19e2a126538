use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::session::{ControlRequest, ProcessStatus, Session, alert_line};

const READ_BUFFER: usize = 8 * 1024;

/// Copy raw chunks from `reader` into the session until EOF
pub(crate) async fn pump<R>(session: Arc<Session>, mut reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                session.push_chunk(&buf[..n]);
            }
            Err(e) => {
                debug!(error = %e, "Stream read failed");
                break;
            }
        }
    }
}

/// Feed piped input into the session.
///
/// A piped producer cannot be stopped or restarted from here, so those
/// requests are answered with a line in the log instead.
pub async fn run_pipe<R>(
    session: Arc<Session>,
    reader: R,
    mut control: mpsc::UnboundedReceiver<ControlRequest>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    session.set_status(ProcessStatus::Piped);
    let mut reader_task = tokio::spawn(pump(session.clone(), reader));
    let mut reading = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = &mut reader_task, if reading => {
                reading = false;
                info!(lines = session.len(), "Piped input closed");
            }
            request = control.recv() => match request {
                Some(ControlRequest::Stop) => session.push_line(alert_line(
                    "~ unable to remotely stop a piped command ~ switch to the terminal and run `ctrl+c` to exit ~",
                )),
                Some(ControlRequest::Restart) => {
                    session.push_line(alert_line("~ unable to remotely restart a piped command ~"))
                }
                None => break,
            },
        }
    }

    reader_task.abort();
}
