use std::sync::Arc;
use std::time::Duration;

use logpilot_logs::spawn_periodic;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::session::Session;

/// Deliver pending lines to every client each `period` until cancelled
pub fn spawn_broadcaster(
    session: Arc<Session>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    spawn_periodic(period, cancel, move || {
        let session = session.clone();
        async move {
            session.deliver_frames();
        }
    })
}
