//! Binding and serving a session

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::broadcast::spawn_broadcaster;
use crate::config::{DEFAULT_PORT, ServerConfig};
use crate::error::ServerError;
use crate::routes::router;
use crate::session::Session;

/// Bind the listening socket.
///
/// An explicit port is used as-is. Otherwise the default port is tried and,
/// if it is taken, the OS picks a free one.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let host = config.host.as_str();

    if let Some(port) = config.port {
        return TcpListener::bind((host, port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: format!("{host}:{port}"),
                source,
            });
    }

    match TcpListener::bind((host, DEFAULT_PORT)).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            debug!(port = DEFAULT_PORT, error = %e, "Default port unavailable, using an ephemeral port");
            TcpListener::bind((host, 0))
                .await
                .map_err(|source| ServerError::Bind {
                    addr: format!("{host}:0"),
                    source,
                })
        }
    }
}

/// Serve the session on `listener` and run its broadcaster until `cancel`
/// fires
pub async fn serve(
    listener: TcpListener,
    session: Arc<Session>,
    config: &ServerConfig,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    let broadcaster = spawn_broadcaster(
        session.clone(),
        Duration::from_millis(config.frame_interval_ms.max(1)),
        cancel.clone(),
    );

    info!("logpilot listening on http://{}", addr);

    let shutdown = cancel.clone();
    let result = axum::serve(listener, router(session))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    cancel.cancel();
    let _ = broadcaster.await;
    result.map_err(ServerError::from)
}

/// Dashboard address including the token
pub fn dashboard_url(host: &str, port: u16, token: &str) -> String {
    format!("http://{host}:{port}?{token}")
}
