//! Websocket link to a logpilot server with automatic reconnect

use futures::{SinkExt, StreamExt};
use logpilot_types::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::error::WorkerError;

/// What the connection reports to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Connected,
    Message(ServerMessage),
    Disconnected,
}

/// Turn a dashboard URL (`http://host:port?token`) into the websocket
/// endpoint (`ws://host:port/web-socket?token`)
pub fn websocket_url(dashboard: &str) -> Result<String, WorkerError> {
    let invalid = || WorkerError::InvalidUrl(dashboard.to_string());

    let (base, query) = dashboard.split_once('?').ok_or_else(invalid)?;
    if query.is_empty() {
        return Err(invalid());
    }

    let base = base.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(invalid());
    };

    let base = base.strip_suffix("/web-socket").map(str::to_string).unwrap_or(base);
    Ok(format!("{base}/web-socket?{query}"))
}

/// Keep a connection to `url` open until cancelled, reconnecting with
/// `backoff`. Server messages are forwarded to `inbound`; messages from
/// `outbound` are sent while connected and dropped otherwise.
pub fn spawn_connection(
    url: String,
    mut backoff: Backoff,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
    inbound: mpsc::UnboundedSender<Inbound>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let attempt = tokio::select! {
                _ = cancel.cancelled() => return,
                attempt = tokio_tungstenite::connect_async(url.as_str()) => attempt,
            };

            match attempt {
                Ok((stream, _)) => {
                    info!(%url, "Connected to server");
                    backoff.reset();
                    if inbound.send(Inbound::Connected).is_err() {
                        return;
                    }

                    let (mut sink, mut source) = stream.split();
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                let _ = sink.close().await;
                                return;
                            }
                            message = outbound.recv() => {
                                let Some(message) = message else { return };
                                let text = match message.encode() {
                                    Ok(text) => text,
                                    Err(e) => {
                                        warn!(error = %e, "Failed to encode client message");
                                        continue;
                                    }
                                };
                                if let Err(e) = sink.send(Message::Text(text.into())).await {
                                    debug!(error = %e, "Send failed");
                                    break;
                                }
                            }
                            frame = source.next() => match frame {
                                Some(Ok(Message::Text(text))) => match ServerMessage::decode(text.as_str()) {
                                    Ok(message) => {
                                        if inbound.send(Inbound::Message(message)).is_err() {
                                            return;
                                        }
                                    }
                                    Err(e) => warn!(error = %e, "Ignoring malformed server message"),
                                },
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Err(e)) => {
                                    debug!(error = %e, "Connection error");
                                    break;
                                }
                                Some(Ok(_)) => {}
                            },
                        }
                    }

                    if inbound.send(Inbound::Disconnected).is_err() {
                        return;
                    }
                }
                Err(e) => debug!(%url, error = %e, "Connection attempt failed"),
            }

            let delay = backoff.next_delay();
            info!(?delay, "Disconnected from server, retrying");
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let mut dropped = 0;
            while outbound.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                debug!(dropped, "Dropped requests sent while disconnected");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url("http://localhost:51515?abc").unwrap(),
            "ws://localhost:51515/web-socket?abc"
        );
        assert_eq!(
            websocket_url("https://example.com/?abc").unwrap(),
            "wss://example.com/web-socket?abc"
        );
        assert_eq!(
            websocket_url("ws://h:1/web-socket?abc").unwrap(),
            "ws://h:1/web-socket?abc"
        );
        assert!(websocket_url("http://localhost:51515").is_err());
        assert!(websocket_url("http://localhost:51515?").is_err());
        assert!(websocket_url("ftp://x?abc").is_err());
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Inbound>) -> Inbound {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_forwards_and_reconnects() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(50));
        let handle = spawn_connection(
            format!("ws://127.0.0.1:{port}/web-socket?t"),
            backoff,
            outbound_rx,
            inbound_tx,
            cancel.clone(),
        );

        // First connection: send one frame, read one request, then hang up
        let (stream, _) = listener.accept().await.unwrap();
        let mut server = tokio_tungstenite::accept_async(stream).await.unwrap();
        assert_eq!(next(&mut inbound_rx).await, Inbound::Connected);

        let started = ServerMessage::Started.encode().unwrap();
        server.send(Message::Text(started.into())).await.unwrap();
        let malformed = r#"{"type":"nonsense"}"#.to_string();
        server.send(Message::Text(malformed.into())).await.unwrap();
        assert_eq!(next(&mut inbound_rx).await, Inbound::Message(ServerMessage::Started));

        outbound_tx.send(ClientMessage::Restart).unwrap();
        let request = server.next().await.unwrap().unwrap();
        assert_eq!(
            ClientMessage::decode(request.to_text().unwrap()).unwrap(),
            ClientMessage::Restart
        );

        drop(server);
        assert_eq!(next(&mut inbound_rx).await, Inbound::Disconnected);

        // The client comes back on its own
        let (stream, _) = listener.accept().await.unwrap();
        let _server = tokio_tungstenite::accept_async(stream).await.unwrap();
        assert_eq!(next(&mut inbound_rx).await, Inbound::Connected);

        cancel.cancel();
        handle.await.unwrap();
    }
}
