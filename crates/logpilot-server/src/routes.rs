//! HTTP surface
//!
//! | route | without token | with token |
//! |---|---|---|
//! | `GET /web-socket?<token>` | 401 | websocket upgrade |
//! | `GET /?<token>` | 403 | dashboard page |
//! | `GET /?<token>&keepAlive` | 403 | 200, empty body |
//!
//! The token must be the first component of the query string.

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{RawQuery, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use logpilot_types::ClientMessage;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::session::Session;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Build the router for a session
pub fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/web-socket", get(web_socket))
        .route("/", get(index))
        .fallback(index)
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

fn has_token(query: Option<&str>, token: &str) -> bool {
    query.and_then(|q| q.split('&').next()) == Some(token)
}

fn wants_keep_alive(query: Option<&str>) -> bool {
    query.is_some_and(|q| q.split('&').skip(1).any(|part| part == "keepAlive"))
}

async fn index(RawQuery(query): RawQuery, State(session): State<Arc<Session>>) -> Response {
    let query = query.as_deref();
    if !has_token(query, session.token()) {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    if wants_keep_alive(query) {
        return StatusCode::OK.into_response();
    }

    ([(header::CACHE_CONTROL, "no-cache")], Html(INDEX_HTML)).into_response()
}

async fn web_socket(
    RawQuery(query): RawQuery,
    State(session): State<Arc<Session>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !has_token(query.as_deref(), session.token()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match upgrade {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, session)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn handle_socket(socket: WebSocket, session: Arc<Session>) {
    let (id, mut messages) = session.connect();
    info!(client = id, total = session.client_count(), "Client connected");

    // Deliver what is already buffered without waiting for the next tick
    session.deliver_frames();

    let (mut sender, mut receiver) = socket.split();

    let mut egress = tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            let text = match message.encode() {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode server message");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let ingest_session = session.clone();
    let mut ingest = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match ClientMessage::decode(text.as_str()) {
                    Ok(message) => ingest_session.request(message.into()),
                    Err(e) => warn!(error = %e, "Ignoring malformed client message"),
                },
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut ingest => egress.abort(),
        _ = &mut egress => ingest.abort(),
    }

    session.disconnect(id);
    info!(client = id, total = session.client_count(), "Client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_must_come_first() {
        assert!(has_token(Some("abc"), "abc"));
        assert!(has_token(Some("abc&keepAlive"), "abc"));
        assert!(!has_token(Some("keepAlive&abc"), "abc"));
        assert!(!has_token(Some("abcd"), "abc"));
        assert!(!has_token(None, "abc"));
    }

    #[test]
    fn test_keep_alive_flag() {
        assert!(wants_keep_alive(Some("abc&keepAlive")));
        assert!(!wants_keep_alive(Some("abc")));
        assert!(!wants_keep_alive(Some("keepAlive")));
        assert!(!wants_keep_alive(None));
    }
}
