//! WebSocket upgrade handler.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use dealerhub_core::types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// How long queued frames may take to flush after the socket loop ends.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Query parameters of the upgrade request.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Optional access token; when present, `authenticate` must name the
    /// token's subject.
    pub token: Option<String>,
}

/// GET /ws[?token={jwt}]
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    let expected_user = match query.token.as_deref() {
        Some(token) => Some(state.jwt.decode(token)?.sub),
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(state, expected_user, socket)))
}

/// Runs one connection until either side closes it.
async fn handle_socket(state: AppState, expected_user: Option<UserId>, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let manager = state.realtime.connections.clone();

    let (handle, mut outbound_rx) = manager.open(expected_user);
    let conn_id = handle.id;
    info!(conn_id = %conn_id, "WebSocket connection established");

    let deadline = tokio::spawn({
        let manager = manager.clone();
        let handle = handle.clone();
        async move { manager.enforce_auth_deadline(handle).await }
    });

    let forwarder = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    manager.handle_inbound(&conn_id, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = handle.closed() => {
                debug!(conn_id = %conn_id, "Connection closed by server");
                break;
            }
        }
    }

    manager.close(&conn_id).await;
    deadline.abort();
    drop(handle);

    if tokio::time::timeout(FLUSH_TIMEOUT, forwarder).await.is_err() {
        warn!(conn_id = %conn_id, "Timed out flushing outbound frames");
    }

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
