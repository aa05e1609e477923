//! WebSocket upgrade handler.
//!
//! Each socket gets an outbound forwarder task draining the connection's
//! queue, a heartbeat task, and an inbound loop on the upgrade task itself.
//! Whichever side ends first closes the connection, and the connection is
//! unregistered exactly once on the way out.

use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use roomie_core::error::AppError;
use roomie_realtime::connection::heartbeat::run_heartbeat;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /ws
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    if state.realtime.is_shutting_down() {
        return Err(AppError::service_unavailable("Server is shutting down").into());
    }

    let max_bytes = state.config.realtime.max_message_bytes;
    Ok(ws
        .max_message_size(max_bytes)
        .on_upgrade(move |socket| handle_ws_connection(state, socket)))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let manager = state.realtime.connections.clone();

    let (handle, mut outbound_rx) = manager.register();
    let conn_id = handle.id;

    info!(conn_id = %conn_id, "WebSocket connection established");

    let heartbeat_task = tokio::spawn(run_heartbeat(handle.clone(), manager.heartbeat_config()));

    let outbound_handle = handle.clone();
    let outbound_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                frame = outbound_rx.recv() => {
                    let Some(frame) = frame else { break };
                    if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                        outbound_handle.mark_closed();
                        break;
                    }
                }
                _ = outbound_handle.closed() => break,
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            _ = handle.closed() => {
                debug!(conn_id = %conn_id, "Connection closed by server");
                break;
            }
            next = ws_rx.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    manager.handle_inbound(&conn_id, text.as_str());
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => handle.touch(),
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    manager.unregister(&conn_id);
    heartbeat_task.abort();
    let _ = outbound_task.await;

    info!(
        conn_id = %conn_id,
        user_id = ?handle.identity(),
        "WebSocket connection closed"
    );
}
