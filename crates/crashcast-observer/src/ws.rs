//! `WebSocket` handler for the real-time game event stream.
//!
//! Observers connect to `GET /ws/game`. The handler immediately sends one
//! `initData` frame built from the live snapshot -- a late joiner is
//! synchronized at connection time instead of waiting for the next tick --
//! and then forwards every broadcast [`GameEvent`] as a JSON text frame.
//!
//! If an observer falls behind, lagged messages are silently skipped and
//! the observer resumes from the most recent event. The channel is
//! read-only: inbound frames other than ping/close are ignored.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use crashcast_types::GameEvent;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming game events.
///
/// # Route
///
/// `GET /ws/game`
pub async fn ws_game(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: catch the observer up with one
/// `initData` frame, then forward broadcasts until disconnect.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket observer connected");

    // Subscribe before snapshotting so an event that lands between the
    // snapshot read and the first recv is delivered, not dropped.
    let mut rx = state.subscribe();

    let init = state.init_data().await;
    if !send_event(&mut socket, &init).await {
        return;
    }

    loop {
        tokio::select! {
            // Receive a game event from the engine.
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            debug!("WebSocket observer disconnected (send failed)");
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket observer lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // Check if the observer sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket observer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let pong = Message::Pong(data);
                        if socket.send(pong).await.is_err() {
                            debug!("WebSocket observer disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Ignore other message types (text, binary from observer).
                    }
                }
            }
        }
    }
}

/// Serialize and send one event frame. Returns false when the socket is
/// gone and the handler should exit.
async fn send_event(socket: &mut WebSocket, event: &GameEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize game event: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}
