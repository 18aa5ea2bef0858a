//! WebSocket upgrade and per-connection loop.
//!
//! Each connection is one tracked task:
//!
//! 1. The socket is split. An **egress** task drains a bounded channel of
//!    [`Response`]s and writes them as text frames.
//! 2. The read loop feeds each text frame to a [`ProtocolHandler`] and
//!    awaits it before reading the next, so requests on one connection are
//!    handled in arrival order.
//! 3. Shutdown cancellation interrupts both the read and any in-flight
//!    request. Dropping the reply sender lets egress flush and close.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use futures_util::{SinkExt, StreamExt};
use speakd_core::Response;
use tokio::sync::mpsc;

use crate::handler::ProtocolHandler;
use crate::state::AppState;

/// Replies buffered per connection before the handler waits on egress.
const REPLY_BUFFER: usize = 32;

/// Upgrade endpoint, mounted on every path.
pub async fn protocol_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> HttpResponse {
    if state.shutdown.is_triggered() {
        return (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response();
    }

    let tracker = state.shutdown.tracker().clone();
    ws.on_upgrade(move |socket| tracker.track_future(handle_socket(socket, state)))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = state.next_connection_id();
    tracing::info!(connection = connection_id, "Client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Response>(REPLY_BUFFER);

    // ── Egress: replies → JSON text frames ────────────────────────────

    let egress = tokio::spawn(async move {
        while let Some(response) = rx.recv().await {
            let text = match response.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode reply");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    // ── Ingest: frames → handler, one at a time ───────────────────────

    let token = state.shutdown.token();
    let mut handler = ProtocolHandler::new(state, connection_id);

    loop {
        let frame = tokio::select! {
            () = token.cancelled() => break,
            frame = ws_receiver.next() => frame,
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(data))) => String::from_utf8_lossy(&data).into_owned(),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                tracing::debug!(connection = connection_id, error = %e, "Socket error");
                break;
            }
            // Ping/pong are answered by axum.
            Some(Ok(_)) => continue,
        };

        tokio::select! {
            () = token.cancelled() => {
                tracing::debug!(connection = connection_id, "Request cancelled by shutdown");
                break;
            }
            () = handler.handle_message(&text, &tx) => {}
        }
    }

    drop(handler);
    drop(tx);
    let _ = egress.await;

    tracing::info!(connection = connection_id, "Client disconnected");
}
