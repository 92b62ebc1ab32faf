//! WebSocket connection loop.
//!
//! Registers the socket with the relay, then runs two halves side by side:
//! a writer task draining the connection's outbound queue into the sink,
//! and the reader loop dispatching inbound frames in arrival order.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::service::Relay;

/// Runs a single WebSocket connection until the client goes away.
///
/// On exit the connection is removed from every room and any frame still
/// being written is abandoned.
pub async fn run_connection(socket: WebSocket, relay: Arc<Relay>) {
    let (id, mut outbound) = relay.connect().await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let json = match frame.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(connection = %id, error = %e, "failed to encode frame");
                    continue;
                }
            };
            if let Err(e) = ws_tx.send(Message::text(json)).await {
                tracing::debug!(connection = %id, error = %e, "ws send failed");
                break;
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => relay.handle_text(id, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection = %id, error = %e, "ws read failed");
                break;
            }
        }
    }

    relay.disconnect(id).await;
    writer.abort();
    tracing::debug!(connection = %id, "ws connection closed");
}
