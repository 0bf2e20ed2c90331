//! WebSocket entrypoint and connection handler.
//!
//! Upgrades HTTP to WS and runs one session per connection: inbound frames
//! are applied one at a time in receipt order, while a writer task drains
//! the session's outbound queue to the socket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, info, warn};

use crate::server::GatewayState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: GatewayState) {
    let (mut sender, mut receiver) = socket.split();
    let manager = state.manager;
    let (tx, mut rx) = manager.outbound_channel();
    let mut session = manager.connect(tx).await;
    let session_id = session.id;
    info!(session_id, "WebSocket connection opened");

    // Forward queued frames to the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.to_string())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    manager.handle_text(&mut session, &text).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // Binary, ping and pong frames carry no intents.
                Some(Err(e)) => {
                    debug!(session_id, error = %e, "WebSocket receive failed");
                    break;
                }
            },
            _ = &mut send_task => {
                warn!(session_id, "WebSocket writer stopped");
                break;
            }
        }
    }

    manager.disconnect(session).await;
    send_task.abort();

    info!(session_id, "WebSocket connection closed");
}
