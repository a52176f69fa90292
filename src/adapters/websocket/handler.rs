//! WebSocket upgrade handler for relay clients.
//!
//! Manages one connection's lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Attach to the relay (counted, joins the shared room)
//! 3. Forward relay events to the socket; feed inbound frames to the relay
//! 4. Detach on close, error or instance shutdown

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    watch,
};

use crate::application::handlers::presence::PresenceError;
use crate::domain::relay::RelayEvent;

use super::{
    clients::ClientId,
    context::RelayContext,
    messages::{ClientMessage, ServerMessage},
};

/// How long a closing connection may spend delivering its Close frame.
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(context): State<RelayContext>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, context))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(mut socket: WebSocket, context: RelayContext) {
    let (client_id, events) = match context.attach().await {
        Ok(attached) => attached,
        Err(PresenceError::Draining) => {
            tracing::debug!("Refusing connection, instance is shutting down");
            let _ =
                tokio::time::timeout(CLOSE_FRAME_TIMEOUT, socket.send(Message::Close(None))).await;
            return;
        }
        Err(e) => {
            tracing::error!("Failed to attach client: {}", e);
            let _ =
                tokio::time::timeout(CLOSE_FRAME_TIMEOUT, socket.send(Message::Close(None))).await;
            return;
        }
    };

    let (sender, mut receiver) = socket.split();
    let closing = context.clients().closing();

    // Forward relay events to the client
    let mut send_task = tokio::spawn(forward_events(sender, events, closing, client_id.clone()));

    // Handle incoming frames from the client
    let mut recv_task = {
        let client_id = client_id.clone();
        let context = context.clone();
        tokio::spawn(async move {
            while let Some(result) = receiver.next().await {
                match result {
                    Ok(Message::Text(text)) => receive_text(&context, &client_id, &text).await,
                    Ok(Message::Binary(_)) => {
                        tracing::debug!(client_id = %client_id, "Ignoring binary frame");
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                        // answered by axum
                    }
                    Ok(Message::Close(_)) => {
                        tracing::debug!(client_id = %client_id, "Client sent close frame");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(client_id = %client_id, "Receive error: {}", e);
                        break;
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    if let Err(e) = context.detach(&client_id).await {
        tracing::error!(client_id = %client_id, "Failed to detach client: {}", e);
    }
}

async fn receive_text(context: &RelayContext, client_id: &ClientId, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(client_id = %client_id, "Dropping malformed frame: {}", e);
            return;
        }
    };

    if let Err(e) = context.receive(message).await {
        tracing::error!(client_id = %client_id, "Failed to publish chat message: {}", e);
    }
}

/// Resolves once the registry asks connections to close.
async fn closed(mut closing: watch::Receiver<bool>) {
    while !*closing.borrow_and_update() {
        if closing.changed().await.is_err() {
            // registry dropped; nothing will ever ask us to close
            std::future::pending::<()>().await;
        }
    }
}

/// Forward relay events to one client until the socket fails, the event
/// stream ends or the registry asks connections to close.
///
/// Every send races the close flag, so a client that stopped reading cannot
/// hold the task open past shutdown.
async fn forward_events<S>(
    mut sender: S,
    mut events: broadcast::Receiver<RelayEvent>,
    closing: watch::Receiver<bool>,
    client_id: ClientId,
) where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let closed = closed(closing);
    tokio::pin!(closed);

    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = &mut closed => break,
        };

        match event {
            Ok(event) => {
                let msg: ServerMessage = event.into();
                let sent = tokio::select! {
                    sent = send_message(&mut sender, &msg) => sent,
                    _ = &mut closed => {
                        tracing::debug!(client_id = %client_id, "Closing stalled connection");
                        return;
                    }
                };
                if let Err(e) = sent {
                    tracing::debug!(client_id = %client_id, "Send error, closing connection: {}", e);
                    return;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    client_id = %client_id,
                    skipped,
                    "Client fell behind, oldest events dropped"
                );
            }
            Err(RecvError::Closed) => return,
        }
    }

    let _ = tokio::time::timeout(CLOSE_FRAME_TIMEOUT, sender.send(Message::Close(None))).await;
}

/// Send a JSON message over the WebSocket.
async fn send_message<S>(sender: &mut S, msg: &ServerMessage) -> Result<(), String>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sender
        .send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<RelayContext> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
