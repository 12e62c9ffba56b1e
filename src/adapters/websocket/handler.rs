//! WebSocket upgrade handler for the dashboard feed.
//!
//! Each connection gets a `connected` ack, then every lifecycle update until
//! either side closes. Client pings are answered with pongs.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use crate::domain::foundation::Timestamp;

use super::hub::{ClientId, DashboardHub};
use super::messages::{ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage};

#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<DashboardHub>,
}

impl WebSocketState {
    pub fn new(hub: Arc<DashboardHub>) -> Self {
        Self { hub }
    }
}

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let client_id = ClientId::new();
    let mut updates = state.hub.join(&client_id);

    let connected = ServerMessage::Connected(ConnectedMessage {
        client_id: client_id.to_string(),
        timestamp: Timestamp::now().as_datetime().to_rfc3339(),
    });
    if let Err(e) = send_message(&mut sender, &connected).await {
        tracing::debug!(client_id = %client_id, "Failed to send connected message: {}", e);
        state.hub.leave(&client_id);
        return;
    }

    // Replies from the receive side go through the send task.
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(8);

    let mut send_task = {
        let client_id = client_id.clone();
        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    update = updates.recv() => match update {
                        Ok(update) => ServerMessage::Update(update),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(client_id = %client_id, skipped, "Dashboard client lagging");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    reply = reply_rx.recv() => match reply {
                        Some(reply) => reply,
                        None => break,
                    },
                };
                if let Err(e) = send_message(&mut sender, &msg).await {
                    tracing::debug!(client_id = %client_id, "Send error, closing connection: {}", e);
                    break;
                }
            }
        })
    };

    let mut recv_task = {
        let client_id = client_id.clone();
        tokio::spawn(async move {
            while let Some(result) = receiver.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Ping) => ServerMessage::Pong(PongMessage::now()),
                            Err(_) => ServerMessage::Error(ErrorMessage {
                                code: "UNKNOWN_MESSAGE".to_string(),
                                message: "expected {\"type\":\"ping\"}".to_string(),
                            }),
                        };
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::debug!(client_id = %client_id, "Client sent close frame");
                        break;
                    }
                    Ok(_) => {}
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

    state.hub.leave(&client_id);
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

pub fn websocket_routes(state: WebSocketState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_shares_the_hub() {
        let hub = Arc::new(DashboardHub::default());
        let state = WebSocketState::new(hub.clone());
        assert!(Arc::ptr_eq(&state.hub, &hub));
    }
}
