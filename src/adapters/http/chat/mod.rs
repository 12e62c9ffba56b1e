//! Chat HTTP adapter: an inbound message source for bots and bridges.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::application::{ChatIngress, ChatReply};

#[derive(Clone)]
pub struct ChatAppState {
    ingress: Arc<ChatIngress>,
}

impl ChatAppState {
    pub fn new(ingress: Arc<ChatIngress>) -> Self {
        Self { ingress }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub is_bot: bool,
}

/// POST /chat/messages
pub async fn post_message(
    State(state): State<ChatAppState>,
    Json(req): Json<ChatMessageRequest>,
) -> Json<ChatReply> {
    tracing::debug!(author = %req.author, "Chat message received");
    Json(state.ingress.handle_message(&req.content, req.is_bot).await)
}

pub fn chat_routes(state: ChatAppState) -> Router {
    Router::new()
        .route("/chat/messages", post(post_message))
        .with_state(state)
}
