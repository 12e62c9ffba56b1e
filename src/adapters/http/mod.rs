//! HTTP adapters - REST and WebSocket surface.
//!
//! Each area has its own router; [`app_router`] merges them.

pub mod chat;
pub mod dao;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value as JsonValue};

use crate::adapters::websocket::{websocket_routes, DashboardHub, WebSocketState};
use crate::application::{ChatIngress, LifecycleCoordinator};

pub use chat::{chat_routes, ChatAppState};
pub use dao::{dao_routes, DaoAppState, ErrorResponse};

/// GET /health
pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

/// Full application router without middleware layers.
pub fn app_router(
    coordinator: Arc<LifecycleCoordinator>,
    ingress: Arc<ChatIngress>,
    hub: Arc<DashboardHub>,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(dao_routes(DaoAppState::new(coordinator)))
        .merge(chat_routes(ChatAppState::new(ingress)))
        .merge(websocket_routes(WebSocketState::new(hub)))
}
