//! WebSocket dashboard feed.
//!
//! ```text
//! event bus ──▶ DashboardEventBridge ──▶ DashboardHub ──▶ GET /ws clients
//! ```

mod event_bridge;
mod handler;
mod hub;
mod messages;

pub use event_bridge::DashboardEventBridge;
pub use handler::{websocket_routes, ws_handler, WebSocketState};
pub use hub::{ClientId, DashboardHub, DEFAULT_HUB_CAPACITY};
pub use messages::{
    ClientMessage, ConnectedMessage, DashboardUpdate, ErrorMessage, PongMessage, ServerMessage,
};
