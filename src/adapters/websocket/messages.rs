//! Dashboard feed protocol.
//!
//! - Server → Client: connection ack, lifecycle updates, errors, pongs
//! - Client → Server: pings

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventEnvelope, Timestamp};

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected(ConnectedMessage),

    /// A lifecycle event, forwarded as published.
    Update(DashboardUpdate),

    Error(ErrorMessage),

    Pong(PongMessage),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub client_id: String,
    pub timestamp: String,
}

/// Lifecycle update pushed to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpdate {
    pub event: String,
    pub proposal_id: Option<String>,
    pub data: serde_json::Value,
    pub timestamp: String,
}

impl DashboardUpdate {
    pub fn from_envelope(envelope: &EventEnvelope) -> Self {
        // The proposals list is keyed by DAO, not by proposal.
        let proposal_id = (envelope.aggregate_type == "Proposal")
            .then(|| envelope.aggregate_id.clone());
        Self {
            event: envelope.event_type.clone(),
            proposal_id,
            data: envelope.payload.clone(),
            timestamp: envelope.occurred_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl PongMessage {
    pub fn now() -> Self {
        Self {
            timestamp: Timestamp::now().as_datetime().to_rfc3339(),
        }
    }
}

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_serializes_with_type_tag() {
        let envelope = EventEnvelope::new("voting_started", "7", "Proposal", json!({"round": 1}));
        let msg = ServerMessage::Update(DashboardUpdate::from_envelope(&envelope));

        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "update");
        assert_eq!(value["event"], "voting_started");
        assert_eq!(value["proposalId"], "7");
        assert_eq!(value["data"]["round"], 1);
    }

    #[test]
    fn dao_level_events_have_no_proposal_id() {
        let envelope = EventEnvelope::new("proposals", "0xda0", "Dao", json!([]));
        assert_eq!(DashboardUpdate::from_envelope(&envelope).proposal_id, None);
    }

    #[test]
    fn client_ping_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping);
    }

    #[test]
    fn unknown_client_message_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"vote"}"#).is_err());
    }
}
