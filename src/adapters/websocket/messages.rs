//! WebSocket message types for the chat relay.
//!
//! Every frame is a JSON text object naming an event and carrying its data:
//!
//! ```json
//! {"event": "chat:new-message", "data": {"message": "hello"}}
//! ```
//!
//! - Server → Client: count updates, relayed chat messages
//! - Client → Server: send a chat message

use serde::{Deserialize, Serialize};

use crate::domain::relay::{ChatMessage, RelayEvent};

// ============================================
// Server → Client Messages
// ============================================

/// All events that can be sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    /// The global connection count changed.
    #[serde(rename = "chat:connection-count-updated")]
    ConnectionCountUpdated(ConnectionCountPayload),

    /// A chat message relayed from the broker.
    #[serde(rename = "chat:new-message")]
    NewMessage(NewMessagePayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionCountPayload {
    pub count: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessagePayload {
    pub message: String,
    pub id: String,
    pub created_at: String,
    pub port: u16,
}

impl From<RelayEvent> for ServerMessage {
    fn from(event: RelayEvent) -> Self {
        match event {
            RelayEvent::ConnectionCountUpdated { count } => {
                ServerMessage::ConnectionCountUpdated(ConnectionCountPayload { count })
            }
            RelayEvent::NewMessage(message) => ServerMessage::NewMessage(message.into()),
        }
    }
}

impl From<ChatMessage> for NewMessagePayload {
    fn from(message: ChatMessage) -> Self {
        Self {
            message: message.message,
            id: message.id.to_string(),
            created_at: message.created_at.to_iso8601(),
            port: message.port,
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All events that can be received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Publish a chat message to the shared room.
    #[serde(rename = "chat:new-message")]
    SendMessage(SendMessagePayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SendMessagePayload {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MessageId, Timestamp};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn count_update_serializes_as_named_event() {
        let msg: ServerMessage = RelayEvent::ConnectionCountUpdated {
            count: "4".to_string(),
        }
        .into();

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"event": "chat:connection-count-updated", "data": {"count": "4"}})
        );
    }

    #[test]
    fn new_message_serializes_with_camel_case_envelope() {
        let id = MessageId::new();
        let created_at =
            Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
        let msg: ServerMessage = RelayEvent::NewMessage(ChatMessage {
            message: "hello".to_string(),
            id,
            created_at,
            port: 3001,
        })
        .into();

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "chat:new-message",
                "data": {
                    "message": "hello",
                    "id": id.to_string(),
                    "createdAt": "2024-05-06T07:08:09.000Z",
                    "port": 3001
                }
            })
        );
    }

    #[test]
    fn send_message_deserializes() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"chat:new-message","data":{"message":"hi"}}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SendMessage(SendMessagePayload {
                message: Some("hi".to_string())
            })
        );
    }

    #[test]
    fn send_message_without_field_deserializes_to_none() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"chat:new-message","data":{}}"#).unwrap();
        assert_eq!(msg, ClientMessage::SendMessage(SendMessagePayload::default()));
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result =
            serde_json::from_str::<ClientMessage>(r#"{"event":"chat:typing","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn non_string_message_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(
            r#"{"event":"chat:new-message","data":{"message":5}}"#,
        );
        assert!(result.is_err());
    }
}
