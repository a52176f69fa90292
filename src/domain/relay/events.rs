//! Events relayed from the broker to locally connected clients.

use crate::domain::foundation::{MessageId, Timestamp};

/// A chat message as broadcast to clients.
///
/// The envelope fields are assigned by whichever instance relays the
/// message, not by the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub message: String,
    pub id: MessageId,
    pub created_at: Timestamp,
    pub port: u16,
}

impl ChatMessage {
    /// Wraps raw message text in a freshly generated envelope.
    pub fn stamp(message: impl Into<String>, port: u16) -> Self {
        Self {
            message: message.into(),
            id: MessageId::new(),
            created_at: Timestamp::now(),
            port,
        }
    }
}

/// Everything the relay emits to local clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// New global count, passed through as the text received from the broker.
    ConnectionCountUpdated { count: String },
    NewMessage(ChatMessage),
}
