//! BroadcastRelay - Broker handler that fans channel payloads out to clients.
//!
//! Subscribed to every relay channel. Count updates are forwarded with the
//! payload text untouched; chat messages are wrapped in a fresh envelope
//! stamped by this instance. Nothing is filtered or deduplicated, so a
//! message sent by one of our own clients comes back to all of them,
//! sender included.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::relay::{Channel, ChatMessage, RelayEvent};
use crate::ports::{BrokerHandler, ClientBroadcaster};

/// Turns broker deliveries into relay events for local clients.
pub struct BroadcastRelay {
    broadcaster: Arc<dyn ClientBroadcaster>,
    port: u16,
}

impl BroadcastRelay {
    /// `port` is stamped into every relayed chat message.
    pub fn new(broadcaster: Arc<dyn ClientBroadcaster>, port: u16) -> Self {
        Self { broadcaster, port }
    }

    fn to_event(&self, channel: Channel, payload: String) -> RelayEvent {
        match channel {
            Channel::ConnectionCountUpdated => RelayEvent::ConnectionCountUpdated { count: payload },
            Channel::NewMessage => RelayEvent::NewMessage(ChatMessage::stamp(payload, self.port)),
        }
    }
}

#[async_trait]
impl BrokerHandler for BroadcastRelay {
    async fn handle(&self, channel: Channel, payload: String) {
        let event = self.to_event(channel, payload);
        let delivered = self.broadcaster.broadcast(event);
        tracing::debug!(channel = %channel, delivered, "Relayed broker payload to clients");
    }

    fn name(&self) -> &'static str {
        "BroadcastRelay"
    }
}
