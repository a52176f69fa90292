//! BrokerPublisher port - Publishing text payloads on shared channels.

use async_trait::async_trait;

use crate::domain::relay::Channel;

use super::BrokerError;

/// Port for publishing to a broker channel.
///
/// Publishing is fire-and-forget from the caller's point of view: the broker
/// delivers to every current subscriber, including the publishing instance.
#[async_trait]
pub trait BrokerPublisher: Send + Sync {
    async fn publish(&self, channel: Channel, payload: &str) -> Result<(), BrokerError>;
}
