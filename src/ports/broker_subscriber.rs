//! BrokerSubscriber port - Receiving payloads published on shared channels.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::relay::Channel;

use super::BrokerError;

/// Handler invoked for every payload published on a subscribed channel.
///
/// Payloads on one channel are handed over in the order the broker
/// delivered them; the next payload is not handled until the previous
/// call returns.
#[async_trait]
pub trait BrokerHandler: Send + Sync {
    async fn handle(&self, channel: Channel, payload: String);

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for subscribing handlers to broker channels.
#[async_trait]
pub trait BrokerSubscriber: Send + Sync {
    /// Subscribe a handler to one channel.
    ///
    /// Returns once the broker has acknowledged the subscription; deliveries
    /// happen in the background afterwards.
    async fn subscribe(
        &self,
        channel: Channel,
        handler: Arc<dyn BrokerHandler>,
    ) -> Result<(), BrokerError>;
}

/// Combined trait for brokers providing counters and pub/sub.
pub trait Broker: super::CounterStore + super::BrokerPublisher + BrokerSubscriber {}

impl<T: super::CounterStore + super::BrokerPublisher + BrokerSubscriber> Broker for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_handler_object_safe(_: &dyn BrokerHandler) {}

    #[allow(dead_code)]
    fn assert_subscriber_object_safe(_: &dyn BrokerSubscriber) {}
}
