//! SendMessageHandler - Publishes a client's chat message to every instance.

use std::sync::Arc;

use crate::domain::relay::Channel;
use crate::ports::{BrokerError, BrokerPublisher};

/// Command carrying the text a client asked to send.
#[derive(Debug, Clone, Default)]
pub struct SendMessageCommand {
    pub message: Option<String>,
}

impl SendMessageCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// What happened to a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMessageOutcome {
    Published,
    /// Missing or empty text; nothing was published.
    Dropped,
}

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Handler for client chat messages.
///
/// The text is published as-is. Envelopes are assigned later by each
/// relaying instance.
pub struct SendMessageHandler {
    publisher: Arc<dyn BrokerPublisher>,
}

impl SendMessageHandler {
    pub fn new(publisher: Arc<dyn BrokerPublisher>) -> Self {
        Self { publisher }
    }

    pub async fn handle(&self, cmd: SendMessageCommand) -> Result<SendMessageOutcome, MessagingError> {
        let message = match cmd.message {
            Some(message) if !message.is_empty() => message,
            _ => {
                tracing::debug!("Dropping empty chat message");
                return Ok(SendMessageOutcome::Dropped);
            }
        };

        self.publisher.publish(Channel::NewMessage, &message).await?;
        Ok(SendMessageOutcome::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broker::InMemoryBroker;

    fn handler() -> (SendMessageHandler, Arc<InMemoryBroker>) {
        let broker = Arc::new(InMemoryBroker::new());
        (SendMessageHandler::new(broker.clone()), broker)
    }

    #[tokio::test]
    async fn publishes_text_verbatim() {
        let (handler, broker) = handler();

        let outcome = handler
            .handle(SendMessageCommand::new("  hello there "))
            .await
            .unwrap();

        assert_eq!(outcome, SendMessageOutcome::Published);
        assert_eq!(broker.published_on(Channel::NewMessage), vec!["  hello there "]);
    }

    #[tokio::test]
    async fn empty_text_is_dropped() {
        let (handler, broker) = handler();

        let outcome = handler.handle(SendMessageCommand::new("")).await.unwrap();

        assert_eq!(outcome, SendMessageOutcome::Dropped);
        assert!(broker.published().is_empty());
    }

    #[tokio::test]
    async fn missing_text_is_dropped() {
        let (handler, broker) = handler();

        let outcome = handler.handle(SendMessageCommand::default()).await.unwrap();

        assert_eq!(outcome, SendMessageOutcome::Dropped);
        assert!(broker.published().is_empty());
    }

    #[tokio::test]
    async fn broker_failure_is_reported() {
        let (handler, broker) = handler();
        broker.set_unavailable(true);

        let result = handler.handle(SendMessageCommand::new("hi")).await;

        assert!(matches!(result, Err(MessagingError::Broker(_))));
    }
}
