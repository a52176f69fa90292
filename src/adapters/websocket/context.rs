//! Per-process relay context.
//!
//! Owns everything one instance needs to serve clients: the connection
//! tracker, message ingress, the local client registry and the port used as
//! this instance's identity. Cloned into every connection task and used as
//! the axum router state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::application::handlers::messaging::{
    MessagingError, SendMessageCommand, SendMessageHandler, SendMessageOutcome,
};
use crate::application::handlers::presence::{ConnectionTracker, PresenceError, ReconcileOutcome};
use crate::application::handlers::relay::BroadcastRelay;
use crate::domain::relay::{Channel, RelayEvent};
use crate::ports::{Broker, BrokerHandler, BrokerPublisher, BrokerSubscriber, CounterStore};

use super::clients::{ClientId, ClientRegistry};
use super::messages::ClientMessage;

#[derive(Clone)]
pub struct RelayContext {
    tracker: Arc<ConnectionTracker>,
    ingress: Arc<SendMessageHandler>,
    clients: Arc<ClientRegistry>,
    port: u16,
}

impl RelayContext {
    /// Initialize the global count and subscribe the relay to every channel.
    ///
    /// A failed subscription is logged and the instance keeps running without
    /// that channel. A failed count initialization is returned, since the
    /// instance cannot track presence without it.
    pub async fn start(
        store: Arc<dyn CounterStore>,
        publisher: Arc<dyn BrokerPublisher>,
        subscriber: Arc<dyn BrokerSubscriber>,
        port: u16,
    ) -> Result<Self, PresenceError> {
        let tracker = Arc::new(ConnectionTracker::new(store, publisher.clone()));
        tracker.initialize().await?;

        let clients = Arc::new(ClientRegistry::with_default_capacity());
        let relay: Arc<dyn BrokerHandler> = Arc::new(BroadcastRelay::new(clients.clone(), port));

        for channel in Channel::ALL {
            if let Err(e) = subscriber.subscribe(channel, relay.clone()).await {
                tracing::error!(
                    channel = %channel,
                    "Subscription failed, continuing without this channel: {}",
                    e
                );
            }
        }

        Ok(Self {
            tracker,
            ingress: Arc::new(SendMessageHandler::new(publisher)),
            clients,
            port,
        })
    }

    /// [`start`](Self::start) with one broker serving all three ports.
    pub async fn with_broker<B>(broker: Arc<B>, port: u16) -> Result<Self, PresenceError>
    where
        B: Broker + 'static,
    {
        Self::start(broker.clone(), broker.clone(), broker, port).await
    }

    /// Attach a client and count it.
    ///
    /// The client joins the registry before the count is published, so it
    /// receives the count its own arrival produced.
    pub async fn attach(
        &self,
    ) -> Result<(ClientId, broadcast::Receiver<RelayEvent>), PresenceError> {
        let (client_id, events) = self.clients.join().await;

        match self.tracker.client_connected().await {
            Ok(count) => {
                tracing::info!(client_id = %client_id, count, "Client attached");
                Ok((client_id, events))
            }
            Err(e) => {
                self.clients.leave(&client_id).await;
                Err(e)
            }
        }
    }

    /// Detach a client and uncount it. Detaching an unknown client is a no-op.
    pub async fn detach(&self, client_id: &ClientId) -> Result<(), PresenceError> {
        if !self.clients.leave(client_id).await {
            return Ok(());
        }

        let count = self.tracker.client_disconnected().await?;
        tracing::info!(client_id = %client_id, count = ?count, "Client detached");
        Ok(())
    }

    /// Route an inbound client event.
    pub async fn receive(
        &self,
        message: ClientMessage,
    ) -> Result<SendMessageOutcome, MessagingError> {
        match message {
            ClientMessage::SendMessage(payload) => {
                self.ingress
                    .handle(SendMessageCommand {
                        message: payload.message,
                    })
                    .await
            }
        }
    }

    /// Remove this instance's clients from the global count, then close
    /// every client socket.
    ///
    /// Reconciliation is abandoned once `grace` has elapsed.
    pub async fn shutdown(&self, grace: Duration) -> Option<ReconcileOutcome> {
        let outcome = match tokio::time::timeout(grace, self.tracker.reconcile()).await {
            Ok(Ok(outcome)) => {
                tracing::info!(outcome = ?outcome, "Reconciled global connection count");
                Some(outcome)
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to reconcile global connection count: {}", e);
                None
            }
            Err(_) => {
                tracing::error!(
                    grace_ms = grace.as_millis() as u64,
                    "Reconciliation did not finish within the grace period"
                );
                None
            }
        };

        self.clients.close_all();
        outcome
    }

    /// Port stamped on relayed messages.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    pub fn tracker(&self) -> &Arc<ConnectionTracker> {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broker::InMemoryBroker;
    use crate::ports::BrokerError;
    use async_trait::async_trait;
    use crate::adapters::websocket::messages::SendMessagePayload;
    use crate::domain::relay::CONNECTION_COUNT_KEY;

    struct RefusingPublisher;

    #[async_trait]
    impl BrokerPublisher for RefusingPublisher {
        async fn publish(&self, _: Channel, _: &str) -> Result<(), BrokerError> {
            Err(BrokerError::Unavailable("publish refused".to_string()))
        }
    }

    /// Counter store whose reconciliation never completes.
    struct HangingStore(Arc<InMemoryBroker>);

    #[async_trait]
    impl CounterStore for HangingStore {
        async fn get(&self, key: &str) -> Result<Option<i64>, BrokerError> {
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: i64) -> Result<(), BrokerError> {
            self.0.set(key, value).await
        }

        async fn init_if_absent(&self, key: &str, value: i64) -> Result<bool, BrokerError> {
            self.0.init_if_absent(key, value).await
        }

        async fn incr(&self, key: &str) -> Result<i64, BrokerError> {
            self.0.incr(key).await
        }

        async fn decr(&self, key: &str) -> Result<i64, BrokerError> {
            self.0.decr(key).await
        }

        async fn subtract_clamped(&self, _: &str, _: i64) -> Result<i64, BrokerError> {
            std::future::pending().await
        }
    }

    async fn start(broker: &Arc<InMemoryBroker>) -> RelayContext {
        RelayContext::with_broker(broker.clone(), 3001).await.unwrap()
    }

    #[tokio::test]
    async fn start_subscribes_to_every_channel() {
        let broker = Arc::new(InMemoryBroker::new());
        start(&broker).await;

        for channel in Channel::ALL {
            assert_eq!(broker.subscriber_count(channel), 1);
        }
        assert_eq!(broker.value(CONNECTION_COUNT_KEY), Some(0));
    }

    #[tokio::test]
    async fn start_fails_when_count_cannot_be_initialized() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.set_unavailable(true);

        let result =
            RelayContext::start(broker.clone(), broker.clone(), broker.clone(), 3001).await;

        assert!(matches!(result, Err(PresenceError::Broker(_))));
    }

    #[tokio::test]
    async fn attaching_client_receives_its_own_count() {
        let broker = Arc::new(InMemoryBroker::new());
        let context = start(&broker).await;

        let (_id, mut events) = context.attach().await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            RelayEvent::ConnectionCountUpdated {
                count: "1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn failed_attach_leaves_registry() {
        let broker = Arc::new(InMemoryBroker::new());
        let context = start(&broker).await;
        broker.set_unavailable(true);

        assert!(context.attach().await.is_err());
        assert_eq!(context.clients().client_count().await, 0);
        assert_eq!(context.tracker().local_count(), 0);
    }

    #[tokio::test]
    async fn detach_is_counted_once() {
        let broker = Arc::new(InMemoryBroker::new());
        let context = start(&broker).await;
        let (id, _events) = context.attach().await.unwrap();

        context.detach(&id).await.unwrap();
        context.detach(&id).await.unwrap();

        assert_eq!(broker.value(CONNECTION_COUNT_KEY), Some(0));
        assert_eq!(context.tracker().local_count(), 0);
    }

    #[tokio::test]
    async fn receive_publishes_chat_message() {
        let broker = Arc::new(InMemoryBroker::new());
        let context = start(&broker).await;

        let outcome = context
            .receive(ClientMessage::SendMessage(SendMessagePayload {
                message: Some("hello".to_string()),
            }))
            .await
            .unwrap();

        assert_eq!(outcome, SendMessageOutcome::Published);
        assert_eq!(broker.published_on(Channel::NewMessage), vec!["hello"]);
    }

    #[tokio::test]
    async fn shutdown_reconciles_and_closes_clients() {
        let broker = Arc::new(InMemoryBroker::new());
        let context = start(&broker).await;
        context.attach().await.unwrap();
        context.attach().await.unwrap();
        let closing = context.clients().closing();

        let outcome = context.shutdown(Duration::from_secs(1)).await;

        assert_eq!(
            outcome,
            Some(ReconcileOutcome::Reconciled {
                removed: 2,
                count: 0
            })
        );
        assert!(*closing.borrow());
        assert!(context.tracker().is_draining());
    }

    #[tokio::test]
    async fn shutdown_still_closes_clients_when_broker_is_down() {
        let broker = Arc::new(InMemoryBroker::new());
        let context = start(&broker).await;
        context.attach().await.unwrap();
        broker.set_unavailable(true);

        assert_eq!(context.shutdown(Duration::from_secs(1)).await, None);
        assert!(*context.clients().closing().borrow());
    }

    #[tokio::test]
    async fn attach_survives_failed_count_announcement() {
        let broker = Arc::new(InMemoryBroker::new());
        let context = RelayContext::start(
            broker.clone(),
            Arc::new(RefusingPublisher),
            broker.clone(),
            3001,
        )
        .await
        .unwrap();

        let (id, _events) = context.attach().await.unwrap();

        assert!(context.clients().contains(&id).await);
        assert_eq!(context.tracker().local_count(), 1);
        assert_eq!(broker.value(CONNECTION_COUNT_KEY), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_gives_up_on_stuck_reconciliation_and_still_closes_clients() {
        let broker = Arc::new(InMemoryBroker::new());
        let context = RelayContext::start(
            Arc::new(HangingStore(broker.clone())),
            broker.clone(),
            broker.clone(),
            3001,
        )
        .await
        .unwrap();
        context.attach().await.unwrap();
        let closing = context.clients().closing();

        let outcome = context.shutdown(Duration::from_millis(500)).await;

        assert_eq!(outcome, None);
        assert!(*closing.borrow());
        assert_eq!(broker.value(CONNECTION_COUNT_KEY), Some(1));
    }
}
