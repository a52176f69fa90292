//! Redis-backed broker for production deployments.
//!
//! Counters use native `INCR`/`DECR`/`SET NX`; shutdown reconciliation runs
//! as a Lua script so the read-subtract-clamp-write happens atomically on
//! the server. Each subscribed channel gets its own pub/sub connection and a
//! listener task that feeds payloads to the handler in delivery order.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Script};
use std::sync::Arc;

use crate::config::RedisConfig;
use crate::domain::relay::Channel;
use crate::ports::{BrokerError, BrokerHandler, BrokerPublisher, BrokerSubscriber, CounterStore};

/// `max(GET(key) - amount, 0)` written back in one step. A missing key reads as 0.
const SUBTRACT_CLAMPED_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
local next = current - tonumber(ARGV[1])
if next < 0 then
  next = 0
end
redis.call('SET', KEYS[1], next)
return next
"#;

/// Redis broker shared by every relay instance.
#[derive(Clone)]
pub struct RedisBroker {
    client: Client,
    conn: MultiplexedConnection,
    subtract_script: Arc<Script>,
}

impl RedisBroker {
    /// Open the command connection. Pub/sub connections are opened lazily
    /// per subscription.
    pub async fn connect(config: &RedisConfig) -> Result<Self, BrokerError> {
        let client = Client::open(config.url.as_str()).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;

        Ok(Self {
            client,
            conn,
            subtract_script: Arc::new(Script::new(SUBTRACT_CLAMPED_SCRIPT)),
        })
    }
}

fn unavailable(e: redis::RedisError) -> BrokerError {
    BrokerError::Unavailable(e.to_string())
}

fn read_integer(e: redis::RedisError) -> BrokerError {
    if e.kind() == redis::ErrorKind::TypeError {
        BrokerError::InvalidValue(e.to_string())
    } else {
        unavailable(e)
    }
}

#[async_trait]
impl CounterStore for RedisBroker {
    async fn get(&self, key: &str) -> Result<Option<i64>, BrokerError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(read_integer)
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await.map_err(unavailable)
    }

    async fn init_if_absent(&self, key: &str, value: i64) -> Result<bool, BrokerError> {
        let mut conn = self.conn.clone();
        conn.set_nx(key, value).await.map_err(unavailable)
    }

    async fn incr(&self, key: &str) -> Result<i64, BrokerError> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1_i64).await.map_err(read_integer)
    }

    async fn decr(&self, key: &str) -> Result<i64, BrokerError> {
        let mut conn = self.conn.clone();
        conn.decr(key, 1_i64).await.map_err(read_integer)
    }

    async fn subtract_clamped(&self, key: &str, amount: i64) -> Result<i64, BrokerError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.subtract_script.key(key);
        invocation.arg(amount);
        invocation.invoke_async(&mut conn).await.map_err(read_integer)
    }
}

#[async_trait]
impl BrokerPublisher for RedisBroker {
    async fn publish(&self, channel: Channel, payload: &str) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(channel.as_str(), payload)
            .await
            .map_err(unavailable)?;

        tracing::trace!(channel = %channel, receivers, "Published to broker");
        Ok(())
    }
}

#[async_trait]
impl BrokerSubscriber for RedisBroker {
    async fn subscribe(
        &self,
        channel: Channel,
        handler: Arc<dyn BrokerHandler>,
    ) -> Result<(), BrokerError> {
        let subscription_error = |e: redis::RedisError| BrokerError::Subscription {
            channel,
            reason: e.to_string(),
        };

        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(subscription_error)?
            .into_pubsub();
        pubsub
            .subscribe(channel.as_str())
            .await
            .map_err(subscription_error)?;

        tracing::info!(channel = %channel, handler = handler.name(), "Subscribed to broker channel");

        tokio::spawn(async move {
            let mut messages = pubsub.on_message();
            while let Some(msg) = messages.next().await {
                match msg.get_payload::<String>() {
                    Ok(payload) => handler.handle(channel, payload).await,
                    Err(e) => {
                        tracing::warn!(
                            channel = %channel,
                            "Dropping non-text payload from broker: {}",
                            e
                        );
                    }
                }
            }
            tracing::error!(
                channel = %channel,
                "Broker subscription closed, channel will no longer be relayed"
            );
        });

        Ok(())
    }
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    // These need a running Redis:
    //   CHAT_RELAY_TEST_REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    async fn test_broker() -> RedisBroker {
        let url = std::env::var("CHAT_RELAY_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        RedisBroker::connect(&RedisConfig { url }).await.unwrap()
    }

    fn scratch_key() -> String {
        format!("chat-relay-test:{}", Uuid::new_v4())
    }

    struct RecordingHandler(Mutex<Vec<String>>);

    #[async_trait]
    impl BrokerHandler for RecordingHandler {
        async fn handle(&self, _channel: Channel, payload: String) {
            self.0.lock().unwrap().push(payload);
        }

        fn name(&self) -> &'static str {
            "RecordingHandler"
        }
    }

    #[tokio::test]
    #[ignore]
    async fn counters_round_trip_through_redis() {
        let broker = test_broker().await;
        let key = scratch_key();

        assert!(broker.init_if_absent(&key, 0).await.unwrap());
        assert!(!broker.init_if_absent(&key, 0).await.unwrap());
        assert_eq!(broker.incr(&key).await.unwrap(), 1);
        assert_eq!(broker.incr(&key).await.unwrap(), 2);
        assert_eq!(broker.decr(&key).await.unwrap(), 1);
        assert_eq!(broker.get(&key).await.unwrap(), Some(1));
    }

    #[tokio::test]
    #[ignore]
    async fn subtract_clamped_script_floors_at_zero() {
        let broker = test_broker().await;
        let key = scratch_key();

        broker.set(&key, 5).await.unwrap();
        assert_eq!(broker.subtract_clamped(&key, 2).await.unwrap(), 3);
        assert_eq!(broker.subtract_clamped(&key, 10).await.unwrap(), 0);
        assert_eq!(broker.get(&key).await.unwrap(), Some(0));
    }

    #[tokio::test]
    #[ignore]
    async fn subscriber_receives_published_payloads_in_order() {
        let broker = test_broker().await;
        let handler = Arc::new(RecordingHandler(Mutex::new(Vec::new())));

        broker
            .subscribe(Channel::NewMessage, handler.clone())
            .await
            .unwrap();
        broker.publish(Channel::NewMessage, "first").await.unwrap();
        broker.publish(Channel::NewMessage, "second").await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let received = handler.0.lock().unwrap().clone();
        assert!(received.ends_with(&["first".to_string(), "second".to_string()]));
    }
}
