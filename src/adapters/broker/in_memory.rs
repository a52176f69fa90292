//! In-memory broker implementation for testing.
//!
//! Provides synchronous, deterministic delivery for unit and integration
//! tests. Several relay contexts sharing one `Arc<InMemoryBroker>` behave
//! like several instances sharing one Redis.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.
//! Production code should use the Redis broker adapter.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::relay::{Channel, GlobalCount};
use crate::ports::{BrokerError, BrokerHandler, BrokerPublisher, BrokerSubscriber, CounterStore};

/// In-memory broker for testing.
///
/// Features:
/// - Synchronous delivery in publish order (deterministic for tests)
/// - Publish capture for assertions
/// - Fault injection: whole-broker outage, failing subscriptions per channel
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
///
/// # Example
///
/// ```ignore
/// let broker = Arc::new(InMemoryBroker::new());
///
/// broker.publish(Channel::NewMessage, "hello").await?;
///
/// assert_eq!(broker.published_on(Channel::NewMessage), vec!["hello"]);
/// ```
pub struct InMemoryBroker {
    values: Mutex<HashMap<String, i64>>,
    handlers: RwLock<HashMap<Channel, Vec<Arc<dyn BrokerHandler>>>>,
    published: RwLock<Vec<(Channel, String)>>,
    failing_subscriptions: RwLock<HashSet<Channel>>,
    unavailable: AtomicBool,
}

impl InMemoryBroker {
    /// Creates a new empty broker.
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
            failing_subscriptions: RwLock::new(HashSet::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    // === Test Helpers ===

    /// Returns every published `(channel, payload)` pair in publish order.
    pub fn published(&self) -> Vec<(Channel, String)> {
        self.published
            .read()
            .expect("InMemoryBroker: published lock poisoned")
            .clone()
    }

    /// Returns the payloads published on one channel.
    pub fn published_on(&self, channel: Channel) -> Vec<String> {
        self.published()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, payload)| payload)
            .collect()
    }

    /// Clears captured publishes (for test isolation).
    pub fn clear_published(&self) {
        self.published
            .write()
            .expect("InMemoryBroker: published write lock poisoned")
            .clear();
    }

    /// Reads a key without going through the port (no outage simulation).
    pub fn value(&self, key: &str) -> Option<i64> {
        self.values
            .lock()
            .expect("InMemoryBroker: values lock poisoned")
            .get(key)
            .copied()
    }

    /// Writes a key without going through the port, e.g. to simulate drift.
    pub fn put(&self, key: &str, value: i64) {
        self.values
            .lock()
            .expect("InMemoryBroker: values lock poisoned")
            .insert(key.to_string(), value);
    }

    /// Makes every subsequent port call fail with `BrokerError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes subsequent subscriptions to `channel` fail.
    pub fn fail_subscriptions_to(&self, channel: Channel) {
        self.failing_subscriptions
            .write()
            .expect("InMemoryBroker: subscriptions write lock poisoned")
            .insert(channel);
    }

    /// Number of handlers subscribed to a channel.
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.handlers
            .read()
            .expect("InMemoryBroker: handlers lock poisoned")
            .get(&channel)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn ensure_available(&self) -> Result<(), BrokerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable(
                "in-memory broker marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn update<F>(&self, key: &str, f: F) -> i64
    where
        F: FnOnce(i64) -> i64,
    {
        let mut values = self
            .values
            .lock()
            .expect("InMemoryBroker: values lock poisoned");
        let entry = values.entry(key.to_string()).or_insert(0);
        *entry = f(*entry);
        *entry
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryBroker {
    async fn get(&self, key: &str) -> Result<Option<i64>, BrokerError> {
        self.ensure_available()?;
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), BrokerError> {
        self.ensure_available()?;
        self.put(key, value);
        Ok(())
    }

    async fn init_if_absent(&self, key: &str, value: i64) -> Result<bool, BrokerError> {
        self.ensure_available()?;
        let mut values = self
            .values
            .lock()
            .expect("InMemoryBroker: values lock poisoned");
        if values.contains_key(key) {
            return Ok(false);
        }
        values.insert(key.to_string(), value);
        Ok(true)
    }

    async fn incr(&self, key: &str) -> Result<i64, BrokerError> {
        self.ensure_available()?;
        Ok(self.update(key, |v| v + 1))
    }

    async fn decr(&self, key: &str) -> Result<i64, BrokerError> {
        self.ensure_available()?;
        Ok(self.update(key, |v| v - 1))
    }

    async fn subtract_clamped(&self, key: &str, amount: i64) -> Result<i64, BrokerError> {
        self.ensure_available()?;
        Ok(self.update(key, |v| GlobalCount::new(v).subtract_clamped(amount).value()))
    }
}

#[async_trait]
impl BrokerPublisher for InMemoryBroker {
    async fn publish(&self, channel: Channel, payload: &str) -> Result<(), BrokerError> {
        self.ensure_available()?;

        self.published
            .write()
            .expect("InMemoryBroker: published write lock poisoned")
            .push((channel, payload.to_string()));

        // Clone handlers to release lock before await points
        let channel_handlers: Vec<Arc<dyn BrokerHandler>> = {
            let handlers = self
                .handlers
                .read()
                .expect("InMemoryBroker: handlers lock poisoned");
            handlers.get(&channel).cloned().unwrap_or_default()
        };

        for handler in channel_handlers {
            handler.handle(channel, payload.to_string()).await;
        }

        Ok(())
    }
}

#[async_trait]
impl BrokerSubscriber for InMemoryBroker {
    async fn subscribe(
        &self,
        channel: Channel,
        handler: Arc<dyn BrokerHandler>,
    ) -> Result<(), BrokerError> {
        self.ensure_available()?;

        let failing = self
            .failing_subscriptions
            .read()
            .expect("InMemoryBroker: subscriptions lock poisoned")
            .contains(&channel);
        if failing {
            return Err(BrokerError::Subscription {
                channel,
                reason: "subscription rejected by in-memory broker".to_string(),
            });
        }

        self.handlers
            .write()
            .expect("InMemoryBroker: handlers write lock poisoned")
            .entry(channel)
            .or_default()
            .push(handler);
        Ok(())
    }
}
