//! ConnectionTracker - Owns this instance's share of the global connection count.
//!
//! Every connect and disconnect mutates the shared count with a single atomic
//! broker operation and announces the result on the count-update channel.
//! The tracker also remembers how many of the global count's clients live on
//! this instance, so that shutdown can remove exactly that contribution.
//!
//! # Lifecycle
//!
//! ```text
//! initialize ──► client_connected / client_disconnected ... ──► reconcile
//!                                                               (draining)
//! ```
//!
//! Once `reconcile` has run the tracker is draining: new connections are
//! refused and disconnects no longer touch the global count, because their
//! contribution has already been removed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::relay::{Channel, CONNECTION_COUNT_KEY};
use crate::ports::{BrokerError, BrokerPublisher, CounterStore};

/// Errors from the connect/disconnect paths.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("Instance is shutting down and refuses new connections")]
    Draining,
}

/// What `initialize` found on the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupCount {
    /// The key was absent and this instance created it at zero.
    Initialized,
    /// The key already existed and was left untouched.
    Existing(i64),
}

/// Result of shutdown reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No local clients were counted; the global count was not touched.
    Skipped,
    /// `removed` clients were subtracted, leaving `count` on the broker.
    Reconciled { removed: i64, count: i64 },
}

#[derive(Debug, Default)]
struct LocalConnections {
    count: i64,
    draining: bool,
}

/// Tracks local connections and mirrors them into the global count.
pub struct ConnectionTracker {
    store: Arc<dyn CounterStore>,
    publisher: Arc<dyn BrokerPublisher>,
    // never held across an await
    local: Mutex<LocalConnections>,
}

impl ConnectionTracker {
    pub fn new(store: Arc<dyn CounterStore>, publisher: Arc<dyn BrokerPublisher>) -> Self {
        Self {
            store,
            publisher,
            local: Mutex::new(LocalConnections::default()),
        }
    }

    /// Create the global count at zero if no instance has done so yet.
    ///
    /// An existing count is never overwritten.
    pub async fn initialize(&self) -> Result<StartupCount, PresenceError> {
        if self.store.init_if_absent(CONNECTION_COUNT_KEY, 0).await? {
            tracing::info!(key = CONNECTION_COUNT_KEY, "Initialized global connection count");
            return Ok(StartupCount::Initialized);
        }

        let current = self.store.get(CONNECTION_COUNT_KEY).await?.unwrap_or(0);
        tracing::info!(count = current, "Found existing global connection count");
        Ok(StartupCount::Existing(current))
    }

    /// Count a newly attached client and announce the new global count.
    ///
    /// Returns the global count after the increment. Once the increment has
    /// landed the client stays counted; a failed announcement is only logged.
    pub async fn client_connected(&self) -> Result<i64, PresenceError> {
        if self.lock_local().draining {
            return Err(PresenceError::Draining);
        }

        let count = self.store.incr(CONNECTION_COUNT_KEY).await?;

        let admitted = {
            let mut local = self.lock_local();
            if local.draining {
                false
            } else {
                local.count += 1;
                true
            }
        };
        if !admitted {
            // Reconciliation ran while we were incrementing; undo our share.
            let count = self.store.decr(CONNECTION_COUNT_KEY).await?;
            self.announce(count).await;
            return Err(PresenceError::Draining);
        }

        tracing::debug!(count, local = self.local_count(), "Client connected");
        self.announce(count).await;
        Ok(count)
    }

    /// Uncount a detached client and announce the new global count.
    ///
    /// Returns `None` when the instance is draining and the client's
    /// contribution was already removed by reconciliation.
    pub async fn client_disconnected(&self) -> Result<Option<i64>, PresenceError> {
        {
            let mut local = self.lock_local();
            if local.draining {
                return Ok(None);
            }
            local.count -= 1;
        }

        let count = match self.store.decr(CONNECTION_COUNT_KEY).await {
            Ok(count) => count,
            Err(e) => {
                let mut local = self.lock_local();
                if !local.draining {
                    local.count += 1;
                }
                return Err(e.into());
            }
        };

        tracing::debug!(count, local = self.local_count(), "Client disconnected");
        self.announce(count).await;
        Ok(Some(count))
    }

    /// Remove this instance's contribution from the global count.
    ///
    /// Puts the tracker into draining mode first, so no connect or disconnect
    /// can change the local count underneath the subtraction. The new count
    /// is announced on a best-effort basis.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome, PresenceError> {
        let removed = {
            let mut local = self.lock_local();
            local.draining = true;
            std::mem::take(&mut local.count)
        };

        if removed <= 0 {
            tracing::info!("No local clients to remove from the global count");
            return Ok(ReconcileOutcome::Skipped);
        }

        tracing::info!(removed, "Removing local clients from the global count");
        let count = self
            .store
            .subtract_clamped(CONNECTION_COUNT_KEY, removed)
            .await?;

        self.announce(count).await;
        Ok(ReconcileOutcome::Reconciled { removed, count })
    }

    /// Clients currently counted by this instance.
    pub fn local_count(&self) -> i64 {
        self.lock_local().count
    }

    /// Whether reconciliation has started.
    pub fn is_draining(&self) -> bool {
        self.lock_local().draining
    }

    /// Publish the count on the update channel. The count on the broker is
    /// already correct at this point, so a failure is logged and swallowed.
    async fn announce(&self, count: i64) {
        if let Err(e) = self
            .publisher
            .publish(Channel::ConnectionCountUpdated, &count.to_string())
            .await
        {
            tracing::error!(count, "Failed to announce connection count: {}", e);
        }
    }

    fn lock_local(&self) -> MutexGuard<'_, LocalConnections> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
