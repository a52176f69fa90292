//! Registry of clients attached to this instance.
//!
//! All clients share one room, so a single broadcast channel fans every
//! relayed event out to every attached connection.
//!
//! ```text
//! BroadcastRelay ──► ClientRegistry ──► client-a
//!                                   ├─► client-b
//!                                   └─► client-c
//! ```

use std::collections::HashSet;

use tokio::sync::{broadcast, watch, RwLock};
use uuid::Uuid;

use crate::domain::relay::RelayEvent;
use crate::ports::ClientBroadcaster;

/// Unique identifier for a WebSocket client connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Create a new random client ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracks locally attached clients and broadcasts relay events to them.
///
/// # Thread Safety
///
/// The broadcast sender is lock-free; the client set uses `RwLock` since
/// it is only touched on attach/detach.
pub struct ClientRegistry {
    sender: broadcast::Sender<RelayEvent>,
    clients: RwLock<HashSet<ClientId>>,
    closing: watch::Sender<bool>,
}

impl ClientRegistry {
    /// Create a registry whose per-client buffer holds `channel_capacity` events.
    ///
    /// A client that falls further behind than that skips the oldest events.
    pub fn new(channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        let (closing, _) = watch::channel(false);
        Self {
            sender,
            clients: RwLock::new(HashSet::new()),
            closing,
        }
    }

    /// Create with default capacity (128 events).
    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Attach a new client. The receiver gets every event broadcast from now on.
    pub async fn join(&self) -> (ClientId, broadcast::Receiver<RelayEvent>) {
        let client_id = ClientId::new();
        let receiver = self.sender.subscribe();
        self.clients.write().await.insert(client_id.clone());
        (client_id, receiver)
    }

    /// Detach a client. Returns `false` if it was not attached.
    pub async fn leave(&self, client_id: &ClientId) -> bool {
        self.clients.write().await.remove(client_id)
    }

    /// Emit an event to every attached client.
    ///
    /// Returns how many receivers were handed the event; zero when no
    /// client is attached, which is not an error.
    pub fn broadcast(&self, event: RelayEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of attached clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether a client is currently attached.
    pub async fn contains(&self, client_id: &ClientId) -> bool {
        self.clients.read().await.contains(client_id)
    }

    /// Watch that flips to `true` once [`close_all`](Self::close_all) ran.
    pub fn closing(&self) -> watch::Receiver<bool> {
        self.closing.subscribe()
    }

    /// Ask every connection task to close its socket.
    pub fn close_all(&self) {
        self.closing.send_replace(true);
    }
}

impl ClientBroadcaster for ClientRegistry {
    fn broadcast(&self, event: RelayEvent) -> usize {
        ClientRegistry::broadcast(self, event)
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
