//! Application layer - Handlers coordinating the domain with the broker ports.

pub mod handlers;

pub use handlers::{
    // Presence
    ConnectionTracker, PresenceError, ReconcileOutcome, StartupCount,
    // Relay
    BroadcastRelay,
    // Messaging
    MessagingError, SendMessageCommand, SendMessageHandler, SendMessageOutcome,
};
