//! Application handlers.
//!
//! - `presence` - Connection counting and shutdown reconciliation
//! - `relay` - Broker channel fan-out to local clients
//! - `messaging` - Chat messages sent by local clients

pub mod messaging;
pub mod presence;
pub mod relay;

pub use messaging::{MessagingError, SendMessageCommand, SendMessageHandler, SendMessageOutcome};
pub use presence::{ConnectionTracker, PresenceError, ReconcileOutcome, StartupCount};
pub use relay::BroadcastRelay;
