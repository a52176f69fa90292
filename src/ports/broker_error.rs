//! Errors surfaced by broker adapters.

use crate::domain::relay::Channel;

/// Errors that can occur talking to the shared broker.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// A command or publish round-trip failed
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// Subscribing to a channel failed
    #[error("Failed to subscribe to {channel}: {reason}")]
    Subscription { channel: Channel, reason: String },

    /// A stored value could not be read as an integer
    #[error("Invalid value stored on broker: {0}")]
    InvalidValue(String),
}
