//! Broker key and channel names.

use std::fmt;

/// Broker key holding the global connection count.
pub const CONNECTION_COUNT_KEY: &str = "chat:connection-count";

/// The two pub/sub channels every instance subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Carries the new global count as decimal text.
    ConnectionCountUpdated,
    /// Carries the raw chat message text.
    NewMessage,
}

impl Channel {
    /// Every channel, in subscription order.
    pub const ALL: [Channel; 2] = [Channel::ConnectionCountUpdated, Channel::NewMessage];

    /// Channel name on the broker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::ConnectionCountUpdated => "chat:connection-count-updated",
            Channel::NewMessage => "chat:new-message",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
