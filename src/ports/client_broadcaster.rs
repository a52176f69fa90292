//! ClientBroadcaster port - Emitting events to this instance's clients.

use crate::domain::relay::RelayEvent;

/// Port for delivering an event to every client attached to this instance.
///
/// Implementations must not block; slow clients are the adapter's problem.
pub trait ClientBroadcaster: Send + Sync {
    /// Returns how many clients were handed the event.
    fn broadcast(&self, event: RelayEvent) -> usize;
}
