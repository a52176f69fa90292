//! Connection presence: keeping the global count in step with local clients.

mod connection_tracker;

pub use connection_tracker::{ConnectionTracker, PresenceError, ReconcileOutcome, StartupCount};
