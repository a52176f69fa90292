//! Relay handlers - Forwarding broker traffic to local clients.

mod broadcast_relay;

pub use broadcast_relay::BroadcastRelay;
