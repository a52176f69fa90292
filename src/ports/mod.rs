//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay and the shared broker. Adapters implement these ports.
//!
//! ## Broker Ports
//!
//! - `CounterStore` - Atomic integer keys (the global connection count)
//! - `BrokerPublisher` - Publishing text payloads on a channel
//! - `BrokerSubscriber` - Registering handlers for a channel
//! - `BrokerHandler` - Handler invoked per delivered payload
//!
//! ## Client Ports
//!
//! - `ClientBroadcaster` - Emitting relay events to locally attached clients

mod broker_error;
mod broker_publisher;
mod broker_subscriber;
mod client_broadcaster;
mod counter_store;

pub use broker_error::BrokerError;
pub use broker_publisher::BrokerPublisher;
pub use broker_subscriber::{Broker, BrokerHandler, BrokerSubscriber};
pub use client_broadcaster::ClientBroadcaster;
pub use counter_store::CounterStore;
