//! Broker adapters.
//!
//! Adapters implement the counter and pub/sub ports
//! for different environments:
//!
//! - `RedisBroker` - Shared Redis, used by every instance in a deployment
//! - `InMemoryBroker` - Synchronous, in-process broker for testing

mod in_memory;
mod redis;

pub use self::redis::RedisBroker;
pub use in_memory::InMemoryBroker;
