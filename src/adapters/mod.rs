//! Adapters - Implementations of port interfaces and transports.
//!
//! - `broker` - Shared broker implementations (Redis, in-memory)
//! - `http` - Router composition and the health endpoint
//! - `websocket` - Client transport, local fan-out and the relay context

pub mod broker;
pub mod http;
pub mod websocket;

pub use broker::{InMemoryBroker, RedisBroker};
pub use self::http::app_router;
pub use websocket::RelayContext;
