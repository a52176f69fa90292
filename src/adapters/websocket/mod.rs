//! WebSocket transport for relay clients.
//!
//! ```text
//!            broker channels
//!                  │
//!                  ▼
//!          ┌───────────────┐      publish       ┌──────────────────┐
//!          │ BroadcastRelay│◄───── broker ◄─────│ SendMessageHandler│
//!          └───────┬───────┘                    └─────────▲────────┘
//!                  │ broadcast                            │ receive
//!                  ▼                                      │
//!          ┌───────────────┐   events   ┌──────────┐  frames
//!          │ClientRegistry │──────────► │ ws task  │──────┘
//!          └───────────────┘            └──────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - JSON frame types
//! - [`clients`] - Local client registry and fan-out
//! - [`context`] - Per-process relay context
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod clients;
pub mod context;
pub mod handler;
pub mod messages;

pub use clients::{ClientId, ClientRegistry};
pub use context::RelayContext;
pub use handler::{websocket_router, ws_handler};
pub use messages::{ClientMessage, ConnectionCountPayload, NewMessagePayload, SendMessagePayload, ServerMessage};
