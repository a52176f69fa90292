//! Relay vocabulary shared by every instance.
//!
//! The key and channel names are fixed process-wide; instances that agree on
//! them share one logical room through the broker.

mod channels;
mod count;
mod events;

pub use channels::{Channel, CONNECTION_COUNT_KEY};
pub use count::GlobalCount;
pub use events::{ChatMessage, RelayEvent};
