//! Messaging handlers - Chat messages sent by local clients.

mod send_message;

pub use send_message::{MessagingError, SendMessageCommand, SendMessageHandler, SendMessageOutcome};
