//! Foundation module - Shared domain primitives.
//!
//! Contains the value objects and identifiers that form the vocabulary of
//! the relay domain.

mod ids;
mod timestamp;

pub use ids::MessageId;
pub use timestamp::Timestamp;
