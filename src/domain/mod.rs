//! Domain layer containing relay vocabulary and pure count arithmetic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `relay` - Channel names, the global count and relayed events

pub mod foundation;
pub mod relay;
