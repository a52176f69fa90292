//! Chat Relay - Horizontally scaled real-time chat relay.
//!
//! Every instance accepts WebSocket clients, tracks how many are attached
//! in a count shared through Redis, and relays chat messages and count
//! updates published on shared channels to its own clients.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
