//! Global connection count value object.

use std::fmt;

/// The deployment-wide number of connected clients, as stored on the broker.
///
/// Signed because uncompensated broker failures can drift the stored value
/// below zero; every value this crate writes itself is clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct GlobalCount(i64);

impl GlobalCount {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Removes an instance's local contribution, never going below zero.
    pub fn subtract_clamped(self, local: i64) -> Self {
        Self(self.0.saturating_sub(local).max(0))
    }
}

impl fmt::Display for GlobalCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
