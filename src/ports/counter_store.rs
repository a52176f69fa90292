//! CounterStore port - Atomic integer keys on the shared broker.
//!
//! Every mutation of a shared counter goes through a single broker-side
//! operation. Callers never read a value, change it locally and write it
//! back, because concurrent instances would lose each other's updates.

use async_trait::async_trait;

use super::BrokerError;

/// Port for integer keys shared by every instance.
///
/// # Example
///
/// ```ignore
/// store.init_if_absent(CONNECTION_COUNT_KEY, 0).await?;
/// let count = store.incr(CONNECTION_COUNT_KEY).await?;
/// ```
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a key. Returns `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<i64>, BrokerError>;

    /// Unconditionally write a key.
    async fn set(&self, key: &str, value: i64) -> Result<(), BrokerError>;

    /// Write a key only if it does not exist yet.
    ///
    /// Returns `true` when this call created the key. Concurrent callers
    /// racing on an absent key all write the same value, so whoever wins
    /// the result is the same.
    async fn init_if_absent(&self, key: &str, value: i64) -> Result<bool, BrokerError>;

    /// Atomically add one and return the new value.
    async fn incr(&self, key: &str) -> Result<i64, BrokerError>;

    /// Atomically subtract one and return the new value.
    async fn decr(&self, key: &str) -> Result<i64, BrokerError>;

    /// Atomically subtract `amount`, clamping at zero, and return the value written.
    ///
    /// A missing key counts as zero.
    async fn subtract_clamped(&self, key: &str, amount: i64) -> Result<i64, BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn CounterStore) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn counter_store_is_send_sync() {
        #[allow(dead_code)]
        fn check<T: CounterStore>() {
            assert_send_sync::<T>();
        }
    }
}
