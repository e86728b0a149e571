//! Key-value store abstraction consumed by the cache layer.
//!
//! The gateway never assumes cache contents live in-process: everything goes
//! through this trait, so store outages stay injectable in tests and the
//! cache layer can degrade instead of failing requests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Errors from the external key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
            StoreError::Connection(e.to_string())
        } else {
            StoreError::Command(e.to_string())
        }
    }
}

/// Server-reported usage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreInfo {
    pub connected_clients: u64,
    pub used_memory: u64,
    pub used_memory_human: String,
    pub keyspace_hits: u64,
    pub keyspace_misses: u64,
    pub total_commands_processed: u64,
}

/// TTL-capable key-value store with glob pattern deletion.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key. `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a key with a store-enforced expiry.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Delete all keys matching a glob pattern, returning the count removed.
    ///
    /// Deletion of each individual key is atomic; the scan as a whole is not,
    /// and may run concurrently with reads and writes.
    async fn delete_matching(&self, pattern: &str) -> Result<u64, StoreError>;

    /// Check connectivity.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fetch server usage statistics.
    async fn info(&self) -> Result<StoreInfo, StoreError>;
}
