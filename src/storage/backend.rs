//! Backend trait for durable key-value storage.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage backend operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Redis operation failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend is temporarily unavailable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Backend trait for small durable records.
///
/// Values are opaque blobs; callers own the encoding. Implementations must be
/// `Send + Sync` since the engine worker holds them behind an `Arc`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend identifier used in logs ("memory", "file", "redis").
    fn backend_type(&self) -> &'static str;

    /// Read the value stored under `key`, or `None` when nothing was written yet.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
}
