//! Redis-based key-value backend.
//!
//! Stores each record as a plain string value under `{prefix}:{key}`. The
//! multiplexed connection is established lazily and dropped after connection
//! or I/O errors so the next call reconnects.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::RwLock;

use super::backend::{KeyValueStore, StorageError};

/// Redis-based key-value backend.
pub struct RedisKeyValueStore {
    /// Redis client for creating connections
    client: Client,

    /// Multiplexed connection (shared across calls)
    connection: RwLock<Option<MultiplexedConnection>>,

    /// Key prefix for Redis keys
    prefix: String,
}

impl RedisKeyValueStore {
    /// Create a new Redis backend. Fails only if the URL cannot be parsed;
    /// no connection is made until the first command.
    pub fn new(url: &str, prefix: impl Into<String>) -> Result<Self, StorageError> {
        let client = Client::open(url)?;

        Ok(Self {
            client,
            connection: RwLock::new(None),
            prefix: prefix.into(),
        })
    }

    /// Full Redis key for a logical key.
    pub fn redis_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, StorageError> {
        {
            let conn = self.connection.read().await;
            if let Some(ref c) = *conn {
                return Ok(c.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // Another caller may have connected while we waited for the lock
        if let Some(ref c) = *conn_guard {
            return Ok(c.clone());
        }

        match self.client.get_multiplexed_tokio_connection().await {
            Ok(conn) => {
                *conn_guard = Some(conn.clone());
                tracing::info!("Redis storage connection established");
                Ok(conn)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to Redis");
                Err(StorageError::Redis(e))
            }
        }
    }

    async fn reset_on_error(&self, error: &RedisError) {
        if error.is_connection_dropped() || error.is_io_error() {
            let mut conn_guard = self.connection.write().await;
            *conn_guard = None;
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    fn backend_type(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let mut conn = self.get_connection().await?;
        let result: Result<Option<Vec<u8>>, RedisError> = conn.get(self.redis_key(key)).await;

        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                self.reset_on_error(&e).await;
                Err(StorageError::Redis(e))
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        let result: Result<(), RedisError> = conn.set(self.redis_key(key), value).await;

        if let Err(e) = result {
            self.reset_on_error(&e).await;
            return Err(StorageError::Redis(e));
        }
        Ok(())
    }
}
