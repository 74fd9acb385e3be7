//! In-memory key-value backend using DashMap.
//!
//! Values live only as long as the process. Useful for tests and hosts that
//! do not need schedules to survive a restart.

use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::{KeyValueStore, StorageError};

/// In-memory key-value backend.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: DashMap<String, Vec<u8>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a single record.
    pub fn with_value(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.values.insert(key.into(), value.into());
        store
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
