//! Storage backend factory

use std::sync::Arc;

use crate::config::StorageConfig;

use super::backend::KeyValueStore;
use super::file_backend::FileKeyValueStore;
use super::memory_backend::MemoryKeyValueStore;
use super::redis_backend::RedisKeyValueStore;

/// Create a key-value backend based on configuration.
///
/// Returns the appropriate backend implementation based on the `backend` setting:
/// - `"redis"`: Returns a `RedisKeyValueStore` if the URL is valid
/// - `"file"`: Returns a `FileKeyValueStore` rooted at `path`
/// - `"memory"` (or anything else): Returns a `MemoryKeyValueStore`
///
/// # Example
///
/// ```rust,ignore
/// let storage = create_key_value_store(&settings.storage);
/// ```
pub fn create_key_value_store(settings: &StorageConfig) -> Arc<dyn KeyValueStore> {
    match settings.backend.as_str() {
        "redis" => match RedisKeyValueStore::new(&settings.redis_url, settings.redis_prefix.clone())
        {
            Ok(store) => {
                tracing::info!(
                    backend = "redis",
                    prefix = %settings.redis_prefix,
                    "Creating Redis storage backend"
                );
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Redis storage requested but client could not be created, falling back to memory"
                );
                Arc::new(MemoryKeyValueStore::new())
            }
        },
        "file" => {
            tracing::info!(backend = "file", path = %settings.path, "Creating file storage backend");
            Arc::new(FileKeyValueStore::new(&settings.path))
        }
        "memory" => {
            tracing::info!(backend = "memory", "Creating memory storage backend");
            Arc::new(MemoryKeyValueStore::new())
        }
        other => {
            tracing::warn!(backend = %other, "Unknown storage backend, falling back to memory");
            Arc::new(MemoryKeyValueStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: &str) -> StorageConfig {
        StorageConfig {
            backend: backend.to_string(),
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_backend_selection() {
        assert_eq!(create_key_value_store(&config("memory")).backend_type(), "memory");
        assert_eq!(create_key_value_store(&config("file")).backend_type(), "file");
        assert_eq!(create_key_value_store(&config("redis")).backend_type(), "redis");
        assert_eq!(create_key_value_store(&config("sqlite")).backend_type(), "memory");
    }

    #[test]
    fn test_invalid_redis_url_falls_back() {
        let settings = StorageConfig {
            backend: "redis".to_string(),
            redis_url: "definitely not a url".to_string(),
            ..StorageConfig::default()
        };
        assert_eq!(create_key_value_store(&settings).backend_type(), "memory");
    }
}
