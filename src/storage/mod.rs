//! Durable key-value storage used to persist schedule state.
//!
//! # Backend Architecture
//!
//! The schedule store writes a single record through the [`KeyValueStore`]
//! abstraction, so the persistence medium can be swapped by configuration:
//!
//! - `MemoryKeyValueStore`: In-memory storage using DashMap (tests, ephemeral hosts)
//! - `FileKeyValueStore`: One JSON file per key under a directory (default)
//! - `RedisKeyValueStore`: Plain `GET`/`SET` on a Redis server
//!
//! Use `create_key_value_store()` to build the backend named in configuration.

mod backend;
mod factory;
mod file_backend;
mod memory_backend;
mod redis_backend;

pub use backend::{KeyValueStore, StorageError};
pub use factory::create_key_value_store;
pub use file_backend::FileKeyValueStore;
pub use memory_backend::MemoryKeyValueStore;
pub use redis_backend::RedisKeyValueStore;
