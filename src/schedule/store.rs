//! Durable identifier → recurrence mapping.
//!
//! All entries are serialized together under one storage key. Every mutation
//! writes the full map before returning; write failures are logged and
//! swallowed, leaving the in-memory map authoritative for this process.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::metrics::ScheduleMetrics;
use crate::storage::{KeyValueStore, StorageError};

use super::{DailyTime, RecurrenceConfig};

pub struct ScheduleStore {
    entries: HashMap<String, RecurrenceConfig>,
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl ScheduleStore {
    /// Load the persisted schedules. A missing or unreadable record yields an
    /// empty store; malformed entries are skipped individually.
    pub async fn load(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();

        let entries = match backend.get(&key).await {
            Ok(Some(bytes)) => decode_entries(&bytes),
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backend = backend.backend_type(),
                    key = %key,
                    "Failed to read persisted schedules, starting empty"
                );
                HashMap::new()
            }
        };

        tracing::info!(
            entries = entries.len(),
            backend = backend.backend_type(),
            "Schedule store loaded"
        );
        ScheduleMetrics::set_entries(entries.len());

        Self {
            entries,
            backend,
            key,
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&RecurrenceConfig> {
        self.entries.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of every entry
    pub fn load_all(&self) -> HashMap<String, RecurrenceConfig> {
        self.entries.clone()
    }

    /// Every entry, sorted by identifier
    pub fn sorted_entries(&self) -> Vec<(String, RecurrenceConfig)> {
        let mut entries: Vec<(String, RecurrenceConfig)> = self
            .entries
            .iter()
            .map(|(id, config)| (id.clone(), *config))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Insert or replace the entry for `identifier`.
    pub async fn put(&mut self, identifier: impl Into<String>, config: RecurrenceConfig) {
        let identifier = identifier.into();
        tracing::debug!(identifier = %identifier, kind = config.kind(), "Storing schedule");
        self.entries.insert(identifier, config);
        self.persist().await;
    }

    /// Remove the entry for `identifier` if present.
    pub async fn remove(&mut self, identifier: &str) {
        if self.entries.remove(identifier).is_some() {
            tracing::debug!(identifier = %identifier, "Removed schedule");
        }
        self.persist().await;
    }

    /// Remove every entry.
    pub async fn clear(&mut self) {
        self.entries.clear();
        self.persist().await;
    }

    async fn persist(&self) {
        ScheduleMetrics::set_entries(self.entries.len());

        if let Err(e) = self.write().await {
            ScheduleMetrics::record_persistence_failure();
            tracing::debug!(
                backend = self.backend.backend_type(),
                entries = self.entries.len(),
                "Schedule write failed"
            );
            EngineError::from(e).log("persist_schedules", &self.key);
        }
    }

    async fn write(&self) -> Result<(), StorageError> {
        let ordered: BTreeMap<&String, &RecurrenceConfig> = self.entries.iter().collect();
        let bytes = serde_json::to_vec(&ordered)?;
        self.backend.set(&self.key, bytes).await
    }
}

/// Decode the persisted map, skipping entries that do not describe a valid
/// recurrence. Records without a `type` tag are read as bare daily times.
fn decode_entries(bytes: &[u8]) -> HashMap<String, RecurrenceConfig> {
    let object: Map<String, Value> = match serde_json::from_slice(bytes) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            tracing::warn!("Persisted schedules are not a JSON object, ignoring");
            return HashMap::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Persisted schedules are not valid JSON, ignoring");
            return HashMap::new();
        }
    };

    let mut entries = HashMap::with_capacity(object.len());
    for (identifier, value) in object {
        match decode_entry(value) {
            Ok(config) => {
                entries.insert(identifier, config);
            }
            Err(reason) => {
                ScheduleMetrics::record_skipped_record();
                tracing::warn!(identifier = %identifier, reason = %reason, "Skipping malformed schedule record");
            }
        }
    }
    entries
}

fn decode_entry(value: Value) -> Result<RecurrenceConfig, String> {
    let tagged = value.get("type").is_some();

    let config = if tagged {
        serde_json::from_value::<RecurrenceConfig>(value).map_err(|e| e.to_string())?
    } else {
        let time = serde_json::from_value::<DailyTime>(value).map_err(|e| e.to_string())?;
        RecurrenceConfig::DailyAt(time)
    };

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}
