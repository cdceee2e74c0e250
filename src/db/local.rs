//! Repository adapter over the synchronous key-value store.
//!
//! Keyed records live under `"<prefix>-<key>"`; blob records share one JSON
//! array. Every write goes straight to the store.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::repository::{decode_record, merge_documents, LocalLayout, Record, Repository, StoreError, WriteMode};
use super::storage::KeyValueStore;
use crate::models::{DayEvents, Event};

/// Key the oldest calendar page stored its whole date map under.
pub const LEGACY_EVENTS_KEY: &str = "events";

/// Local-mode repository for one record kind.
pub struct LocalRepository<T> {
    storage: Arc<dyn KeyValueStore>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Record> LocalRepository<T> {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            _phantom: PhantomData,
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(|e| {
            tracing::error!(kind = T::KIND, key, "Local storage write failed: {}", e);
            StoreError::BackendUnavailable(format!("local storage write failed: {}", e))
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(|e| {
            tracing::error!(kind = T::KIND, key, "Local storage delete failed: {}", e);
            StoreError::BackendUnavailable(format!("local storage delete failed: {}", e))
        })
    }

    /// Parse raw JSON under `key`, treating corrupt content as absent.
    fn read_value(&self, key: &str) -> Option<Value> {
        let raw = self.storage.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(kind = T::KIND, key, "Ignoring corrupt local entry: {}", e);
                None
            }
        }
    }

    // ==================== KEYED LAYOUT ====================

    fn keyed_write(&self, prefix: &str, key: &str, value: &T, mode: WriteMode) -> Result<(), StoreError> {
        let storage_key = format!("{}-{}", prefix, key);
        let incoming = serde_json::to_value(value)?;
        let document = match (mode, self.read_value(&storage_key)) {
            (WriteMode::Merge, Some(existing)) => merge_documents(existing, incoming),
            _ => incoming,
        };
        self.set(&storage_key, &serde_json::to_string(&document)?)
    }

    fn keyed_get(&self, prefix: &str, key: &str) -> Option<T> {
        let value = self.read_value(&format!("{}-{}", prefix, key))?;
        decode_record(key, value)
    }

    fn keyed_list(&self, prefix: &str) -> Vec<T> {
        let key_prefix = format!("{}-", prefix);
        self.storage
            .keys()
            .into_iter()
            .filter_map(|storage_key| {
                let key = storage_key.strip_prefix(&key_prefix)?.to_string();
                let value = self.read_value(&storage_key)?;
                decode_record(&key, value)
            })
            .collect()
    }

    // ==================== BLOB LAYOUT ====================

    /// Load every record in the blob, backfilling ids for legacy entries.
    fn load_blob(&self, blob_key: &str) -> Result<Vec<T>, StoreError> {
        let Some(Value::Array(entries)) = self.read_value(blob_key) else {
            return Ok(Vec::new());
        };

        let mut backfilled = 0usize;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<T>(entry) {
                Ok(mut record) => {
                    if record.key().is_err() {
                        record.attach_key(&uuid::Uuid::new_v4().to_string());
                        backfilled += 1;
                    }
                    records.push(record);
                }
                Err(e) => {
                    tracing::warn!(kind = T::KIND, key = blob_key, "Dropping corrupt entry: {}", e);
                }
            }
        }

        if backfilled > 0 {
            tracing::info!(kind = T::KIND, backfilled, "Assigned ids to legacy records");
            self.store_blob(blob_key, &records)?;
        }

        Ok(records)
    }

    fn store_blob(&self, blob_key: &str, records: &[T]) -> Result<(), StoreError> {
        self.set(blob_key, &serde_json::to_string(records)?)
    }

    fn blob_write(&self, blob_key: &str, key: &str, value: &T, mode: WriteMode) -> Result<(), StoreError> {
        let mut records = self.load_blob(blob_key)?;
        let mut incoming = value.clone();
        incoming.attach_key(key);

        let position = records
            .iter()
            .position(|r| r.key().map(|k| k == key).unwrap_or(false));

        match (position, mode) {
            (Some(index), WriteMode::Overwrite) => records[index] = incoming,
            (Some(index), WriteMode::Merge) => {
                let merged = merge_documents(
                    serde_json::to_value(&records[index])?,
                    serde_json::to_value(&incoming)?,
                );
                records[index] = serde_json::from_value(merged)?;
            }
            (None, _) => records.push(incoming),
        }

        self.store_blob(blob_key, &records)
    }

    fn blob_delete(&self, blob_key: &str, key: &str) -> Result<(), StoreError> {
        let records = self.load_blob(blob_key)?;
        let before = records.len();
        let remaining: Vec<T> = records
            .into_iter()
            .filter(|r| r.key().map(|k| k != key).unwrap_or(true))
            .collect();

        if remaining.len() != before {
            self.store_blob(blob_key, &remaining)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> Repository<T> for LocalRepository<T> {
    async fn write(&self, key: &str, value: &T, mode: WriteMode) -> Result<(), StoreError> {
        match T::LOCAL_LAYOUT {
            LocalLayout::Keyed { prefix } => self.keyed_write(prefix, key, value, mode),
            LocalLayout::Blob { key: blob_key } => self.blob_write(blob_key, key, value, mode),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        match T::LOCAL_LAYOUT {
            LocalLayout::Keyed { prefix } => Ok(self.keyed_get(prefix, key)),
            LocalLayout::Blob { key: blob_key } => Ok(self
                .load_blob(blob_key)?
                .into_iter()
                .find(|r| r.key().map(|k| k == key).unwrap_or(false))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match T::LOCAL_LAYOUT {
            LocalLayout::Keyed { prefix } => self.remove(&format!("{}-{}", prefix, key)),
            LocalLayout::Blob { key: blob_key } => self.blob_delete(blob_key, key),
        }
    }

    async fn list_all(&self) -> Result<Vec<T>, StoreError> {
        match T::LOCAL_LAYOUT {
            LocalLayout::Keyed { prefix } => Ok(self.keyed_list(prefix)),
            LocalLayout::Blob { key: blob_key } => self.load_blob(blob_key),
        }
    }
}

/// Move the legacy `events` date map into per-date keys.
///
/// Events already stored for a date are kept and the legacy ones appended.
/// Returns the number of dates touched. The legacy key is removed afterwards.
pub async fn import_legacy_events(storage: Arc<dyn KeyValueStore>) -> Result<usize, StoreError> {
    let Some(raw) = storage.get_item(LEGACY_EVENTS_KEY) else {
        return Ok(0);
    };

    let legacy: BTreeMap<String, Vec<Event>> = match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(key = LEGACY_EVENTS_KEY, "Legacy events entry is corrupt, leaving it: {}", e);
            return Ok(0);
        }
    };

    let repo = LocalRepository::<DayEvents>::new(storage.clone());
    let mut touched = 0;
    for (date, events) in legacy {
        if events.is_empty() {
            continue;
        }
        let mut day = repo.get(&date).await?.unwrap_or_else(|| DayEvents::new(&date));
        for event in events {
            if !day.events.contains(&event) {
                day.events.push(event);
            }
        }
        repo.upsert(&date, &day).await?;
        touched += 1;
    }

    storage
        .remove_item(LEGACY_EVENTS_KEY)
        .map_err(|e| StoreError::BackendUnavailable(format!("local storage delete failed: {}", e)))?;
    tracing::info!(dates = touched, "Imported legacy calendar events");
    Ok(touched)
}
