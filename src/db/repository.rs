//! Repository contract shared by the local and remote adapters.
//!
//! Call sites hold an `Arc<dyn Repository<T>>` and never branch on which
//! backend is active.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Errors raised by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document store rejected or failed the call.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// An id-keyed operation was attempted on a record without an id.
    #[error("missing identifier for {0} record")]
    MissingIdentifier(&'static str),
    /// A record could not be encoded or decoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// How a record is laid out in the local key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalLayout {
    /// One JSON document per record under `"<prefix>-<key>"`.
    Keyed { prefix: &'static str },
    /// One JSON array holding every record under a single key.
    Blob { key: &'static str },
}

/// How a write treats fields already stored under the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Replace the stored record entirely.
    #[default]
    Overwrite,
    /// Keep stored fields that the new value leaves absent or null.
    Merge,
}

/// A persisted entity kind.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Document collection name, also used in log fields.
    const KIND: &'static str;
    /// Storage layout used by the local adapter.
    const LOCAL_LAYOUT: LocalLayout;

    /// The record's natural key.
    fn key(&self) -> Result<String, StoreError>;

    /// Restore the key on a record read back from storage.
    fn attach_key(&mut self, key: &str);
}

/// Backend-agnostic CRUD over one entity kind.
///
/// Concurrent writers to the same key are not isolated: the last write wins.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// Create or replace the record at `key` according to `mode`.
    async fn write(&self, key: &str, value: &T, mode: WriteMode) -> Result<(), StoreError>;

    /// Fetch the record at `key`. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<T>, StoreError>;

    /// Remove the record at `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Every record of this kind, in no particular order.
    async fn list_all(&self) -> Result<Vec<T>, StoreError>;

    /// Create or overwrite the record at `key`.
    async fn upsert(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.write(key, value, WriteMode::Overwrite).await
    }

    /// Update the record at `key`, keeping fields `value` does not set.
    async fn merge(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.write(key, value, WriteMode::Merge).await
    }

    /// Keys of every stored record.
    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list_all()
            .await?
            .iter()
            .filter_map(|record| record.key().ok())
            .collect())
    }
}

/// Shallow merge of two JSON documents.
///
/// Non-null fields of `incoming` replace those of `existing`; everything else
/// in `existing` is kept. Non-object inputs resolve to `incoming`.
pub fn merge_documents(existing: Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (field, value) in patch {
                if !value.is_null() {
                    base.insert(field, value);
                }
            }
            Value::Object(base)
        }
        (_, incoming) => incoming,
    }
}

/// Decode a stored record, treating corrupt JSON as absent.
pub(crate) fn decode_record<T: Record>(key: &str, value: Value) -> Option<T> {
    match serde_json::from_value::<T>(value) {
        Ok(mut record) => {
            record.attach_key(key);
            Some(record)
        }
        Err(e) => {
            tracing::warn!(kind = T::KIND, key, "Ignoring corrupt record: {}", e);
            None
        }
    }
}
