//! Asynchronous document store port backing the remote adapter.
//!
//! Documents are JSON objects addressed by `(collection, id)`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use super::repository::StoreError;

/// Opaque document key-value service.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store `document` under `(collection, id)`, replacing any previous one.
    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Remove a document. Missing documents are not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Every document in `collection` with its id.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Document store error: {:?}", err);
        StoreError::BackendUnavailable(format!("Database error: {}", err))
    }
}

// ==================== IN-MEMORY STORE ====================

/// Document store kept in memory, with switchable outages for tests.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Value>>>,
    offline: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with `BackendUnavailable` until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::BackendUnavailable(
                "document store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        self.check_online()?;
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.check_online()?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        if let Some(docs) = self.collections.write().get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        self.check_online()?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ==================== SQLITE STORE ====================

/// Document store persisted in the SQLite `documents` table.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let data = serde_json::to_string(&document)?;

        sqlx::query(
            r#"INSERT INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)
               ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at"#,
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|row| parse_document(collection, id, row.get("data"))))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id: String = row.get("id");
                let document = parse_document(collection, &id, row.get("data"))?;
                Some((id, document))
            })
            .collect())
    }
}

fn parse_document(collection: &str, id: &str, data: String) -> Option<Value> {
    match serde_json::from_str(&data) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(collection, id, "Ignoring corrupt document: {}", e);
            None
        }
    }
}
