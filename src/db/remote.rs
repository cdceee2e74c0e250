//! Repository adapter over the asynchronous document store.
//!
//! One collection per record kind, one document per key. Failures are logged
//! here and propagated to the caller; nothing is retried.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use super::documents::DocumentStore;
use super::repository::{decode_record, merge_documents, Record, Repository, StoreError, WriteMode};

/// Remote-mode repository for one record kind.
pub struct RemoteRepository<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Record> RemoteRepository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }
}

fn log_failure<'a, T: Record>(
    operation: &'static str,
    key: &'a str,
) -> impl FnOnce(StoreError) -> StoreError + 'a {
    move |err| {
        tracing::error!(kind = T::KIND, key, operation, "Remote operation failed: {}", err);
        err
    }
}

#[async_trait]
impl<T: Record> Repository<T> for RemoteRepository<T> {
    async fn write(&self, key: &str, value: &T, mode: WriteMode) -> Result<(), StoreError> {
        let incoming = serde_json::to_value(value)?;
        let document = match mode {
            WriteMode::Overwrite => incoming,
            WriteMode::Merge => match self
                .store
                .get(T::KIND, key)
                .await
                .map_err(log_failure::<T>("read", key))?
            {
                Some(existing) => merge_documents(existing, incoming),
                None => incoming,
            },
        };

        self.store
            .set(T::KIND, key, document)
            .await
            .map_err(log_failure::<T>("write", key))?;
        tracing::debug!(kind = T::KIND, key, ?mode, "Document written");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        let document = self
            .store
            .get(T::KIND, key)
            .await
            .map_err(log_failure::<T>("get", key))?;
        Ok(document.and_then(|doc| decode_record(key, doc)))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.store
            .delete(T::KIND, key)
            .await
            .map_err(log_failure::<T>("delete", key))
    }

    async fn list_all(&self) -> Result<Vec<T>, StoreError> {
        let documents = self
            .store
            .list(T::KIND)
            .await
            .map_err(log_failure::<T>("list", "*"))?;
        Ok(documents
            .into_iter()
            .filter_map(|(id, doc)| decode_record(&id, doc))
            .collect())
    }
}
