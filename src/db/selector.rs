//! Composition-time choice between the local and remote adapters.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::documents::DocumentStore;
use super::local::LocalRepository;
use super::remote::RemoteRepository;
use super::repository::Repository;
use super::storage::KeyValueStore;
use crate::models::{Article, Contact, DayEvents};

/// Which persistence backend the site runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    #[default]
    Local,
    Remote,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Local => "local",
            StorageMode::Remote => "remote",
        }
    }
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageMode::Local),
            "remote" => Ok(StorageMode::Remote),
            other => Err(format!("unknown storage mode '{}'", other)),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opened storage backend, ready to be wrapped in repositories.
#[derive(Clone)]
pub enum StorageBackend {
    Local(Arc<dyn KeyValueStore>),
    Remote(Arc<dyn DocumentStore>),
}

impl StorageBackend {
    pub fn mode(&self) -> StorageMode {
        match self {
            StorageBackend::Local(_) => StorageMode::Local,
            StorageBackend::Remote(_) => StorageMode::Remote,
        }
    }
}

/// One repository per entity kind, all on the same backend.
#[derive(Clone)]
pub struct Repositories {
    pub articles: Arc<dyn Repository<Article>>,
    pub events: Arc<dyn Repository<DayEvents>>,
    pub contacts: Arc<dyn Repository<Contact>>,
}

impl Repositories {
    /// Wrap `backend` in the matching adapters. Performs no I/O.
    pub fn select(backend: &StorageBackend) -> Self {
        match backend {
            StorageBackend::Local(storage) => Self {
                articles: Arc::new(LocalRepository::<Article>::new(storage.clone())),
                events: Arc::new(LocalRepository::<DayEvents>::new(storage.clone())),
                contacts: Arc::new(LocalRepository::<Contact>::new(storage.clone())),
            },
            StorageBackend::Remote(store) => Self {
                articles: Arc::new(RemoteRepository::<Article>::new(store.clone())),
                events: Arc::new(RemoteRepository::<DayEvents>::new(store.clone())),
                contacts: Arc::new(RemoteRepository::<Contact>::new(store.clone())),
            },
        }
    }
}
