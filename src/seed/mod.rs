//! Backfill of missing records from bundled JSON fixtures.
//!
//! Seeding runs on every startup and only writes what is missing, so repeated
//! runs are free. Fixture problems never abort startup; they leave the
//! collection as it was.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::db::{Record, Repositories, Repository, StoreError};
use crate::models::{Article, Contact, DayEvents, PLACEHOLDER_IMAGE};

pub const CONTACTS_FIXTURE: &str = "contacts.json";
pub const ARTICLES_FIXTURE: &str = "articles.json";
pub const EVENTS_FIXTURE: &str = "events.json";

/// Errors loading a fixture document.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to fetch fixture {path}: {message}")]
    Fetch { path: String, message: String },
    #[error("fixture {path} is not valid JSON: {message}")]
    Decode { path: String, message: String },
}

/// Loads static JSON fixtures.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    async fn fetch_json(&self, path: &str) -> Result<Value, SeedError>;
}

/// Fixtures read from a directory on disk.
#[derive(Debug, Clone)]
pub struct FileFixtureSource {
    root: PathBuf,
}

impl FileFixtureSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FixtureSource for FileFixtureSource {
    async fn fetch_json(&self, path: &str) -> Result<Value, SeedError> {
        let full_path = self.root.join(path);
        let contents = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| SeedError::Fetch {
                path: full_path.display().to_string(),
                message: e.to_string(),
            })?;
        serde_json::from_str(&contents).map_err(|e| SeedError::Decode {
            path: full_path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Fixtures fetched with HTTP GET below a base URL.
#[derive(Debug, Clone)]
pub struct HttpFixtureSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFixtureSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FixtureSource for HttpFixtureSource {
    async fn fetch_json(&self, path: &str) -> Result<Value, SeedError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let fetch_error = |message: String| SeedError::Fetch {
            path: url.clone(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| fetch_error(e.to_string()))?;

        response.json::<Value>().await.map_err(|e| SeedError::Decode {
            path: url.clone(),
            message: e.to_string(),
        })
    }
}

/// Fixtures held in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StaticFixtureSource {
    documents: std::collections::HashMap<String, Value>,
    fetches: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl StaticFixtureSource {
    pub fn with(mut self, path: &str, document: Value) -> Self {
        self.documents.insert(path.to_string(), document);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl FixtureSource for StaticFixtureSource {
    async fn fetch_json(&self, path: &str) -> Result<Value, SeedError> {
        self.fetches.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.documents.get(path).cloned().ok_or_else(|| SeedError::Fetch {
            path: path.to_string(),
            message: "not found".to_string(),
        })
    }
}

/// Record kinds that can be seeded from fixtures.
pub trait Seedable: Record {
    /// Fill in defaults the fixture may omit.
    fn with_defaults(self) -> Self {
        self
    }
}

impl Seedable for Contact {
    fn with_defaults(mut self) -> Self {
        if self.image.as_deref().map_or(true, str::is_empty) {
            self.image = Some(PLACEHOLDER_IMAGE.to_string());
        }
        self
    }
}

impl Seedable for Article {
    fn with_defaults(mut self) -> Self {
        if self.id.is_none() {
            self.id = Some(uuid::Uuid::new_v4().to_string());
        }
        self
    }
}

impl Seedable for DayEvents {}

/// Outcome of one seeding pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Keys written during this pass.
    pub written: Vec<String>,
    /// Missing keys the fixture had no record for.
    pub unresolved: Vec<String>,
}

/// Write fixture records for every key in `required` that is not stored yet.
pub async fn ensure_seeded<T: Seedable>(
    repo: &dyn Repository<T>,
    required: &BTreeSet<String>,
    source: &dyn FixtureSource,
    fixture_path: &str,
) -> Result<SeedReport, StoreError> {
    let existing: HashSet<String> = repo.keys().await?.into_iter().collect();
    let missing: BTreeSet<&String> = required.iter().filter(|k| !existing.contains(*k)).collect();

    if missing.is_empty() {
        tracing::debug!(kind = T::KIND, "Nothing to seed");
        return Ok(SeedReport::default());
    }

    let Some(fixtures) = load_fixture::<T>(source, fixture_path).await else {
        return Ok(SeedReport::default());
    };

    let mut report = SeedReport::default();
    for record in fixtures {
        let Ok(key) = record.key() else {
            continue;
        };
        if missing.contains(&key) && !report.written.contains(&key) {
            repo.upsert(&key, &record).await?;
            report.written.push(key);
        }
    }

    report.unresolved = missing
        .into_iter()
        .filter(|key| !report.written.contains(key))
        .cloned()
        .collect();
    if !report.unresolved.is_empty() {
        tracing::warn!(kind = T::KIND, unresolved = ?report.unresolved, "Fixture lacks required records");
    }
    tracing::info!(kind = T::KIND, written = report.written.len(), "Seeded missing records");

    Ok(report)
}

/// Seed every fixture record when the collection is empty.
pub async fn backfill_if_empty<T: Seedable>(
    repo: &dyn Repository<T>,
    source: &dyn FixtureSource,
    fixture_path: &str,
) -> Result<SeedReport, StoreError> {
    if !repo.list_all().await?.is_empty() {
        return Ok(SeedReport::default());
    }

    let Some(fixtures) = load_fixture::<T>(source, fixture_path).await else {
        return Ok(SeedReport::default());
    };

    let mut report = SeedReport::default();
    for record in fixtures {
        match record.key() {
            Ok(key) => {
                repo.upsert(&key, &record).await?;
                report.written.push(key);
            }
            Err(e) => tracing::warn!(kind = T::KIND, "Skipping fixture record: {}", e),
        }
    }

    tracing::info!(kind = T::KIND, written = report.written.len(), "Backfilled empty collection");
    Ok(report)
}

/// Fetch and decode a fixture, logging and swallowing fixture problems.
async fn load_fixture<T: Seedable>(source: &dyn FixtureSource, fixture_path: &str) -> Option<Vec<T>> {
    let document = match source.fetch_json(fixture_path).await {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(kind = T::KIND, "Seeding skipped: {}", e);
            return None;
        }
    };

    match serde_json::from_value::<Vec<T>>(document) {
        Ok(records) => Some(records.into_iter().map(Seedable::with_defaults).collect()),
        Err(e) => {
            tracing::warn!(kind = T::KIND, path = fixture_path, "Seeding skipped, bad fixture: {}", e);
            None
        }
    }
}

/// Startup seeding for the whole site.
pub async fn seed_site(
    repos: &Repositories,
    source: &dyn FixtureSource,
    required_roles: &BTreeSet<String>,
) -> Result<(), StoreError> {
    ensure_seeded(repos.contacts.as_ref(), required_roles, source, CONTACTS_FIXTURE).await?;
    backfill_if_empty(repos.articles.as_ref(), source, ARTICLES_FIXTURE).await?;
    backfill_if_empty(repos.events.as_ref(), source, EVENTS_FIXTURE).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{LocalRepository, MemoryDocumentStore, MemoryStorage, RemoteRepository, StorageBackend};
    use serde_json::json;
    use std::sync::Arc;

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn contacts_fixture() -> StaticFixtureSource {
        StaticFixtureSource::default().with(
            CONTACTS_FIXTURE,
            json!([
                {"role": "president", "name": "Fixture President"},
                {"role": "secretary", "name": "Fixture Secretary", "image": "assets/images/sec.jpg"},
                {"role": "treasurer", "name": "Fixture Treasurer", "image": ""}
            ]),
        )
    }

    #[tokio::test]
    async fn test_fills_only_gaps() {
        let repo = LocalRepository::<Contact>::new(Arc::new(MemoryStorage::new()));
        let existing = Contact {
            name: Some("Real President".to_string()),
            ..Contact::new("president")
        };
        repo.upsert("president", &existing).await.unwrap();
        let source = contacts_fixture();

        let report = ensure_seeded(&repo, &roles(&["president", "secretary"]), &source, CONTACTS_FIXTURE)
            .await
            .unwrap();

        assert_eq!(report.written, vec!["secretary".to_string()]);
        assert_eq!(repo.get("president").await.unwrap(), Some(existing));
        let secretary = repo.get("secretary").await.unwrap().unwrap();
        assert_eq!(secretary.image.as_deref(), Some("assets/images/sec.jpg"));
        assert_eq!(repo.get("treasurer").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_placeholder_image() {
        let repo = RemoteRepository::<Contact>::new(Arc::new(MemoryDocumentStore::new()));
        let source = contacts_fixture();

        ensure_seeded(&repo, &roles(&["president", "treasurer"]), &source, CONTACTS_FIXTURE)
            .await
            .unwrap();

        for role in ["president", "treasurer"] {
            let contact = repo.get(role).await.unwrap().unwrap();
            assert_eq!(contact.image.as_deref(), Some(PLACEHOLDER_IMAGE));
        }
    }

    #[tokio::test]
    async fn test_rerun_writes_nothing() {
        let repo = LocalRepository::<Contact>::new(Arc::new(MemoryStorage::new()));
        let source = contacts_fixture();
        let required = roles(&["president", "secretary"]);

        let first = ensure_seeded(&repo, &required, &source, CONTACTS_FIXTURE).await.unwrap();
        let second = ensure_seeded(&repo, &required, &source, CONTACTS_FIXTURE).await.unwrap();

        assert_eq!(first.written.len(), 2);
        assert_eq!(second, SeedReport::default());
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_reports_unresolved_roles() {
        let repo = LocalRepository::<Contact>::new(Arc::new(MemoryStorage::new()));
        let source = contacts_fixture();

        let report = ensure_seeded(&repo, &roles(&["president", "janitor"]), &source, CONTACTS_FIXTURE)
            .await
            .unwrap();

        assert_eq!(report.written, vec!["president".to_string()]);
        assert_eq!(report.unresolved, vec!["janitor".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_fixture_degrades_to_empty() {
        let repo = LocalRepository::<Contact>::new(Arc::new(MemoryStorage::new()));
        let source = StaticFixtureSource::default();

        let report = ensure_seeded(&repo, &roles(&["president"]), &source, CONTACTS_FIXTURE)
            .await
            .unwrap();

        assert_eq!(report, SeedReport::default());
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_fixture_degrades_to_empty() {
        let repo = LocalRepository::<Contact>::new(Arc::new(MemoryStorage::new()));
        let source = StaticFixtureSource::default().with(CONTACTS_FIXTURE, json!({"not": "a list"}));

        let report = ensure_seeded(&repo, &roles(&["president"]), &source, CONTACTS_FIXTURE)
            .await
            .unwrap();

        assert!(report.written.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let store = Arc::new(MemoryDocumentStore::new());
        let repo = RemoteRepository::<Contact>::new(store.clone());
        store.set_offline(true);

        let result = ensure_seeded(&repo, &roles(&["president"]), &contacts_fixture(), CONTACTS_FIXTURE).await;

        assert!(matches!(result, Err(StoreError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_backfill_only_when_empty() {
        let repo = LocalRepository::<Article>::new(Arc::new(MemoryStorage::new()));
        let source = StaticFixtureSource::default().with(
            ARTICLES_FIXTURE,
            json!([
                {"title": "Welcome", "content": "Hello", "date": "2024-09-01"},
                {"title": "Fair", "content": "Come", "date": "2024-10-01"}
            ]),
        );

        let first = backfill_if_empty(&repo, &source, ARTICLES_FIXTURE).await.unwrap();
        let second = backfill_if_empty(&repo, &source, ARTICLES_FIXTURE).await.unwrap();

        assert_eq!(first.written.len(), 2);
        assert!(second.written.is_empty());
        let articles = repo.list_all().await.unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.id.is_some()));
    }

    #[tokio::test]
    async fn test_seed_site() {
        let repos = Repositories::select(&StorageBackend::Local(Arc::new(MemoryStorage::new())));
        let source = contacts_fixture().with(
            EVENTS_FIXTURE,
            json!([{"date": "2024-12-25", "events": [{"title": "Party", "date": "2024-12-25"}]}]),
        );

        seed_site(&repos, &source, &roles(&["president"])).await.unwrap();

        assert_eq!(repos.contacts.list_all().await.unwrap().len(), 1);
        assert!(repos.articles.list_all().await.unwrap().is_empty());
        assert_eq!(repos.events.get("2024-12-25").await.unwrap().unwrap().events.len(), 1);
    }

    #[tokio::test]
    async fn test_file_fixture_source() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONTACTS_FIXTURE), r#"[{"role":"president"}]"#).unwrap();
        let source = FileFixtureSource::new(dir.path());

        let doc = source.fetch_json(CONTACTS_FIXTURE).await.unwrap();
        assert_eq!(doc, json!([{"role": "president"}]));
        assert!(matches!(
            source.fetch_json("missing.json").await,
            Err(SeedError::Fetch { .. })
        ));
    }
}
