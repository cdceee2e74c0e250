//! Organization roster, one contact per role.

use super::{require_text, ContentError};
use crate::db::{Record, Repository};
use crate::models::Contact;

/// Create or replace the contact for its role.
pub async fn save_contact(repo: &dyn Repository<Contact>, contact: &Contact) -> Result<Contact, ContentError> {
    require_text(&contact.role, "Role")?;

    let mut contact = contact.clone();
    contact.role = contact.role.trim().to_string();
    repo.upsert(&contact.key()?, &contact).await?;

    tracing::info!(role = %contact.role, "Contact saved");
    Ok(contact)
}

pub async fn remove_contact(repo: &dyn Repository<Contact>, role: &str) -> Result<(), ContentError> {
    require_text(role, "Role")?;
    let role = role.trim();
    repo.delete(role).await?;
    tracing::info!(role = %role, "Contact deleted");
    Ok(())
}

pub async fn find_contact(repo: &dyn Repository<Contact>, role: &str) -> Result<Contact, ContentError> {
    let role = role.trim();
    repo.get(role)
        .await?
        .ok_or_else(|| ContentError::NotFound(format!("Contact '{}'", role)))
}

/// Every contact sorted by role. Backend failures yield an empty roster.
pub async fn load_roster(repo: &dyn Repository<Contact>) -> Vec<Contact> {
    match repo.list_all().await {
        Ok(mut contacts) => {
            contacts.sort_by(|a, b| a.role.cmp(&b.role));
            contacts
        }
        Err(e) => {
            tracing::error!("Failed to load contacts: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{LocalRepository, MemoryDocumentStore, MemoryStorage, RemoteRepository};
    use std::sync::Arc;

    fn contact(role: &str, name: &str) -> Contact {
        Contact {
            name: Some(name.to_string()),
            ..Contact::new(role)
        }
    }

    #[tokio::test]
    async fn test_save_replaces_by_role() {
        let repo = LocalRepository::<Contact>::new(Arc::new(MemoryStorage::new()));

        save_contact(&repo, &contact("President", "Ann")).await.unwrap();
        save_contact(&repo, &contact(" President ", "Bea")).await.unwrap();

        let roster = load_roster(&repo).await;
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name.as_deref(), Some("Bea"));
    }

    #[tokio::test]
    async fn test_save_requires_role() {
        let repo = LocalRepository::<Contact>::new(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            save_contact(&repo, &contact("  ", "Ann")).await,
            Err(ContentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_roster_sorted_and_removable() {
        let repo = RemoteRepository::<Contact>::new(Arc::new(MemoryDocumentStore::new()));
        save_contact(&repo, &contact("Treasurer", "Tom")).await.unwrap();
        save_contact(&repo, &contact("Secretary", "Sue")).await.unwrap();

        let roles: Vec<_> = load_roster(&repo).await.into_iter().map(|c| c.role).collect();
        assert_eq!(roles, vec!["Secretary", "Treasurer"]);

        remove_contact(&repo, "Secretary").await.unwrap();
        assert!(matches!(
            find_contact(&repo, "Secretary").await,
            Err(ContentError::NotFound(_))
        ));
        assert_eq!(find_contact(&repo, "Treasurer").await.unwrap().name.as_deref(), Some("Tom"));
    }

    #[tokio::test]
    async fn test_role_lookups_ignore_padding() {
        let repo = LocalRepository::<Contact>::new(Arc::new(MemoryStorage::new()));
        save_contact(&repo, &contact("President", "Ann")).await.unwrap();

        assert_eq!(find_contact(&repo, " President ").await.unwrap().name.as_deref(), Some("Ann"));

        remove_contact(&repo, " President ").await.unwrap();
        assert!(load_roster(&repo).await.is_empty());
    }

    #[tokio::test]
    async fn test_roster_degrades_on_outage() {
        let store = Arc::new(MemoryDocumentStore::new());
        let repo = RemoteRepository::<Contact>::new(store.clone());
        save_contact(&repo, &contact("Secretary", "Sue")).await.unwrap();
        store.set_offline(true);

        assert!(load_roster(&repo).await.is_empty());
        assert!(find_contact(&repo, "Secretary").await.is_err());
    }
}
