//! News article model matching the frontend Article interface.

use serde::{Deserialize, Serialize};

use crate::db::{LocalLayout, Record, StoreError};

/// A news article shown on the home carousel and in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Stable identifier. Missing only on articles written by older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    /// Publication date in `YYYY-MM-DD` form.
    pub date: String,
}

impl Article {
    /// Create a new article with a freshly generated identifier.
    pub fn new(title: impl Into<String>, content: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            title: title.into(),
            content: content.into(),
            date: date.into(),
        }
    }
}

impl Record for Article {
    const KIND: &'static str = "articles";
    const LOCAL_LAYOUT: LocalLayout = LocalLayout::Blob { key: "articles" };

    fn key(&self) -> Result<String, StoreError> {
        self.id
            .clone()
            .ok_or(StoreError::MissingIdentifier(Self::KIND))
    }

    fn attach_key(&mut self, key: &str) {
        self.id = Some(key.to_string());
    }
}

/// Request body for publishing a new article.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
}

/// Request body for editing an existing article.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}
