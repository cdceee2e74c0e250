//! News article publishing and the news page projection.

use serde::Serialize;

use super::{require_text, ContentError};
use crate::archive::{
    build_archive, build_latest_article_list, build_recent_article_list, parse_date, YearMap,
    LATEST_ARTICLE_COUNT,
};
use crate::clock::Clock;
use crate::db::{Record, Repository};
use crate::models::{Article, UpdateArticleRequest};

/// Everything the news page shows.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPage {
    pub latest: Vec<Article>,
    pub recent: Vec<Article>,
    pub archive: YearMap,
}

/// Publish a new article dated today.
pub async fn publish_article(
    repo: &dyn Repository<Article>,
    clock: &dyn Clock,
    title: &str,
    content: &str,
) -> Result<Article, ContentError> {
    require_text(title, "Title")?;

    let article = Article::new(title.trim(), content, clock.today());
    let key = article.key()?;
    repo.upsert(&key, &article).await?;

    tracing::info!(id = %key, date = %article.date, "Article published");
    Ok(article)
}

/// Apply `changes` to a stored article, keeping its id and date.
pub async fn edit_article(
    repo: &dyn Repository<Article>,
    original: &Article,
    changes: &UpdateArticleRequest,
) -> Result<Article, ContentError> {
    let key = original.key()?;
    if let Some(title) = &changes.title {
        require_text(title, "Title")?;
    }

    let patch = Article {
        id: Some(key.clone()),
        title: changes
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(&original.title)
            .to_string(),
        content: changes
            .content
            .clone()
            .unwrap_or_else(|| original.content.clone()),
        date: original.date.clone(),
    };
    repo.merge(&key, &patch).await?;

    tracing::info!(id = %key, "Article updated");
    repo.get(&key)
        .await?
        .ok_or_else(|| ContentError::NotFound(format!("Article {}", key)))
}

/// Delete one article.
pub async fn remove_article(repo: &dyn Repository<Article>, article: &Article) -> Result<(), ContentError> {
    let key = article.key()?;
    repo.delete(&key).await?;
    tracing::info!(id = %key, "Article deleted");
    Ok(())
}

/// Delete every article. Returns how many were removed.
pub async fn clear_archive(repo: &dyn Repository<Article>) -> Result<usize, ContentError> {
    let keys = repo.keys().await?;
    for key in &keys {
        repo.delete(key).await?;
    }
    tracing::info!(deleted = keys.len(), "News archive cleared");
    Ok(keys.len())
}

/// All articles, newest first. Backend failures yield an empty list.
pub async fn load_articles(repo: &dyn Repository<Article>) -> Vec<Article> {
    match repo.list_all().await {
        Ok(articles) => build_latest_article_list(&articles, articles.len()),
        Err(e) => {
            tracing::error!("Failed to load articles: {}", e);
            Vec::new()
        }
    }
}

/// Build the news page. Articles with unreadable dates stay out of the archive.
pub async fn load_news_page(repo: &dyn Repository<Article>) -> NewsPage {
    let articles = load_articles(repo).await;

    let (dated, undated): (Vec<Article>, Vec<Article>) = articles
        .iter()
        .cloned()
        .partition(|a| parse_date(&a.date).is_some());
    if !undated.is_empty() {
        tracing::warn!(count = undated.len(), "Articles with invalid dates left out of the archive");
    }

    let archive = build_archive(&dated).unwrap_or_else(|e| {
        tracing::warn!("Failed to build archive: {}", e);
        YearMap::new()
    });

    NewsPage {
        latest: build_latest_article_list(&articles, LATEST_ARTICLE_COUNT),
        recent: build_recent_article_list(&articles),
        archive,
    }
}
