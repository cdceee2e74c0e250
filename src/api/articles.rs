//! Article API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::content;
use crate::errors::AppError;
use crate::models::{Article, CreateArticleRequest, UpdateArticleRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ClearedArchive {
    pub deleted: usize,
}

async fn find_article(state: &AppState, id: &str) -> Result<Article, AppError> {
    match state.repos.articles.get(id).await {
        Ok(Some(article)) => Ok(article),
        Ok(None) => Err(AppError::NotFound(format!("Article {} not found", id))),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/articles - All articles, newest first.
pub async fn list_articles(State(state): State<AppState>) -> ApiResult<Vec<Article>> {
    success(content::load_articles(state.repos.articles.as_ref()).await)
}

/// GET /api/articles/:id - Get a single article.
pub async fn get_article(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Article> {
    match find_article(&state, &id).await {
        Ok(article) => success(article),
        Err(e) => error(e),
    }
}

/// POST /api/articles - Publish an article dated today.
pub async fn create_article(
    State(state): State<AppState>,
    Json(request): Json<CreateArticleRequest>,
) -> ApiResult<Article> {
    match content::publish_article(
        state.repos.articles.as_ref(),
        state.clock.as_ref(),
        &request.title,
        &request.content,
    )
    .await
    {
        Ok(article) => success(article),
        Err(e) => error(e),
    }
}

/// PUT /api/articles/:id - Edit title and/or content.
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateArticleRequest>,
) -> ApiResult<Article> {
    let original = match find_article(&state, &id).await {
        Ok(article) => article,
        Err(e) => return error(e),
    };

    match content::edit_article(state.repos.articles.as_ref(), &original, &request).await {
        Ok(article) => success(article),
        Err(e) => error(e),
    }
}

/// DELETE /api/articles/:id - Delete an article.
pub async fn delete_article(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let article = match find_article(&state, &id).await {
        Ok(article) => article,
        Err(e) => return error(e),
    };

    match content::remove_article(state.repos.articles.as_ref(), &article).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}

/// DELETE /api/articles - Clear the whole news archive.
pub async fn clear_articles(State(state): State<AppState>) -> ApiResult<ClearedArchive> {
    match content::clear_archive(state.repos.articles.as_ref()).await {
        Ok(deleted) => success(ClearedArchive { deleted }),
        Err(e) => error(e),
    }
}
