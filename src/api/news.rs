//! News page endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::content::{self, NewsPage};
use crate::AppState;

/// GET /api/news - Carousel, recent boxes and the archive sidebar.
pub async fn get_news(State(state): State<AppState>) -> ApiResult<NewsPage> {
    success(content::load_news_page(state.repos.articles.as_ref()).await)
}
