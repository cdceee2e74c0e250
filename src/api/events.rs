//! Calendar API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::content::{self, CalendarView};
use crate::models::{DayEvents, Event, EventRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
}

/// GET /api/events - Events by day and the year's public holidays.
pub async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<CalendarView> {
    success(
        content::load_calendar_view(state.repos.events.as_ref(), state.clock.as_ref(), query.year)
            .await,
    )
}

/// GET /api/events/upcoming - The next three events.
pub async fn get_upcoming_events(State(state): State<AppState>) -> ApiResult<Vec<Event>> {
    success(content::load_upcoming(state.repos.events.as_ref(), state.clock.as_ref()).await)
}

/// POST /api/events/:date - Add an event to a day.
pub async fn create_event(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(request): Json<EventRequest>,
) -> ApiResult<DayEvents> {
    match content::add_event(state.repos.events.as_ref(), &date, &request).await {
        Ok(day) => success(day),
        Err(e) => error(e),
    }
}

/// PUT /api/events/:date/:index - Replace one event of a day.
pub async fn update_event(
    State(state): State<AppState>,
    Path((date, index)): Path<(String, usize)>,
    Json(request): Json<EventRequest>,
) -> ApiResult<DayEvents> {
    match content::update_event(state.repos.events.as_ref(), &date, index, &request).await {
        Ok(day) => success(day),
        Err(e) => error(e),
    }
}

/// DELETE /api/events/:date/:index - Remove one event. Returns the remaining
/// day, or null when it was the last one.
pub async fn delete_event(
    State(state): State<AppState>,
    Path((date, index)): Path<(String, usize)>,
) -> ApiResult<Option<DayEvents>> {
    match content::remove_event(state.repos.events.as_ref(), &date, index).await {
        Ok(day) => success(day),
        Err(e) => error(e),
    }
}
