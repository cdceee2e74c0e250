//! Calendar editing. Each stored record holds every event of one day.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::{require_text, ContentError};
use crate::archive::{
    build_event_calendar, build_upcoming_event_list, flatten_calendar, parse_date,
    public_holidays, EventCalendar,
};
use crate::clock::Clock;
use crate::db::Repository;
use crate::models::{DayEvents, Event, EventRequest};

/// The calendar page: events by day plus the year's public holidays.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub year: i32,
    pub events: EventCalendar,
    pub holidays: Vec<String>,
}

fn require_date(date: &str) -> Result<NaiveDate, ContentError> {
    parse_date(date)
        .ok_or_else(|| ContentError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", date)))
}

async fn load_day(repo: &dyn Repository<DayEvents>, date: &str) -> Result<DayEvents, ContentError> {
    repo.get(date)
        .await?
        .ok_or_else(|| ContentError::NotFound(format!("Events on {}", date)))
}

fn check_index(day: &DayEvents, index: usize) -> Result<(), ContentError> {
    if index >= day.events.len() {
        return Err(ContentError::NotFound(format!(
            "Event {} on {}",
            index, day.date
        )));
    }
    Ok(())
}

/// Append an event to `date`, creating the day if needed.
pub async fn add_event(
    repo: &dyn Repository<DayEvents>,
    date: &str,
    request: &EventRequest,
) -> Result<DayEvents, ContentError> {
    require_date(date)?;
    require_text(&request.title, "Title")?;

    let mut day = repo
        .get(date)
        .await?
        .unwrap_or_else(|| DayEvents::new(date));
    day.events.push(Event {
        title: request.title.trim().to_string(),
        date: date.to_string(),
        description: request.description.clone(),
    });
    repo.upsert(date, &day).await?;

    tracing::info!(date = %date, count = day.events.len(), "Event added");
    Ok(day)
}

/// Replace the event at `index` on `date`.
pub async fn update_event(
    repo: &dyn Repository<DayEvents>,
    date: &str,
    index: usize,
    request: &EventRequest,
) -> Result<DayEvents, ContentError> {
    require_date(date)?;
    require_text(&request.title, "Title")?;

    let mut day = load_day(repo, date).await?;
    check_index(&day, index)?;
    day.events[index] = Event {
        title: request.title.trim().to_string(),
        date: date.to_string(),
        description: request.description.clone(),
    };
    repo.upsert(date, &day).await?;

    tracing::info!(date = %date, index, "Event updated");
    Ok(day)
}

/// Remove the event at `index` on `date`. The day record is deleted once
/// its last event is gone, in which case `None` is returned.
pub async fn remove_event(
    repo: &dyn Repository<DayEvents>,
    date: &str,
    index: usize,
) -> Result<Option<DayEvents>, ContentError> {
    let mut day = load_day(repo, date).await?;
    check_index(&day, index)?;
    day.events.remove(index);

    if day.events.is_empty() {
        repo.delete(date).await?;
        tracing::info!(date = %date, "Last event removed, day deleted");
        return Ok(None);
    }

    repo.upsert(date, &day).await?;
    tracing::info!(date = %date, index, "Event removed");
    Ok(Some(day))
}

/// Events by day. Backend failures yield an empty calendar.
pub async fn load_calendar(repo: &dyn Repository<DayEvents>) -> EventCalendar {
    match repo.list_all().await {
        Ok(days) => build_event_calendar(&days),
        Err(e) => {
            tracing::error!("Failed to load events: {}", e);
            EventCalendar::new()
        }
    }
}

/// Calendar page for `year`, or the current year when absent.
pub async fn load_calendar_view(
    repo: &dyn Repository<DayEvents>,
    clock: &dyn Clock,
    year: Option<i32>,
) -> CalendarView {
    let year = year.unwrap_or_else(|| clock.now().year());
    CalendarView {
        year,
        events: load_calendar(repo).await,
        holidays: public_holidays(year)
            .into_iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect(),
    }
}

/// The upcoming-events box.
pub async fn load_upcoming(repo: &dyn Repository<DayEvents>, clock: &dyn Clock) -> Vec<Event> {
    let calendar = load_calendar(repo).await;
    build_upcoming_event_list(&flatten_calendar(&calendar), clock.now())
}
