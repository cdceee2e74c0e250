//! Date-keyed projections over articles and events.
//!
//! Pure functions with no I/O. The results are rebuilt on every load and
//! never persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use indexmap::IndexMap;

use crate::models::{Article, DayEvents, Event};

/// Articles published on one day, keyed by two-digit day.
pub type DayMap = IndexMap<String, Vec<Article>>;
/// Days of one month, keyed by month name.
pub type MonthMap = IndexMap<String, DayMap>;
/// The news archive: year, then month name, then day.
pub type YearMap = IndexMap<String, MonthMap>;
/// Events grouped by `YYYY-MM-DD`, oldest first.
pub type EventCalendar = BTreeMap<String, Vec<Event>>;

/// Articles on the home carousel.
pub const LATEST_ARTICLE_COUNT: usize = 3;
/// Article boxes shown under the carousel.
pub const RECENT_ARTICLE_COUNT: usize = 4;
/// Entries in the upcoming-events box.
pub const UPCOMING_EVENT_COUNT: usize = 3;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// National holidays highlighted on the calendar, as (month, day).
const PUBLIC_HOLIDAYS: [(u32, u32); 10] = [
    (1, 1),
    (4, 25),
    (5, 1),
    (6, 10),
    (8, 15),
    (10, 5),
    (11, 1),
    (12, 1),
    (12, 8),
    (12, 25),
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Name of month `month` (1-12).
pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
}

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Group articles into year, month name and day, keeping input order.
pub fn build_year_article_index(articles: &[Article]) -> Result<YearMap, ArchiveError> {
    let mut index = YearMap::new();

    for article in articles {
        let date = parse_date(&article.date)
            .ok_or_else(|| ArchiveError::InvalidDate(article.date.clone()))?;
        let month = month_name(date.month())
            .ok_or_else(|| ArchiveError::InvalidDate(article.date.clone()))?;

        index
            .entry(date.year().to_string())
            .or_default()
            .entry(month.to_string())
            .or_default()
            .entry(format!("{:02}", date.day()))
            .or_default()
            .push(article.clone());
    }

    Ok(index)
}

/// The archive sidebar: newest articles first, then grouped.
pub fn build_archive(articles: &[Article]) -> Result<YearMap, ArchiveError> {
    build_year_article_index(&sort_newest_first(articles))
}

/// The `n` most recent articles. Articles with unreadable dates sort last.
pub fn build_latest_article_list(articles: &[Article], n: usize) -> Vec<Article> {
    let mut sorted = sort_newest_first(articles);
    sorted.truncate(n);
    sorted
}

/// The articles right after the carousel ones.
pub fn build_recent_article_list(articles: &[Article]) -> Vec<Article> {
    sort_newest_first(articles)
        .into_iter()
        .skip(LATEST_ARTICLE_COUNT)
        .take(RECENT_ARTICLE_COUNT)
        .collect()
}

fn sort_newest_first(articles: &[Article]) -> Vec<Article> {
    let mut sorted = articles.to_vec();
    sorted.sort_by(|a, b| parse_date(&b.date).cmp(&parse_date(&a.date)));
    sorted
}

/// Up to three events dated on or after `reference`'s date, soonest first.
pub fn build_upcoming_event_list(events: &[Event], reference: DateTime<Utc>) -> Vec<Event> {
    let today = reference.date_naive();

    let mut upcoming: Vec<(NaiveDate, &Event)> = events
        .iter()
        .filter_map(|event| match parse_date(&event.date) {
            Some(date) => Some((date, event)),
            None => {
                tracing::warn!(date = %event.date, title = %event.title, "Skipping event with invalid date");
                None
            }
        })
        .filter(|(date, _)| *date >= today)
        .collect();

    upcoming.sort_by_key(|(date, _)| *date);

    upcoming
        .into_iter()
        .take(UPCOMING_EVENT_COUNT)
        .map(|(_, event)| event.clone())
        .collect()
}

/// Flat date-keyed map for the calendar page. Empty days are omitted.
pub fn build_event_calendar(days: &[DayEvents]) -> EventCalendar {
    let mut calendar = EventCalendar::new();
    for day in days.iter().filter(|d| !d.events.is_empty()) {
        calendar
            .entry(day.date.clone())
            .or_default()
            .extend(day.events.iter().cloned());
    }
    calendar
}

/// Every event in the calendar, oldest first.
pub fn flatten_calendar(calendar: &EventCalendar) -> Vec<Event> {
    calendar.values().flatten().cloned().collect()
}

/// Public holidays of `year`.
pub fn public_holidays(year: i32) -> Vec<NaiveDate> {
    PUBLIC_HOLIDAYS
        .iter()
        .filter_map(|&(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(title: &str, date: &str) -> Article {
        Article {
            id: Some(title.to_lowercase()),
            title: title.to_string(),
            content: String::new(),
            date: date.to_string(),
        }
    }

    fn event(title: &str, date: &str) -> Event {
        Event {
            title: title.to_string(),
            date: date.to_string(),
            description: None,
        }
    }

    fn titles<'a>(articles: impl IntoIterator<Item = &'a Article>) -> Vec<&'a str> {
        articles.into_iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_month_name_table() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_single_article_index() {
        let hi = Article {
            id: None,
            title: "Hi".to_string(),
            content: "X".to_string(),
            date: "2024-05-01".to_string(),
        };
        let index = build_year_article_index(std::slice::from_ref(&hi)).unwrap();

        assert_eq!(
            serde_json::to_value(&index).unwrap(),
            json!({"2024": {"May": {"01": [{"title": "Hi", "content": "X", "date": "2024-05-01"}]}}})
        );
    }

    #[test]
    fn test_index_preserves_order_within_day() {
        let articles = vec![
            article("A", "2024-03-02"),
            article("B", "2023-12-31"),
            article("C", "2024-03-02"),
        ];
        let index = build_year_article_index(&articles).unwrap();

        assert_eq!(titles(&index["2024"]["March"]["02"]), vec!["A", "C"]);
        assert_eq!(titles(&index["2023"]["December"]["31"]), vec!["B"]);
    }

    #[test]
    fn test_index_rejects_bad_dates() {
        let err = build_year_article_index(&[article("Bad", "2024-13-01")]).unwrap_err();
        assert_eq!(err, ArchiveError::InvalidDate("2024-13-01".to_string()));
        assert!(build_year_article_index(&[article("Worse", "yesterday")]).is_err());
    }

    #[test]
    fn test_archive_is_deterministic_and_newest_first() {
        let articles = vec![
            article("Old", "2022-01-15"),
            article("New", "2024-07-04"),
            article("Mid", "2023-05-20"),
        ];

        let first = build_archive(&articles).unwrap();
        let second = build_archive(&articles).unwrap();

        assert_eq!(first, second);
        let years: Vec<_> = first.keys().map(String::as_str).collect();
        assert_eq!(years, vec!["2024", "2023", "2022"]);
    }

    #[test]
    fn test_latest_articles_descending() {
        let articles = vec![
            article("A", "2024-01-01"),
            article("B", "2024-03-01"),
            article("C", "2024-02-01"),
        ];
        assert_eq!(titles(&build_latest_article_list(&articles, 3)), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_latest_articles_fewer_than_n() {
        let articles = vec![article("Only", "2024-01-01")];
        assert_eq!(build_latest_article_list(&articles, 3).len(), 1);
        assert!(build_latest_article_list(&[], 3).is_empty());
    }

    #[test]
    fn test_latest_articles_invalid_dates_last() {
        let articles = vec![article("Broken", "soon"), article("Fine", "2020-01-01")];
        assert_eq!(titles(&build_latest_article_list(&articles, 2)), vec!["Fine", "Broken"]);
    }

    #[test]
    fn test_recent_articles_follow_carousel() {
        let articles: Vec<_> = (1..=9)
            .map(|d| article(&format!("D{}", d), &format!("2024-01-0{}", d)))
            .collect();
        assert_eq!(
            titles(&build_recent_article_list(&articles)),
            vec!["D6", "D5", "D4", "D3"]
        );
    }

    #[test]
    fn test_upcoming_excludes_past() {
        let events = vec![event("Past", "2024-01-01"), event("Future", "2099-01-01")];
        let reference = noon(2025, 1, 1);

        let upcoming = build_upcoming_event_list(&events, reference);

        assert_eq!(upcoming, vec![event("Future", "2099-01-01")]);
    }

    #[test]
    fn test_upcoming_includes_today_sorted_and_truncated() {
        let events = vec![
            event("Later", "2025-03-01"),
            event("Today", "2025-01-01"),
            event("Tie A", "2025-02-01"),
            event("Tie B", "2025-02-01"),
            event("Broken", "someday"),
        ];
        let reference = noon(2025, 1, 1);

        let upcoming: Vec<_> = build_upcoming_event_list(&events, reference)
            .into_iter()
            .map(|e| e.title)
            .collect();

        assert_eq!(upcoming, vec!["Today", "Tie A", "Tie B"]);
    }

    #[test]
    fn test_event_calendar_skips_empty_days() {
        let mut busy = DayEvents::new("2024-06-10");
        busy.events.push(event("Fair", "2024-06-10"));
        let quiet = DayEvents::new("2024-06-11");

        let calendar = build_event_calendar(&[quiet, busy]);

        assert_eq!(calendar.len(), 1);
        assert_eq!(calendar["2024-06-10"][0].title, "Fair");
        assert_eq!(flatten_calendar(&calendar).len(), 1);
    }

    #[test]
    fn test_public_holidays() {
        let holidays = public_holidays(2024);
        assert_eq!(holidays.len(), 10);
        assert!(holidays.contains(&NaiveDate::from_ymd_opt(2024, 4, 25).unwrap()));
        assert!(!holidays.contains(&NaiveDate::from_ymd_opt(2024, 4, 26).unwrap()));
    }

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }
}
