//! Calendar event models.
//!
//! Events are stored as a list per calendar day so that several events can
//! share a date in either backend.

use serde::{Deserialize, Serialize};

use crate::db::{LocalLayout, Record, StoreError};

/// A single calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub title: String,
    /// Event date in `YYYY-MM-DD` form.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// All events of one calendar day, keyed by `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DayEventsRepr")]
pub struct DayEvents {
    pub date: String,
    pub events: Vec<Event>,
}

impl DayEvents {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            events: Vec::new(),
        }
    }
}

/// Stored shapes accepted on read: the current `{date, events}` document,
/// a bare list of events, or the single event older clients wrote.
#[derive(Deserialize)]
#[serde(untagged)]
enum DayEventsRepr {
    Day { date: String, events: Vec<Event> },
    List(Vec<Event>),
    Single(Event),
}

impl From<DayEventsRepr> for DayEvents {
    fn from(repr: DayEventsRepr) -> Self {
        match repr {
            DayEventsRepr::Day { date, events } => Self { date, events },
            DayEventsRepr::List(events) => Self {
                date: events.first().map(|e| e.date.clone()).unwrap_or_default(),
                events,
            },
            DayEventsRepr::Single(event) => Self {
                date: event.date.clone(),
                events: vec![event],
            },
        }
    }
}

impl Record for DayEvents {
    const KIND: &'static str = "events";
    const LOCAL_LAYOUT: LocalLayout = LocalLayout::Keyed { prefix: "event" };

    fn key(&self) -> Result<String, StoreError> {
        if self.date.is_empty() {
            return Err(StoreError::MissingIdentifier(Self::KIND));
        }
        Ok(self.date.clone())
    }

    fn attach_key(&mut self, key: &str) {
        self.date = key.to_string();
    }
}

/// Request body for adding or editing a calendar event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}
