//! Shared DTOs for JSON responses.

use serde::{Deserialize, Serialize};

use crate::calendar::{EventType, TrialEvent};

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub ticker: Option<String>,
    pub event_type: Option<EventType>,
}

impl EventQuery {
    pub fn matches(&self, event: &TrialEvent) -> bool {
        let ticker_ok = self
            .ticker
            .as_deref()
            .map(|t| event.ticker.eq_ignore_ascii_case(t))
            .unwrap_or(true);
        let type_ok = self.event_type.map(|t| event.event_type == t).unwrap_or(true);
        ticker_ok && type_ok
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDto {
    pub uid: String,
    pub date: String,
    pub event_type: EventType,
    pub company: String,
    pub ticker: String,
    pub nct_id: String,
    pub summary: String,
    pub url: String,
}

impl From<TrialEvent> for EventDto {
    fn from(value: TrialEvent) -> Self {
        EventDto {
            uid: value.uid,
            date: value.date.to_string(),
            event_type: value.event_type,
            company: value.company,
            ticker: value.ticker,
            nct_id: value.nct_id,
            summary: value.summary,
            url: value.url,
        }
    }
}
