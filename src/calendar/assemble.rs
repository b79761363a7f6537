//! Subject × record iteration, windowing and final ordering.

use anyhow::Result;
use chrono::{Months, NaiveDate};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::{
    builder, dates, EventType, Overrides, PriceObservation, RegistryRecord, Subject, TrialEvent,
};

/// Data the assembler pulls per subject. Implemented over the network by
/// [`crate::data::RegistrySource`] and in memory by tests.
#[allow(async_fn_in_trait)]
pub trait TrialSource {
    async fn fetch_price(&self, subject: &Subject) -> Result<PriceObservation>;

    async fn search_registry(
        &self,
        subject: &Subject,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<String>>;

    async fn fetch_record(&self, nct_id: &str) -> Result<RegistryRecord>;
}

/// Forward readout window plus trailing results-posted window, anchored on `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub today: NaiveDate,
    pub end: NaiveDate,
    pub recent_days: i64,
}

impl Window {
    pub fn new(today: NaiveDate, months: u32, recent_days: i64) -> Self {
        let end = today
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX);
        Self {
            today,
            end,
            recent_days,
        }
    }

    pub fn contains_readout(&self, date: NaiveDate) -> bool {
        self.today <= date && date <= self.end
    }

    pub fn is_recent(&self, date: NaiveDate) -> bool {
        let days_ago = (self.today - date).num_days();
        (0..=self.recent_days).contains(&days_ago)
    }

    /// Zero, one or two classifications for a record; the checks are independent.
    pub fn classify(&self, record: &RegistryRecord) -> Vec<(EventType, NaiveDate)> {
        let mut out = Vec::with_capacity(2);
        if let Some(date) = dates::resolve(record.primary_completion_date()) {
            if self.contains_readout(date) {
                out.push((EventType::ReadoutProxy, date));
            }
        }
        if let Some(date) = dates::resolve(record.results_first_posted_date()) {
            if self.is_recent(date) {
                out.push((EventType::ResultsPosted, date));
            }
        }
        out
    }
}

/// Order by date, then company name, then registry id.
pub fn sort_events(events: &mut [TrialEvent]) {
    events.sort_by(|a, b| {
        (a.date, &a.company, &a.nct_id).cmp(&(b.date, &b.company, &b.nct_id))
    });
}

/// Events for a single subject. Search and record failures are logged and skipped.
pub async fn subject_events<S: TrialSource>(
    source: &S,
    subject: &Subject,
    overrides: &Overrides,
    window: &Window,
) -> Vec<TrialEvent> {
    let price = match source.fetch_price(subject).await {
        Ok(price) => price,
        Err(err) => {
            warn!(ticker = %subject.ticker, error = %err, "price lookup failed");
            PriceObservation::default()
        }
    };

    let nct_ids = match source
        .search_registry(subject, window.today, window.end)
        .await
    {
        Ok(ids) => ids,
        Err(err) => {
            warn!(ticker = %subject.ticker, error = %err, "registry search failed; skipping subject");
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    for nct_id in nct_ids {
        let record = match source.fetch_record(&nct_id).await {
            Ok(record) => record.with_searched_id(&nct_id),
            Err(err) => {
                warn!(%nct_id, error = %err, "registry fetch failed; skipping record");
                continue;
            }
        };
        let correction = record.nct_id().and_then(|id| overrides.get(id));
        for (event_type, date) in window.classify(&record) {
            events.push(builder::build(
                subject,
                &record,
                &price,
                correction,
                event_type,
                date,
            ));
        }
    }
    events
}

/// Run every subject through the source and return the globally sorted collection.
///
/// With `concurrency > 1` subjects overlap, but partial collections are
/// concatenated in subject order before the single sort pass.
pub async fn assemble<S: TrialSource>(
    source: &S,
    subjects: &[Subject],
    overrides: &Overrides,
    window: &Window,
    concurrency: usize,
) -> Vec<TrialEvent> {
    let total = subjects.len();
    let partials: Vec<Vec<TrialEvent>> = stream::iter(subjects.iter().enumerate())
        .map(|(idx, subject)| async move {
            info!("[{}/{}] {} {}", idx + 1, total, subject.ticker, subject.name);
            subject_events(source, subject, overrides, window).await
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut events: Vec<TrialEvent> = partials.into_iter().flatten().collect();
    sort_events(&mut events);
    events
}
