//! Event normalisation and scheduling core.

pub mod assemble;
pub mod builder;
pub mod dates;
pub mod ics;
pub mod record;
pub mod snapshot;

use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use record::RegistryRecord;

/// A tradable holding whose sponsored trials are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub ticker: String,
}

impl Subject {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
        }
    }
}

/// Latest close observed for a subject during the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: Option<f64>,
    pub as_of: Option<String>,
}

/// Classification of a calendar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Expected primary completion, standing in for a readout.
    ReadoutProxy,
    /// Results recently published to the registry.
    ResultsPosted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadoutProxy => "readout_proxy",
            Self::ResultsPosted => "results_posted",
        }
    }

    /// Human label used in summary lines, e.g. `Readout Proxy`.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ReadoutProxy => "Readout Proxy",
            Self::ResultsPosted => "Results Posted",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manual endpoint replacements. Each list replaces the derived list wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointOverride {
    #[serde(default)]
    pub primary: Option<Vec<String>>,
    #[serde(default)]
    pub secondary: Option<Vec<String>>,
}

/// Partial manual correction for one registry id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Override {
    #[serde(default)]
    pub drug: Option<String>,
    #[serde(default)]
    pub moa: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
    #[serde(default)]
    pub patient_population: Option<String>,
    #[serde(default)]
    pub endpoints: Option<EndpointOverride>,
    #[serde(default)]
    pub endpoint_notes: Option<String>,
}

/// Overrides keyed by registry id, in file order.
pub type Overrides = IndexMap<String, Override>;

/// Canonical calendar entry. Built once by [`builder::build`] and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialEvent {
    pub uid: String,
    pub date: NaiveDate,
    pub summary: String,
    pub description: String,
    pub url: String,
    pub company: String,
    pub ticker: String,
    pub stock_price: Option<f64>,
    pub stock_price_date: Option<String>,
    pub nct_id: String,
    pub event_type: EventType,
}
