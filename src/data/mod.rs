//! External collaborators: holdings, registry, quotes and manual overrides.

pub mod ctgov;
pub mod holdings;
pub mod http;
pub mod overrides;
pub mod quotes;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    calendar::{assemble::TrialSource, PriceObservation, RegistryRecord, Subject},
    config::Settings,
};

/// Failures raised while fetching or decoding upstream data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("cache io error at {path:?}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unexpected holdings layout: {0}")]
    Layout(String),
}

/// Network-backed [`TrialSource`]: ClinicalTrials.gov plus stooq quotes.
pub struct RegistrySource {
    pub ctgov: ctgov::CtGovClient,
    pub quotes: quotes::QuoteClient,
}

impl RegistrySource {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = http::CachedHttp::new(settings)?;
        Ok(Self {
            ctgov: ctgov::CtGovClient::new(http.clone(), settings.ctgov_cache_dir()),
            quotes: quotes::QuoteClient::new(http, settings.price_cache_dir()),
        })
    }
}

impl TrialSource for RegistrySource {
    async fn fetch_price(&self, subject: &Subject) -> Result<PriceObservation> {
        Ok(self.quotes.fetch_price(&subject.ticker).await?)
    }

    async fn search_registry(
        &self,
        subject: &Subject,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<String>> {
        Ok(self.ctgov.search(subject, window_start, window_end).await?)
    }

    async fn fetch_record(&self, nct_id: &str) -> Result<RegistryRecord> {
        Ok(self.ctgov.fetch_study(nct_id).await?)
    }
}
