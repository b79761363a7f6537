//! ClinicalTrials.gov v2 API client.

use std::{collections::BTreeSet, path::PathBuf, time::Duration};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use urlencoding::encode;

use super::{http::CachedHttp, FetchError};
use crate::calendar::{RegistryRecord, Subject};

const STUDIES_URL: &str = "https://clinicaltrials.gov/api/v2/studies";
const VERSION_URL: &str = "https://clinicaltrials.gov/api/v2/version";
const PAGE_SIZE: usize = 100;
const VERSION_MAX_AGE: Duration = Duration::from_secs(12 * 3600);

pub struct CtGovClient {
    http: CachedHttp,
    cache_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    studies: Vec<Value>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(default, rename = "dataTimestamp")]
    data_timestamp: Option<String>,
}

/// Query string for one search page.
pub fn search_url(
    sponsor: &str,
    window_start: NaiveDate,
    window_end: NaiveDate,
    page_token: Option<&str>,
) -> String {
    let filter = format!("AREA[PrimaryCompletionDate]RANGE[{window_start},{window_end}]");
    let mut url = format!(
        "{STUDIES_URL}?query.spons={sponsor}&filter.advanced={filter}&pageSize={PAGE_SIZE}&countTotal=true",
        sponsor = encode(sponsor),
        filter = encode(&filter),
    );
    if let Some(token) = page_token {
        url.push_str("&pageToken=");
        url.push_str(&encode(token));
    }
    url
}

/// Cache file for one search page; the window is part of the key.
pub fn search_cache_name(
    ticker: &str,
    window_start: NaiveDate,
    window_end: NaiveDate,
    page: usize,
) -> String {
    format!("search_{ticker}_{window_start}_{window_end}_{page}.json")
}

impl CtGovClient {
    pub fn new(http: CachedHttp, cache_dir: PathBuf) -> Self {
        Self { http, cache_dir }
    }

    /// Registry ids sponsored by `subject` with a primary completion inside the window,
    /// sorted and de-duplicated across pages.
    pub async fn search(
        &self,
        subject: &Subject,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<String>, FetchError> {
        let mut ids = BTreeSet::new();
        let mut page_token: Option<String> = None;
        let mut page = 0usize;

        loop {
            let url = search_url(&subject.name, window_start, window_end, page_token.as_deref());
            let cache_path = self.cache_dir.join(search_cache_name(
                &subject.ticker,
                window_start,
                window_end,
                page,
            ));
            let body = self.http.get(&url, Some(&cache_path)).await?;
            let payload: SearchPage = serde_json::from_slice(&body)
                .map_err(|e| FetchError::Decode(format!("search page for {}: {e}", subject.ticker)))?;

            for study in payload.studies {
                let record = RegistryRecord::new(study);
                if let Some(nct) = record.nct_id() {
                    ids.insert(nct.to_string());
                }
            }

            match payload.next_page_token {
                Some(token) if !token.is_empty() => {
                    page_token = Some(token);
                    page += 1;
                }
                _ => break,
            }
        }

        debug!(ticker = %subject.ticker, count = ids.len(), "registry search complete");
        Ok(ids.into_iter().collect())
    }

    pub async fn fetch_study(&self, nct_id: &str) -> Result<RegistryRecord, FetchError> {
        let url = format!("{STUDIES_URL}/{}", encode(nct_id));
        let cache_path = self.cache_dir.join(format!("{nct_id}.json"));
        let body = self.http.get(&url, Some(&cache_path)).await?;
        let payload: Value = serde_json::from_slice(&body)
            .map_err(|e| FetchError::Decode(format!("study {nct_id}: {e}")))?;
        Ok(RegistryRecord::new(payload))
    }

    /// Upstream data refresh timestamp; `None` on any failure.
    pub async fn data_timestamp(&self) -> Option<String> {
        let cache_path = self.cache_dir.join("ctgov_version.json");
        let body = match self
            .http
            .get_with_age(VERSION_URL, Some(&cache_path), VERSION_MAX_AGE)
            .await
        {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "registry version lookup failed");
                return None;
            }
        };
        serde_json::from_slice::<VersionInfo>(&body)
            .ok()
            .and_then(|v| v.data_timestamp)
    }
}
