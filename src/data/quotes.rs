//! Latest close lookups from stooq's CSV quote endpoint.

use std::{collections::HashMap, path::PathBuf};

use tracing::debug;

use super::{
    http::{is_fresh, write_cache, CachedHttp},
    FetchError,
};
use crate::calendar::PriceObservation;

const QUOTE_URL: &str = "https://stooq.com/q/l/";

pub struct QuoteClient {
    http: CachedHttp,
    cache_dir: PathBuf,
}

/// Extract the first usable close and its date from a stooq CSV body.
pub fn parse_quote(text: &str) -> PriceObservation {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.trim().as_bytes());
    for row in reader.deserialize::<HashMap<String, String>>().flatten() {
        let field = |upper: &str, lower: &str| {
            row.get(upper)
                .or_else(|| row.get(lower))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let Some(close) = field("Close", "close").filter(|c| c != "N/A") else {
            continue;
        };
        return PriceObservation {
            price: close.parse().ok(),
            as_of: field("Date", "date"),
        };
    }
    PriceObservation::default()
}

impl QuoteClient {
    pub fn new(http: CachedHttp, cache_dir: PathBuf) -> Self {
        Self { http, cache_dir }
    }

    /// Latest close for a US ticker. Empty observations are cached too.
    pub async fn fetch_price(&self, ticker: &str) -> Result<PriceObservation, FetchError> {
        let cache_path = self.cache_dir.join(format!("{ticker}.json"));
        if is_fresh(&cache_path, self.http.max_age()) {
            if let Ok(body) = tokio::fs::read(&cache_path).await {
                if let Ok(cached) = serde_json::from_slice::<PriceObservation>(&body) {
                    debug!(%ticker, "price cache hit");
                    return Ok(cached);
                }
            }
        }

        let url = format!(
            "{QUOTE_URL}?s={}.us&f=sd2t2ohlcvn&h&e=csv",
            ticker.to_lowercase()
        );
        let raw = self.http.get(&url, None).await?;
        let observation = parse_quote(&String::from_utf8_lossy(&raw));

        let body = serde_json::to_vec(&observation)
            .map_err(|e| FetchError::Decode(format!("price cache for {ticker}: {e}")))?;
        write_cache(&cache_path, &body).await?;
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_close_and_date() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume,Name\n\
                    ACME.US,2026-10-16,22:00:09,10.1,10.9,9.8,10.52,12345,ACME\n";
        let quote = parse_quote(body);
        assert_eq!(quote.price, Some(10.52));
        assert_eq!(quote.as_of.as_deref(), Some("2026-10-16"));
    }

    #[test]
    fn missing_close_yields_empty_observation() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume,Name\n\
                    NOPE.US,N/A,N/A,N/A,N/A,N/A,N/A,N/A,NOPE\n";
        assert_eq!(parse_quote(body), PriceObservation::default());
    }
}
