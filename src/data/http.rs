//! HTTP GET with an optional on-disk response cache.

use std::{
    path::Path,
    time::{Duration, SystemTime},
};

use reqwest::Client;
use tracing::debug;

use super::FetchError;
use crate::config::Settings;

/// Shared client plus the freshness horizon for cached bodies.
#[derive(Debug, Clone)]
pub struct CachedHttp {
    client: Client,
    max_age: Duration,
}

impl CachedHttp {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self {
            client,
            max_age: settings.cache_max_age(),
        })
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Fetch `url`, serving from `cache_path` when it is younger than the default max age.
    pub async fn get(&self, url: &str, cache_path: Option<&Path>) -> Result<Vec<u8>, FetchError> {
        self.get_with_age(url, cache_path, self.max_age).await
    }

    pub async fn get_with_age(
        &self,
        url: &str,
        cache_path: Option<&Path>,
        max_age: Duration,
    ) -> Result<Vec<u8>, FetchError> {
        if let Some(path) = cache_path {
            if is_fresh(path, max_age) {
                debug!(path = %path.display(), "cache hit");
                return tokio::fs::read(path).await.map_err(|source| FetchError::Cache {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }
        let bytes = resp.bytes().await.map_err(network)?.to_vec();

        if let Some(path) = cache_path {
            write_cache(path, &bytes).await?;
        }
        Ok(bytes)
    }
}

/// True when `path` exists and was modified less than `max_age` ago.
pub fn is_fresh(path: &Path, max_age: Duration) -> bool {
    if max_age.is_zero() {
        return false;
    }
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map(|age| age < max_age)
        .unwrap_or(false)
}

pub async fn write_cache(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let cache_err = |source| FetchError::Cache {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(cache_err)?;
    }
    tokio::fs::write(path, bytes).await.map_err(cache_err)
}
