//! Runtime configuration utilities for readout-calendar.

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

const DEFAULT_HOLDINGS_URL: &str = "https://www.ssga.com/us/en/intermediary/etfs/library-content/products/fund-data/etfs/us/holdings-daily-us-en-xbi.xlsx";

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Spreadsheet listing the tracked holdings.
    pub holdings_url: String,
    /// User agent sent with every upstream request.
    pub user_agent: String,
    /// Forward readout window in months.
    pub window_months: u32,
    /// Trailing window for recently posted results, in days.
    pub recent_results_days: i64,
    /// Cached responses younger than this are reused.
    pub cache_max_age_hours: u64,
    /// Snapshot, overrides and HTTP cache root.
    pub data_dir: PathBuf,
    /// Destination of the generated `.ics` file.
    pub calendar_dir: PathBuf,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let holdings_url =
            env::var("HOLDINGS_URL").unwrap_or_else(|_| DEFAULT_HOLDINGS_URL.to_string());
        let user_agent = env::var("USER_AGENT")
            .unwrap_or_else(|_| "biotech-readout-calendar/1.0 (+local script)".to_string());
        let window_months = env_parse("WINDOW_MONTHS", 12);
        let recent_results_days = env_parse("RECENT_RESULTS_DAYS", 30);
        let cache_max_age_hours = env_parse("CACHE_MAX_AGE_HOURS", 24);
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let calendar_dir = env::var("CALENDAR_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./calendar"));

        Ok(Self {
            holdings_url,
            user_agent,
            window_months,
            recent_results_days,
            cache_max_age_hours,
            data_dir,
            calendar_dir,
        })
    }

    /// Create every directory the pipeline writes into.
    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        for dir in [
            self.data_dir.clone(),
            self.cache_dir(),
            self.ctgov_cache_dir(),
            self.price_cache_dir(),
            self.calendar_dir.clone(),
        ] {
            std::fs::create_dir_all(&dir).with_context(|| format!("creating {dir:?}"))?;
        }
        Ok(())
    }

    /// Convenience helper for derived path segments.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.join_data("cache")
    }

    pub fn ctgov_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("ctgov")
    }

    pub fn price_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("prices")
    }

    pub fn calendar_path(&self) -> PathBuf {
        self.calendar_dir.join("biotech-readouts.ics")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.join_data("events.json")
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.join_data("overrides.yaml")
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_hours * 3600)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
