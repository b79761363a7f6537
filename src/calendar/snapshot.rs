//! Machine-readable companion to the calendar file.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::TrialEvent;

/// Run metadata plus every emitted event, persisted as `events.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub ctgov_data_timestamp: Option<String>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub events: Vec<TrialEvent>,
}

impl Snapshot {
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body).with_context(|| format!("write {path:?}"))?;
        info!(path = %path.display(), events = self.events.len(), "wrote snapshot");
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
        serde_json::from_str(&body).with_context(|| format!("decode {path:?}"))
    }
}
