//! Manual corrections loaded from `overrides.yaml`.

use std::path::Path;

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::{info, warn};

use crate::calendar::{Override, Overrides};

/// Parse an overrides document. An empty document yields an empty map.
///
/// Only a document that is not a mapping fails as a whole; an entry whose
/// fields do not fit is logged and dropped on its own.
pub fn parse_overrides(text: &str) -> Result<Overrides, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(Overrides::new());
    }
    let raw = serde_yaml::from_str::<Option<IndexMap<String, Value>>>(text)?.unwrap_or_default();
    let mut overrides = Overrides::with_capacity(raw.len());
    for (nct_id, entry) in raw {
        if entry.is_null() {
            overrides.insert(nct_id, Override::default());
            continue;
        }
        match serde_yaml::from_value::<Override>(entry) {
            Ok(correction) => {
                overrides.insert(nct_id, correction);
            }
            Err(err) => warn!(%nct_id, error = %err, "skipping malformed override entry"),
        }
    }
    Ok(overrides)
}

/// Load overrides from disk. Missing or malformed files yield an empty map.
pub fn load_overrides(path: &Path) -> Overrides {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => {
            info!(path = %path.display(), "no overrides file");
            return Overrides::new();
        }
    };
    match parse_overrides(&text) {
        Ok(overrides) => {
            info!(count = overrides.len(), "loaded overrides");
            overrides
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring malformed overrides file");
            Overrides::new()
        }
    }
}
