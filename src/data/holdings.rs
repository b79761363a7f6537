//! Holdings spreadsheet download and column sniffing.

use std::{io::Cursor, path::Path};

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use indexmap::IndexMap;
use tracing::info;

use super::{http::CachedHttp, FetchError};
use crate::calendar::Subject;

const HEADER_SCAN_ROWS: usize = 30;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Locate the header row and extract `(name, ticker)` pairs from the rows below it.
///
/// Tickers are trimmed and upper-cased; blank or `N/A` rows are skipped and the
/// first occurrence of a duplicated ticker wins.
pub fn subjects_from_rows(rows: &[Vec<String>]) -> Result<Vec<Subject>, FetchError> {
    let (header_idx, header) = rows
        .iter()
        .take(HEADER_SCAN_ROWS)
        .enumerate()
        .find_map(|(idx, row)| {
            let lower: Vec<String> = row.iter().map(|c| c.trim().to_lowercase()).collect();
            let has_ticker = lower.iter().any(|c| c == "ticker");
            let has_name = lower
                .iter()
                .any(|c| matches!(c.as_str(), "name" | "security name" | "description"));
            (has_ticker && has_name).then_some((idx, lower))
        })
        .ok_or_else(|| FetchError::Layout("could not find header row".into()))?;

    let column = |candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|cand| header.iter().position(|c| c == *cand))
    };
    let ticker_idx = column(&["ticker", "symbol"])
        .ok_or_else(|| FetchError::Layout("missing ticker column".into()))?;
    let name_idx = column(&["name", "security name", "description"])
        .ok_or_else(|| FetchError::Layout("missing name column".into()))?;

    let mut subjects: IndexMap<String, Subject> = IndexMap::new();
    for row in &rows[header_idx + 1..] {
        let (Some(ticker), Some(name)) = (row.get(ticker_idx), row.get(name_idx)) else {
            continue;
        };
        let ticker = ticker.trim().to_uppercase();
        let name = name.trim();
        if ticker.is_empty() || name.is_empty() || ticker == "N/A" {
            continue;
        }
        subjects
            .entry(ticker.clone())
            .or_insert_with(|| Subject::new(name, ticker));
    }
    Ok(subjects.into_values().collect())
}

/// Parse the first worksheet of an xlsx workbook.
pub fn parse_xlsx(bytes: &[u8]) -> Result<Vec<Subject>, FetchError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| FetchError::Decode(format!("holdings workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FetchError::Layout("workbook has no sheets".into()))?
        .map_err(|e| FetchError::Decode(format!("holdings sheet: {e}")))?;
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    subjects_from_rows(&rows)
}

/// Download (or read from cache) and parse the holdings list.
pub async fn fetch_holdings(
    http: &CachedHttp,
    url: &str,
    cache_path: &Path,
) -> Result<Vec<Subject>, FetchError> {
    let bytes = http.get(url, Some(cache_path)).await?;
    let subjects = parse_xlsx(&bytes)?;
    info!(count = subjects.len(), "loaded holdings");
    Ok(subjects)
}

/// Parse a holdings workbook already on disk.
pub fn load_holdings_file(path: &Path) -> Result<Vec<Subject>, FetchError> {
    let bytes = std::fs::read(path).map_err(|source| FetchError::Cache {
        path: path.to_path_buf(),
        source,
    })?;
    let subjects = parse_xlsx(&bytes)?;
    info!(count = subjects.len(), path = %path.display(), "loaded holdings file");
    Ok(subjects)
}
