//! Resolution of partial registry dates to a concrete "not before" day.
//!
//! Coarse periods resolve to their last day, so `2026 Q1` becomes 2026-03-31.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static FULL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid date regex"));
static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("valid year-month regex"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})$").expect("valid year regex"));
static YEAR_QUARTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{4})\s*Q([1-4])$").expect("valid quarter regex"));
static MONTH_NAME_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{3})\s+(\d{4})$").expect("valid month-name regex"));

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Resolve a free-form registry date. Unrecognised or blank input yields `None`.
pub fn resolve(raw: Option<&str>) -> Option<NaiveDate> {
    let value = raw?.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(caps) = FULL_DATE.captures(value) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }
    if let Some(caps) = YEAR_MONTH.captures(value) {
        return last_day_of_month(caps[1].parse().ok()?, caps[2].parse().ok()?);
    }
    if let Some(caps) = YEAR.captures(value) {
        return NaiveDate::from_ymd_opt(caps[1].parse().ok()?, 12, 31);
    }
    if let Some(caps) = YEAR_QUARTER.captures(value) {
        let quarter: u32 = caps[2].parse().ok()?;
        return last_day_of_month(caps[1].parse().ok()?, quarter * 3);
    }
    if let Some(caps) = MONTH_NAME_YEAR.captures(value) {
        let abbrev = caps[1].to_ascii_lowercase();
        let month = MONTH_ABBREVIATIONS
            .iter()
            .position(|m| *m == abbrev)
            .map(|idx| idx as u32 + 1)?;
        return last_day_of_month(caps[2].parse().ok()?, month);
    }

    None
}

/// Last calendar day of `month`, computed as the first of the next month minus one day.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).map(|d| d - Duration::days(1))
}
