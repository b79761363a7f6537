//! Read-only accessor over a ClinicalTrials.gov study payload.

use serde_json::Value;

/// One trial's registry payload, consumed through safe path lookups so schema
/// drift degrades to missing values instead of decode failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryRecord {
    payload: Value,
    searched_id: Option<String>,
}

impl RegistryRecord {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            searched_id: None,
        }
    }

    /// Remember the id the record was fetched under; used when the payload lacks one.
    pub fn with_searched_id(mut self, nct_id: &str) -> Self {
        self.searched_id = Some(nct_id.to_string()).filter(|id| !id.is_empty());
        self
    }

    /// Walk `path` through nested objects; `None` on any missing or non-object segment.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.payload, |cur, key| cur.as_object()?.get(*key))
    }

    /// Non-empty string at `path`.
    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Array at `path`, or an empty slice.
    pub fn array_at(&self, path: &[&str]) -> &[Value] {
        self.lookup(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Non-empty strings held by the array at `path`.
    pub fn strings_at(&self, path: &[&str]) -> Vec<String> {
        self.array_at(path)
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn nct_id(&self) -> Option<&str> {
        self.str_at(&["protocolSection", "identificationModule", "nctId"])
            .or_else(|| self.str_at(&["nctId"]))
            .or(self.searched_id.as_deref())
    }

    pub fn brief_title(&self) -> Option<&str> {
        self.str_at(&["protocolSection", "identificationModule", "briefTitle"])
    }

    /// Raw primary completion date, structured form first.
    pub fn primary_completion_date(&self) -> Option<&str> {
        self.status_date("primaryCompletionDateStruct", "primaryCompletionDate")
    }

    /// Raw results-first-posted date, structured form first.
    pub fn results_first_posted_date(&self) -> Option<&str> {
        self.status_date("resultsFirstPostDateStruct", "resultsFirstPostDate")
    }

    fn status_date(&self, structured: &str, flat: &str) -> Option<&str> {
        self.str_at(&["protocolSection", "statusModule", structured, "date"])
            .or_else(|| self.str_at(&["protocolSection", "statusModule", flat]))
    }
}

/// String field of a JSON object, treating empty strings as absent.
pub fn field_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
