#![allow(dead_code)]

use chrono::NaiveDate;
use readout_calendar::calendar::{PriceObservation, RegistryRecord, Subject};
use serde_json::{json, Value};

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn subject() -> Subject {
    Subject::new("Acme Therapeutics", "ACME")
}

pub fn price() -> PriceObservation {
    PriceObservation {
        price: Some(42.5),
        as_of: Some("2026-10-16".into()),
    }
}

/// A study payload shaped like ClinicalTrials.gov v2.
pub fn study_payload(nct_id: &str, primary: Option<&str>, results: Option<&str>) -> Value {
    let mut status = json!({});
    if let Some(date) = primary {
        status["primaryCompletionDateStruct"] = json!({ "date": date, "type": "ESTIMATED" });
    }
    if let Some(date) = results {
        status["resultsFirstPostDateStruct"] = json!({ "date": date });
    }
    json!({
        "protocolSection": {
            "identificationModule": {
                "nctId": nct_id,
                "briefTitle": "A Study of ACM-101 in Adults With Condition X"
            },
            "statusModule": status,
            "descriptionModule": {
                "briefSummary": "A **randomized** study of a small molecule inhibitor."
            },
            "conditionsModule": { "conditions": ["Condition X", "Condition Y"] },
            "designModule": { "phases": ["PHASE2", "PHASE3"] },
            "armsInterventionsModule": {
                "interventions": [
                    { "type": "DRUG", "name": "ACM-101" },
                    { "type": "OTHER", "name": "Placebo" }
                ]
            },
            "outcomesModule": {
                "primaryOutcomes": [
                    { "measure": "Change in score", "timeFrame": "Week 12" },
                    { "measure": "", "timeFrame": "", "description": "" }
                ],
                "secondaryOutcomes": [
                    { "measure": "Responder rate", "timeFrame": "Week 24", "description": "Percent of responders" }
                ]
            },
            "eligibilityModule": {
                "sex": "ALL",
                "minimumAge": "18 Years",
                "maximumAge": "75 Years",
                "healthyVolunteers": false,
                "eligibilityCriteria": "Inclusion Criteria:\n\n* Adults with `confirmed` Condition X"
            }
        }
    })
}

pub fn record(nct_id: &str, primary: Option<&str>, results: Option<&str>) -> RegistryRecord {
    RegistryRecord::new(study_payload(nct_id, primary, results))
}
