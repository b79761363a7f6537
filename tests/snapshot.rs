mod common;

use chrono::{TimeZone, Utc};
use common::{price, record, subject, ymd};
use readout_calendar::calendar::{builder::build, snapshot::Snapshot, EventType};
use serde_json::Value;

fn sample() -> Snapshot {
    let event = build(
        &subject(),
        &record("NCT01234567", Some("2027-03"), None),
        &price(),
        None,
        EventType::ReadoutProxy,
        ymd(2027, 3, 31),
    );
    Snapshot {
        generated_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap(),
        ctgov_data_timestamp: None,
        window_start: ymd(2026, 10, 19),
        window_end: ymd(2027, 10, 19),
        events: vec![event],
    }
}

#[test]
fn snapshot_json_uses_iso_dates_and_snake_case_types() {
    let value = serde_json::to_value(sample()).unwrap();
    assert_eq!(value["window_start"], "2026-10-19");
    assert_eq!(value["window_end"], "2027-10-19");
    assert_eq!(value["ctgov_data_timestamp"], Value::Null);

    let event = &value["events"][0];
    assert_eq!(event["date"], "2027-03-31");
    assert_eq!(event["event_type"], "readout_proxy");
    assert_eq!(event["stock_price"], 42.5);
    assert_eq!(event["stock_price_date"], "2026-10-16");
    let mut keys: Vec<&str> = event.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "company",
            "date",
            "description",
            "event_type",
            "nct_id",
            "stock_price",
            "stock_price_date",
            "summary",
            "ticker",
            "uid",
            "url",
        ]
    );
}

#[test]
fn written_snapshot_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/events.json");
    let snapshot = sample();
    snapshot.write(&path).unwrap();
    assert_eq!(Snapshot::read(&path).unwrap(), snapshot);
}
