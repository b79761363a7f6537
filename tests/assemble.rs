mod common;

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use common::{record, study_payload, ymd};
use readout_calendar::calendar::{
    assemble::{assemble, sort_events, TrialSource, Window},
    EventType, Override, Overrides, PriceObservation, RegistryRecord, Subject,
};
use serde_json::Value;

fn window() -> Window {
    Window::new(ymd(2026, 10, 19), 12, 30)
}

#[test]
fn readout_window_is_inclusive_of_twelve_months() {
    let w = window();
    assert_eq!(w.end, ymd(2027, 10, 19));
    assert!(w.contains_readout(ymd(2026, 10, 19)));
    assert!(w.contains_readout(ymd(2027, 10, 19)));
    assert!(!w.contains_readout(ymd(2027, 10, 20)));
    assert!(!w.contains_readout(ymd(2026, 10, 18)));
}

#[test]
fn results_window_covers_thirty_days_back() {
    let w = window();
    assert!(w.is_recent(ymd(2026, 10, 19)));
    assert!(w.is_recent(ymd(2026, 9, 19)));
    assert!(!w.is_recent(ymd(2026, 9, 18)));
    assert!(!w.is_recent(ymd(2026, 10, 20)));
}

#[test]
fn classification_uses_resolved_partial_dates() {
    let w = window();
    assert_eq!(
        w.classify(&record("NCT1", Some("2027 Q3"), None)),
        vec![(EventType::ReadoutProxy, ymd(2027, 9, 30))]
    );
    // 2027-10 resolves to Oct 31, past the window end
    assert!(w.classify(&record("NCT1", Some("2027-10"), None)).is_empty());
    assert!(w.classify(&record("NCT1", None, Some("2026-11-01"))).is_empty());
    assert!(w.classify(&record("NCT1", Some("soon"), Some("n/a"))).is_empty());
}

#[test]
fn a_record_can_qualify_twice() {
    let classes = window().classify(&record("NCT1", Some("2027-03"), Some("2026-10-01")));
    assert_eq!(
        classes,
        vec![
            (EventType::ReadoutProxy, ymd(2027, 3, 31)),
            (EventType::ResultsPosted, ymd(2026, 10, 1)),
        ]
    );
}

#[derive(Default)]
struct FakeSource {
    searches: HashMap<String, Vec<String>>,
    records: HashMap<String, Value>,
}

impl FakeSource {
    fn with_study(mut self, ticker: &str, payload: Value) -> Self {
        let id = RegistryRecord::new(payload.clone())
            .nct_id()
            .unwrap()
            .to_string();
        self.searches.entry(ticker.to_string()).or_default().push(id.clone());
        self.records.insert(id, payload);
        self
    }

    fn with_unlabelled_study(mut self, ticker: &str, nct_id: &str, mut payload: Value) -> Self {
        if let Some(ident) = payload["protocolSection"]["identificationModule"].as_object_mut() {
            ident.remove("nctId");
        }
        self.searches
            .entry(ticker.to_string())
            .or_default()
            .push(nct_id.to_string());
        self.records.insert(nct_id.to_string(), payload);
        self
    }

    fn with_missing_study(mut self, ticker: &str, nct_id: &str) -> Self {
        self.searches
            .entry(ticker.to_string())
            .or_default()
            .push(nct_id.to_string());
        self
    }
}

impl TrialSource for FakeSource {
    async fn fetch_price(&self, subject: &Subject) -> Result<PriceObservation> {
        if subject.ticker == "NOPX" {
            return Err(anyhow!("quote service down"));
        }
        Ok(PriceObservation {
            price: Some(10.0),
            as_of: Some("2026-10-16".into()),
        })
    }

    async fn search_registry(
        &self,
        subject: &Subject,
        _window_start: NaiveDate,
        _window_end: NaiveDate,
    ) -> Result<Vec<String>> {
        self.searches
            .get(&subject.ticker)
            .cloned()
            .ok_or_else(|| anyhow!("search failed for {}", subject.ticker))
    }

    async fn fetch_record(&self, nct_id: &str) -> Result<RegistryRecord> {
        self.records
            .get(nct_id)
            .cloned()
            .map(RegistryRecord::new)
            .ok_or_else(|| anyhow!("no study {nct_id}"))
    }
}

#[tokio::test]
async fn dual_classification_yields_two_distinct_events() {
    let source =
        FakeSource::default().with_study("ACME", study_payload("NCT1", Some("2027-03"), Some("2026-10-01")));
    let subjects = vec![Subject::new("Acme Therapeutics", "ACME")];

    let events = assemble(&source, &subjects, &Overrides::new(), &window(), 1).await;

    assert_eq!(events.len(), 2);
    assert_ne!(events[0].uid, events[1].uid);
    assert_eq!(events[0].event_type, EventType::ResultsPosted);
    assert_eq!(events[1].event_type, EventType::ReadoutProxy);
}

#[tokio::test]
async fn failures_skip_only_the_affected_unit() {
    let source = FakeSource::default()
        .with_study("ACME", study_payload("NCT1", Some("2027-01"), None))
        .with_missing_study("ACME", "NCT404")
        .with_study("NOPX", study_payload("NCT2", Some("2027-02"), None));
    let subjects = vec![
        Subject::new("Acme Therapeutics", "ACME"),
        Subject::new("Lost Sponsor", "LOST"),
        Subject::new("No Price Inc", "NOPX"),
    ];

    let events = assemble(&source, &subjects, &Overrides::new(), &window(), 1).await;

    let ids: Vec<&str> = events.iter().map(|e| e.nct_id.as_str()).collect();
    assert_eq!(ids, vec!["NCT1", "NCT2"]);
    assert_eq!(events[1].stock_price, None);
    assert!(events[1].description.contains("Stock Price: Not available"));
}

#[tokio::test]
async fn same_day_events_sort_by_company_then_id() {
    let source = FakeSource::default()
        .with_study("ZETA", study_payload("NCT3", Some("2027-06-30"), None))
        .with_study("ALFA", study_payload("NCT5", Some("2027-06-30"), None))
        .with_study("ALFA", study_payload("NCT4", Some("2027-06-30"), None))
        .with_study("MIDS", study_payload("NCT6", Some("2027-06-30"), None))
        .with_study("MIDS", study_payload("NCT7", Some("2027-01-31"), None));
    let subjects = vec![
        Subject::new("Zeta Bio", "ZETA"),
        Subject::new("Alfa Pharma", "ALFA"),
        Subject::new("Mid Sciences", "MIDS"),
    ];

    for concurrency in [1, 3] {
        let events = assemble(&source, &subjects, &Overrides::new(), &window(), concurrency).await;
        let order: Vec<(&str, &str)> = events
            .iter()
            .map(|e| (e.company.as_str(), e.nct_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Mid Sciences", "NCT7"),
                ("Alfa Pharma", "NCT4"),
                ("Alfa Pharma", "NCT5"),
                ("Mid Sciences", "NCT6"),
                ("Zeta Bio", "NCT3"),
            ]
        );
    }
}

#[tokio::test]
async fn overrides_are_looked_up_by_registry_id() {
    let source =
        FakeSource::default().with_study("ACME", study_payload("NCT1", Some("2027-01"), None));
    let mut overrides = Overrides::new();
    overrides.insert(
        "NCT1".into(),
        Override {
            drug: Some("acmetinib".into()),
            ..Default::default()
        },
    );

    let events = assemble(
        &source,
        &[Subject::new("Acme Therapeutics", "ACME")],
        &overrides,
        &window(),
        1,
    )
    .await;

    assert_eq!(
        events[0].summary,
        "Acme Therapeutics (ACME) — acmetinib — Readout Proxy"
    );
}

#[tokio::test]
async fn records_without_an_id_take_the_searched_id() {
    let source = FakeSource::default()
        .with_unlabelled_study("ACME", "NCT00000011", study_payload("", Some("2027-01"), None))
        .with_unlabelled_study("ACME", "NCT00000022", study_payload("", Some("2027-01"), None));
    let mut overrides = Overrides::new();
    overrides.insert(
        "NCT00000022".into(),
        Override {
            drug: Some("acmetinib".into()),
            ..Default::default()
        },
    );

    let events = assemble(
        &source,
        &[Subject::new("Acme Therapeutics", "ACME")],
        &overrides,
        &window(),
        1,
    )
    .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].uid, "NCT00000011-readout_proxy-2027-01-31");
    assert_eq!(events[1].uid, "NCT00000022-readout_proxy-2027-01-31");
    assert!(events[0].url.ends_with("/NCT00000011"));
    assert!(events[1].url.ends_with("/NCT00000022"));
    assert!(events[1].summary.contains("acmetinib"));
}

#[test]
fn sort_is_by_date_first() {
    let build = |nct: &str, company: &str, date: NaiveDate| {
        readout_calendar::calendar::builder::build(
            &Subject::new(company, "TCKR"),
            &record(nct, None, None),
            &PriceObservation::default(),
            None,
            EventType::ReadoutProxy,
            date,
        )
    };
    let mut events = vec![
        build("NCT2", "Alpha", ymd(2027, 2, 1)),
        build("NCT1", "Zulu", ymd(2027, 1, 1)),
    ];
    sort_events(&mut events);
    assert_eq!(events[0].company, "Zulu");
}
