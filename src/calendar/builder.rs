//! Conversion of one registry record into a canonical [`TrialEvent`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{
    record::field_str, EventType, Override, PriceObservation, RegistryRecord, Subject, TrialEvent,
};

pub const NOT_SPECIFIED: &str = "Not specified";
pub const MOA_NOT_SPECIFIED: &str = "Not specified in registry";
const STUDY_URL_BASE: &str = "https://clinicaltrials.gov/study";
const EXCERPT_WIDTH: usize = 500;
const EXCERPT_PLACEHOLDER: &str = "...";
const DRUG_INTERVENTION_TYPES: &[&str] = &["drug", "biological", "genetic", "cell"];

static BACKTICKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"`+").expect("valid regex"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static ITALIC_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));
static ITALIC_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([^_]+)_").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Mechanism-of-action classes, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    CarT,
    GeneTherapy,
    Mrna,
    MonoclonalAntibody,
    Sirna,
    SmallMolecule,
}

/// Precedence of the keyword classifier; first match wins.
pub const MECHANISM_RULES: &[Mechanism] = &[
    Mechanism::CarT,
    Mechanism::GeneTherapy,
    Mechanism::Mrna,
    Mechanism::MonoclonalAntibody,
    Mechanism::Sirna,
    Mechanism::SmallMolecule,
];

impl Mechanism {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CarT => "CAR-T cell therapy",
            Self::GeneTherapy => "Gene therapy",
            Self::Mrna => "mRNA-based therapeutic",
            Self::MonoclonalAntibody => "Monoclonal antibody",
            Self::Sirna => "siRNA therapeutic",
            Self::SmallMolecule => "Small-molecule therapeutic",
        }
    }

    /// `text` must already be lowercase.
    fn matches(&self, text: &str, drug_names: &[String]) -> bool {
        match self {
            Self::CarT => text.contains("car-t") || text.contains("car t"),
            Self::GeneTherapy => text.contains("gene therapy"),
            Self::Mrna => text.contains("mrna"),
            Self::MonoclonalAntibody => {
                text.contains("monoclonal")
                    || drug_names
                        .iter()
                        .any(|name| name.to_lowercase().ends_with("mab"))
            }
            Self::Sirna => text.contains("sirna"),
            Self::SmallMolecule => text.contains("small molecule"),
        }
    }
}

/// Classify drug names plus free-text summary, case-insensitively.
pub fn infer_mechanism(drug_names: &[String], summary: &str) -> Option<Mechanism> {
    let text = format!("{} {}", drug_names.join(" "), summary).to_lowercase();
    MECHANISM_RULES
        .iter()
        .copied()
        .find(|rule| rule.matches(&text, drug_names))
}

/// Remove markdown emphasis/code markers and collapse whitespace.
pub fn strip_markdown(text: &str) -> String {
    let text = BACKTICKS.replace_all(text, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Shorten whitespace-normalised text to `width` characters on a word boundary,
/// appending `...` when anything was cut.
pub fn shorten(text: &str, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let joined = words.join(" ");
    if joined.chars().count() <= width {
        return joined;
    }

    let budget = width.saturating_sub(EXCERPT_PLACEHOLDER.len());
    let mut kept = String::new();
    for word in words {
        let extra = if kept.is_empty() { 0 } else { 1 };
        if kept.chars().count() + extra + word.chars().count() > budget {
            break;
        }
        if extra == 1 {
            kept.push(' ');
        }
        kept.push_str(word);
    }
    if kept.is_empty() {
        // first word alone overflows
        kept = joined.chars().take(budget).collect();
    }
    kept.push_str(EXCERPT_PLACEHOLDER);
    kept
}

fn outcome_lines(outcomes: &[Value]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|item| {
            let bits: Vec<&str> = ["measure", "timeFrame", "description"]
                .iter()
                .filter_map(|key| field_str(item, key))
                .collect();
            (!bits.is_empty()).then(|| bits.join(" — "))
        })
        .collect()
}

fn drug_names(record: &RegistryRecord) -> Vec<String> {
    let interventions = record.array_at(&["protocolSection", "armsInterventionsModule", "interventions"]);
    let interventions = if interventions.is_empty() {
        record.array_at(&["protocolSection", "designModule", "interventions"])
    } else {
        interventions
    };

    let typed: Vec<String> = interventions
        .iter()
        .filter(|item| {
            field_str(item, "type")
                .map(|t| DRUG_INTERVENTION_TYPES.contains(&t.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .filter_map(|item| field_str(item, "name"))
        .map(str::to_string)
        .collect();
    if !typed.is_empty() {
        return typed;
    }
    interventions
        .iter()
        .filter_map(|item| field_str(item, "name"))
        .map(str::to_string)
        .collect()
}

fn population(record: &RegistryRecord) -> String {
    let at = |key: &str| -> String {
        record
            .str_at(&["protocolSection", "eligibilityModule", key])
            .unwrap_or(NOT_SPECIFIED)
            .to_string()
    };
    let mut bits = vec![
        format!("Sex: {}", at("sex")),
        format!("Age: {} to {}", at("minimumAge"), at("maximumAge")),
    ];
    match record.lookup(&["protocolSection", "eligibilityModule", "healthyVolunteers"]) {
        Some(Value::Bool(flag)) => {
            let flag = if *flag { "True" } else { "False" };
            bits.push(format!("Healthy Volunteers: {flag}"))
        }
        Some(Value::String(text)) => bits.push(format!("Healthy Volunteers: {text}")),
        _ => {}
    }
    bits.join("; ")
}

/// Overridable fields, derived from the record first and then patched field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub drug: String,
    pub moa: String,
    pub indication: String,
    pub population: String,
    pub primary_endpoints: Vec<String>,
    pub secondary_endpoints: Vec<String>,
    pub endpoint_notes: Option<String>,
}

impl EventFields {
    /// Registry-native values with documented defaults.
    pub fn derive(record: &RegistryRecord, summary_text: &str) -> Self {
        let drugs = drug_names(record);
        let drug = if drugs.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            drugs.join(", ")
        };
        let moa = infer_mechanism(&drugs, summary_text)
            .map(|m| m.label())
            .unwrap_or(MOA_NOT_SPECIFIED)
            .to_string();
        let conditions = record.strings_at(&["protocolSection", "conditionsModule", "conditions"]);
        let indication = if conditions.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            conditions.join("; ")
        };
        Self {
            drug,
            moa,
            indication,
            population: population(record),
            primary_endpoints: outcome_lines(record.array_at(&[
                "protocolSection",
                "outcomesModule",
                "primaryOutcomes",
            ])),
            secondary_endpoints: outcome_lines(record.array_at(&[
                "protocolSection",
                "outcomesModule",
                "secondaryOutcomes",
            ])),
            endpoint_notes: None,
        }
    }

    pub fn with_drug(mut self, drug: Option<&str>) -> Self {
        if let Some(drug) = drug {
            self.drug = drug.to_string();
        }
        self
    }

    pub fn with_moa(mut self, moa: Option<&str>) -> Self {
        if let Some(moa) = moa {
            self.moa = moa.to_string();
        }
        self
    }

    pub fn with_indication(mut self, indication: Option<&str>) -> Self {
        if let Some(indication) = indication.filter(|s| !s.is_empty()) {
            self.indication = indication.to_string();
        }
        self
    }

    pub fn with_population(mut self, population: Option<&str>) -> Self {
        if let Some(population) = population.filter(|s| !s.is_empty()) {
            self.population = population.to_string();
        }
        self
    }

    pub fn with_primary_endpoints(mut self, lines: Option<&[String]>) -> Self {
        if let Some(lines) = lines {
            self.primary_endpoints = lines.to_vec();
        }
        self
    }

    pub fn with_secondary_endpoints(mut self, lines: Option<&[String]>) -> Self {
        if let Some(lines) = lines {
            self.secondary_endpoints = lines.to_vec();
        }
        self
    }

    pub fn with_endpoint_notes(mut self, notes: Option<&str>) -> Self {
        self.endpoint_notes = notes.filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    /// Apply every field the override supplies; absent fields keep derived values.
    pub fn apply(self, overrides: Option<&Override>) -> Self {
        let Some(o) = overrides else {
            return self;
        };
        let endpoints = o.endpoints.as_ref();
        self.with_drug(o.drug.as_deref())
            .with_moa(o.moa.as_deref())
            .with_indication(o.indication.as_deref())
            .with_population(o.patient_population.as_deref())
            .with_primary_endpoints(endpoints.and_then(|e| e.primary.as_deref()))
            .with_secondary_endpoints(endpoints.and_then(|e| e.secondary.as_deref()))
            .with_endpoint_notes(o.endpoint_notes.as_deref())
    }
}

/// `$12.34 (as of 2026-01-02)`, `$12.34`, or `Not available`.
pub fn price_line(observation: &PriceObservation) -> String {
    match (observation.price, observation.as_of.as_deref()) {
        (Some(price), Some(date)) if !date.is_empty() => format!("${price:.2} (as of {date})"),
        (Some(price), _) => format!("${price:.2}"),
        (None, _) => "Not available".to_string(),
    }
}

pub fn study_url(nct_id: &str) -> String {
    format!("{STUDY_URL_BASE}/{nct_id}")
}

/// Build the canonical event. Deterministic for identical inputs.
pub fn build(
    subject: &Subject,
    record: &RegistryRecord,
    price: &PriceObservation,
    overrides: Option<&Override>,
    event_type: EventType,
    event_date: NaiveDate,
) -> TrialEvent {
    let nct_id = record.nct_id().unwrap_or_default().to_string();
    let brief_title = record.brief_title().unwrap_or("Clinical study");
    let url = study_url(&nct_id);

    let summary_text = record
        .str_at(&["protocolSection", "descriptionModule", "briefSummary"])
        .map(strip_markdown)
        .unwrap_or_default();
    let criteria = record
        .str_at(&["protocolSection", "eligibilityModule", "eligibilityCriteria"])
        .map(strip_markdown)
        .filter(|s| !s.is_empty())
        .map(|s| shorten(&s, EXCERPT_WIDTH));

    let phases = record.strings_at(&["protocolSection", "designModule", "phases"]);
    let phase = if phases.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        phases.join(", ")
    };

    let fields = EventFields::derive(record, &summary_text).apply(overrides);

    let title_drug = if fields.drug == NOT_SPECIFIED {
        brief_title
    } else {
        fields.drug.as_str()
    };
    let summary = format!(
        "{} ({}) — {} — {}",
        subject.name,
        subject.ticker,
        title_drug,
        event_type.title()
    );

    let mut lines = vec![
        format!("Company: {}", subject.name),
        format!("Ticker: {}", subject.ticker),
        format!("Stock Price: {}", price_line(price)),
        format!("Drug: {}", fields.drug),
        format!("MOA: {}", fields.moa),
        format!("Phase: {phase}"),
        format!("Indication: {}", fields.indication),
        format!("Patient Population: {}", fields.population),
    ];
    if !fields.primary_endpoints.is_empty() {
        lines.push("Primary Endpoints:".to_string());
        lines.extend(fields.primary_endpoints.iter().map(|l| format!("- {l}")));
    }
    if !fields.secondary_endpoints.is_empty() {
        lines.push("Secondary Endpoints:".to_string());
        lines.extend(fields.secondary_endpoints.iter().map(|l| format!("- {l}")));
    }
    if let Some(criteria) = &criteria {
        lines.push(format!("Eligibility Criteria (excerpt): {criteria}"));
    }
    if let Some(notes) = &fields.endpoint_notes {
        lines.push(format!("Endpoint Notes: {notes}"));
    }
    if !summary_text.is_empty() {
        lines.push(format!("Summary: {summary_text}"));
    }
    lines.push(format!("ClinicalTrials.gov: {url}"));

    TrialEvent {
        uid: format!("{nct_id}-{}-{event_date}", event_type.as_str()),
        date: event_date,
        summary,
        description: lines.join("\n"),
        url,
        company: subject.name.clone(),
        ticker: subject.ticker.clone(),
        stock_price: price.price,
        stock_price_date: price.as_of.clone(),
        nct_id,
        event_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mechanism_precedence_prefers_cart_over_antibody() {
        let drugs = vec!["tisagenlecleucel".to_string(), "rituximab".to_string()];
        assert_eq!(
            infer_mechanism(&drugs, "An autologous CAR-T product"),
            Some(Mechanism::CarT)
        );
        assert_eq!(infer_mechanism(&drugs, ""), Some(Mechanism::MonoclonalAntibody));
    }

    #[test]
    fn mechanism_keywords_are_case_insensitive() {
        assert_eq!(infer_mechanism(&[], "an SIRNA agent"), Some(Mechanism::Sirna));
        assert_eq!(infer_mechanism(&[], "MRNA vaccine"), Some(Mechanism::Mrna));
        assert_eq!(infer_mechanism(&[], "placebo"), None);
    }

    #[test]
    fn healthy_volunteer_flag_is_capitalised() {
        let record = RegistryRecord::new(serde_json::json!({
            "protocolSection": { "eligibilityModule": { "sex": "ALL", "healthyVolunteers": true } }
        }));
        assert_eq!(
            population(&record),
            "Sex: ALL; Age: Not specified to Not specified; Healthy Volunteers: True"
        );
    }

    #[test]
    fn strip_markdown_removes_emphasis_and_code() {
        assert_eq!(
            strip_markdown("**Inclusion**:\n\n* `adults` with _confirmed_   disease"),
            "Inclusion: * adults with confirmed disease"
        );
    }

    #[test]
    fn shorten_cuts_on_word_boundary() {
        let text = "alpha beta gamma delta";
        assert_eq!(shorten(text, 100), text);
        assert_eq!(shorten(text, 14), "alpha beta...");
        assert!(shorten(&"x".repeat(600), 500).chars().count() <= 500);
    }

    #[test]
    fn price_line_variants() {
        let both = PriceObservation {
            price: Some(12.3),
            as_of: Some("2026-01-02".into()),
        };
        let price_only = PriceObservation {
            price: Some(3.0),
            as_of: None,
        };
        assert_eq!(price_line(&both), "$12.30 (as of 2026-01-02)");
        assert_eq!(price_line(&price_only), "$3.00");
        assert_eq!(price_line(&PriceObservation::default()), "Not available");
    }
}
