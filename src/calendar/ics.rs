//! iCalendar rendering with RFC 5545 escaping and line folding.

use chrono::{DateTime, Duration, Utc};

use super::TrialEvent;

pub const PRODID: &str = "-//biotech-readout-calendar//EN";
const FOLD_WIDTH: usize = 75;
const CRLF: &str = "\r\n";

/// Escape a TEXT value. Backslash goes first so later escapes are not doubled.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Fold a content line: 75 characters, then continuation chunks of a space plus 74.
pub fn fold_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= FOLD_WIDTH {
        return line.to_string();
    }
    let mut parts = vec![chars[..FOLD_WIDTH].iter().collect::<String>()];
    for chunk in chars[FOLD_WIDTH..].chunks(FOLD_WIDTH - 1) {
        let mut part = String::with_capacity(chunk.len() + 1);
        part.push(' ');
        part.extend(chunk);
        parts.push(part);
    }
    parts.join(CRLF)
}

fn event_lines(event: &TrialEvent, stamp: &str) -> Vec<String> {
    let start = event.date;
    let end = event.date + Duration::days(1);
    vec![
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", escape(&event.uid)),
        format!("DTSTAMP:{stamp}"),
        format!("DTSTART;VALUE=DATE:{}", start.format("%Y%m%d")),
        format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")),
        format!("SUMMARY:{}", escape(&event.summary)),
        format!("DESCRIPTION:{}", escape(&event.description)),
        format!("URL:{}", escape(&event.url)),
        "END:VEVENT".to_string(),
    ]
}

/// Render the full calendar document with CRLF line endings.
pub fn render(events: &[TrialEvent], generated_at: DateTime<Utc>) -> String {
    let stamp = generated_at.format("%Y%m%dT%H%M%SZ").to_string();
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
    ];
    for event in events {
        lines.extend(event_lines(event, &stamp));
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines
        .iter()
        .map(|line| fold_line(line))
        .collect::<Vec<_>>()
        .join(CRLF);
    out.push_str(CRLF);
    out
}
