//! Per-field confidence scoring from provenance.
//!
//! A score is a pure function of the record's provenance and a few
//! field-specific rules. Fields without provenance get no key at all:
//! unknown is not the same as low confidence.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::html::fragment_text;
use crate::name::MaidenMarker;
use crate::provenance::{ProvenanceSpan, SignalClass};
use crate::types::{DateFragment, DatePrecision, IndividualRecord};

/// Field key → score in `[0, 1]`, ordered by key.
pub type ConfidenceScores = BTreeMap<String, f64>;

const DAY_DATE: f64 = 0.95;
const MONTH_DATE: f64 = 0.75;
const YEAR_OR_APPROX_DATE: f64 = 0.6;
const YEARLESS_DATE: f64 = 0.3;
const EXPLICIT_MAIDEN: f64 = 0.95;
const BRACKET_MAIDEN: f64 = 0.5;
const LABELLED_PARENT: f64 = 0.9;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NEE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bn[ée]e\b").expect("valid regex"));

/// Score every field that has provenance.
///
/// - signal tiers: heading 0.9, table-label 0.8, narrative 0.6, inferred 0.4
/// - `birth.date`/`death.date`: by precision and certainty of the parsed date
/// - `maidenName`: 0.95 with an explicit née marker or a labelled row, 0.5
///   for a bracketed guess
/// - `parents.*` from a labelled table: 0.9
/// - `birth`/`death`: mean of their date and place scores
///
/// Covering `name.*` spans are not scored; deeper paths fold into their
/// field (`birth.place.country` → `birth.place`). The maximum over a
/// field's spans wins.
///
/// # Examples
/// ```
/// use lignage_extractor::confidence::score_confidence;
/// use lignage_extractor::types::IndividualRecord;
///
/// assert!(score_confidence(&IndividualRecord::default()).is_empty());
/// ```
#[must_use]
pub fn score_confidence(record: &IndividualRecord) -> ConfidenceScores {
    let mut scores = ConfidenceScores::new();

    for span in record.provenance.iter() {
        let Some(key) = score_key(&span.field) else {
            continue;
        };
        let score = span_score(record, &key, span);
        scores
            .entry(key)
            .and_modify(|best| *best = best.max(score))
            .or_insert(score);
    }

    for event in ["birth", "death"] {
        let parts: Vec<f64> = [format!("{event}.date"), format!("{event}.place")]
            .iter()
            .filter_map(|key| scores.get(key).copied())
            .collect();
        if !parts.is_empty() {
            let mean = parts.iter().sum::<f64>() / parts.len() as f64;
            scores.insert(event.to_string(), mean);
        }
    }

    scores
}

/// Score key of a provenance field path, `None` for covering name spans.
fn score_key(field: &str) -> Option<String> {
    if field.starts_with("name.") {
        return None;
    }
    let mut segments = field.splitn(3, '.');
    match (segments.next(), segments.next()) {
        (Some(head), Some(sub)) => Some(format!("{head}.{sub}")),
        (Some(head), None) => Some(head.to_string()),
        _ => None,
    }
}

fn span_score(record: &IndividualRecord, key: &str, span: &ProvenanceSpan) -> f64 {
    match key {
        "birth.date" => date_score(&record.birth),
        "death.date" => date_score(&record.death),
        "maidenName" => maiden_score(record.maiden_marker, span),
        "parents.father" | "parents.mother" if span.signal == SignalClass::TableLabel => LABELLED_PARENT,
        _ => span.signal.tier(),
    }
}

fn date_score(date: &DateFragment) -> f64 {
    if date.year.is_none() {
        return YEARLESS_DATE;
    }
    if date.approx {
        return YEAR_OR_APPROX_DATE;
    }
    match date.precision() {
        DatePrecision::Day => DAY_DATE,
        DatePrecision::Month => MONTH_DATE,
        _ => YEAR_OR_APPROX_DATE,
    }
}

fn maiden_score(marker: Option<MaidenMarker>, span: &ProvenanceSpan) -> f64 {
    match marker {
        Some(MaidenMarker::Explicit) => return EXPLICIT_MAIDEN,
        Some(MaidenMarker::Bracket) => return BRACKET_MAIDEN,
        None => {}
    }
    // Span text is raw source: `n&eacute;e` must read as `née`.
    let text = fragment_text(&span.text);
    if NEE_MARKER.is_match(&text) {
        EXPLICIT_MAIDEN
    } else if text.trim_start().starts_with('[') {
        BRACKET_MAIDEN
    } else if span.signal == SignalClass::TableLabel {
        EXPLICIT_MAIDEN
    } else {
        span.signal.tier()
    }
}
