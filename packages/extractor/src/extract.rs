//! Extraction entry point that ties the strategies, the record builder and
//! the confidence scorer together.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canon::{PlaceDefinition, ProfessionDefinition};
use crate::confidence::{score_confidence, ConfidenceScores};
use crate::html::Document;
use crate::provenance::SignalClass;
use crate::strategy::{RecordBuilder, StrategyRegistry};
use crate::types::{IndividualRecord, StrategyKind};

static STRATEGIES: LazyLock<StrategyRegistry> = LazyLock::new(StrategyRegistry::default);

/// Caller-supplied extraction settings.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Place dictionary replacing the built-in one.
    pub places: Option<Vec<PlaceDefinition>>,
    /// Profession dictionary replacing the built-in one.
    pub professions: Option<Vec<ProfessionDefinition>>,
    /// Source URL; wins over any URL detected in the page.
    pub source_url: Option<String>,
    /// Fixed extraction timestamp, `Utc::now()` when absent.
    pub extracted_at: Option<DateTime<Utc>>,
}

/// A record together with its per-field confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub record: IndividualRecord,
    pub confidence: ConfidenceScores,
}

/// Extract one individual from an HTML document or fragment.
///
/// The first strategy whose precondition holds owns the page. When none
/// does, the result is an empty record attributed to the tabular strategy
/// with no provenance. Never fails.
///
/// # Arguments
/// * `html` - The raw HTML, kept verbatim as `source_html`
/// * `options` - Dictionaries, source URL and timestamp overrides
///
/// # Examples
/// ```
/// use lignage_extractor::extract::{extract_individual, ExtractOptions};
///
/// let html = "<table><tr><th>Name</th><td>Jean Dupont</td></tr></table>";
/// let record = extract_individual(html, &ExtractOptions::default());
/// assert_eq!(record.surname.as_deref(), Some("Dupont"));
/// ```
pub fn extract_individual(html: &str, options: &ExtractOptions) -> IndividualRecord {
    let doc = Document::parse(html);
    let mut builder = RecordBuilder::new(
        doc.source(),
        options.places.as_deref(),
        options.professions.as_deref(),
    );
    builder.seek(doc.source().body_start());
    if let Some(url) = &options.source_url {
        builder.source_url(url, SignalClass::TableLabel);
    }

    let strategy = match STRATEGIES.select(&doc) {
        Some(strategy) => {
            tracing::debug!(strategy = %strategy.kind(), "Strategy selected");
            strategy.extract(&doc, &mut builder);
            strategy.kind()
        }
        None => {
            tracing::debug!("No strategy precondition satisfied, returning empty record");
            StrategyKind::Tabular
        }
    };

    let mut record = builder.finish(strategy);
    record.extracted_at = options.extracted_at.unwrap_or_else(Utc::now);
    record
}

/// Extract and score in one call.
pub fn extract_and_score(html: &str, options: &ExtractOptions) -> Extraction {
    let record = extract_individual(html, options);
    let confidence = score_confidence(&record);
    Extraction { record, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixed() -> ExtractOptions {
        ExtractOptions {
            extracted_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single(),
            ..ExtractOptions::default()
        }
    }

    #[test]
    fn test_no_strategy_gives_empty_tabular_record() {
        let html = "<p>Nothing to see.</p>";
        let record = extract_individual(html, &fixed());
        assert_eq!(record.strategy, Some(StrategyKind::Tabular));
        assert!(record.provenance.is_empty());
        assert!(record.given_names.is_empty());
        assert_eq!(record.source_html, html);
    }

    #[test]
    fn test_deterministic() {
        let html = "<h1>Jean Dupont (1850–1920)</h1><p>He was born in Lyon, the son of Louis Dupont and Anne Martin.</p>";
        assert_eq!(extract_individual(html, &fixed()), extract_individual(html, &fixed()));
    }

    #[test]
    fn test_caller_source_url_wins() {
        let html = r#"<link rel="canonical" href="https://detected.example/p"><h1>Jean Dupont</h1>
<h2>Parents</h2><ul><li><a href="/1">Louis Dupont</a></li></ul>
<h2>Children</h2><ul><li><a href="/2">Pierre Dupont</a></li></ul>"#;
        let detected = extract_individual(html, &fixed());
        assert_eq!(detected.source_url.as_deref(), Some("https://detected.example/p"));

        let options = ExtractOptions {
            source_url: Some("https://given.example/q".to_string()),
            ..fixed()
        };
        let record = extract_individual(html, &options);
        assert_eq!(record.source_url.as_deref(), Some("https://given.example/q"));
        assert_eq!(record.provenance.for_field("sourceUrl").count(), 0);
    }

    #[test]
    fn test_custom_dictionaries_replace_builtins() {
        let html = "<table><tr><td>Occupation</td><td>boulanger</td></tr>\
                    <tr><td>Birth</td><td>1850, Lyon</td></tr></table>";
        let options = ExtractOptions {
            professions: Some(vec![ProfessionDefinition::new("Bread maker", &["boulanger"])]),
            places: Some(Vec::new()),
            ..fixed()
        };
        let record = extract_individual(html, &options);
        assert_eq!(record.occupation.as_deref(), Some("Bread maker"));
        assert_eq!(record.provenance.for_field("birth.place.city").count(), 0);
    }

    #[test]
    fn test_extract_and_score() {
        let html = "<table><tr><td>Father</td><td>Louis Dupont</td></tr></table>";
        let extraction = extract_and_score(html, &fixed());
        assert_eq!(extraction.record.parents.father.as_deref(), Some("Louis Dupont"));
        assert_eq!(extraction.confidence.get("parents.father"), Some(&0.9));
    }
}
