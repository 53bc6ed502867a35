//! Provenance model: which span of the source produced which field.
//!
//! Spans live in an append-only arena with a per-field index. Nothing in a
//! record points back into the source text; spans are correlated with
//! `source_html` purely by byte offsets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural category of the evidence behind a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalClass {
    /// Text of an `<h1>`..`<h6>` element.
    Heading,
    /// Value cell next to a recognised label (table row, `dt`/`dd`, `Label:`).
    TableLabel,
    /// Prose matched by a keyword-anchored pattern.
    Narrative,
    /// Weakest evidence, e.g. a name taken from the document `<title>`.
    Inferred,
}

impl SignalClass {
    /// Default confidence tier for this class.
    #[must_use]
    pub fn tier(self) -> f64 {
        match self {
            Self::Heading => 0.9,
            Self::TableLabel => 0.8,
            Self::Narrative => 0.6,
            Self::Inferred => 0.4,
        }
    }

    /// Wire name, as used in serialized provenance.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::TableLabel => "table-label",
            Self::Narrative => "narrative",
            Self::Inferred => "inferred",
        }
    }
}

impl fmt::Display for SignalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted field mapped onto the source.
///
/// Invariant: `source_html[start..end] == text` (byte offsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceSpan {
    /// Dotted record path, e.g. `"parents.father"` or `"birth.date"`.
    pub field: String,
    /// Exact source substring.
    pub text: String,
    /// Start byte offset into the source HTML.
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Evidence class used for scoring.
    pub signal: SignalClass,
}

/// Append-only list of spans with O(1) lookup by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ProvenanceSpan>", into = "Vec<ProvenanceSpan>")]
pub struct Provenance {
    spans: Vec<ProvenanceSpan>,
    by_field: BTreeMap<String, Vec<usize>>,
}

impl Provenance {
    /// Create an empty provenance list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span. Only extraction code appends; records never remove.
    pub(crate) fn push(&mut self, span: ProvenanceSpan) {
        self.by_field
            .entry(span.field.clone())
            .or_default()
            .push(self.spans.len());
        self.spans.push(span);
    }

    /// All spans in extraction order.
    #[must_use]
    pub fn spans(&self) -> &[ProvenanceSpan] {
        &self.spans
    }

    /// Iterate over all spans in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = &ProvenanceSpan> {
        self.spans.iter()
    }

    /// All spans recorded for one field path.
    pub fn for_field<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a ProvenanceSpan> + 'a {
        self.by_field
            .get(field)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.spans[idx])
    }

    /// Field paths that have at least one span, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.by_field.keys().map(String::as_str)
    }

    /// Number of spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether no span was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl From<Vec<ProvenanceSpan>> for Provenance {
    fn from(spans: Vec<ProvenanceSpan>) -> Self {
        let mut provenance = Self::new();
        for span in spans {
            provenance.push(span);
        }
        provenance
    }
}

impl From<Provenance> for Vec<ProvenanceSpan> {
    fn from(provenance: Provenance) -> Self {
        provenance.spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(field: &str, start: usize) -> ProvenanceSpan {
        ProvenanceSpan {
            field: field.to_string(),
            text: "x".to_string(),
            start,
            end: start + 1,
            signal: SignalClass::TableLabel,
        }
    }

    #[test]
    fn test_provenance_index_by_field() {
        let mut provenance = Provenance::new();
        provenance.push(span("children", 0));
        provenance.push(span("surname", 4));
        provenance.push(span("children", 8));

        let children: Vec<_> = provenance.for_field("children").map(|s| s.start).collect();
        assert_eq!(children, vec![0, 8]);
        assert_eq!(provenance.for_field("missing").count(), 0);
        assert_eq!(provenance.len(), 3);
    }

    #[test]
    fn test_provenance_serializes_as_list() {
        let mut provenance = Provenance::new();
        provenance.push(span("surname", 2));

        let json = serde_json::to_value(&provenance).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["signal"], "table-label");

        let back: Provenance = serde_json::from_value(json).unwrap();
        assert_eq!(back, provenance);
        assert_eq!(back.for_field("surname").count(), 1);
    }

    #[test]
    fn test_signal_tiers_are_ordered() {
        assert!(SignalClass::Heading.tier() > SignalClass::TableLabel.tier());
        assert!(SignalClass::TableLabel.tier() > SignalClass::Narrative.tier());
        assert!(SignalClass::Narrative.tier() > SignalClass::Inferred.tier());
    }
}
