//! Core data types: the extracted individual and its parts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::name::MaidenMarker;
use crate::provenance::Provenance;

/// Sex of an individual as stated in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "U")]
    Unknown,
}

impl Sex {
    /// Single-letter code, shared with GEDCOM.
    #[must_use]
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Unknown => "U",
        }
    }

    /// Interpret a free-text sex value (EN/FR/DE).
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        match crate::normalize::normalize_token(text).as_str() {
            "m" | "male" | "man" | "masculin" | "homme" | "h" | "mannlich" | "maennlich" => {
                Some(Self::Male)
            }
            "f" | "female" | "woman" | "feminin" | "femme" | "weiblich" | "w" => Some(Self::Female),
            "u" | "unknown" | "inconnu" | "unbekannt" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Optional year range attached to a date expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i32>,
}

/// How much of a date is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatePrecision {
    None,
    Year,
    Month,
    Day,
}

/// A partial calendar date as written in the source.
///
/// `raw` always holds the original text verbatim; the numeric components are
/// independently optional and are not range-checked here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub approx: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
}

impl DateFragment {
    /// Fragment holding only a year.
    #[must_use]
    pub fn from_year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    /// Whether nothing at all is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
            && self.year.is_none()
            && self.month.is_none()
            && self.day.is_none()
            && self.range.is_none()
    }

    /// Most precise component present, counted only from the year down.
    #[must_use]
    pub fn precision(&self) -> DatePrecision {
        match (self.year, self.month, self.day) {
            (Some(_), Some(_), Some(_)) => DatePrecision::Day,
            (Some(_), Some(_), None) => DatePrecision::Month,
            (Some(_), None, _) => DatePrecision::Year,
            (None, _, _) => DatePrecision::None,
        }
    }
}

/// A place of residence, optionally dated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

impl Residence {
    /// A residence is kept only when one of its parts carries text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.as_deref().map_or(true, |r| r.trim().is_empty())
            && self.year.is_none()
            && self.place.as_deref().map_or(true, |p| p.trim().is_empty())
    }
}

/// Free-text parent names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub father: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother: Option<String>,
}

impl Parents {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.father.is_none() && self.mother.is_none()
    }
}

/// Relationship of a linked person to the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Father,
    Mother,
    Parent,
    Spouse,
    Child,
    Sibling,
}

impl Relation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Father => "father",
            Self::Mother => "mother",
            Self::Parent => "parent",
            Self::Spouse => "spouse",
            Self::Child => "child",
            Self::Sibling => "sibling",
        }
    }
}

/// A relative enumerated on a linked-tree page, with its own vitals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPerson {
    pub relation: Relation,
    /// Display name as written (lifespan removed).
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "DateFragment::is_empty")]
    pub birth: DateFragment,
    #[serde(default, skip_serializing_if = "DateFragment::is_empty")]
    pub death: DateFragment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Which extraction strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Tabular,
    Narrative,
    LinkedTree,
}

impl StrategyKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tabular => "tabular",
            Self::Narrative => "narrative",
            Self::LinkedTree => "linked-tree",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured result of extracting one individual from HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualRecord {
    /// The exact input, kept for re-rendering highlights.
    pub source_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub extracted_at: DateTime<Utc>,
    #[serde(default)]
    pub given_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maiden_name: Option<String>,
    /// How the source marked the maiden name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maiden_marker: Option<MaidenMarker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub birth: DateFragment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(default)]
    pub death: DateFragment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_place: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub residences: Vec<Residence>,
    #[serde(default)]
    pub parents: Parents,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spouses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub siblings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relatives: Vec<LinkedPerson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
}

impl IndividualRecord {
    /// Name for display: given names and surname, or `None` when both are empty.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let mut parts: Vec<&str> = self.given_names.iter().map(String::as_str).collect();
        if let Some(surname) = self.surname.as_deref() {
            parts.push(surname);
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}
