//! Lignage extractor - structured genealogical records from pasted HTML.
//!
//! This crate turns an HTML page or fragment describing one person into an
//! [`IndividualRecord`], recording for every extracted value the exact
//! substring of the input it came from, and scores each field's confidence
//! from that provenance.
//!
//! # Example
//!
//! ```
//! use lignage_extractor::{extract_and_score, ExtractOptions};
//!
//! let html = "<table><tr><th>Name</th><td>Jean Dupont</td></tr>\
//!             <tr><th>Born</th><td>17 Mar 1901</td></tr></table>";
//! let extraction = extract_and_score(html, &ExtractOptions::default());
//! assert_eq!(extraction.record.surname.as_deref(), Some("Dupont"));
//! assert_eq!(extraction.record.birth.year, Some(1901));
//! assert_eq!(extraction.confidence.get("birth.date"), Some(&0.95));
//! ```
//!
//! # Architecture
//!
//! - [`normalize`]: Token and label normalization
//! - [`date`]: Lenient free-text date parsing
//! - [`name`]: Personal name and relationship list parsing
//! - [`canon`]: Place and profession dictionaries
//! - [`html`]: Parsed documents and offset mapping into the source
//! - [`provenance`]: Source spans and signal classes
//! - [`strategy`]: Tabular, narrative and linked-tree extraction strategies
//! - [`extract`]: Strategy dispatch
//! - [`confidence`]: Per-field confidence scoring
//! - [`fields`]: Field descriptor table for generic get/set
//! - [`highlight`]: Provenance highlighting of the source HTML
//! - [`gedcom`]: GEDCOM 5.5.1 export
//! - [`boundary`]: Payload validation for callers receiving raw bytes
//! - [`http`]: Page fetching
//! - [`config`]: Configuration constants
//! - [`error`]: Error types and Result alias
//! - [`types`]: Core data types
//! - [`cli`]: Command-line interface

pub mod boundary;
pub mod canon;
pub mod cli;
pub mod confidence;
pub mod config;
pub mod date;
pub mod error;
pub mod extract;
pub mod fields;
pub mod gedcom;
pub mod highlight;
pub mod html;
pub mod http;
pub mod name;
pub mod normalize;
pub mod provenance;
pub mod strategy;
pub mod types;

// Re-export main functions
pub use extract::{extract_and_score, extract_individual, ExtractOptions, Extraction};

// Re-export commonly used items
pub use boundary::validate_html_payload;
pub use canon::{parse_place, parse_profession};
pub use confidence::{score_confidence, ConfidenceScores};
pub use date::parse_date_fragment;
pub use error::{ExtractorError, Result};
pub use gedcom::generate_gedcom;
pub use highlight::highlight_html;
pub use name::parse_name;
pub use provenance::{Provenance, ProvenanceSpan, SignalClass};
pub use types::{DateFragment, IndividualRecord, LinkedPerson, Relation, Residence, Sex, StrategyKind};
