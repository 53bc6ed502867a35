//! Personal name parsing.
//!
//! Splits a full-name string into given names, surname, maiden name and
//! aliases. Quoted nicknames and non-maiden parentheticals become aliases,
//! generational suffixes are dropped, and the remaining tokens split into
//! given names (all but the last) and surname (the last, with any
//! nobiliary particles in front of it).

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::{clean_text, normalize_token};

/// How a maiden name was marked in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaidenMarker {
    /// `née` / `nee` / `geb.` marker, with or without parentheses.
    Explicit,
    /// A bracketed guess such as `[Johnson]`.
    Bracket,
}

/// Components of a parsed name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameParts {
    pub given_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maiden_name: Option<String>,
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maiden_marker: Option<MaidenMarker>,
    /// Exact input substring holding the maiden name and its marker,
    /// e.g. `"(née Johnson)"` or `"[Johnson]"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maiden_segment: Option<String>,
}

impl NameParts {
    /// Whether no component was recognised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.given_names.is_empty() && self.surname.is_none() && self.maiden_name.is_none()
    }

    /// Given names and surname joined with spaces.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut parts = self.given_names.clone();
        parts.extend(self.surname.clone());
        parts.join(" ")
    }
}

/// Particles folded into the surname when they directly precede it.
const SURNAME_PARTICLES: &[&str] = &[
    "de", "du", "des", "d", "la", "le", "van", "von", "der", "den", "ter", "ten", "zu", "della",
    "delle", "di", "da", "dos", "das", "del", "y",
];

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PAREN_MAIDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\s*(?:née|nee|born|geb\.?|geborene)\s+([^)]+?)\s*\)").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BARE_MAIDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)((?:née|nee|geb\.|geborene)\s+([^()\[\]"“”«»,;]+))"#)
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*([^\]]*?)\s*\]").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    // A single quote opens after whitespace and closes before a non-word
    // character; an apostrophe inside a word is not a quote.
    Regex::new(
        r#""\s*([^"]+?)\s*"|“\s*([^”]+?)\s*”|«\s*([^»]+?)\s*»|(?:^|\s)'([^'\s][^']*?)'\B|(?:^|\s)‘\s*([^’]+?)\s*’\B"#,
    )
    .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*([^)]*?)\s*\)").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:jr|jnr|sr|snr|junior|senior|fils|père|pere|ii|iii|iv|\d+(?:st|nd|rd|th|e|er)?)\.?,?$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:[,;\n]|\s(?:and|et|und)\s|&)\s*").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d{1,2}[.)]\s+|[-•*–·]\s*)").expect("valid regex"));

/// Parse a full-name string.
///
/// Never fails: a string with no usable tokens yields empty `given_names`
/// and every other field absent.
///
/// # Examples
/// ```
/// use lignage_extractor::name::parse_name;
///
/// let name = parse_name("Elizabeth \"Liz\" Carter Jr.");
/// assert_eq!(name.given_names, vec!["Elizabeth"]);
/// assert_eq!(name.surname.as_deref(), Some("Carter"));
/// assert_eq!(name.aliases, vec!["Liz"]);
/// assert!(name.maiden_name.is_none());
/// ```
pub fn parse_name(text: &str) -> NameParts {
    let mut parts = NameParts::default();
    let mut removed: Vec<Range<usize>> = Vec::new();

    if let Some(caps) = PAREN_MAIDEN.captures(text) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
        parts.maiden_name = caps.get(1).map(|m| clean_text(m.as_str()));
        parts.maiden_marker = Some(MaidenMarker::Explicit);
        parts.maiden_segment = Some(text[whole.clone()].to_string());
        removed.push(whole);
    } else if let Some(caps) = BARE_MAIDEN.captures(text) {
        if let (Some(segment), Some(value)) = (caps.get(1), caps.get(2)) {
            let maiden = clean_text(value.as_str());
            if !maiden.is_empty() {
                let end = segment.start() + segment.as_str().trim_end().len();
                parts.maiden_segment = Some(text[segment.start()..end].to_string());
                parts.maiden_name = Some(maiden);
                parts.maiden_marker = Some(MaidenMarker::Explicit);
                removed.push(segment.start()..end);
            }
        }
    }

    for caps in BRACKETED.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&removed, &whole.range()) {
            continue;
        }
        let inner = caps.get(1).map(|m| clean_text(m.as_str())).unwrap_or_default();
        if !inner.is_empty() && parts.maiden_name.is_none() {
            parts.maiden_name = Some(inner);
            parts.maiden_marker = Some(MaidenMarker::Bracket);
            parts.maiden_segment = Some(whole.as_str().to_string());
        } else if !inner.is_empty() {
            push_alias(&mut parts.aliases, &inner);
        }
        removed.push(whole.range());
    }

    for caps in QUOTED.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&removed, &whole.range()) {
            continue;
        }
        if let Some(inner) = caps.iter().skip(1).flatten().next() {
            push_alias(&mut parts.aliases, &clean_text(inner.as_str()));
        }
        removed.push(whole.range());
    }

    for caps in PARENTHETICAL.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&removed, &whole.range()) {
            continue;
        }
        let inner = caps.get(1).map(|m| clean_text(m.as_str())).unwrap_or_default();
        // Lifespans and other digit-only notes are not aliases.
        if inner.chars().any(char::is_alphabetic) {
            push_alias(&mut parts.aliases, &inner);
        }
        removed.push(whole.range());
    }

    let remainder = blank_ranges(text, &removed);
    let (given_names, surname) = split_tokens(&remainder);
    parts.given_names = given_names;
    parts.surname = surname;
    parts
}

/// Split a free-text list of names (children, siblings, spouses).
///
/// Separators are `,` `;` newlines and the conjunctions `and`, `et`, `und`
/// and `&`. List numbering and bullets are stripped, empty entries dropped
/// and duplicates removed keeping the first occurrence.
///
/// # Examples
/// ```
/// use lignage_extractor::name::parse_relationship_list;
///
/// assert_eq!(
///     parse_relationship_list("Pierre, Marie et Jeanne"),
///     vec!["Pierre", "Marie", "Jeanne"]
/// );
/// ```
pub fn parse_relationship_list(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for entry in LIST_SEPARATOR.split(text) {
        let entry = LIST_MARKER.replace(entry, "");
        let entry = clean_text(entry.trim_matches(|c: char| c == '.' || c.is_whitespace()));
        if entry.is_empty() {
            continue;
        }
        if !names.iter().any(|n| n == &entry) {
            names.push(entry);
        }
    }
    names
}

fn split_tokens(text: &str) -> (Vec<String>, Option<String>) {
    let mut tokens: Vec<&str> = text
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| {
                matches!(c, ',' | ';' | ':' | '"' | '“' | '”' | '«' | '»' | '(' | ')' | '[' | ']')
            })
        })
        .filter(|t| !t.is_empty())
        .collect();

    while tokens.len() > 1 && tokens.last().is_some_and(|t| SUFFIX.is_match(t)) {
        tokens.pop();
    }

    match tokens.len() {
        0 => (Vec::new(), None),
        1 => (vec![tokens[0].to_string()], None),
        len => {
            let mut surname_start = len - 1;
            while surname_start > 1 && is_particle(tokens[surname_start - 1]) {
                surname_start -= 1;
            }
            let given = tokens[..surname_start]
                .iter()
                .map(|t| (*t).to_string())
                .collect();
            (given, Some(tokens[surname_start..].join(" ")))
        }
    }
}

fn is_particle(token: &str) -> bool {
    let key = normalize_token(token);
    SURNAME_PARTICLES.contains(&key.as_str()) && token.chars().next().is_some_and(char::is_lowercase)
}

fn push_alias(aliases: &mut Vec<String>, alias: &str) {
    if !alias.is_empty() && !aliases.iter().any(|a| a == alias) {
        aliases.push(alias.to_string());
    }
}

fn overlaps(ranges: &[Range<usize>], range: &Range<usize>) -> bool {
    ranges
        .iter()
        .any(|r| r.start < range.end && range.start < r.end)
}

/// Replace the given byte ranges with spaces.
fn blank_ranges(text: &str, ranges: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        if ranges.iter().any(|r| r.contains(&idx)) {
            out.push(' ');
        } else {
            out.push(ch);
        }
    }
    out
}
