//! Lexical normalization shared by every lookup table.
//!
//! All functions are pure and total: any input produces some output.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters removed outright before whitespace is collapsed.
const STRIPPED_PUNCTUATION: &[char] = &['.', '\'', '’', '‘', '-', '‐', '/'];

/// Normalize a token for dictionary lookup.
///
/// Lower-cases, strips diacritics (NFD decomposition followed by removal of
/// combining marks), removes periods, apostrophes, hyphens and slashes, and
/// collapses runs of whitespace into single spaces.
///
/// # Examples
/// ```
/// use lignage_extractor::normalize::normalize_token;
///
/// assert_eq!(normalize_token("  Île-de-France "), "iledefrance");
/// assert_eq!(normalize_token("St. Étienne"), "st etienne");
/// ```
pub fn normalize_token(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();
    collapse_whitespace(&stripped)
}

/// Secondary lookup key: [`normalize_token`] with all whitespace removed.
///
/// Lets "New York" and "NewYork" resolve to the same entry.
///
/// # Examples
/// ```
/// use lignage_extractor::normalize::collapse_spaces;
///
/// assert_eq!(collapse_spaces("New York"), collapse_spaces("NewYork"));
/// ```
pub fn collapse_spaces(text: &str) -> String {
    normalize_token(text)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Normalize a field label such as `"Date de naissance :"`.
///
/// Same as [`normalize_token`] but also drops trailing colons and leading
/// bullet or dash markers that label cells often carry.
pub fn normalize_label(text: &str) -> String {
    let trimmed = text
        .trim()
        .trim_start_matches(['•', '*', '–', '—', '-'])
        .trim_end_matches([':', '：', ' ', '\u{a0}']);
    normalize_token(trimmed)
}

/// Collapse whitespace (including non-breaking spaces) without changing case.
///
/// Used for display values taken from DOM text.
pub fn clean_text(text: &str) -> String {
    collapse_whitespace(text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
