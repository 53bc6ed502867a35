//! Free-text date parsing into [`DateFragment`]s.
//!
//! The parser is lenient: it extracts whatever structure it can
//! recognise, keeps the original text in `raw`, and never fails. Month and day
//! values are not range-checked here; renderers clamp them.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::normalize_token;
use crate::types::{DateFragment, DateRange};

/// Month spellings (EN/FR/DE, with and without diacritics) and their number.
///
/// Longer spellings come first so regex alternation prefers them.
const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("janvier", 1),
    ("januar", 1),
    ("janv", 1),
    ("jan", 1),
    ("february", 2),
    ("février", 2),
    ("fevrier", 2),
    ("februar", 2),
    ("févr", 2),
    ("fevr", 2),
    ("feb", 2),
    ("fév", 2),
    ("fev", 2),
    ("march", 3),
    ("märz", 3),
    ("maerz", 3),
    ("marz", 3),
    ("mars", 3),
    ("mar", 3),
    ("april", 4),
    ("avril", 4),
    ("apr", 4),
    ("avr", 4),
    ("may", 5),
    ("mai", 5),
    ("june", 6),
    ("juin", 6),
    ("juni", 6),
    ("jun", 6),
    ("july", 7),
    ("juillet", 7),
    ("juil", 7),
    ("juli", 7),
    ("jul", 7),
    ("august", 8),
    ("août", 8),
    ("aout", 8),
    ("aug", 8),
    ("september", 9),
    ("septembre", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("octobre", 10),
    ("oktober", 10),
    ("oct", 10),
    ("okt", 10),
    ("november", 11),
    ("novembre", 11),
    ("nov", 11),
    ("december", 12),
    ("décembre", 12),
    ("decembre", 12),
    ("dezember", 12),
    ("déc", 12),
    ("dec", 12),
    ("dez", 12),
];

/// Uncertainty and before/after qualifiers that may precede a date.
const QUALIFIER: &str = r"(?:\b(?:about|abt|approximately|approx|around|circa|before|bef|after|aft|between|bet|vers|environ|avant|après|apres|entre)\b\.?\s*|\b(?:ca|c)\.\s*|~\s*)";

fn month_alternation() -> String {
    MONTHS
        .iter()
        .map(|(name, _)| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|")
}

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static APPROX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:abt|about|approx|approximately|around|circa|before|after|bef|aft|vers|environ|avant|après|apres)\b|\b(?:ca|c)\.|~)",
    )
    .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SPAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{3,4}|\?{1,4})\s*(?:[-–—]|\bto\b|\bbis\b|\bà\b)\s*(\d{3,4}|\?{1,4})(?:$|[^\d])")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BETWEEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:between|bet|entre)\b\.?\s+(\d{3,4})\s+(?:and|et|und|&)\s+(\d{3,4})")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BEFORE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:before|bef|avant)\b\.?[^\d]{0,24}?(\d{3,4})").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static AFTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:after|aft|après|apres)\b\.?[^\d]{0,24}?(\d{3,4})").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static QUARTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bQ([1-4])\b").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ISO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{3,4})-(\d{1,2})-(\d{1,2})\b").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUMERIC_DMY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[./-](\d{1,2})[./-](\d{3,4})\b").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DAY_MONTH_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th|er|e)?\.?\s+({})\b\.?,?\s+(\d{{3,4}})\b",
        month_alternation()
    ))
    .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MONTH_DAY_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({})\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{3,4}})\b",
        month_alternation()
    ))
    .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MONTH_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({})\b\.?,?\s+(\d{{3,4}})\b",
        month_alternation()
    ))
    .expect("valid regex")
});

/// A date expression embedded in longer text, qualifiers included.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    let months = month_alternation();
    let core = [
        r"\b\d{3,4}\s*[-–—]\s*(?:\d{3,4}\b|\?{1,4})".to_string(),
        r"\b\d{3,4}\s+(?:and|et|und|&)\s+\d{3,4}\b".to_string(),
        r"\b\d{3,4}-\d{1,2}-\d{1,2}\b".to_string(),
        r"\b\d{1,2}[./-]\d{1,2}[./-]\d{3,4}\b".to_string(),
        format!(r"\b\d{{1,2}}(?:st|nd|rd|th|er|e)?\.?\s+(?:{months})\b\.?,?\s+\d{{3,4}}\b"),
        format!(r"\b(?:{months})\b\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{3,4}}\b"),
        format!(r"\b(?:{months})\b\.?,?\s+\d{{3,4}}\b"),
        r"\bQ[1-4]\s+\d{3,4}\b".to_string(),
        r"\b\d{3,4}\b".to_string(),
    ]
    .join("|");
    Regex::new(&format!(r"(?i){QUALIFIER}?(?:{core})")).expect("valid regex")
});

/// Look up a month name in any supported language.
#[must_use]
pub fn month_from_name(name: &str) -> Option<u32> {
    let key = normalize_token(name);
    MONTHS
        .iter()
        .find(|(month, _)| normalize_token(month) == key)
        .map(|(_, number)| *number)
}

/// Extract the year: the first run of 3–4 digits.
///
/// A run written as a negative number (`-500`) is rejected and yields `None`.
///
/// # Examples
/// ```
/// use lignage_extractor::date::normalize_year;
///
/// assert_eq!(normalize_year("17 Mar 1901"), Some(1901));
/// assert_eq!(normalize_year("no year"), None);
/// ```
#[must_use]
pub fn normalize_year(text: &str) -> Option<i32> {
    let run = DIGIT_RUN
        .find_iter(text)
        .find(|m| (3..=4).contains(&m.as_str().len()))?;

    let before = &text[..run.start()];
    let mut preceding = before.chars().rev();
    if let Some('-' | '−') = preceding.next() {
        let negative = match preceding.next() {
            None => true,
            Some(c) => c.is_whitespace() || c == '(',
        };
        if negative {
            return None;
        }
    }

    run.as_str().parse().ok()
}

/// Whether the text carries an uncertainty or before/after qualifier.
#[must_use]
pub fn parse_approx(text: &str) -> bool {
    APPROX_PATTERN.is_match(text)
}

/// Recognise a year span, a `before` bound or an `after` bound, in that order.
#[must_use]
pub fn parse_range(text: &str) -> Option<DateRange> {
    if let Some(caps) = SPAN_PATTERN.captures(text) {
        let start = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let end = caps.get(2).and_then(|m| m.as_str().parse().ok());
        if start.is_some() || end.is_some() {
            return Some(DateRange { start, end });
        }
    }

    if let Some(caps) = BETWEEN_PATTERN.captures(text) {
        return Some(DateRange {
            start: caps.get(1).and_then(|m| m.as_str().parse().ok()),
            end: caps.get(2).and_then(|m| m.as_str().parse().ok()),
        });
    }

    if let Some(caps) = BEFORE_PATTERN.captures(text) {
        return Some(DateRange {
            start: None,
            end: caps.get(1).and_then(|m| m.as_str().parse().ok()),
        });
    }

    if let Some(caps) = AFTER_PATTERN.captures(text) {
        return Some(DateRange {
            start: caps.get(1).and_then(|m| m.as_str().parse().ok()),
            end: None,
        });
    }

    None
}

/// Parse a free-text date expression.
///
/// # Examples
/// ```
/// use lignage_extractor::date::parse_date_fragment;
///
/// let date = parse_date_fragment("17 Mar 1901");
/// assert_eq!((date.year, date.month, date.day), (Some(1901), Some(3), Some(17)));
/// assert!(!date.approx);
///
/// let date = parse_date_fragment("abt 1902");
/// assert_eq!(date.year, Some(1902));
/// assert!(date.approx);
/// ```
#[must_use]
pub fn parse_date_fragment(text: &str) -> DateFragment {
    if text.trim().is_empty() {
        return DateFragment::default();
    }

    let mut fragment = DateFragment {
        raw: Some(text.to_string()),
        year: normalize_year(text),
        approx: parse_approx(text),
        range: parse_range(text),
        ..DateFragment::default()
    };

    if let Some((year, month, day)) = day_precision(text) {
        fragment.year = year.or(fragment.year);
        fragment.month = Some(month);
        fragment.day = Some(day);
    } else if let Some(caps) = MONTH_YEAR_PATTERN.captures(text) {
        fragment.month = caps.get(1).and_then(|m| month_from_name(m.as_str()));
        if let Some(year) = caps.get(2).and_then(|m| m.as_str().parse().ok()) {
            fragment.year = Some(year);
        }
    }

    if let Some(caps) = QUARTER_PATTERN.captures(text) {
        if let Some(quarter) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
            if fragment.month.is_none() {
                fragment.month = Some((quarter - 1) * 3 + 1);
            }
            fragment.approx = true;
        }
    }

    fragment
}

/// Find the first day-precision date: returns `(year, month, day)`.
fn day_precision(text: &str) -> Option<(Option<i32>, u32, u32)> {
    if let Some(caps) = ISO_PATTERN.captures(text) {
        return Some((
            caps[1].parse().ok(),
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        ));
    }

    if let Some(caps) = NUMERIC_DMY_PATTERN.captures(text) {
        return Some((
            caps[3].parse().ok(),
            caps[2].parse().ok()?,
            caps[1].parse().ok()?,
        ));
    }

    if let Some(caps) = DAY_MONTH_YEAR_PATTERN.captures(text) {
        return Some((
            caps[3].parse().ok(),
            month_from_name(&caps[2])?,
            caps[1].parse().ok()?,
        ));
    }

    if let Some(caps) = MONTH_DAY_YEAR_PATTERN.captures(text) {
        return Some((
            caps[3].parse().ok(),
            month_from_name(&caps[1])?,
            caps[2].parse().ok()?,
        ));
    }

    None
}

/// Byte range of the first date expression inside a longer text.
///
/// Leading qualifiers (`abt`, `before`, `vers`, `~`, ...) are part of the
/// range so the date can be parsed and cited as one unit.
#[must_use]
pub fn find_date_expression(text: &str) -> Option<Range<usize>> {
    DATE_EXPRESSION.find(text).map(|m| m.range())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_precision() {
        let date = parse_date_fragment("17 Mar 1901");
        assert_eq!(date.year, Some(1901));
        assert_eq!(date.month, Some(3));
        assert_eq!(date.day, Some(17));
        assert!(!date.approx);
        assert_eq!(date.raw.as_deref(), Some("17 Mar 1901"));
    }

    #[test]
    fn test_parse_abt_and_tilde_are_equivalent() {
        let abt = parse_date_fragment("abt 1902");
        let tilde = parse_date_fragment("~1902");
        assert_eq!(abt.year, Some(1902));
        assert!(abt.approx);
        assert_eq!(
            (abt.year, abt.month, abt.day, abt.approx, abt.range),
            (tilde.year, tilde.month, tilde.day, tilde.approx, tilde.range)
        );
    }

    #[test]
    fn test_parse_circa() {
        assert!(parse_date_fragment("circa 1850").approx);
        assert!(parse_date_fragment("c. 1850").approx);
        assert!(parse_date_fragment("ca. 1850").approx);
        assert!(!parse_date_fragment("Dec. 1850").approx);
    }

    #[test]
    fn test_parse_quarter() {
        let date = parse_date_fragment("Q3 1887");
        assert_eq!(date.year, Some(1887));
        assert_eq!(date.month, Some(7));
        assert!(date.approx);
    }

    #[test]
    fn test_parse_french_dates() {
        let date = parse_date_fragment("le 3 mars 1850");
        assert_eq!((date.year, date.month, date.day), (Some(1850), Some(3), Some(3)));

        let date = parse_date_fragment("1er janvier 1900");
        assert_eq!((date.year, date.month, date.day), (Some(1900), Some(1), Some(1)));

        let date = parse_date_fragment("vers 1790");
        assert_eq!(date.year, Some(1790));
        assert!(date.approx);
    }

    #[test]
    fn test_parse_numeric_dates() {
        let date = parse_date_fragment("17/03/1901");
        assert_eq!((date.year, date.month, date.day), (Some(1901), Some(3), Some(17)));

        let date = parse_date_fragment("1901-03-17");
        assert_eq!((date.year, date.month, date.day), (Some(1901), Some(3), Some(17)));
    }

    #[test]
    fn test_parse_month_day_year() {
        let date = parse_date_fragment("March 17, 1901");
        assert_eq!((date.year, date.month, date.day), (Some(1901), Some(3), Some(17)));
    }

    #[test]
    fn test_parse_month_year() {
        let date = parse_date_fragment("about June 1875");
        assert_eq!((date.year, date.month, date.day), (Some(1875), Some(6), None));
        assert!(date.approx);
    }

    #[test]
    fn test_parse_does_not_validate_ranges() {
        let date = parse_date_fragment("45/13/1901");
        assert_eq!(date.day, Some(45));
        assert_eq!(date.month, Some(13));
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse_date_fragment(""), DateFragment::default());
        assert_eq!(parse_date_fragment("   \n"), DateFragment::default());
    }

    #[test]
    fn test_parse_keeps_raw_when_nothing_parsed() {
        let date = parse_date_fragment("unknown");
        assert_eq!(date.raw.as_deref(), Some("unknown"));
        assert_eq!(date.year, None);
    }

    #[test]
    fn test_normalize_year() {
        assert_eq!(normalize_year("born 1850 in Lyon"), Some(1850));
        assert_eq!(normalize_year("17 Mar 1901"), Some(1901));
        assert_eq!(normalize_year("987"), Some(987));
        assert_eq!(normalize_year("-500"), None);
        assert_eq!(normalize_year("17-03-1901"), Some(1901));
        assert_eq!(normalize_year("12"), None);
    }

    #[test]
    fn test_parse_approx_keywords() {
        assert!(parse_approx("abt 1900"));
        assert!(parse_approx("About 1900"));
        assert!(parse_approx("approx. 1900"));
        assert!(parse_approx("around 1900"));
        assert!(parse_approx("before 1900"));
        assert!(parse_approx("AFTER 1900"));
        assert!(!parse_approx("17 March 1900"));
        assert!(!parse_approx("Roundabout"));
    }

    #[test]
    fn test_parse_range_span() {
        assert_eq!(
            parse_range("1880–1885"),
            Some(DateRange {
                start: Some(1880),
                end: Some(1885)
            })
        );
        assert_eq!(
            parse_range("1880-?"),
            Some(DateRange {
                start: Some(1880),
                end: None
            })
        );
    }

    #[test]
    fn test_parse_range_before_after() {
        assert_eq!(
            parse_range("before 1900"),
            Some(DateRange {
                start: None,
                end: Some(1900)
            })
        );
        assert_eq!(
            parse_range("after 1900"),
            Some(DateRange {
                start: Some(1900),
                end: None
            })
        );
        assert_eq!(parse_range("17 Mar 1901"), None);
        assert_eq!(parse_range("1901-03-17"), None);
    }

    #[test]
    fn test_parse_range_between() {
        let date = parse_date_fragment("between 1880 and 1885");
        assert_eq!(
            date.range,
            Some(DateRange {
                start: Some(1880),
                end: Some(1885)
            })
        );
        assert_eq!(date.year, Some(1880));
    }

    #[test]
    fn test_find_date_expression() {
        let text = "17 Mar 1901, Paris, France";
        let range = find_date_expression(text).unwrap();
        assert_eq!(&text[range], "17 Mar 1901");

        let text = "Lyon, abt 1850";
        let range = find_date_expression(text).unwrap();
        assert_eq!(&text[range], "abt 1850");

        let text = "vers 1790 à Nantes";
        let range = find_date_expression(text).unwrap();
        assert_eq!(&text[range], "vers 1790");

        assert!(find_date_expression("Paris, France").is_none());
    }

    #[test]
    fn test_month_from_name() {
        assert_eq!(month_from_name("Mar"), Some(3));
        assert_eq!(month_from_name("août"), Some(8));
        assert_eq!(month_from_name("Dezember"), Some(12));
        assert_eq!(month_from_name("Paris"), None);
    }
}
