//! Splitting vital-event values into a date part and a place part.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::date::find_date_expression;

/// Which vital event a value describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Birth,
    Death,
}

impl Event {
    /// Field path prefix: `"birth"` or `"death"`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Birth => "birth",
            Self::Death => "death",
        }
    }
}

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LEADING_CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\s,;:(–—-]+|(?i:in|at|on|à|a|en|au|aux|le|la|te|zu|bei|im|near|près de)\s+)+")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TRAILING_CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[\s,;:.)–—-]+|\s+(?i:in|at|on|à|a|en|au|le|la|zu|bei|im))+$").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BIRTH_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bb\.|\bborn\b|\bnée?\b|\bgeb\.|\bgeboren\b|°|\*)\s*").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DEATH_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bd\.|\bdied\b|\bdécédée?\b|\bmorte?\b|\bgest\.|\bgestorben\b|†|\+)\s*")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<birth>.*?\d{3,4})\s*[-–—]\s*(?P<death>\d{3,4}|\?+)$").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-–—]\s*").expect("valid regex"));

/// Byte ranges of the birth and death dates in a lifespan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifespan {
    pub birth: Option<Range<usize>>,
    pub death: Option<Range<usize>>,
}

/// Find birth and death dates in lifespan text such as `"1850–1920"`,
/// `"b. 1850, d. 1920"` or `"17 Mar 1850 - 3 Jun 1920"`.
///
/// Explicit markers (`b.`, `né`, `*`, `d.`, `†`, ...) take precedence; an
/// unmarked pair separated by a dash reads as birth then death, and a lone
/// unmarked date as birth. A `?` side is absent.
#[must_use]
pub fn split_lifespan(text: &str) -> Lifespan {
    let birth = marked_date(text, &BIRTH_MARKER);
    let death = marked_date(text, &DEATH_MARKER);
    if birth.is_some() || death.is_some() {
        return Lifespan { birth, death };
    }

    let Some(first) = find_date_expression(text) else {
        return Lifespan::default();
    };

    if let Some(caps) = YEAR_SPAN.captures(&text[first.clone()]) {
        let shift = |m: regex::Match<'_>| first.start + m.start()..first.start + m.end();
        return Lifespan {
            birth: caps.name("birth").map(shift),
            death: caps
                .name("death")
                .filter(|m| !m.as_str().starts_with('?'))
                .map(shift),
        };
    }

    let rest = &text[first.end..];
    let death = DASH.find(rest).and_then(|dash| {
        let after = first.end + dash.end();
        find_date_expression(&text[after..])
            .filter(|d| d.start == 0)
            .map(|d| after + d.start..after + d.end)
    });

    Lifespan {
        birth: Some(first),
        death,
    }
}

/// A date expression directly following a marker.
fn marked_date(text: &str, marker: &Regex) -> Option<Range<usize>> {
    marker.find_iter(text).find_map(|m| {
        let rest = &text[m.end()..];
        find_date_expression(rest)
            .filter(|d| d.start <= 3)
            .map(|d| m.end() + d.start..m.end() + d.end)
    })
}

/// Byte ranges of the date and place parts of an event value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventParts {
    pub date: Option<Range<usize>>,
    pub place: Option<Range<usize>>,
}

/// Split an event value such as `"17 Mar 1901, Lyon, France"`.
///
/// The date is the first recognised date expression; the place is the text
/// after it (or before it when nothing follows) with connectors such as
/// `in`, `à` or commas trimmed. Without a date expression the whole value
/// is taken as a place when it contains letters.
///
/// # Examples
/// ```
/// use lignage_extractor::strategy::event::split_event;
///
/// let value = "17 Mar 1901 in Lyon, France";
/// let parts = split_event(value);
/// assert_eq!(&value[parts.date.unwrap()], "17 Mar 1901");
/// assert_eq!(&value[parts.place.unwrap()], "Lyon, France");
/// ```
#[must_use]
pub fn split_event(value: &str) -> EventParts {
    let Some(date) = find_date_expression(value) else {
        return EventParts {
            date: None,
            place: trim_connectors(value, 0..value.len()),
        };
    };

    let place = trim_connectors(value, date.end..value.len())
        .or_else(|| trim_connectors(value, 0..date.start));

    EventParts {
        date: Some(date),
        place,
    }
}

/// Trim connector words and punctuation from both ends of `value[range]`.
fn trim_connectors(value: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &value[range.clone()];
    let lead = LEADING_CONNECTOR.find(slice).map_or(0, |m| m.end());
    let rest = &slice[lead..];
    let trail = TRAILING_CONNECTOR.find(rest).map_or(rest.len(), |m| m.start());
    let trimmed = &rest[..trail];

    if trimmed.chars().any(char::is_alphabetic) {
        let start = range.start + lead;
        Some(start..start + trimmed.len())
    } else {
        None
    }
}
