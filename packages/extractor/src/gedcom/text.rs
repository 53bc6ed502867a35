//! Value formatting for GEDCOM lines: dates, escaping and long-text
//! continuation.

use textwrap::{wrap, Options};

use crate::types::DateFragment;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Escape a line value: `@` is doubled and line breaks become spaces.
pub fn escape_value(text: &str) -> String {
    text.replace('@', "@@")
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a date fragment as a GEDCOM date value.
///
/// Ranges become `BET … AND …`, `BEF …` or `AFT …`; approximate dates get
/// `ABT`. Months outside 1–12 and days outside 1–31 are clamped. A fragment
/// with no year falls back to a date phrase `(raw)`.
pub fn format_date(date: &DateFragment) -> Option<String> {
    if let Some(range) = date.range {
        match (range.start, range.end) {
            (Some(start), Some(end)) if start != end => return Some(format!("BET {start} AND {end}")),
            (None, Some(end)) => return Some(format!("BEF {end}")),
            (Some(start), None) => return Some(format!("AFT {start}")),
            _ => {}
        }
    }

    if let Some(year) = date.year {
        let mut parts = Vec::new();
        if let Some(month) = date.month {
            if let Some(day) = date.day {
                parts.push(format!("{:02}", day.clamp(1, 31)));
            }
            let index = month.clamp(1, 12) as usize - 1;
            parts.push(MONTHS[index].to_string());
        }
        parts.push(year.to_string());
        let exact = parts.join(" ");
        return Some(if date.approx { format!("ABT {exact}") } else { exact });
    }

    date.raw
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| format!("({})", escape_value(raw).replace(['(', ')'], "")))
}

/// Split one logical line into pieces of at most `width` characters for
/// `CONC` continuation.
///
/// Concatenating the pieces gives back the line exactly: whitespace at a
/// break stays at the end of the earlier piece.
pub fn split_for_conc(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width || width < 2 {
        return vec![line.to_string()];
    }

    let options = Options::new(width - 1).break_words(true);
    let mut chunks: Vec<String> = Vec::new();
    let mut pos = 0;
    for piece in wrap(line, &options) {
        let piece = piece.trim_end();
        if piece.is_empty() {
            continue;
        }
        let Some(offset) = line[pos..].find(piece) else {
            continue;
        };
        let start = pos + offset;
        let end = start + piece.len();
        if chunks.is_empty() {
            chunks.push(line[..end].to_string());
        } else {
            if let Some(last) = chunks.last_mut() {
                last.push_str(&line[pos..start]);
            }
            chunks.push(piece.to_string());
        }
        pos = end;
    }

    match chunks.last_mut() {
        Some(last) => last.push_str(&line[pos..]),
        None => chunks.push(line.to_string()),
    }
    chunks
}
