//! Provenance highlighting: re-render the source HTML with every recorded
//! span wrapped in a `<mark>` element.

use crate::config::HIGHLIGHT_CLASS;
use crate::html::SourceMap;
use crate::provenance::ProvenanceSpan;

/// Wrap each span of `html` in `<mark class="lignage-provenance"
/// data-field="…">`.
///
/// Spans nest when one contains another. A span is skipped when its
/// offsets do not match its text, when it straddles markup, or when it
/// crosses an earlier accepted span. Everything outside the spans is
/// copied byte for byte.
///
/// # Examples
/// ```
/// use lignage_extractor::highlight::highlight_html;
/// use lignage_extractor::provenance::{ProvenanceSpan, SignalClass};
///
/// let html = "<p>Jean Dupont</p>";
/// let span = ProvenanceSpan {
///     field: "surname".to_string(),
///     text: "Dupont".to_string(),
///     start: 8,
///     end: 14,
///     signal: SignalClass::Heading,
/// };
/// assert_eq!(
///     highlight_html(html, &[span]),
///     "<p>Jean <mark class=\"lignage-provenance\" data-field=\"surname\">Dupont</mark></p>"
/// );
/// ```
#[must_use]
pub fn highlight_html(html: &str, spans: &[ProvenanceSpan]) -> String {
    let source = SourceMap::new(html);

    let mut candidates: Vec<&ProvenanceSpan> = spans
        .iter()
        .filter(|span| {
            let matches = html.get(span.start..span.end) == Some(span.text.as_str());
            if !matches || !source.is_plain_text(&(span.start..span.end)) {
                tracing::debug!(field = %span.field, start = span.start, end = span.end, "Span not highlightable, skipped");
                return false;
            }
            true
        })
        .collect();
    // Outer spans before the spans they contain.
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(html.len() + spans.len() * 48);
    let mut cursor = 0;
    let mut open: Vec<usize> = Vec::new();

    for span in candidates {
        while let Some(&end) = open.last() {
            if end > span.start {
                break;
            }
            close(&mut out, html, &mut cursor, end);
            open.pop();
        }
        if open.last().is_some_and(|&end| span.end > end) {
            tracing::debug!(field = %span.field, "Span crosses another span, skipped");
            continue;
        }

        out.push_str(&html[cursor..span.start]);
        out.push_str("<mark class=\"");
        out.push_str(HIGHLIGHT_CLASS);
        out.push_str("\" data-field=\"");
        out.push_str(&escape_attribute(&span.field));
        out.push_str("\">");
        cursor = span.start;
        open.push(span.end);
    }

    while let Some(end) = open.pop() {
        close(&mut out, html, &mut cursor, end);
    }
    out.push_str(&html[cursor..]);
    out
}

fn close(out: &mut String, html: &str, cursor: &mut usize, end: usize) {
    out.push_str(&html[*cursor..end]);
    out.push_str("</mark>");
    *cursor = end;
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
