//! Request-boundary validation for HTML payloads.
//!
//! Runs before extraction: oversized, mistyped, empty, mis-encoded or
//! non-HTML payloads are rejected here and the extractor is never invoked
//! on them.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::HTML_SNIFF_BYTES;
use crate::error::{ExtractorError, Result};

/// Media types accepted for an HTML payload.
const ACCEPTED_MEDIA_TYPES: &[&str] = &["text/html", "application/xhtml+xml", "text/plain"];

/// Something that looks like markup near the start of the payload.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:!doctype\b|!--|/?[a-z][a-z0-9]*(?:\s|/?>))").expect("valid regex")
});

/// Validate a raw payload and return it as text.
///
/// Checks, in order: size against `limit` (413), declared content type
/// (415), emptiness, UTF-8 encoding and HTML sniffing (400). A leading
/// byte-order mark is stripped.
///
/// # Arguments
/// * `body` - Raw payload bytes
/// * `content_type` - Declared `Content-Type`, if any
/// * `limit` - Maximum accepted size in bytes
///
/// # Examples
/// ```
/// use lignage_extractor::boundary::validate_html_payload;
///
/// let html = validate_html_payload(b"<p>Jean</p>", Some("text/html"), 1024).unwrap();
/// assert_eq!(html, "<p>Jean</p>");
/// assert!(validate_html_payload(b"Jean", None, 1024).is_err());
/// ```
pub fn validate_html_payload<'a>(
    body: &'a [u8],
    content_type: Option<&str>,
    limit: usize,
) -> Result<&'a str> {
    if body.len() > limit {
        return Err(ExtractorError::PayloadTooLarge {
            size: body.len(),
            limit,
        });
    }

    if let Some(content_type) = content_type {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !media_type.is_empty() && !ACCEPTED_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(ExtractorError::UnsupportedMediaType(media_type));
        }
    }

    let text = std::str::from_utf8(body)
        .map_err(|e| ExtractorError::InvalidEncoding(e.valid_up_to()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if text.trim().is_empty() {
        return Err(ExtractorError::EmptyPayload);
    }

    if !looks_like_html(text) {
        tracing::debug!(bytes = text.len(), "Rejected payload without markup");
        return Err(ExtractorError::NotHtml);
    }

    Ok(text)
}

/// Whether the start of the text contains an HTML tag, comment or doctype.
#[must_use]
pub fn looks_like_html(text: &str) -> bool {
    let mut end = text.len().min(HTML_SNIFF_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    MARKUP_PATTERN.is_match(&text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_fragment() {
        let html = validate_html_payload(b"<table><tr><td>Name</td></tr></table>", None, 100);
        assert!(html.is_ok());
    }

    #[test]
    fn test_accepts_charset_parameter() {
        let body = b"<!DOCTYPE html><html></html>";
        assert!(validate_html_payload(body, Some("text/html; charset=utf-8"), 100).is_ok());
    }

    #[test]
    fn test_rejects_oversized() {
        let err = validate_html_payload(b"<p>0123456789</p>", None, 5).unwrap_err();
        assert_eq!(err.status_code(), 413);
    }

    #[test]
    fn test_rejects_media_type() {
        let err = validate_html_payload(b"<p>x</p>", Some("application/pdf"), 100).unwrap_err();
        assert!(matches!(err, ExtractorError::UnsupportedMediaType(ref m) if m == "application/pdf"));
        assert_eq!(err.status_code(), 415);
    }

    #[test]
    fn test_rejects_empty() {
        let err = validate_html_payload(b"  \n ", None, 100).unwrap_err();
        assert!(matches!(err, ExtractorError::EmptyPayload));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let err = validate_html_payload(&[b'<', b'p', b'>', 0xff, 0xfe], None, 100).unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidEncoding(3)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_rejects_plain_text() {
        let err = validate_html_payload(b"Jean Dupont, born 1850 < 1900", None, 100).unwrap_err();
        assert!(matches!(err, ExtractorError::NotHtml));
    }

    #[test]
    fn test_strips_bom() {
        let body = "\u{feff}<p>x</p>".as_bytes();
        assert_eq!(validate_html_payload(body, None, 100).unwrap(), "<p>x</p>");
    }

    #[test]
    fn test_sniff_respects_char_boundaries() {
        let mut text = "é".repeat(HTML_SNIFF_BYTES);
        text.push_str("<p>");
        assert!(!looks_like_html(&text));
    }
}
