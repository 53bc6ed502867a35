//! Configuration constants for extraction, rendering and fetching.

/// Default maximum accepted HTML payload in bytes (2 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 2 * 1024 * 1024;

/// HTTP timeout in seconds when fetching a page.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum size of a fetched page in bytes.
///
/// Pages larger than the payload cap would be rejected anyway, so the fetch
/// stops reading at the same limit.
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = DEFAULT_MAX_PAYLOAD_BYTES as u64;

/// Maximum GEDCOM line length, level and tag included.
pub const GEDCOM_LINE_WIDTH: usize = 80;

/// Name written in the GEDCOM `HEAD.SOUR` record.
pub const GEDCOM_SOURCE_NAME: &str = "LIGNAGE";

/// CSS class of the `<mark>` elements inserted by the highlighter.
pub const HIGHLIGHT_CLASS: &str = "lignage-provenance";

/// Number of bytes sniffed when deciding whether a payload is HTML.
pub const HTML_SNIFF_BYTES: usize = 1024;
