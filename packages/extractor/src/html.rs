//! HTML access for the strategies: a parsed DOM plus a source map.
//!
//! Structure is read through `scraper`. Text read from the DOM is decoded
//! and whitespace-normalized, so it cannot be sliced out of the input
//! directly; [`SourceMap`] maps such text back to byte offsets in the raw
//! HTML so provenance spans always satisfy `html[start..end] == text`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::normalize::clean_text;

/// Longest value for which a tolerant pattern is compiled.
const MAX_TOLERANT_LEN: usize = 512;

/// Elements whose boundaries separate words in extracted text.
const BLOCK_ELEMENTS: &[&str] = &[
    "br", "p", "div", "li", "ul", "ol", "td", "th", "tr", "dt", "dd", "dl", "table", "h1", "h2",
    "h3", "h4", "h5", "h6", "section", "article", "header", "footer", "blockquote", "hr",
];

/// Parse a static CSS selector.
#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));

/// A document ready for extraction: the DOM and its source map.
pub struct Document<'a> {
    dom: Html,
    source: SourceMap<'a>,
}

impl<'a> Document<'a> {
    /// Parse an HTML document or fragment.
    pub fn parse(html: &'a str) -> Self {
        Self {
            dom: Html::parse_document(html),
            source: SourceMap::new(html),
        }
    }

    /// The parsed DOM.
    pub fn dom(&self) -> &Html {
        &self.dom
    }

    /// Offset locator over the raw input.
    pub fn source(&self) -> &SourceMap<'a> {
        &self.source
    }

    /// Select elements in document order.
    pub fn select<'b>(&'b self, selector: &'b Selector) -> impl Iterator<Item = ElementRef<'b>> + 'b {
        self.dom.select(selector)
    }

    /// Text of the `<title>` element, if any.
    pub fn title(&self) -> Option<String> {
        self.dom
            .select(&TITLE)
            .next()
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
    }
}

/// Visible text of an element with whitespace collapsed.
///
/// Block-level boundaries and `<br>` count as whitespace, so
/// `Jean<br>Dupont` reads as `"Jean Dupont"`. Script and style content is
/// skipped.
pub fn element_text(element: &ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => {
                let inside_code = node.ancestors().any(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|e| matches!(e.name(), "script" | "style"))
                });
                if !inside_code {
                    raw.push_str(text);
                }
            }
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => raw.push(' '),
            _ => {}
        }
    }
    clean_text(&raw)
}

/// Decoded, whitespace-collapsed text of a raw HTML fragment.
///
/// Character references are resolved and tags dropped, so
/// `"(n&eacute;e <b>Doe</b>)"` reads as `"(née Doe)"`.
pub fn fragment_text(fragment: &str) -> String {
    let dom = Html::parse_fragment(fragment);
    element_text(&dom.root_element())
}

/// Visible text of an element split into lines at `<br>` and block
/// boundaries. Empty lines are dropped.
pub fn element_lines(element: &ElementRef<'_>) -> Vec<String> {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(&text.replace('\n', " ")),
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => raw.push('\n'),
            _ => {}
        }
    }
    raw.lines()
        .map(clean_text)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Lower-cased `class` and `id` attribute values of an element.
pub fn class_or_id(element: &ElementRef<'_>) -> String {
    let mut out = String::new();
    if let Some(class) = element.value().attr("class") {
        out.push_str(class);
        out.push(' ');
    }
    if let Some(id) = element.value().attr("id") {
        out.push_str(id);
    }
    out.to_lowercase()
}

/// Heading level of an `h1`..`h6` element.
pub fn heading_level(element: &ElementRef<'_>) -> Option<u8> {
    match element.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Child elements of an element, in order.
pub fn child_elements<'b>(element: &ElementRef<'b>) -> impl Iterator<Item = ElementRef<'b>> + 'b {
    element.children().filter_map(ElementRef::wrap)
}

/// Sibling elements after a heading, up to the next heading.
pub fn following_section<'b>(heading: &ElementRef<'b>) -> Vec<ElementRef<'b>> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| heading_level(el).is_none())
        .collect()
}

/// Maps decoded text back to byte ranges of the raw HTML.
///
/// Knows which byte ranges of the input are text content (outside tags,
/// comments, `<script>` and `<style>`). Searches start from a caller
/// supplied position so repeated values resolve in document order.
#[derive(Debug, Clone)]
pub struct SourceMap<'a> {
    html: &'a str,
    regions: Vec<Range<usize>>,
}

impl<'a> SourceMap<'a> {
    /// Scan the raw HTML for text regions.
    pub fn new(html: &'a str) -> Self {
        Self {
            html,
            regions: text_regions(html),
        }
    }

    /// The raw input.
    pub fn html(&self) -> &'a str {
        self.html
    }

    /// Text regions of the input, in order.
    pub fn regions(&self) -> &[Range<usize>] {
        &self.regions
    }

    /// Offset of the `<body>` start tag, or 0 for a fragment without one.
    pub fn body_start(&self) -> usize {
        self.html.to_ascii_lowercase().find("<body").unwrap_or(0)
    }

    /// Whether a byte range lies inside a single text region.
    pub fn is_plain_text(&self, range: &Range<usize>) -> bool {
        self.region_of(range.start)
            .is_some_and(|r| range.end <= r.end && range.start < range.end)
    }

    /// Locate `text` at or after byte `from`, falling back to the whole input.
    pub fn locate(&self, text: &str, from: usize) -> Option<Range<usize>> {
        let from = from.min(self.html.len());
        self.locate_in(text, from..self.html.len())
            .or_else(|| (from > 0).then(|| self.locate_in(text, 0..self.html.len())).flatten())
    }

    /// Locate `text` inside `within`.
    ///
    /// Tries an exact match inside one text region first, then a tolerant
    /// match that allows whitespace runs, `&nbsp;`, inline tags and
    /// character references where the decoded text differs from the source.
    pub fn locate_in(&self, text: &str, within: Range<usize>) -> Option<Range<usize>> {
        let text = text.trim();
        if text.is_empty() || within.start >= within.end || within.end > self.html.len() {
            return None;
        }
        self.exact(text, &within)
            .or_else(|| self.tolerant(text, &within))
    }

    /// Locate a literal attribute value such as an `href`, at or after `from`.
    ///
    /// Attribute values live inside tags, so text regions are ignored; `&`
    /// may appear escaped as `&amp;` in the source.
    pub fn locate_attribute(&self, value: &str, from: usize) -> Option<Range<usize>> {
        if value.is_empty() {
            return None;
        }
        let escaped = value.replace('&', "&amp;");
        let from = from.min(self.html.len());
        for start in [from, 0] {
            let haystack = self.html.get(start..)?;
            for candidate in [value, escaped.as_str()] {
                if let Some(pos) = haystack.find(candidate) {
                    let begin = start + pos;
                    return Some(begin..begin + candidate.len());
                }
            }
        }
        None
    }

    fn region_of(&self, offset: usize) -> Option<&Range<usize>> {
        let idx = self.regions.partition_point(|r| r.end <= offset);
        self.regions.get(idx).filter(|r| r.start <= offset)
    }

    fn exact(&self, text: &str, within: &Range<usize>) -> Option<Range<usize>> {
        let first = self.regions.partition_point(|r| r.end <= within.start);
        for region in &self.regions[first..] {
            if region.start >= within.end {
                break;
            }
            let start = region.start.max(within.start);
            let end = region.end.min(within.end);
            if let Some(pos) = self.html.get(start..end).and_then(|slice| slice.find(text)) {
                return Some(start + pos..start + pos + text.len());
            }
        }
        None
    }

    fn tolerant(&self, text: &str, within: &Range<usize>) -> Option<Range<usize>> {
        if text.len() > MAX_TOLERANT_LEN {
            return None;
        }
        let pattern = Regex::new(&tolerant_pattern(text)).ok()?;
        let haystack = self.html.get(..within.end)?;

        let mut at = within.start;
        while at < within.end {
            let found = pattern.find_at(haystack, at)?;
            let range = found.range();
            if self.region_of(range.start).is_some()
                && self.region_of(range.end - 1).is_some()
                && fragment_text(&self.html[range.clone()]) == clean_text(text)
            {
                return Some(range);
            }
            at = next_char_boundary(self.html, range.start + 1);
        }
        None
    }
}

/// Build a regex matching `text` as it may be written in HTML source.
fn tolerant_pattern(text: &str) -> String {
    const GAP: &str = r"(?:\s|&nbsp;|&#160;|&#[xX][aA]0;|<[^>]*>)+";
    const INLINE: &str = r"(?:<[^>]*>)*";

    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            word.chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_string()
                    } else {
                        // Named references are checked by decoding the match.
                        let code = u32::from(c);
                        format!(
                            "(?:{}|&#0*{code};|&#[xX]0*(?i:{code:x});|&[a-zA-Z][a-zA-Z0-9]*;)",
                            regex::escape(&c.to_string())
                        )
                    }
                })
                .collect::<Vec<_>>()
                .join(INLINE)
        })
        .collect();
    words.join(GAP)
}

fn next_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Byte ranges of the input that are text content.
fn text_regions(html: &str) -> Vec<Range<usize>> {
    let bytes = html.as_bytes();
    let mut regions = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let Some(markup_end) = markup_end(html, i) else {
            // A stray '<' is text.
            i += 1;
            continue;
        };
        if text_start < i {
            regions.push(text_start..i);
        }
        i = markup_end;
        text_start = i;
    }
    if text_start < bytes.len() {
        regions.push(text_start..bytes.len());
    }
    regions
}

/// End offset (exclusive) of the markup starting at `start`, if it is markup.
fn markup_end(html: &str, start: usize) -> Option<usize> {
    let rest = &html[start..];
    let bytes = rest.as_bytes();

    if rest.starts_with("<!--") {
        return Some(rest[4..].find("-->").map_or(html.len(), |p| start + 4 + p + 3));
    }

    let next = *bytes.get(1)?;
    if !(next.is_ascii_alphabetic() || next == b'/' || next == b'!' || next == b'?') {
        return None;
    }

    let tag_end = tag_close(rest).map_or(html.len(), |p| start + p + 1);

    // Raw text elements: skip their content up to the closing tag.
    let name: String = rest[1..]
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    if name == "script" || name == "style" {
        let closing = format!("</{name}");
        let lower = html[tag_end..].to_ascii_lowercase();
        return Some(match lower.find(&closing) {
            Some(p) => {
                let close_start = tag_end + p;
                tag_close(&html[close_start..]).map_or(html.len(), |q| close_start + q + 1)
            }
            None => html.len(),
        });
    }

    Some(tag_end)
}

/// Offset of the `>` closing a tag, skipping quoted attribute values.
fn tag_close(tag: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (idx, byte) in tag.bytes().enumerate().skip(1) {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(byte),
            (None, b'>') => return Some(idx),
            (None, _) => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_regions_skip_markup() {
        let html = "<p class=\"a>b\">Jean</p><!-- x --><script>var a = '<p>';</script>Dupont";
        let map = SourceMap::new(html);
        let texts: Vec<&str> = map.regions().iter().map(|r| &html[r.clone()]).collect();
        assert_eq!(texts, vec!["Jean", "Dupont"]);
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let html = "<p>1850 < 1900</p>";
        let map = SourceMap::new(html);
        let range = map.locate("1850 < 1900", 0).unwrap();
        assert_eq!(&html[range], "1850 < 1900");
    }

    #[test]
    fn test_locate_exact_from_anchor() {
        let html = "<td>Dupont</td><td>Dupont</td>";
        let map = SourceMap::new(html);
        assert_eq!(map.locate("Dupont", 0), Some(4..10));
        assert_eq!(map.locate("Dupont", 10), Some(19..25));
        // Falls back to the start when nothing follows the anchor.
        assert_eq!(map.locate("Dupont", 26), Some(4..10));
    }

    #[test]
    fn test_locate_ignores_attribute_text() {
        let html = "<a title=\"Jean\">x</a><span>Jean</span>";
        let map = SourceMap::new(html);
        let range = map.locate("Jean", 0).unwrap();
        assert_eq!(range.start, html.rfind("Jean").unwrap());
    }

    #[test]
    fn test_locate_tolerant_whitespace_and_entities() {
        let html = "<h1>Jean&nbsp;Baptiste\n  <b>Dupont</b></h1><p>Ren&eacute;e</p>";
        let map = SourceMap::new(html);

        let range = map.locate("Jean Baptiste Dupont", 0).unwrap();
        assert_eq!(&html[range], "Jean&nbsp;Baptiste\n  <b>Dupont");

        let range = map.locate("Renée", 0).unwrap();
        assert_eq!(&html[range], "Ren&eacute;e");
    }

    #[test]
    fn test_locate_tolerant_checks_reference_character() {
        let html = "<p>Jean &amp; Marie</p><p>Jean &lt; Marie</p><p>Ren&#233;e R&#xE9;my</p>";
        let map = SourceMap::new(html);

        let range = map.locate("Jean < Marie", 0).unwrap();
        assert_eq!(range.start, html.find("Jean &lt;").unwrap());
        assert_eq!(&html[range], "Jean &lt; Marie");

        let range = map.locate("Renée Rémy", 0).unwrap();
        assert_eq!(&html[range], "Ren&#233;e R&#xE9;my");

        assert_eq!(map.locate("Ren&e", 0), None);
    }

    #[test]
    fn test_fragment_text_decodes_references() {
        assert_eq!(fragment_text("(n&eacute;e <b>Doe</b>)"), "(née Doe)");
        assert_eq!(fragment_text("Jean&nbsp;Baptiste\n  Dupont"), "Jean Baptiste Dupont");
    }

    #[test]
    fn test_locate_missing() {
        let map = SourceMap::new("<p>Jean</p>");
        assert_eq!(map.locate("Marie", 0), None);
        assert_eq!(map.locate("   ", 0), None);
    }

    #[test]
    fn test_locate_multibyte() {
        let html = "<p>Née à Zürich</p>";
        let map = SourceMap::new(html);
        let range = map.locate("Zürich", 0).unwrap();
        assert_eq!(&html[range], "Zürich");
    }

    #[test]
    fn test_locate_attribute() {
        let html = r#"<link rel="canonical" href="https://example.org/p?id=1&amp;l=fr">"#;
        let map = SourceMap::new(html);
        let range = map.locate_attribute("https://example.org/p?id=1&l=fr", 0).unwrap();
        assert_eq!(&html[range], "https://example.org/p?id=1&amp;l=fr");
    }

    #[test]
    fn test_is_plain_text() {
        let html = "<b>Jean</b> Dupont";
        let map = SourceMap::new(html);
        assert!(map.is_plain_text(&(3..7)));
        assert!(!map.is_plain_text(&(3..18)));
    }

    #[test]
    fn test_element_text_breaks_on_blocks() {
        let doc = Document::parse("<div>Jean<br>Dupont<p>né en 1850</p></div>");
        let sel = selector("div");
        let div = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(&div), "Jean Dupont né en 1850");
    }

    #[test]
    fn test_element_lines() {
        let doc = Document::parse("<table><tr><td>Pierre<br>Marie\n Dupont<br><br></td></tr></table>");
        let sel = selector("td");
        let td = doc.select(&sel).next().unwrap();
        assert_eq!(element_lines(&td), vec!["Pierre", "Marie Dupont"]);
    }

    #[test]
    fn test_document_title() {
        let doc = Document::parse("<html><head><title> Jean  Dupont </title></head></html>");
        assert_eq!(doc.title().as_deref(), Some("Jean Dupont"));
    }

    #[test]
    fn test_body_start() {
        let map = SourceMap::new("<html><head><title>X</title></head><BODY><p>Y</p></BODY></html>");
        assert_eq!(map.body_start(), 35);
        assert_eq!(SourceMap::new("<p>fragment</p>").body_start(), 0);
    }
}
