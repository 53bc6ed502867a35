//! Linked-tree strategy for family-tree biography pages.
//!
//! These pages list relatives in sections ("Parents", "Children", a
//! `class="spouses"` block...) where each relative links to their own page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::builder::RecordBuilder;
use super::event::{split_lifespan, Event};
use super::labels::{match_label, LabelKind};
use super::narrative::{heading_name, prose_blocks, read_prose};
use super::tabular::{apply_labelled, collect_labelled};
use super::ExtractionStrategy;
use crate::date::parse_date_fragment;
use crate::html::{class_or_id, element_text, following_section, heading_level, selector, Document};
use crate::name::parse_name;
use crate::normalize::{clean_text, normalize_label, normalize_token};
use crate::provenance::SignalClass;
use crate::types::{LinkedPerson, Relation, StrategyKind};

/// Minimum relation sections and person links for a tree page.
const MIN_SECTIONS: usize = 2;
const MIN_LINKS: usize = 2;

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static CONTAINERS: LazyLock<Selector> =
    LazyLock::new(|| selector("section, div, ul, ol, table, dl, aside"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("li, dd, p"));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector("link[rel=canonical][href]"));
static OG_URL: LazyLock<Selector> = LazyLock::new(|| selector("meta[property=\"og:url\"][content]"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CONTEXT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^:]{1,30}?)\s*:").expect("valid regex"));

/// Words in a link's context that name its relation inside a family block.
const RELATION_WORDS: &[(&str, Relation)] = &[
    ("father", Relation::Father),
    ("pere", Relation::Father),
    ("vater", Relation::Father),
    ("mother", Relation::Mother),
    ("mere", Relation::Mother),
    ("mutter", Relation::Mother),
    ("husband", Relation::Spouse),
    ("wife", Relation::Spouse),
    ("spouse", Relation::Spouse),
    ("epoux", Relation::Spouse),
    ("epouse", Relation::Spouse),
    ("mari", Relation::Spouse),
    ("son", Relation::Child),
    ("daughter", Relation::Child),
    ("child", Relation::Child),
    ("fils", Relation::Child),
    ("fille", Relation::Child),
    ("brother", Relation::Sibling),
    ("sister", Relation::Sibling),
    ("frere", Relation::Sibling),
    ("soeur", Relation::Sibling),
    ("sœur", Relation::Sibling),
];

/// Section titles and class/id markers beyond the field-label dictionary.
const SECTION_WORDS: &[(&str, SectionKind)] = &[
    ("family", SectionKind::Family),
    ("immediate family", SectionKind::Family),
    ("family members", SectionKind::Family),
    ("famille", SectionKind::Family),
    ("familie", SectionKind::Family),
    ("kids", SectionKind::Relation(Relation::Child)),
    ("marriages", SectionKind::Relation(Relation::Spouse)),
];

/// What a tree section enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Relation(Relation),
    /// Mixed relatives; each link's relation comes from its context.
    Family,
    Sources,
}

/// A relation section: the heading or container that marks it and the
/// elements holding its entries.
#[derive(Debug, Clone)]
pub struct TreeSection<'d> {
    pub kind: SectionKind,
    pub anchor: ElementRef<'d>,
    pub elements: Vec<ElementRef<'d>>,
}

impl<'d> TreeSection<'d> {
    /// Whether `element` lies inside this section.
    fn covers(&self, element: &ElementRef<'d>) -> bool {
        self.elements.iter().any(|own| {
            own.id() == element.id() || element.ancestors().any(|a| a.id() == own.id())
        })
    }

    /// Person links: `<a href>` with alphabetic text that is not a label.
    fn person_links(&self) -> Vec<ElementRef<'d>> {
        self.elements
            .iter()
            .flat_map(|el| el.select(&LINKS))
            .filter(|link| is_person_link(link))
            .collect()
    }
}

/// Extraction over relation sections with per-relative links.
/// Signal class `table-label`: the section titles act as labels.
pub struct LinkedTreeStrategy;

impl ExtractionStrategy for LinkedTreeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LinkedTree
    }

    fn precondition(&self, doc: &Document<'_>) -> bool {
        has_tree_sections(doc)
    }

    fn extract(&self, doc: &Document<'_>, builder: &mut RecordBuilder<'_>) {
        let signal = SignalClass::TableLabel;
        let sections = tree_sections(doc);
        let covered = |el: &ElementRef<'_>| sections.iter().any(|s| s.covers(el));

        builder.seek(doc.source().body_start());
        if let Some((name, lifespan)) = subject_name(doc, &sections) {
            builder.name(&name, "name.heading", SignalClass::Heading);
            if let Some(lifespan) = lifespan {
                let dates = split_lifespan(&lifespan);
                if let Some(birth) = dates.birth {
                    builder.event_date(Event::Birth, &lifespan[birth], SignalClass::Heading);
                }
                if let Some(death) = dates.death {
                    builder.event_date(Event::Death, &lifespan[death], SignalClass::Heading);
                }
            }
        }

        if let Some(url) = detect_source_url(doc) {
            builder.source_url(&url, signal);
        }

        // Subject vitals outside the relation sections.
        for item in collect_labelled(doc).iter().filter(|i| !covered(&i.element)) {
            apply_labelled(builder, item, signal);
        }
        let excluded: Vec<ElementRef<'_>> = sections
            .iter()
            .flat_map(|s| s.elements.iter())
            .flat_map(|el| el.descendants().filter_map(ElementRef::wrap))
            .collect();
        for block in prose_blocks(doc, &excluded) {
            read_prose(builder, &element_text(&block));
        }

        for section in &sections {
            match section.kind {
                SectionKind::Sources => section_sources(builder, section, signal),
                SectionKind::Relation(relation) => section_relatives(builder, section, Some(relation), signal),
                SectionKind::Family => section_relatives(builder, section, None, signal),
            }
        }
    }
}

/// At least two relation sections holding at least two person links.
pub(crate) fn has_tree_sections(doc: &Document<'_>) -> bool {
    let sections: Vec<TreeSection<'_>> = tree_sections(doc)
        .into_iter()
        .filter(|s| s.kind != SectionKind::Sources)
        .collect();
    sections.len() >= MIN_SECTIONS
        && sections.iter().map(|s| s.person_links().len()).sum::<usize>() >= MIN_LINKS
}

/// Relation and source sections: heading-marked ones first, then
/// class-marked containers, each in document order.
///
/// Sections are marked by a heading whose text names a relation (content
/// runs to the next heading) or by a container whose class or id does. A
/// section nested inside a more specific one is dropped; a family section
/// enclosing specific ones gives way to them.
pub fn tree_sections<'d>(doc: &'d Document<'_>) -> Vec<TreeSection<'d>> {
    let mut candidates = Vec::new();
    for heading in doc.select(&HEADINGS) {
        if let Some(kind) = section_kind_from_title(&element_text(&heading)) {
            let elements = following_section(&heading);
            if !elements.is_empty() {
                candidates.push(TreeSection {
                    kind,
                    anchor: heading,
                    elements,
                });
            }
        }
    }
    for container in doc.select(&CONTAINERS) {
        if let Some(kind) = section_kind_from_markers(&class_or_id(&container)) {
            candidates.push(TreeSection {
                kind,
                anchor: container,
                elements: vec![container],
            });
        }
    }

    let keep: Vec<bool> = candidates
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let nested = candidates.iter().enumerate().any(|(j, outer)| {
                i != j && outer.kind != SectionKind::Family && outer.covers(&section.anchor)
            });
            let encloses = section.kind == SectionKind::Family
                && candidates
                    .iter()
                    .enumerate()
                    .any(|(j, inner)| i != j && section.covers(&inner.anchor));
            !nested && !encloses
        })
        .collect();

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(section, keep)| keep.then_some(section))
        .collect()
}

fn section_kind_from_title(title: &str) -> Option<SectionKind> {
    let key = normalize_label(title);
    if let Some((_, kind)) = SECTION_WORDS.iter().find(|(word, _)| *word == key) {
        return Some(*kind);
    }
    match match_label(title)? {
        LabelKind::Father => Some(SectionKind::Relation(Relation::Father)),
        LabelKind::Mother => Some(SectionKind::Relation(Relation::Mother)),
        LabelKind::Parents => Some(SectionKind::Relation(Relation::Parent)),
        LabelKind::Spouse => Some(SectionKind::Relation(Relation::Spouse)),
        LabelKind::Children => Some(SectionKind::Relation(Relation::Child)),
        LabelKind::Siblings => Some(SectionKind::Relation(Relation::Sibling)),
        LabelKind::Source => Some(SectionKind::Sources),
        _ => None,
    }
}

fn section_kind_from_markers(markers: &str) -> Option<SectionKind> {
    markers
        .split(|c: char| !c.is_alphanumeric())
        .find_map(|token| match token {
            "parents" => Some(SectionKind::Relation(Relation::Parent)),
            "father" => Some(SectionKind::Relation(Relation::Father)),
            "mother" => Some(SectionKind::Relation(Relation::Mother)),
            "spouse" | "spouses" | "husband" | "wife" | "marriage" | "marriages" => {
                Some(SectionKind::Relation(Relation::Spouse))
            }
            "children" | "child" | "kids" => Some(SectionKind::Relation(Relation::Child)),
            "siblings" => Some(SectionKind::Relation(Relation::Sibling)),
            "family" => Some(SectionKind::Family),
            "sources" => Some(SectionKind::Sources),
            _ => None,
        })
}

fn is_person_link(link: &ElementRef<'_>) -> bool {
    let href = link.value().attr("href").unwrap_or_default().trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return false;
    }
    let text = element_text(link);
    text.chars().any(char::is_alphabetic)
        && text.split_whitespace().count() <= 8
        && match_label(&text).is_none()
}

/// Subject name: the first `<h1>`, else the first heading that reads as a
/// name and does not title a section.
fn subject_name(doc: &Document<'_>, sections: &[TreeSection<'_>]) -> Option<(String, Option<String>)> {
    if let Some(name) = doc
        .select(&H1)
        .next()
        .and_then(|h1| heading_name(&element_text(&h1)))
    {
        return Some(name);
    }
    doc.select(&HEADINGS)
        .filter(|h| !sections.iter().any(|s| s.anchor.id() == h.id()))
        .find_map(|h| heading_name(&element_text(&h)))
}

/// Canonical link, then `og:url`, then a permalink or source anchor.
fn detect_source_url(doc: &Document<'_>) -> Option<String> {
    let canonical = doc
        .select(&CANONICAL)
        .find_map(|el| el.value().attr("href").map(str::to_string));
    let og = || {
        doc.select(&OG_URL)
            .find_map(|el| el.value().attr("content").map(str::to_string))
    };
    let anchor = || {
        doc.select(&LINKS).find_map(|link| {
            let href = link.value().attr("href")?;
            let text = normalize_label(&element_text(&link));
            let markers = class_or_id(&link);
            let permalink = link.value().attr("rel") == Some("bookmark")
                || markers.contains("permalink")
                || matches!(
                    text.as_str(),
                    "permalink" | "source" | "source page" | "original page" | "lien permanent"
                );
            (permalink && href.starts_with("http")).then(|| href.to_string())
        })
    };
    canonical
        .or_else(og)
        .or_else(anchor)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

fn section_sources(builder: &mut RecordBuilder<'_>, section: &TreeSection<'_>, signal: SignalClass) {
    for element in &section.elements {
        let items: Vec<ElementRef<'_>> = element.select(&ITEMS).collect();
        if items.is_empty() {
            builder.source_citation(&element_text(element), signal);
        }
        for item in items {
            builder.source_citation(&element_text(&item), signal);
        }
    }
}

/// Record every person link of a section, as a relation of the subject
/// and as a linked person with parsed name and dates.
fn section_relatives(
    builder: &mut RecordBuilder<'_>,
    section: &TreeSection<'_>,
    relation: Option<Relation>,
    signal: SignalClass,
) {
    if heading_level(&section.anchor).is_some() {
        builder.anchor(&element_text(&section.anchor));
    }
    for link in section.person_links() {
        let name = element_text(&link);
        let context = link_context(&link);
        let before = context.split(name.as_str()).next().unwrap_or_default();

        let relation = match (relation, context_relation(before)) {
            (Some(Relation::Parent) | None, Some(found)) => found,
            (Some(relation), _) => relation,
            (None, None) => {
                tracing::debug!(name = %name, "No relation for family link, skipped");
                continue;
            }
        };

        let rest = context.replacen(name.as_str(), " ", 1);
        let lifespan = split_lifespan(&rest);
        let parts = parse_name(&name);
        let person = LinkedPerson {
            relation,
            name: name.clone(),
            given_names: parts.given_names,
            surname: parts.surname,
            birth: lifespan
                .birth
                .map(|r| parse_date_fragment(&rest[r]))
                .unwrap_or_default(),
            death: lifespan
                .death
                .map(|r| parse_date_fragment(&rest[r]))
                .unwrap_or_default(),
            url: link.value().attr("href").map(|h| h.trim().to_string()),
        };

        let range = builder.locate(&name);
        builder.relative_name(relation, &name, signal);
        builder.linked_person(person, range.clone(), signal);
        if let Some(range) = range {
            builder.seek(range.end);
        }
    }
}

/// Text of the list item, row or paragraph enclosing a link.
fn link_context(link: &ElementRef<'_>) -> String {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|el| heading_level(el).is_none())
        .find(|el| matches!(el.value().name(), "li" | "tr" | "dd" | "p"))
        .map_or_else(|| element_text(link), |el| element_text(&el))
}

/// Relation named by a `Label:` prefix or a relation word before a link.
fn context_relation(before: &str) -> Option<Relation> {
    if let Some(label) = CONTEXT_LABEL.captures(before).and_then(|c| c.get(1)) {
        match match_label(label.as_str()) {
            Some(LabelKind::Father) => return Some(Relation::Father),
            Some(LabelKind::Mother) => return Some(Relation::Mother),
            Some(LabelKind::Parents) => return Some(Relation::Parent),
            Some(LabelKind::Spouse) => return Some(Relation::Spouse),
            Some(LabelKind::Children) => return Some(Relation::Child),
            Some(LabelKind::Siblings) => return Some(Relation::Sibling),
            _ => {}
        }
    }
    clean_text(before)
        .split(|c: char| !c.is_alphanumeric())
        .map(normalize_token)
        .find_map(|word| {
            RELATION_WORDS
                .iter()
                .find(|(w, _)| *w == word)
                .map(|(_, relation)| *relation)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndividualRecord;
    use pretty_assertions::assert_eq;

    const TREE: &str = r#"<html><head>
<link rel="canonical" href="https://tree.example.org/p/42">
</head><body>
<h1>Jean Dupont (1850–1920)</h1>
<p>Born: 17 March 1850, Lyon</p>
<h2>Parents</h2>
<ul>
<li>Father: <a href="/p/1">Louis Dupont</a> (1820–1890)</li>
<li>Mother: <a href="/p/2">Anne Martin</a> (c. 1825–1899)</li>
</ul>
<h2>Spouse</h2>
<ul><li><a href="/p/3">Marie Leclerc</a> 1852–1930</li></ul>
<h2>Children</h2>
<ul><li><a href="/p/4">Pierre Dupont</a> b. 1876</li><li><a href="/p/5">Louise Dupont</a></li></ul>
<h2>Sources</h2>
<ul><li>Parish register of Lyon</li></ul>
</body></html>"#;

    fn extract(html: &str) -> IndividualRecord {
        let doc = Document::parse(html);
        let mut builder = RecordBuilder::new(doc.source(), None, None);
        LinkedTreeStrategy.extract(&doc, &mut builder);
        builder.finish(StrategyKind::LinkedTree)
    }

    #[test]
    fn test_tree_sections() {
        let doc = Document::parse(TREE);
        let kinds: Vec<SectionKind> = tree_sections(&doc).iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Relation(Relation::Parent),
                SectionKind::Relation(Relation::Spouse),
                SectionKind::Relation(Relation::Child),
                SectionKind::Sources
            ]
        );
        assert!(has_tree_sections(&doc));
    }

    #[test]
    fn test_extract_tree_page() {
        let record = extract(TREE);
        assert_eq!(record.given_names, vec!["Jean"]);
        assert_eq!(record.surname.as_deref(), Some("Dupont"));
        assert_eq!(record.source_url.as_deref(), Some("https://tree.example.org/p/42"));
        assert_eq!(record.birth.year, Some(1850));
        assert_eq!(record.birth_place.as_deref(), Some("Lyon"));
        assert_eq!(record.parents.father.as_deref(), Some("Louis Dupont"));
        assert_eq!(record.parents.mother.as_deref(), Some("Anne Martin"));
        assert_eq!(record.spouses, vec!["Marie Leclerc"]);
        assert_eq!(record.children, vec!["Pierre Dupont", "Louise Dupont"]);
        assert_eq!(record.sources, vec!["Parish register of Lyon"]);
        assert_eq!(record.relatives.len(), 5);

        let mother = &record.relatives[1];
        assert_eq!(mother.relation, Relation::Mother);
        assert_eq!(mother.birth.year, Some(1825));
        assert!(mother.birth.approx);
        assert_eq!(mother.death.year, Some(1899));
        assert_eq!(mother.url.as_deref(), Some("/p/2"));

        let child = &record.relatives[3];
        assert_eq!(child.relation, Relation::Child);
        assert_eq!(child.birth.year, Some(1876));
        assert_eq!(child.given_names, vec!["Pierre"]);

        for span in record.provenance.iter() {
            assert_eq!(&record.source_html[span.start..span.end], span.text);
        }
        assert_eq!(record.provenance.for_field("relatives").count(), 5);
    }

    #[test]
    fn test_class_marked_family_block() {
        let html = r#"<h1>Anna Weber</h1>
<div class="family">
<p>Husband: <a href="/w/1">Karl Schmidt</a></p>
<p>Daughter: <a href="/w/2">Greta Schmidt</a></p>
<p>Brother: <a href="/w/3">Hans Weber</a></p>
</div>"#;
        let doc = Document::parse(html);
        let sections = tree_sections(&doc);
        assert_eq!(sections.len(), 1);
        assert!(!has_tree_sections(&doc));

        let record = extract(html);
        assert_eq!(record.spouses, vec!["Karl Schmidt"]);
        assert_eq!(record.children, vec!["Greta Schmidt"]);
        assert_eq!(record.siblings, vec!["Hans Weber"]);
    }

    #[test]
    fn test_nested_sections_keep_specific() {
        let html = r#"<div class="family">
<div class="parents"><a href="/1">Louis Dupont</a> <a href="/2">Anne Martin</a></div>
<div class="children"><a href="/3">Pierre Dupont</a></div>
</div>"#;
        let doc = Document::parse(html);
        let kinds: Vec<SectionKind> = tree_sections(&doc).iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::Relation(Relation::Parent), SectionKind::Relation(Relation::Child)]
        );
        assert!(has_tree_sections(&doc));

        let record = extract(html);
        assert_eq!(record.parents.father.as_deref(), Some("Louis Dupont"));
        assert_eq!(record.parents.mother.as_deref(), Some("Anne Martin"));
    }

    #[test]
    fn test_source_url_fallbacks() {
        let og = Document::parse(r#"<meta property="og:url" content="https://a.example/x">"#);
        assert_eq!(detect_source_url(&og).as_deref(), Some("https://a.example/x"));

        let anchor = Document::parse(r#"<a href="https://b.example/y">Permalink</a>"#);
        assert_eq!(detect_source_url(&anchor).as_deref(), Some("https://b.example/y"));

        let none = Document::parse(r#"<a href="/relative">Permalink</a>"#);
        assert_eq!(detect_source_url(&none), None);
    }

    #[test]
    fn test_context_relation() {
        assert_eq!(context_relation("Father: "), Some(Relation::Father));
        assert_eq!(context_relation("his wife "), Some(Relation::Spouse));
        assert_eq!(context_relation("Sœur "), Some(Relation::Sibling));
        assert_eq!(context_relation(""), None);
    }
}
