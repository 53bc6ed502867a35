//! Heading + narrative strategy.
//!
//! The subject's name comes from a heading (or, failing that, the page
//! title); everything else from keyword-anchored phrases in the prose.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::{ElementRef, Selector};

use super::builder::RecordBuilder;
use super::event::{split_lifespan, Event};
use super::labels::{match_label, LabelKind};
use super::{linked_tree, ExtractionStrategy};
use crate::canon::parse_profession;
use crate::html::{element_text, following_section, selector, Document};
use crate::name::{parse_name, parse_relationship_list};
use crate::normalize::normalize_label;
use crate::provenance::SignalClass;
use crate::types::{Relation, Sex, StrategyKind};

/// Longest heading, in words, still read as a person's name.
const MAX_NAME_WORDS: usize = 8;

/// A personal name: capitalised words, lowercase particles between them.
const NAME: &str = r"\p{Lu}(?:\.|[\p{L}'’\-]*)(?:\s+(?:(?:de|du|des|la|le|van|von|der|den|di|da|del|della|ten|ter)\s+|d['’])*\p{Lu}(?:\.|[\p{L}'’\-]*)){0,6}";

/// Start of an event value: a connector, an approximation word or a digit.
const EVENT_START: &str = r"(?i:(?:on|in|at|le|à|en|vers|about|abt|circa|around)\b|ca?\.|\d)";

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));
static PROSE: LazyLock<Selector> = LazyLock::new(|| selector("p, li, blockquote, dd"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static SECTION_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("li"));

/// Headings that title a section rather than name a person.
const SECTION_TITLES: &[&str] = &[
    "biography", "biographie", "life", "early life", "later life", "vie", "family", "famille",
    "history", "histoire", "genealogy", "généalogie", "timeline", "chronologie", "contents",
    "sommaire", "references", "références", "see also", "voir aussi", "descendants", "ancestors",
    "ancêtres", "lebenslauf", "familie", "quellen",
];

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static LIFESPAN_PAREN: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^(?P<name>.+?)\s*\((?P<life>[^()]*\d{3,4}[^()]*)\)\s*$"));

static LIFESPAN_TRAILING: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"^(?P<name>.+?)[,\s]+(?P<life>(?:(?i:b\.|d\.|born|died|née?|°|\*|†)\s*)?(?:(?i:c\.|ca\.|abt\.?|circa)\s*)?\d{3,4}(?:\s*[-–—]\s*(?:\d{3,4}|\?+))?)\s*$")
});

static TITLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| regex(r"\s+[-–—|:]\s+|\s*\|\s*"));

static BIRTH: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(
        r"(?P<marker>\b(?i:born)\b|\b(?i:née?)\b)\s+(?P<value>{EVENT_START}[^.;]*?)(?:[.;]|$|,?\s+(?i:the\s+)?(?i:son|daughter|child|fils|fille|to)\b)"
    ))
});

static DEATH: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(
        r"\b(?i:died|décédée?|morte?|deceased|passed\s+away)\b\s+(?P<value>{EVENT_START}[^.;]*?)(?:[.;]|$|,?\s+(?i:aged|at\s+the\s+age|âgée?|leaving|where)\b)"
    ))
});

static PARENTS_EN: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(
        r"(?P<rel>\b(?i:son|daughter|child)\s+(?i:of)|\b(?i:born\s+to))\s+(?P<first>{NAME})(?:\s+(?i:and|&)\s+(?P<second>{NAME}))?"
    ))
});

static PARENTS_FR: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(
        r"(?P<rel>\b(?i:fils|fille|enfant)\s+(?:de\s+|d['’]))(?P<first>{NAME})(?:\s+et\s+(?:de\s+|d['’])?(?P<second>{NAME}))?"
    ))
});

static PARENT_WAS: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(
        r"\b(?:(?i:his|her)\s+(?P<en>(?i:father|mother))(?:\s+(?i:was)|,)|(?i:son|sa)\s+(?P<fr>(?i:père|mère))(?:\s+(?i:était|est|fut))?,?)\s+(?P<name>{NAME})"
    ))
});

static SPOUSE: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(
        r"\b(?i:married|wed|épousa|a\s+épousé|se\s+maria\s+avec|s['’]est\s+mariée?\s+avec|his\s+wife|her\s+husband|sa\s+femme|son\s+mari|son\s+épouse|son\s+époux)(?:\s+(?i:to|with|was))?,?\s+(?P<name>{NAME})"
    ))
});

static CHILDREN: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"\b(?i:children|enfants)\b[^:.;]{0,40}?(?:\s*:\s*|\s+(?i:were|are|included|sont|étaient|furent)\s+)(?P<list>[^.;]+)")
});

static SIBLINGS: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"\b(?i:siblings|brothers\s+and\s+sisters|frères\s+et\s+s(?:œ|oe)urs)\b[^:.;]{0,40}?(?:\s*:\s*|\s+(?i:were|are|included|sont|étaient)\s+)(?P<list>[^.;]+)")
});

static SIBLING: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(
        r"\b(?i:his|her|son|sa)\s+(?i:brother|sister|frère|s(?:œ|oe)ur)(?:\s+(?i:was))?,?\s+(?P<name>{NAME})"
    ))
});

static RESIDENCE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"\b(?i:lived|resided|settled|was\s+living|living|residing|demeurant|domiciliée?|habitait|vécut|vivait|résidait|s['’]installa)\s+(?i:in|at|à|au|en)\s+(?P<value>[^.;]+?)(?:[.;]|$|\s+(?i:where|until|when|with|où|avec|jusqu))")
});

static OCCUPATION: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"\b(?i:was\s+an?|worked\s+as\s+an?|worked\s+as|by\s+trade\s+an?|était|exerçait\s+la\s+profession\s+de|de\s+profession|war)\s+(?P<value>\p{L}[\p{L}'’\-]*(?:\s+\p{L}[\p{L}'’\-]*){0,3})")
});

static RELIGION: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"\b(?P<value>(?i:roman\s+catholic|catholic|protestant|lutheran|calvinist|huguenot|anglican|methodist|presbyterian|mennonite|jewish|orthodox|catholique|protestante?|luthérienne?|réformée?|juive?|katholisch|evangelisch|jüdisch))\b")
});

static LEADING_NAME: LazyLock<Regex> = LazyLock::new(|| regex(&format!(r"^{NAME}")));

/// Heading name extraction with keyword-anchored prose.
///
/// Signal class `heading` for the heading name and lifespan, `narrative`
/// for prose phrases, `inferred` for a name taken from `<title>`.
pub struct NarrativeStrategy;

impl ExtractionStrategy for NarrativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Narrative
    }

    fn precondition(&self, doc: &Document<'_>) -> bool {
        if linked_tree::has_tree_sections(doc) {
            return false;
        }
        if find_heading_name(doc).is_some() {
            return true;
        }
        title_name(doc).is_some()
            && prose_blocks(doc, &[])
                .iter()
                .any(|block| has_anchored_phrase(&element_text(block)))
    }

    fn extract(&self, doc: &Document<'_>, builder: &mut RecordBuilder<'_>) {
        let body = doc.source().body_start();

        if let Some((name, lifespan)) = find_heading_name(doc) {
            builder.seek(body);
            builder.name(&name, "name.heading", SignalClass::Heading);
            if let Some(lifespan) = lifespan {
                write_lifespan(builder, &lifespan, SignalClass::Heading);
            }
        } else if let Some((name, lifespan)) = title_name(doc) {
            builder.seek(0);
            builder.name(&name, "name.title", SignalClass::Inferred);
            if let Some(lifespan) = lifespan {
                write_lifespan(builder, &lifespan, SignalClass::Inferred);
            }
            builder.seek(body);
        }

        let sources = source_sections(doc);
        for block in prose_blocks(doc, &sources) {
            read_prose(builder, &element_text(&block));
        }
        for item in sources.iter().filter(|el| el.value().name() == "li") {
            builder.source_citation(&element_text(item), SignalClass::Narrative);
        }
    }
}

/// Split a heading into a person's name and an optional lifespan.
///
/// Returns `None` when the text does not read as a name: digits left after
/// removing the lifespan, more than eight words, no surname, uncapitalised
/// words, or a field/section title such as "Biography".
///
/// # Examples
/// ```
/// use lignage_extractor::strategy::narrative::heading_name;
///
/// let (name, lifespan) = heading_name("Jean Dupont (1850–1920)").unwrap();
/// assert_eq!(name, "Jean Dupont");
/// assert_eq!(lifespan.as_deref(), Some("1850–1920"));
/// assert!(heading_name("Biography").is_none());
/// ```
#[must_use]
pub fn heading_name(text: &str) -> Option<(String, Option<String>)> {
    let text = text.trim();
    let (name, lifespan) = if let Some(caps) = LIFESPAN_PAREN.captures(text) {
        (caps.name("name")?.as_str(), caps.name("life").map(|m| m.as_str().to_string()))
    } else if let Some(caps) = LIFESPAN_TRAILING.captures(text) {
        (caps.name("name")?.as_str(), caps.name("life").map(|m| m.as_str().to_string()))
    } else {
        (text, None)
    };
    let name = name.trim().trim_end_matches(',').trim();

    if name.is_empty()
        || name.chars().any(|c| c.is_ascii_digit())
        || name.split_whitespace().count() > MAX_NAME_WORDS
        || match_label(name).is_some()
        || SECTION_TITLES.contains(&normalize_label(name).as_str())
    {
        return None;
    }

    let parts = parse_name(name);
    if parts.surname.is_none() || parts.given_names.is_empty() {
        return None;
    }
    let capitalised = parts
        .given_names
        .iter()
        .map(String::as_str)
        .chain(parts.surname.iter().flat_map(|s| s.split_whitespace()))
        .all(|word| is_name_word(word));
    capitalised.then(|| (name.to_string(), lifespan))
}

fn is_name_word(word: &str) -> bool {
    const PARTICLES: &[&str] = &[
        "de", "du", "des", "la", "le", "van", "von", "der", "den", "di", "da", "del", "della", "ten",
        "ter", "d'", "d’",
    ];
    PARTICLES.contains(&word)
        || word
            .trim_start_matches(['d', '\'', '’'])
            .chars()
            .find(|c| c.is_alphabetic())
            .is_some_and(char::is_uppercase)
}

/// The first heading that reads as a name.
fn find_heading_name(doc: &Document<'_>) -> Option<(String, Option<String>)> {
    doc.select(&HEADINGS)
        .find_map(|heading| heading_name(&element_text(&heading)))
}

/// A name from the first segment of the `<title>` element.
fn title_name(doc: &Document<'_>) -> Option<(String, Option<String>)> {
    let title = doc.title()?;
    let first = TITLE_SEPARATOR.split(&title).next()?;
    heading_name(first)
}

fn write_lifespan(builder: &mut RecordBuilder<'_>, text: &str, signal: SignalClass) {
    let lifespan = split_lifespan(text);
    if let Some(birth) = lifespan.birth {
        builder.event_date(Event::Birth, &text[birth], signal);
    }
    if let Some(death) = lifespan.death {
        builder.event_date(Event::Death, &text[death], signal);
    }
}

/// Whether the text carries a birth, death, parentage or marriage phrase.
pub(crate) fn has_anchored_phrase(text: &str) -> bool {
    [&*BIRTH, &*DEATH, &*PARENTS_EN, &*PARENTS_FR, &*SPOUSE]
        .iter()
        .any(|re| re.is_match(text))
}

/// Leaf prose blocks in document order, skipping `excluded` elements.
///
/// Falls back to the `<body>` when the page has no block elements.
pub(crate) fn prose_blocks<'d>(doc: &'d Document<'_>, excluded: &[ElementRef<'d>]) -> Vec<ElementRef<'d>> {
    let blocks: Vec<ElementRef<'d>> = doc
        .select(&PROSE)
        .filter(|block| !block.select(&PROSE).any(|inner| inner.id() != block.id()))
        .filter(|block| !excluded.iter().any(|e| e.id() == block.id()))
        .collect();
    if blocks.is_empty() && excluded.is_empty() {
        return doc.select(&BODY).collect();
    }
    blocks
}

/// Elements under a "Sources" heading: the following siblings up to the
/// next heading, and their descendants.
fn source_sections<'d>(doc: &'d Document<'_>) -> Vec<ElementRef<'d>> {
    let mut elements = Vec::new();
    for heading in doc.select(&HEADINGS) {
        if match_label(&element_text(&heading)) != Some(LabelKind::Source) {
            continue;
        }
        for sibling in following_section(&heading) {
            elements.push(sibling);
            elements.extend(sibling.select(&SECTION_ITEMS).filter(|el| el.id() != sibling.id()));
        }
    }
    elements
}

/// Run every anchored phrase pattern over one prose block.
pub(crate) fn read_prose(builder: &mut RecordBuilder<'_>, text: &str) {
    let signal = SignalClass::Narrative;

    for caps in BIRTH.captures_iter(text) {
        locate_match(builder, &caps);
        if let Some(marker) = caps.name("marker") {
            match marker.as_str().to_lowercase().as_str() {
                "née" | "nee" => builder.inferred_sex(Sex::Female, marker.as_str(), signal),
                "né" => builder.inferred_sex(Sex::Male, marker.as_str(), signal),
                _ => {}
            }
        }
        if let Some(value) = caps.name("value") {
            builder.event(Event::Birth, value.as_str(), signal);
        }
    }

    for caps in DEATH.captures_iter(text) {
        locate_match(builder, &caps);
        if let Some(value) = caps.name("value") {
            builder.event(Event::Death, value.as_str(), signal);
        }
    }

    for caps in PARENTS_EN.captures_iter(text).chain(PARENTS_FR.captures_iter(text)) {
        locate_match(builder, &caps);
        parentage(builder, &caps, signal);
    }

    for caps in PARENT_WAS.captures_iter(text) {
        locate_match(builder, &caps);
        let rel = caps.name("en").or_else(|| caps.name("fr")).map(|m| m.as_str().to_lowercase());
        if let Some(name) = caps.name("name") {
            match rel.as_deref() {
                Some("father" | "père") => builder.father(name.as_str(), signal),
                Some("mother" | "mère") => builder.mother(name.as_str(), signal),
                _ => {}
            }
        }
    }

    for caps in SPOUSE.captures_iter(text) {
        locate_match(builder, &caps);
        if let Some(name) = caps.name("name") {
            builder.relative_name(Relation::Spouse, name.as_str(), signal);
        }
    }

    for caps in CHILDREN.captures_iter(text) {
        locate_match(builder, &caps);
        if let Some(list) = caps.name("list") {
            name_list(builder, Relation::Child, list.as_str(), signal);
        }
    }

    for caps in SIBLINGS.captures_iter(text) {
        locate_match(builder, &caps);
        if let Some(list) = caps.name("list") {
            name_list(builder, Relation::Sibling, list.as_str(), signal);
        }
    }
    for caps in SIBLING.captures_iter(text) {
        locate_match(builder, &caps);
        if let Some(name) = caps.name("name") {
            builder.relative_name(Relation::Sibling, name.as_str(), signal);
        }
    }

    for caps in RESIDENCE.captures_iter(text) {
        locate_match(builder, &caps);
        if let Some(value) = caps.name("value") {
            builder.residence(value.as_str(), signal);
        }
    }

    if builder.record().occupation.is_none() {
        for caps in OCCUPATION.captures_iter(text) {
            let Some(value) = caps.name("value") else { continue };
            if let Some(profession) = known_profession(builder, value.as_str()) {
                locate_match(builder, &caps);
                builder.occupation(&profession, signal);
                break;
            }
        }
    }

    if let Some(caps) = RELIGION.captures(text) {
        locate_match(builder, &caps);
        if let Some(value) = caps.name("value") {
            builder.religion(value.as_str(), signal);
        }
    }
}

fn locate_match(builder: &mut RecordBuilder<'_>, caps: &Captures<'_>) {
    if let Some(whole) = caps.get(0) {
        builder.locate(whole.as_str());
    }
}

fn parentage(builder: &mut RecordBuilder<'_>, caps: &Captures<'_>, signal: SignalClass) {
    if let Some(rel) = caps.name("rel") {
        let word = rel.as_str().split_whitespace().next().unwrap_or_default();
        match word.to_lowercase().as_str() {
            "son" | "fils" => builder.inferred_sex(Sex::Male, word, signal),
            "daughter" | "fille" => builder.inferred_sex(Sex::Female, word, signal),
            _ => {}
        }
    }
    match (caps.name("first"), caps.name("second")) {
        (Some(father), Some(mother)) => {
            builder.father(father.as_str(), signal);
            builder.mother(mother.as_str(), signal);
        }
        (Some(parent), None) => builder.relative_name(Relation::Parent, parent.as_str(), signal),
        _ => {}
    }
}

/// Add the names of a free-text list, keeping only the leading name of
/// each entry (`"Pierre (1876)"` → `"Pierre"`).
fn name_list(builder: &mut RecordBuilder<'_>, relation: Relation, list: &str, signal: SignalClass) {
    for entry in parse_relationship_list(list) {
        if let Some(name) = LEADING_NAME.find(&entry) {
            builder.relative_name(relation, name.as_str(), signal);
        }
    }
}

/// Longest leading run of words that the profession dictionary recognises.
fn known_profession(builder: &RecordBuilder<'_>, value: &str) -> Option<String> {
    let words: Vec<&str> = value.split_whitespace().collect();
    (1..=words.len()).rev().find_map(|n| {
        let candidate = words[..n].join(" ");
        parse_profession(&candidate, builder.professions())
            .profession
            .map(|_| candidate)
    })
}
