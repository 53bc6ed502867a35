//! Multilingual field-label dictionary (EN/FR/DE).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::normalize_label;

/// Record field a label names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Name,
    GivenNames,
    Surname,
    MaidenName,
    Alias,
    Sex,
    Birth,
    BirthDate,
    BirthPlace,
    Death,
    DeathDate,
    DeathPlace,
    Residence,
    Father,
    Mother,
    Parents,
    Spouse,
    Children,
    Siblings,
    Occupation,
    Religion,
    Notes,
    Source,
}

impl LabelKind {
    /// Whether the label introduces related people.
    #[must_use]
    pub fn is_relation(self) -> bool {
        matches!(
            self,
            Self::Father | Self::Mother | Self::Parents | Self::Spouse | Self::Children | Self::Siblings
        )
    }
}

const LABELS: &[(LabelKind, &[&str])] = &[
    (
        LabelKind::Name,
        &["name", "full name", "individual", "person", "nom complet", "nom et prénoms", "personne", "vollständiger name"],
    ),
    (
        LabelKind::GivenNames,
        &["given name", "given names", "first name", "first names", "forename", "forenames", "christian name", "prénom", "prénoms", "vorname", "vornamen", "taufname"],
    ),
    (
        LabelKind::Surname,
        &["surname", "last name", "family name", "nom", "nom de famille", "patronyme", "nachname", "familienname", "zuname"],
    ),
    (
        LabelKind::MaidenName,
        &["maiden name", "née", "birth name", "nom de jeune fille", "nom de naissance", "geburtsname", "mädchenname", "geborene"],
    ),
    (
        LabelKind::Alias,
        &["alias", "aliases", "nickname", "also known as", "aka", "dit", "surnom", "spitzname", "rufname"],
    ),
    (LabelKind::Sex, &["sex", "gender", "sexe", "genre", "geschlecht"]),
    (
        LabelKind::Birth,
        &["birth", "born", "birth and baptism", "naissance", "né", "né le", "née le", "né(e)", "geboren", "geburt"],
    ),
    (
        LabelKind::BirthDate,
        &["birth date", "date of birth", "dob", "date de naissance", "geburtsdatum", "geburtstag"],
    ),
    (
        LabelKind::BirthPlace,
        &["birth place", "birthplace", "place of birth", "lieu de naissance", "geburtsort"],
    ),
    (
        LabelKind::Death,
        &["death", "died", "deceased", "décès", "décédé", "décédée", "mort", "gestorben", "tod", "sterbefall"],
    ),
    (
        LabelKind::DeathDate,
        &["death date", "date of death", "date de décès", "sterbedatum", "todesdatum", "todestag"],
    ),
    (
        LabelKind::DeathPlace,
        &["death place", "place of death", "lieu de décès", "sterbeort"],
    ),
    (
        LabelKind::Residence,
        &["residence", "residences", "lived", "lived in", "address", "abode", "résidence", "domicile", "demeurant", "adresse", "wohnort", "wohnhaft", "wohnsitz"],
    ),
    (LabelKind::Father, &["father", "père", "vater"]),
    (LabelKind::Mother, &["mother", "mère", "mutter"]),
    (LabelKind::Parents, &["parents", "eltern"]),
    (
        LabelKind::Spouse,
        &["spouse", "spouses", "husband", "wife", "married", "marriage", "conjoint", "conjointe", "époux", "épouse", "mari", "marié à", "mariée à", "ehepartner", "ehemann", "ehefrau", "gatte", "gattin", "heirat"],
    ),
    (
        LabelKind::Children,
        &["children", "child", "issue", "enfants", "enfant", "kinder", "kind"],
    ),
    (
        LabelKind::Siblings,
        &["siblings", "brothers and sisters", "brothers", "sisters", "frères et sœurs", "frères et soeurs", "fratrie", "geschwister"],
    ),
    (
        LabelKind::Occupation,
        &["occupation", "profession", "trade", "job", "métier", "état", "qualité", "beruf", "stand", "tätigkeit"],
    ),
    (LabelKind::Religion, &["religion", "confession", "denomination", "faith", "culte", "konfession", "bekenntnis"]),
    (
        LabelKind::Notes,
        &["notes", "note", "remarks", "comments", "biography", "remarques", "observations", "commentaires", "bemerkungen", "anmerkungen"],
    ),
    (
        LabelKind::Source,
        &["source", "sources", "citation", "citations", "reference", "references", "références", "quelle", "quellen"],
    ),
];

static LABEL_INDEX: LazyLock<HashMap<String, LabelKind>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for (kind, spellings) in LABELS {
        for spelling in *spellings {
            index.entry(normalize_label(spelling)).or_insert(*kind);
        }
    }
    index
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));

/// Match a label cell's text against the dictionary.
///
/// Parenthetical qualifiers are ignored as a fallback, so `"Birth (baptism)"`
/// still resolves to [`LabelKind::Birth`].
///
/// # Examples
/// ```
/// use lignage_extractor::strategy::labels::{match_label, LabelKind};
///
/// assert_eq!(match_label("Date de naissance :"), Some(LabelKind::BirthDate));
/// assert_eq!(match_label("Vater"), Some(LabelKind::Father));
/// assert_eq!(match_label("Favourite colour"), None);
/// ```
#[must_use]
pub fn match_label(text: &str) -> Option<LabelKind> {
    if text.chars().count() > 60 {
        return None;
    }
    let key = normalize_label(text);
    if let Some(kind) = LABEL_INDEX.get(&key) {
        return Some(*kind);
    }
    let stripped = PARENTHETICAL.replace_all(text, " ");
    if stripped != text {
        return LABEL_INDEX.get(&normalize_label(&stripped)).copied();
    }
    None
}
