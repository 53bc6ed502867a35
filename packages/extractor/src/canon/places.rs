//! Place canonicalization.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dictionary::{lenient_definitions, push_unique, split_fragments, AliasIndex, Definition};

/// Kind of place a definition names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceCategory {
    Country,
    Region,
    Department,
    City,
    Territory,
}

impl PlaceCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::Department => "department",
            Self::City => "city",
            Self::Territory => "territory",
        }
    }

    /// Parse a category name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "country" => Some(Self::Country),
            "region" => Some(Self::Region),
            "department" => Some(Self::Department),
            "city" => Some(Self::City),
            "territory" => Some(Self::Territory),
            _ => None,
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical place with its alternative spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDefinition {
    pub label: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PlaceCategory>,
}

impl PlaceDefinition {
    #[must_use]
    pub fn new(label: &str, category: PlaceCategory, aliases: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            category: Some(category),
        }
    }
}

impl Definition for PlaceDefinition {
    fn label(&self) -> &str {
        &self.label
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// One recognised fragment of a place string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceMatch {
    /// Fragment text exactly as written in the input.
    pub fragment: String,
    /// Canonical label it resolved to.
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<PlaceCategory>,
    /// Byte offset of the fragment in the parsed text.
    pub start: usize,
    pub end: usize,
}

/// Result of [`parse_place`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedPlace {
    /// Canonical labels joined with `", "`, absent when nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    /// De-duplicated canonical labels in first-seen order.
    pub tokens: Vec<String>,
    pub matches: Vec<PlaceMatch>,
}

/// Separators between place fragments.
const PLACE_SEPARATORS: &[char] = &[',', ';'];

static BUILTIN_PLACES: LazyLock<Vec<PlaceDefinition>> = LazyLock::new(builtin_place_definitions);

static BUILTIN_PLACE_INDEX: LazyLock<AliasIndex<'static, PlaceDefinition>> =
    LazyLock::new(|| AliasIndex::new(BUILTIN_PLACES.as_slice()));

/// Canonicalize a place string.
///
/// The text is split on `,` and `;`; each fragment is looked up in the
/// definitions (the built-in list when `definitions` is `None`). Unmatched
/// fragments are dropped silently.
///
/// # Examples
/// ```
/// use lignage_extractor::canon::{parse_place, PlaceCategory};
///
/// let parsed = parse_place("Paris, France", None);
/// assert_eq!(parsed.tokens, vec!["France"]);
/// assert_eq!(parsed.matches[0].fragment, "France");
/// assert_eq!(parsed.matches[0].category, Some(PlaceCategory::Country));
/// ```
pub fn parse_place(text: &str, definitions: Option<&[PlaceDefinition]>) -> ParsedPlace {
    match definitions {
        Some(defs) => parse_with(text, &AliasIndex::new(defs)),
        None => parse_with(text, &BUILTIN_PLACE_INDEX),
    }
}

fn parse_with(text: &str, index: &AliasIndex<'_, PlaceDefinition>) -> ParsedPlace {
    let mut parsed = ParsedPlace::default();

    for (range, fragment) in split_fragments(text, PLACE_SEPARATORS) {
        let Some(definition) = index.lookup(fragment) else {
            continue;
        };
        push_unique(&mut parsed.tokens, &definition.label);
        parsed.matches.push(PlaceMatch {
            fragment: fragment.to_string(),
            label: definition.label.clone(),
            category: definition.category,
            start: range.start,
            end: range.end,
        });
    }

    if !parsed.tokens.is_empty() {
        parsed.place = Some(parsed.tokens.join(", "));
    }
    parsed
}

/// Decode caller-supplied place definitions from JSON.
///
/// Malformed entries are skipped; an unknown `category` is dropped while
/// the entry is kept.
pub fn place_definitions_from_json(value: &Value) -> Vec<PlaceDefinition> {
    lenient_definitions(value, "places", |object, label, aliases| PlaceDefinition {
        label,
        aliases,
        category: object
            .get("category")
            .and_then(Value::as_str)
            .and_then(PlaceCategory::from_name),
    })
}

/// The built-in template place list.
#[must_use]
pub fn builtin_places() -> &'static [PlaceDefinition] {
    BUILTIN_PLACES.as_slice()
}

fn builtin_place_definitions() -> Vec<PlaceDefinition> {
    use PlaceCategory::{City, Country, Department, Region, Territory};

    vec![
        // Countries
        PlaceDefinition::new("France", Country, &["République française", "Frankreich", "Francia"]),
        PlaceDefinition::new("Belgium", Country, &["Belgique", "België", "Belgien"]),
        PlaceDefinition::new("Germany", Country, &["Allemagne", "Deutschland", "Deutsches Reich"]),
        PlaceDefinition::new("Switzerland", Country, &["Suisse", "Schweiz", "Svizzera"]),
        PlaceDefinition::new("Italy", Country, &["Italie", "Italia", "Italien"]),
        PlaceDefinition::new("Spain", Country, &["Espagne", "España", "Spanien"]),
        PlaceDefinition::new("Luxembourg", Country, &["Luxemburg"]),
        PlaceDefinition::new("Netherlands", Country, &["Pays-Bas", "Nederland", "Niederlande", "Holland"]),
        PlaceDefinition::new("Austria", Country, &["Autriche", "Österreich"]),
        PlaceDefinition::new("Poland", Country, &["Pologne", "Polen", "Polska"]),
        PlaceDefinition::new("United Kingdom", Country, &["UK", "Royaume-Uni", "Great Britain", "Grande-Bretagne"]),
        PlaceDefinition::new("England", Country, &["Angleterre"]),
        PlaceDefinition::new("Ireland", Country, &["Irlande", "Irland", "Éire"]),
        PlaceDefinition::new(
            "United States",
            Country,
            &["USA", "United States of America", "États-Unis", "Etats-Unis d'Amérique", "Vereinigte Staaten"],
        ),
        PlaceDefinition::new("Canada", Country, &["Kanada"]),
        PlaceDefinition::new("Algeria", Country, &["Algérie", "Algerien"]),
        // Regions
        PlaceDefinition::new("Île-de-France", Region, &["Ile de France", "IDF"]),
        PlaceDefinition::new("Bretagne", Region, &["Brittany", "Bretagne"]),
        PlaceDefinition::new("Normandie", Region, &["Normandy"]),
        PlaceDefinition::new("Alsace", Region, &["Elsass"]),
        PlaceDefinition::new("Lorraine", Region, &["Lothringen"]),
        PlaceDefinition::new("Provence", Region, &[]),
        PlaceDefinition::new("Bourgogne", Region, &["Burgundy", "Burgund"]),
        PlaceDefinition::new("Auvergne", Region, &[]),
        PlaceDefinition::new("Aquitaine", Region, &[]),
        PlaceDefinition::new("Picardie", Region, &["Picardy"]),
        PlaceDefinition::new("Champagne", Region, &[]),
        PlaceDefinition::new("Savoie", Region, &["Savoy", "Savoyen"]),
        PlaceDefinition::new("Corse", Region, &["Corsica", "Korsika"]),
        PlaceDefinition::new("Languedoc", Region, &[]),
        PlaceDefinition::new("Limousin", Region, &[]),
        PlaceDefinition::new("Poitou", Region, &[]),
        PlaceDefinition::new("Bavaria", Region, &["Bayern", "Bavière"]),
        PlaceDefinition::new("Saxony", Region, &["Sachsen", "Saxe"]),
        PlaceDefinition::new("Prussia", Region, &["Preußen", "Preussen", "Prusse"]),
        PlaceDefinition::new("Wallonia", Region, &["Wallonie"]),
        PlaceDefinition::new("Flanders", Region, &["Flandre", "Vlaanderen", "Flandern"]),
        PlaceDefinition::new("Piedmont", Region, &["Piemonte", "Piémont"]),
        PlaceDefinition::new("Catalonia", Region, &["Catalunya", "Catalogne", "Katalonien"]),
        PlaceDefinition::new("Quebec", Region, &["Québec"]),
        // Departments
        PlaceDefinition::new("Seine", Department, &[]),
        PlaceDefinition::new("Seine-et-Oise", Department, &[]),
        PlaceDefinition::new("Rhône", Department, &[]),
        PlaceDefinition::new("Gironde", Department, &[]),
        PlaceDefinition::new("Nord", Department, &[]),
        PlaceDefinition::new("Pas-de-Calais", Department, &[]),
        PlaceDefinition::new("Finistère", Department, &[]),
        PlaceDefinition::new("Morbihan", Department, &[]),
        PlaceDefinition::new("Ille-et-Vilaine", Department, &[]),
        PlaceDefinition::new("Loire-Atlantique", Department, &["Loire-Inférieure"]),
        PlaceDefinition::new("Calvados", Department, &[]),
        PlaceDefinition::new("Manche", Department, &[]),
        PlaceDefinition::new("Vendée", Department, &[]),
        PlaceDefinition::new("Bas-Rhin", Department, &[]),
        PlaceDefinition::new("Haut-Rhin", Department, &[]),
        PlaceDefinition::new("Moselle", Department, &[]),
        PlaceDefinition::new("Bouches-du-Rhône", Department, &[]),
        PlaceDefinition::new("Côte-d'Or", Department, &[]),
        PlaceDefinition::new("Puy-de-Dôme", Department, &[]),
        PlaceDefinition::new("Haute-Savoie", Department, &[]),
        // Overseas territories
        PlaceDefinition::new("Martinique", Territory, &[]),
        PlaceDefinition::new("Guadeloupe", Territory, &[]),
        PlaceDefinition::new("La Réunion", Territory, &["Réunion", "Île Bourbon"]),
        PlaceDefinition::new("Guyane", Territory, &["French Guiana", "Guyane française"]),
        PlaceDefinition::new("Nouvelle-Calédonie", Territory, &["New Caledonia"]),
        // Cities
        PlaceDefinition::new("Lyon", City, &["Lyons"]),
        PlaceDefinition::new("Marseille", City, &["Marseilles"]),
        PlaceDefinition::new("Bordeaux", City, &[]),
        PlaceDefinition::new("Strasbourg", City, &["Straßburg", "Strassburg"]),
        PlaceDefinition::new("Lille", City, &[]),
        PlaceDefinition::new("Nantes", City, &[]),
        PlaceDefinition::new("Toulouse", City, &[]),
        PlaceDefinition::new("Brussels", City, &["Bruxelles", "Brussel", "Brüssel"]),
        PlaceDefinition::new("Geneva", City, &["Genève", "Genf", "Ginevra"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_place_country_only() {
        let parsed = parse_place("Paris, France", None);
        assert_eq!(parsed.tokens, vec!["France".to_string()]);
        assert_eq!(parsed.place.as_deref(), Some("France"));
        assert_eq!(parsed.matches.len(), 1);
        assert_eq!(parsed.matches[0].fragment, "France");
        assert_eq!(parsed.matches[0].category, Some(PlaceCategory::Country));
        assert_eq!(parsed.matches[0].start, 7);
    }

    #[test]
    fn test_parse_place_alias_idempotence() {
        for alias in ["Frankreich", "république française", "FRANCE"] {
            assert_eq!(parse_place(alias, None).tokens, parse_place("France", None).tokens);
        }
        assert_eq!(
            parse_place("Ile-de-France", None).tokens,
            parse_place("Île de France", None).tokens
        );
    }

    #[test]
    fn test_parse_place_multiple_levels() {
        let parsed = parse_place("Lyon; Rhône, France, France", None);
        assert_eq!(parsed.tokens, vec!["Lyon", "Rhône", "France"]);
        assert_eq!(parsed.place.as_deref(), Some("Lyon, Rhône, France"));
        assert_eq!(parsed.matches.len(), 4);
        assert_eq!(parsed.matches[1].category, Some(PlaceCategory::Department));
    }

    #[test]
    fn test_parse_place_unmatched() {
        let parsed = parse_place("Trifouillis-les-Oies", None);
        assert!(parsed.place.is_none());
        assert!(parsed.tokens.is_empty());
        assert!(parsed.matches.is_empty());
    }

    #[test]
    fn test_custom_definitions_replace_builtins() {
        let defs = vec![PlaceDefinition::new("Paris", PlaceCategory::City, &["Lutèce"])];
        let parsed = parse_place("Lutece, France", Some(&defs));
        assert_eq!(parsed.tokens, vec!["Paris".to_string()]);
        assert_eq!(parsed.matches[0].category, Some(PlaceCategory::City));
    }

    #[test]
    fn test_place_definitions_from_json() {
        let value = serde_json::json!([
            {"label": "Paris", "aliases": ["Lutèce"], "category": "city"},
            {"label": "Atlantis", "category": "myth"},
            42
        ]);
        let defs = place_definitions_from_json(&value);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].category, Some(PlaceCategory::City));
        assert_eq!(defs[1].category, None);
    }
}
