//! Profession canonicalization.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dictionary::{lenient_definitions, push_unique, split_fragments, AliasIndex, Definition};

/// A canonical profession with its alternative spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionDefinition {
    pub label: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ProfessionDefinition {
    #[must_use]
    pub fn new(label: &str, aliases: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

impl Definition for ProfessionDefinition {
    fn label(&self) -> &str {
        &self.label
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// Result of [`parse_profession`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedProfession {
    /// Canonical labels joined with `", "`, absent when nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    pub tokens: Vec<String>,
}

/// Separators between profession fragments.
const PROFESSION_SEPARATORS: &[char] = &[',', ';', '/'];

static BUILTIN_PROFESSIONS: LazyLock<Vec<ProfessionDefinition>> =
    LazyLock::new(builtin_profession_definitions);

static BUILTIN_PROFESSION_INDEX: LazyLock<AliasIndex<'static, ProfessionDefinition>> =
    LazyLock::new(|| AliasIndex::new(BUILTIN_PROFESSIONS.as_slice()));

/// Canonicalize a profession string.
///
/// Same algorithm as [`super::parse_place`], with `/` as an extra separator.
///
/// # Examples
/// ```
/// use lignage_extractor::canon::parse_profession;
///
/// let parsed = parse_profession("cultivateur / tisserand", None);
/// assert_eq!(parsed.tokens, vec!["Farmer", "Weaver"]);
/// assert_eq!(parsed.profession.as_deref(), Some("Farmer, Weaver"));
/// ```
pub fn parse_profession(text: &str, definitions: Option<&[ProfessionDefinition]>) -> ParsedProfession {
    match definitions {
        Some(defs) => parse_with(text, &AliasIndex::new(defs)),
        None => parse_with(text, &BUILTIN_PROFESSION_INDEX),
    }
}

fn parse_with(text: &str, index: &AliasIndex<'_, ProfessionDefinition>) -> ParsedProfession {
    let mut parsed = ParsedProfession::default();
    for (_, fragment) in split_fragments(text, PROFESSION_SEPARATORS) {
        if let Some(definition) = index.lookup(fragment) {
            push_unique(&mut parsed.tokens, &definition.label);
        }
    }
    if !parsed.tokens.is_empty() {
        parsed.profession = Some(parsed.tokens.join(", "));
    }
    parsed
}

/// Decode caller-supplied profession definitions from JSON, skipping
/// malformed entries.
pub fn profession_definitions_from_json(value: &Value) -> Vec<ProfessionDefinition> {
    lenient_definitions(value, "professions", |_, label, aliases| ProfessionDefinition {
        label,
        aliases,
    })
}

/// The built-in template profession taxonomy.
#[must_use]
pub fn builtin_professions() -> &'static [ProfessionDefinition] {
    BUILTIN_PROFESSIONS.as_slice()
}

fn builtin_profession_definitions() -> Vec<ProfessionDefinition> {
    vec![
        ProfessionDefinition::new("Farmer", &["cultivateur", "cultivatrice", "agriculteur", "laboureur", "fermier", "fermière", "Landwirt", "Bauer", "Ackerer", "husbandman"]),
        ProfessionDefinition::new("Farm labourer", &["farm laborer", "agricultural labourer", "journalier", "journalière", "ouvrier agricole", "Tagelöhner", "Knecht"]),
        ProfessionDefinition::new("Day labourer", &["day laborer", "labourer", "laborer", "manouvrier", "manœuvre"]),
        ProfessionDefinition::new("Wine grower", &["vine grower", "winegrower", "vigneron", "vigneronne", "Winzer", "Weinbauer"]),
        ProfessionDefinition::new("Carpenter", &["charpentier", "Zimmermann"]),
        ProfessionDefinition::new("Joiner", &["menuisier", "ébéniste", "cabinetmaker", "Tischler", "Schreiner"]),
        ProfessionDefinition::new("Blacksmith", &["smith", "forgeron", "maréchal-ferrant", "maréchal", "farrier", "Schmied", "Hufschmied"]),
        ProfessionDefinition::new("Baker", &["boulanger", "boulangère", "Bäcker"]),
        ProfessionDefinition::new("Butcher", &["boucher", "bouchère", "Metzger", "Fleischer"]),
        ProfessionDefinition::new("Shoemaker", &["cordonnier", "bottier", "cobbler", "Schuhmacher", "Schuster"]),
        ProfessionDefinition::new("Tailor", &["tailleur", "tailleur d'habits", "Schneider"]),
        ProfessionDefinition::new("Seamstress", &["couturière", "dressmaker", "lingère", "Näherin", "Schneiderin"]),
        ProfessionDefinition::new("Weaver", &["tisserand", "tisserande", "tissier", "Weber"]),
        ProfessionDefinition::new("Miller", &["meunier", "meunière", "Müller"]),
        ProfessionDefinition::new("Mason", &["stonemason", "maçon", "tailleur de pierre", "Maurer", "Steinmetz"]),
        ProfessionDefinition::new("Cooper", &["tonnelier", "Böttcher", "Küfer"]),
        ProfessionDefinition::new("Merchant", &["trader", "dealer", "marchand", "marchande", "négociant", "commerçant", "Kaufmann", "Händler"]),
        ProfessionDefinition::new("Innkeeper", &["publican", "aubergiste", "cabaretier", "hôtelier", "Wirt", "Gastwirt"]),
        ProfessionDefinition::new("Teacher", &["schoolmaster", "schoolteacher", "instituteur", "institutrice", "enseignant", "professeur", "Lehrer", "Lehrerin"]),
        ProfessionDefinition::new("Priest", &["clergyman", "curé", "prêtre", "vicaire", "abbé", "Pfarrer", "Priester", "Pastor"]),
        ProfessionDefinition::new("Soldier", &["soldat", "militaire", "fusilier", "Soldat", "Musketier"]),
        ProfessionDefinition::new("Sailor", &["mariner", "seaman", "marin", "matelot", "Seemann", "Matrose"]),
        ProfessionDefinition::new("Fisherman", &["pêcheur", "Fischer"]),
        ProfessionDefinition::new("Miner", &["coal miner", "mineur", "houilleur", "Bergmann", "Bergarbeiter"]),
        ProfessionDefinition::new("Servant", &["domestic servant", "maid", "domestique", "servante", "serviteur", "Magd", "Dienstmagd", "Dienstbote"]),
        ProfessionDefinition::new("Laundress", &["washerwoman", "blanchisseuse", "lavandière", "Wäscherin"]),
        ProfessionDefinition::new("Gardener", &["jardinier", "Gärtner"]),
        ProfessionDefinition::new("Coachman", &["carter", "cocher", "charretier", "voiturier", "Kutscher", "Fuhrmann"]),
        ProfessionDefinition::new("Notary", &["notaire", "Notar"]),
        ProfessionDefinition::new("Physician", &["doctor", "médecin", "docteur en médecine", "Arzt"]),
        ProfessionDefinition::new("Clerk", &["employé", "commis", "Angestellter", "Schreiber"]),
        ProfessionDefinition::new("Factory worker", &["worker", "ouvrier", "ouvrière", "Arbeiter", "Fabrikarbeiter"]),
        ProfessionDefinition::new("Railway worker", &["railwayman", "cheminot", "Eisenbahner"]),
        ProfessionDefinition::new("Landowner", &["propriétaire", "Gutsbesitzer", "Grundbesitzer"]),
        ProfessionDefinition::new("Annuitant", &["rentier", "rentière", "of independent means"]),
        ProfessionDefinition::new("Mayor", &["maire", "Bürgermeister"]),
        ProfessionDefinition::new("Housewife", &["ménagère", "sans profession", "Hausfrau"]),
    ]
}
