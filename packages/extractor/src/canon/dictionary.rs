//! Alias lookup shared by the place and profession canonicalizers.

use std::collections::HashMap;
use std::ops::Range;

use serde_json::{Map, Value};

use crate::normalize::{collapse_spaces, normalize_token};

/// A dictionary entry: one canonical label plus alternative spellings.
pub trait Definition {
    fn label(&self) -> &str;
    fn aliases(&self) -> &[String];
}

/// Normalized alias → definition index.
///
/// Keys are built from [`normalize_token`] with a secondary
/// [`collapse_spaces`] key. When two definitions claim the same key the one
/// listed first wins.
#[derive(Debug)]
pub struct AliasIndex<'a, D> {
    primary: HashMap<String, &'a D>,
    secondary: HashMap<String, &'a D>,
}

impl<'a, D: Definition> AliasIndex<'a, D> {
    /// Build the index over a definitions list.
    pub fn new(definitions: &'a [D]) -> Self {
        let mut primary = HashMap::new();
        let mut secondary = HashMap::new();

        for definition in definitions {
            let spellings = std::iter::once(definition.label())
                .chain(definition.aliases().iter().map(String::as_str));
            for spelling in spellings {
                let key = normalize_token(spelling);
                if key.is_empty() {
                    continue;
                }
                primary.entry(key).or_insert(definition);
                secondary
                    .entry(collapse_spaces(spelling))
                    .or_insert(definition);
            }
        }

        Self { primary, secondary }
    }

    /// Resolve a fragment to its definition, if any.
    pub fn lookup(&self, fragment: &str) -> Option<&'a D> {
        let key = normalize_token(fragment);
        if key.is_empty() {
            return None;
        }
        self.primary
            .get(&key)
            .or_else(|| self.secondary.get(&collapse_spaces(fragment)))
            .copied()
    }
}

/// Split text on separator characters into trimmed, non-empty fragments
/// with their byte ranges in the input.
pub fn split_fragments<'t>(
    text: &'t str,
    separators: &'t [char],
) -> impl Iterator<Item = (Range<usize>, &'t str)> + 't {
    let mut offset = 0;
    text.split(separators).filter_map(move |piece| {
        let start = offset;
        offset += piece.len() + 1;

        let leading = piece.len() - piece.trim_start().len();
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            None
        } else {
            let begin = start + leading;
            Some((begin..begin + trimmed.len(), trimmed))
        }
    })
}

/// Push a label unless already present.
pub fn push_unique(tokens: &mut Vec<String>, label: &str) {
    if !tokens.iter().any(|t| t == label) {
        tokens.push(label.to_string());
    }
}

/// Decode a JSON array of definition objects, skipping malformed entries.
///
/// `build` receives each entry's object together with its validated label
/// and aliases. Entries that are not objects, have no string `label`, or
/// carry an `aliases` value that is not an array of strings are skipped.
pub fn lenient_definitions<D>(
    value: &Value,
    kind: &str,
    build: impl Fn(&Map<String, Value>, String, Vec<String>) -> D,
) -> Vec<D> {
    let Some(entries) = value.as_array() else {
        tracing::debug!(kind, "Custom dictionary is not a JSON array, ignoring");
        return Vec::new();
    };

    let mut definitions = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(object) = entry.as_object() else {
            tracing::debug!(kind, index, "Skipping dictionary entry that is not an object");
            continue;
        };

        let Some(label) = object
            .get("label")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|l| !l.is_empty())
        else {
            tracing::debug!(kind, index, "Skipping dictionary entry without a label");
            continue;
        };

        let aliases = match object.get("aliases") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let strings: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect();
                let Some(strings) = strings else {
                    tracing::debug!(kind, index, label, "Skipping entry with non-string aliases");
                    continue;
                };
                strings
            }
            Some(_) => {
                tracing::debug!(kind, index, label, "Skipping entry whose aliases are not a list");
                continue;
            }
        };

        definitions.push(build(object, label.to_string(), aliases));
    }
    definitions
}
