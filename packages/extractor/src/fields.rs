//! Field descriptor table for generic access to record fields.
//!
//! Each editable field of [`IndividualRecord`] has a descriptor with a
//! stable key, a display label and a typed getter/setter pair over JSON
//! values. Editors and the summary view iterate the table instead of
//! matching on keys.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ExtractorError, Result};
use crate::types::IndividualRecord;

/// Identifier of an editable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    SourceUrl,
    GivenNames,
    Surname,
    MaidenName,
    Aliases,
    Sex,
    Birth,
    BirthPlace,
    Death,
    DeathPlace,
    Residences,
    Father,
    Mother,
    Spouses,
    Children,
    Siblings,
    Occupation,
    Religion,
    Notes,
    Sources,
}

impl FieldId {
    /// The descriptor of this field.
    #[must_use]
    pub fn descriptor(self) -> &'static FieldDescriptor {
        // Every variant has exactly one entry, in declaration order.
        &FIELDS[self as usize]
    }

    /// Stable key used in JSON patches (`"parents.father"`).
    #[must_use]
    pub fn key(self) -> &'static str {
        self.descriptor().key
    }
}

/// Getter/setter pair for one field.
pub struct FieldDescriptor {
    pub id: FieldId,
    pub key: &'static str,
    pub label: &'static str,
    /// Current value as JSON (`null` or `[]` when absent).
    pub get: fn(&IndividualRecord) -> Value,
    /// Replace the value; fails when the JSON has the wrong shape.
    pub set: fn(&mut IndividualRecord, Value) -> Result<()>,
}

const TEXT: &str = "a string or null";
const TEXT_LIST: &str = "an array of strings";
const DATE: &str = "a date fragment object";

/// All editable fields, in display order.
pub const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        id: FieldId::SourceUrl,
        key: "sourceUrl",
        label: "Source URL",
        get: |r| to_json(&r.source_url),
        set: |r, v| {
            r.source_url = text("sourceUrl", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::GivenNames,
        key: "givenNames",
        label: "Given names",
        get: |r| to_json(&r.given_names),
        set: |r, v| {
            r.given_names = text_list("givenNames", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Surname,
        key: "surname",
        label: "Surname",
        get: |r| to_json(&r.surname),
        set: |r, v| {
            r.surname = text("surname", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::MaidenName,
        key: "maidenName",
        label: "Maiden name",
        get: |r| to_json(&r.maiden_name),
        set: |r, v| {
            r.maiden_name = text("maidenName", v)?;
            if r.maiden_name.is_none() {
                r.maiden_marker = None;
            }
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Aliases,
        key: "aliases",
        label: "Also known as",
        get: |r| to_json(&r.aliases),
        set: |r, v| {
            let mut aliases: Vec<String> = Vec::new();
            for alias in text_list("aliases", v)? {
                if !aliases.contains(&alias) {
                    aliases.push(alias);
                }
            }
            r.aliases = aliases;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Sex,
        key: "sex",
        label: "Sex",
        get: |r| to_json(&r.sex),
        set: |r, v| {
            r.sex = typed("sex", v, "\"M\", \"F\", \"U\" or null")?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Birth,
        key: "birth",
        label: "Birth",
        get: |r| to_json(&r.birth),
        set: |r, v| {
            r.birth = typed::<Option<_>>("birth", v, DATE)?.unwrap_or_default();
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::BirthPlace,
        key: "birthPlace",
        label: "Birth place",
        get: |r| to_json(&r.birth_place),
        set: |r, v| {
            r.birth_place = text("birthPlace", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Death,
        key: "death",
        label: "Death",
        get: |r| to_json(&r.death),
        set: |r, v| {
            r.death = typed::<Option<_>>("death", v, DATE)?.unwrap_or_default();
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::DeathPlace,
        key: "deathPlace",
        label: "Death place",
        get: |r| to_json(&r.death_place),
        set: |r, v| {
            r.death_place = text("deathPlace", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Residences,
        key: "residences",
        label: "Residences",
        get: |r| to_json(&r.residences),
        set: |r, v| {
            let residences: Vec<crate::types::Residence> =
                typed::<Option<_>>("residences", v, "an array of residence objects")?.unwrap_or_default();
            r.residences = residences.into_iter().filter(|res| !res.is_empty()).collect();
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Father,
        key: "parents.father",
        label: "Father",
        get: |r| to_json(&r.parents.father),
        set: |r, v| {
            r.parents.father = text("parents.father", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Mother,
        key: "parents.mother",
        label: "Mother",
        get: |r| to_json(&r.parents.mother),
        set: |r, v| {
            r.parents.mother = text("parents.mother", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Spouses,
        key: "spouses",
        label: "Spouses",
        get: |r| to_json(&r.spouses),
        set: |r, v| {
            r.spouses = text_list("spouses", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Children,
        key: "children",
        label: "Children",
        get: |r| to_json(&r.children),
        set: |r, v| {
            r.children = text_list("children", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Siblings,
        key: "siblings",
        label: "Siblings",
        get: |r| to_json(&r.siblings),
        set: |r, v| {
            r.siblings = text_list("siblings", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Occupation,
        key: "occupation",
        label: "Occupation",
        get: |r| to_json(&r.occupation),
        set: |r, v| {
            r.occupation = text("occupation", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Religion,
        key: "religion",
        label: "Religion",
        get: |r| to_json(&r.religion),
        set: |r, v| {
            r.religion = text("religion", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Notes,
        key: "notes",
        label: "Notes",
        get: |r| to_json(&r.notes),
        set: |r, v| {
            r.notes = text("notes", v)?;
            Ok(())
        },
    },
    FieldDescriptor {
        id: FieldId::Sources,
        key: "sources",
        label: "Sources",
        get: |r| to_json(&r.sources),
        set: |r, v| {
            r.sources = text_list("sources", v)?;
            Ok(())
        },
    },
];

/// Look up a descriptor by key.
///
/// # Errors
/// Returns [`ExtractorError::UnknownField`] when no field has that key.
pub fn descriptor(key: &str) -> Result<&'static FieldDescriptor> {
    FIELDS
        .iter()
        .find(|d| d.key == key)
        .ok_or_else(|| ExtractorError::UnknownField(key.to_string()))
}

/// Read a field as JSON.
pub fn get_field(record: &IndividualRecord, key: &str) -> Result<Value> {
    Ok((descriptor(key)?.get)(record))
}

/// Replace a field from JSON.
pub fn set_field(record: &mut IndividualRecord, key: &str, value: Value) -> Result<()> {
    (descriptor(key)?.set)(record, value)
}

/// Apply a `{key: value}` patch atomically: either every entry applies or
/// the record is left unchanged.
///
/// # Examples
/// ```
/// use lignage_extractor::fields::apply_patch;
/// use lignage_extractor::types::IndividualRecord;
///
/// let mut record = IndividualRecord::default();
/// let patch = serde_json::json!({"surname": "Dupont", "children": ["Pierre"]});
/// apply_patch(&mut record, patch.as_object().unwrap()).unwrap();
/// assert_eq!(record.surname.as_deref(), Some("Dupont"));
/// ```
pub fn apply_patch(record: &mut IndividualRecord, patch: &Map<String, Value>) -> Result<()> {
    let mut edited = record.clone();
    for (key, value) in patch {
        set_field(&mut edited, key, value.clone())?;
    }
    *record = edited;
    Ok(())
}

/// Every field with its current value, in display order.
pub fn field_values(record: &IndividualRecord) -> Vec<(&'static FieldDescriptor, Value)> {
    FIELDS.iter().map(|d| (d, (d.get)(record))).collect()
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn typed<T: DeserializeOwned>(field: &str, value: Value, expected: &'static str) -> Result<T> {
    serde_json::from_value(value).map_err(|_| ExtractorError::FieldType {
        field: field.to_string(),
        expected,
    })
}

/// Optional text; blank strings clear the field.
fn text(field: &str, value: Value) -> Result<Option<String>> {
    let value: Option<String> = typed(field, value, TEXT)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// List of texts; `null` clears, blank entries are dropped.
fn text_list(field: &str, value: Value) -> Result<Vec<String>> {
    let values: Option<Vec<String>> = typed(field, value, TEXT_LIST)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateFragment, Sex};
    use serde_json::json;

    #[test]
    fn test_table_matches_ids() {
        for (index, descriptor) in FIELDS.iter().enumerate() {
            assert_eq!(descriptor.id as usize, index, "{}", descriptor.key);
            assert_eq!(descriptor.id.key(), descriptor.key);
        }
    }

    #[test]
    fn test_get_and_set() {
        let mut record = IndividualRecord::default();
        set_field(&mut record, "parents.father", json!("Louis Dupont")).unwrap();
        set_field(&mut record, "sex", json!("F")).unwrap();
        set_field(&mut record, "birth", json!({"raw": "1850", "year": 1850})).unwrap();

        assert_eq!(record.parents.father.as_deref(), Some("Louis Dupont"));
        assert_eq!(record.sex, Some(Sex::Female));
        assert_eq!(record.birth.year, Some(1850));
        assert_eq!(get_field(&record, "parents.father").unwrap(), json!("Louis Dupont"));
        assert_eq!(get_field(&record, "surname").unwrap(), Value::Null);
    }

    #[test]
    fn test_clear_with_null_and_blank() {
        let mut record = IndividualRecord {
            surname: Some("Dupont".to_string()),
            children: vec!["Pierre".to_string()],
            birth: DateFragment::from_year(1850),
            ..IndividualRecord::default()
        };
        set_field(&mut record, "surname", json!("  ")).unwrap();
        set_field(&mut record, "children", Value::Null).unwrap();
        set_field(&mut record, "birth", Value::Null).unwrap();
        assert_eq!(record.surname, None);
        assert!(record.children.is_empty());
        assert!(record.birth.is_empty());
    }

    #[test]
    fn test_errors() {
        let mut record = IndividualRecord::default();
        assert!(matches!(
            set_field(&mut record, "favouriteColour", json!("blue")),
            Err(ExtractorError::UnknownField(_))
        ));
        assert!(matches!(
            set_field(&mut record, "children", json!("Pierre")),
            Err(ExtractorError::FieldType { .. })
        ));
        assert!(matches!(
            set_field(&mut record, "sex", json!("X")),
            Err(ExtractorError::FieldType { .. })
        ));
    }

    #[test]
    fn test_patch_is_atomic() {
        let mut record = IndividualRecord::default();
        let patch = json!({"surname": "Dupont", "spouses": 3});
        assert!(apply_patch(&mut record, patch.as_object().unwrap()).is_err());
        assert_eq!(record.surname, None);
    }

    #[test]
    fn test_aliases_deduplicated() {
        let mut record = IndividualRecord::default();
        set_field(&mut record, "aliases", json!(["Liz", "Beth", "Liz"])).unwrap();
        assert_eq!(record.aliases, vec!["Liz", "Beth"]);
    }
}
