//! End-to-end tests for the extraction pipeline over HTML fixtures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use lignage_extractor::canon::{builtin_places, parse_place, PlaceCategory};
use lignage_extractor::date::parse_date_fragment;
use lignage_extractor::name::parse_name;
use lignage_extractor::{
    extract_and_score, extract_individual, generate_gedcom, highlight_html, ExtractOptions,
    IndividualRecord, Relation, Sex, SignalClass, StrategyKind,
};

const FIXTURES: &[&str] = &[
    "tabular.html",
    "column_table.html",
    "narrative_en.html",
    "narrative_fr.html",
    "prose_parents.html",
    "title_only.html",
    "linked_tree.html",
];

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn options() -> ExtractOptions {
    ExtractOptions {
        extracted_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single(),
        ..ExtractOptions::default()
    }
}

fn extract(name: &str) -> IndividualRecord {
    extract_individual(&load_fixture(name), &options())
}

#[test]
fn test_strategy_selection() {
    let expected = [
        ("tabular.html", StrategyKind::Tabular),
        ("column_table.html", StrategyKind::Tabular),
        ("narrative_en.html", StrategyKind::Narrative),
        ("narrative_fr.html", StrategyKind::Narrative),
        ("prose_parents.html", StrategyKind::Narrative),
        ("title_only.html", StrategyKind::Narrative),
        ("linked_tree.html", StrategyKind::LinkedTree),
    ];
    for (name, strategy) in expected {
        assert_eq!(extract(name).strategy, Some(strategy), "{name}");
    }
}

#[test]
fn test_deterministic() {
    for name in FIXTURES {
        let html = load_fixture(name);
        let first = extract_and_score(&html, &options());
        let second = extract_and_score(&html, &options());
        assert_eq!(first, second, "{name}");
    }
}

#[test]
fn test_provenance_offsets_are_valid() {
    for name in FIXTURES {
        let record = extract(name);
        assert!(!record.provenance.is_empty(), "{name} has no provenance");
        for span in record.provenance.iter() {
            assert_eq!(
                &record.source_html[span.start..span.end],
                span.text,
                "{name}: {}",
                span.field
            );
        }
    }
}

#[test]
fn test_source_html_kept_verbatim() {
    for name in FIXTURES {
        let html = load_fixture(name);
        assert_eq!(extract_individual(&html, &options()).source_html, html);
    }
}

#[test]
fn test_heading_scores_at_least_narrative() {
    // Score per (fixture, field) for fields cited from a single signal tier.
    let mut heading: BTreeMap<String, f64> = BTreeMap::new();
    let mut prose: BTreeMap<String, f64> = BTreeMap::new();

    for name in FIXTURES {
        let extraction = extract_and_score(&load_fixture(name), &options());
        for (key, score) in &extraction.confidence {
            if key.starts_with("birth") || key.starts_with("death") || key == "maidenName" {
                continue;
            }
            let signals: Vec<SignalClass> = extraction
                .record
                .provenance
                .for_field(key)
                .map(|s| s.signal)
                .collect();
            if signals.is_empty() {
                continue;
            }
            if signals.iter().all(|s| *s == SignalClass::Heading) {
                let entry = heading.entry(key.clone()).or_insert(*score);
                *entry = entry.min(*score);
            } else if signals
                .iter()
                .all(|s| matches!(s, SignalClass::Narrative | SignalClass::Inferred))
            {
                let entry = prose.entry(key.clone()).or_insert(*score);
                *entry = entry.max(*score);
            }
        }
    }

    let mut compared = 0;
    for (key, low) in &prose {
        if let Some(high) = heading.get(key) {
            assert!(high >= low, "{key}: heading {high} < prose {low}");
            compared += 1;
        }
    }
    assert!(compared > 0);
}

#[test]
fn test_date_raw_preserved() {
    for text in ["17 Mar 1901", "abt 1902", "~1902", "spring of 1850", "45/13/1901", "unknown", "1880–1885"] {
        assert_eq!(parse_date_fragment(text).raw.as_deref(), Some(text));
    }
    for name in FIXTURES {
        let record = extract(name);
        for date in [&record.birth, &record.death] {
            if let Some(raw) = &date.raw {
                assert!(record.source_html.contains(raw.as_str()), "{name}: {raw}");
            }
        }
    }
}

#[test]
fn test_place_alias_idempotence() {
    for definition in builtin_places() {
        let canonical = parse_place(&definition.label, None);
        assert_eq!(canonical.place.as_deref(), Some(definition.label.as_str()));
        for alias in &definition.aliases {
            assert_eq!(parse_place(alias, None).place, canonical.place, "{alias}");
        }
    }
}

#[test]
fn test_scenario_day_precision_date() {
    let date = parse_date_fragment("17 Mar 1901");
    assert_eq!((date.year, date.month, date.day, date.approx), (Some(1901), Some(3), Some(17), false));
}

#[test]
fn test_scenario_approximate_dates_agree() {
    let abt = parse_date_fragment("abt 1902");
    let tilde = parse_date_fragment("~1902");
    assert_eq!(abt.year, Some(1902));
    assert!(abt.approx);
    assert_eq!(
        (abt.year, abt.month, abt.day, abt.approx, abt.range),
        (tilde.year, tilde.month, tilde.day, tilde.approx, tilde.range)
    );
}

#[test]
fn test_scenario_nickname_and_suffix() {
    let name = parse_name("Elizabeth \"Liz\" Carter Jr.");
    assert_eq!(name.given_names, vec!["Elizabeth"]);
    assert_eq!(name.surname.as_deref(), Some("Carter"));
    assert_eq!(name.maiden_name, None);
    assert_eq!(name.aliases, vec!["Liz"]);
}

#[test]
fn test_scenario_labelled_parents_outscore_prose() {
    let table = extract_and_score(&load_fixture("tabular.html"), &options());
    assert_eq!(table.record.parents.father.as_deref(), Some("Louis Dupont"));
    assert!(table.confidence["parents.father"] >= 0.9);
    assert!(table.confidence["parents.mother"] >= 0.9);

    let prose = extract_and_score(&load_fixture("prose_parents.html"), &options());
    assert_eq!(prose.record.parents.father.as_deref(), Some("Louis Dupont"));
    assert_eq!(prose.record.parents.mother.as_deref(), Some("Anne Martin"));
    assert!(prose.confidence["parents.father"] <= 0.6);
    assert!(prose.confidence["parents.mother"] <= 0.6);
}

#[test]
fn test_scenario_place_country_only() {
    let parsed = parse_place("Paris, France", None);
    assert_eq!(parsed.tokens, vec!["France"]);
    assert_eq!(parsed.matches.len(), 1);
    assert_eq!(parsed.matches[0].fragment, "France");
    assert_eq!(parsed.matches[0].category, Some(PlaceCategory::Country));
}

#[test]
fn test_scenario_maiden_name_markers() {
    let explicit = extract_and_score(
        "<table><tr><th>Name</th><td>Mary Smith (née Johnson)</td></tr></table>",
        &options(),
    );
    assert_eq!(explicit.record.maiden_name.as_deref(), Some("Johnson"));
    assert!(explicit.confidence["maidenName"] >= 0.95);

    let bracket = extract_and_score(
        "<table><tr><th>Name</th><td>Mary Smith [Johnson]</td></tr></table>",
        &options(),
    );
    assert_eq!(bracket.record.maiden_name.as_deref(), Some("Johnson"));
    assert_eq!(bracket.confidence["maidenName"], 0.5);
}

#[test]
fn test_tabular_fixture() {
    let record = extract("tabular.html");
    assert_eq!(record.given_names, vec!["Jean", "Baptiste"]);
    assert_eq!(record.surname.as_deref(), Some("Dupont"));
    assert_eq!(record.sex, Some(Sex::Male));
    assert_eq!((record.birth.year, record.birth.month, record.birth.day), (Some(1901), Some(3), Some(17)));
    assert_eq!(record.birth_place.as_deref(), Some("Lyon, France"));
    assert_eq!(record.death.year, Some(1960));
    assert!(record.death.approx);
    assert_eq!(record.spouses, vec!["Marie Leclerc"]);
    assert_eq!(record.children, vec!["Pierre", "Louise", "Paul"]);
    assert_eq!(record.occupation.as_deref(), Some("Farmer"));
    assert_eq!(record.religion.as_deref(), Some("Catholic"));
    assert_eq!(record.residences.len(), 2);
    assert_eq!(record.residences[1].year, Some(1931));
    assert_eq!(record.sources, vec!["Registre des naissances, Lyon 1901"]);
    assert!(record
        .provenance
        .iter()
        .filter(|s| s.field != "name.full")
        .all(|s| s.signal == SignalClass::TableLabel));
}

#[test]
fn test_column_table_fixture() {
    let record = extract("column_table.html");
    assert_eq!(record.surname.as_deref(), Some("DUPONT"));
    assert_eq!(record.given_names, vec!["Jean", "Pierre"]);
    assert_eq!(record.birth.day, Some(3));
    assert_eq!(record.birth_place.as_deref(), Some("Bordeaux"));
}

#[test]
fn test_narrative_fixture() {
    let record = extract("narrative_en.html");
    assert_eq!(record.given_names, vec!["Jean"]);
    assert_eq!(record.birth_place.as_deref(), Some("Lyon, France"));
    assert_eq!(record.children, vec!["Pierre", "Louise", "Paul"]);
    assert_eq!(record.sources, vec!["Parish register of Lyon, 1850", "Census 1881"]);
    assert_eq!(record.provenance.for_field("name.title").count(), 0);
}

#[test]
fn test_title_fallback_fixture() {
    let extraction = extract_and_score(&load_fixture("title_only.html"), &options());
    assert_eq!(extraction.record.surname.as_deref(), Some("Martin"));
    assert_eq!(extraction.confidence.get("surname"), Some(&0.4));
}

#[test]
fn test_linked_tree_fixture() {
    let record = extract("linked_tree.html");
    assert_eq!(record.source_url.as_deref(), Some("https://tree.example.org/p/42"));
    assert_eq!(record.relatives.len(), 5);
    assert_eq!(record.relatives[0].relation, Relation::Father);
    assert_eq!(record.relatives[0].death.year, Some(1890));
    assert_eq!(record.children, vec!["Pierre Dupont", "Louise Dupont"]);
}

#[test]
fn test_caller_source_url_overrides_detected() {
    let options = ExtractOptions {
        source_url: Some("https://archive.example/jean".to_string()),
        ..options()
    };
    let record = extract_individual(&load_fixture("linked_tree.html"), &options);
    assert_eq!(record.source_url.as_deref(), Some("https://archive.example/jean"));
}

#[test]
fn test_highlight_preserves_text() {
    let marks = regex::Regex::new(r#"<mark class="lignage-provenance" data-field="[^"]*">|</mark>"#)
        .unwrap_or_else(|e| panic!("{e}"));
    for name in FIXTURES {
        let record = extract(name);
        let highlighted = highlight_html(&record.source_html, record.provenance.spans());
        assert!(highlighted.contains("<mark"), "{name}");
        assert_eq!(marks.replace_all(&highlighted, ""), record.source_html, "{name}");
    }
}

#[test]
fn test_gedcom_from_linked_tree() {
    let gedcom = generate_gedcom(&extract("linked_tree.html"));
    assert!(gedcom.starts_with("0 HEAD\n"));
    assert!(gedcom.contains("0 @I1@ INDI\n1 NAME Jean /Dupont/\n"));
    assert!(gedcom.contains("2 DATE ABT 1825\n"));
    assert!(gedcom.contains("1 HUSB @I2@\n1 WIFE @I3@\n1 CHIL @I1@\n"));
    assert!(gedcom.contains("1 SOUR https://tree.example.org/p/42\n"));
    assert!(gedcom.ends_with("0 TRLR\n"));
}

#[test]
fn test_entity_encoded_nee_marker_scores_explicit() {
    let extraction = extract_and_score(
        "<h1>Mary Smith (n&eacute;e Johnson)</h1><p>She was born in 1850.</p>",
        &options(),
    );
    assert_eq!(extraction.record.maiden_name.as_deref(), Some("Johnson"));
    let spans: Vec<_> = extraction.record.provenance.for_field("maidenName").collect();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "(n&eacute;e Johnson)");
    assert_eq!(extraction.confidence["maidenName"], 0.95);
}

#[test]
fn test_entity_encoding_does_not_change_scores() {
    let literal = extract_and_score(
        "<h1>Mary Smith (née Johnson)</h1>\
         <p>She was born on 3 May 1850 in Besançon, France. She married Paul Girard.</p>",
        &options(),
    );
    let encoded = extract_and_score(
        "<h1>Mary Smith (n&eacute;e Johnson)</h1>\
         <p>She was born on 3 May 1850 in Besan&ccedil;on, France. She married Paul Girard.</p>",
        &options(),
    );

    assert_eq!(encoded.record.birth_place, literal.record.birth_place);
    assert_eq!(encoded.record.maiden_name, literal.record.maiden_name);
    assert_eq!(encoded.confidence, literal.confidence);
    assert_eq!(encoded.confidence["maidenName"], 0.95);
    assert_eq!(encoded.confidence["givenNames"], SignalClass::Heading.tier());
    assert_eq!(encoded.confidence["spouses"], SignalClass::Narrative.tier());

    for span in encoded.record.provenance.iter() {
        assert_eq!(&encoded.record.source_html[span.start..span.end], span.text);
    }
    for key in encoded.confidence.keys() {
        if key == "birth" || key == "death" {
            continue;
        }
        assert!(
            encoded.record.provenance.for_field(key).next().is_some()
                || encoded.record.provenance.fields().any(|f| f.starts_with(&format!("{key}."))),
            "{key} scored without a span"
        );
    }
}

#[test]
fn test_maiden_surname_in_prose_is_not_an_event() {
    let extraction = extract_and_score(
        "<h1>Marie Dupont</h1><p>Marie Dupont, née Lebrun, was a seamstress in Lyon.</p>",
        &options(),
    );
    assert_eq!(extraction.record.birth_place, None);
    assert!(!extraction.confidence.contains_key("birth.place"));
    assert!(!extraction.confidence.contains_key("birth"));

    let extraction = extract_and_score(
        "<h1>Mary Dupont</h1><p>Mary Dupont, born Inglis, married Jean Dupont.</p>",
        &options(),
    );
    assert_eq!(extraction.record.birth_place, None);
    assert_eq!(extraction.record.spouses, vec!["Jean Dupont"]);
}

#[test]
fn test_single_quoted_nickname_in_name_row() {
    let record = extract_individual(
        "<table><tr><th>Name</th><td>Elizabeth 'Liz' Carter</td></tr>\
         <tr><th>Born</th><td>1850</td></tr></table>",
        &options(),
    );
    assert_eq!(record.given_names, vec!["Elizabeth"]);
    assert_eq!(record.surname.as_deref(), Some("Carter"));
    assert_eq!(record.aliases, vec!["Liz"]);
}
