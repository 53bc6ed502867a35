//! GEDCOM 5.5.1 generation for an extracted record.

use crate::config::{GEDCOM_LINE_WIDTH, GEDCOM_SOURCE_NAME};
use crate::name::parse_name;
use crate::normalize::normalize_token;
use crate::types::{DateFragment, IndividualRecord, LinkedPerson, Relation, Sex};

use super::text::{escape_value, format_date, split_for_conc};

const SUBJECT_XREF: &str = "@I1@";
const SUBMITTER_XREF: &str = "@U1@";

/// A line-oriented GEDCOM buffer.
#[derive(Default)]
struct Lines {
    out: String,
}

impl Lines {
    /// Write `level tag [value]`, splitting long values with `CONC` and
    /// line breaks with `CONT`.
    fn push(&mut self, level: u8, tag: &str, value: Option<&str>) {
        let Some(value) = value else {
            self.raw(&format!("{level} {tag}"));
            return;
        };

        let mut tag = tag.to_string();
        let mut current = level;
        for (index, logical) in value.split('\n').enumerate() {
            if index > 0 {
                tag = "CONT".to_string();
                current = level + 1;
            }
            let logical = escape_value(logical.trim_end_matches('\r'));
            let prefix = format!("{current} {tag} ");
            let conc_prefix = format!("{} CONC ", level + 1);
            let width = GEDCOM_LINE_WIDTH.saturating_sub(prefix.len().max(conc_prefix.len()));
            let mut pieces = split_for_conc(&logical, width).into_iter();
            match pieces.next() {
                Some(first) if !first.is_empty() => self.raw(&format!("{prefix}{first}")),
                _ => self.raw(prefix.trim_end()),
            }
            for piece in pieces {
                self.raw(&format!("{conc_prefix}{piece}"));
            }
        }
    }

    fn value(&mut self, level: u8, tag: &str, value: &str) {
        self.push(level, tag, Some(value));
    }

    fn raw(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }
}

/// An individual other than the subject.
struct Relative {
    xref: String,
    name: String,
    sex: Option<Sex>,
    person: Option<LinkedPerson>,
}

/// A family record.
struct Family {
    xref: String,
    husband: Option<String>,
    wife: Option<String>,
    children: Vec<String>,
}

/// Generate a GEDCOM 5.5.1 document for `record`.
///
/// The subject is `@I1@`. Parents, siblings, spouses and children become
/// their own `INDI` records, linked through a parents family (`FAMC`) and
/// one family per spouse (`FAMS`). Children go to the first spouse family,
/// or to a single-parent family when no spouse is known.
///
/// # Examples
/// ```
/// use lignage_extractor::gedcom::generate_gedcom;
/// use lignage_extractor::types::IndividualRecord;
///
/// let record = IndividualRecord {
///     given_names: vec!["Jean".to_string()],
///     surname: Some("Dupont".to_string()),
///     ..IndividualRecord::default()
/// };
/// let gedcom = generate_gedcom(&record);
/// assert!(gedcom.starts_with("0 HEAD\n"));
/// assert!(gedcom.contains("1 NAME Jean /Dupont/\n"));
/// assert!(gedcom.ends_with("0 TRLR\n"));
/// ```
#[must_use]
pub fn generate_gedcom(record: &IndividualRecord) -> String {
    let mut lines = Lines::default();
    let mut relatives: Vec<Relative> = Vec::new();
    let mut families: Vec<Family> = Vec::new();

    let add_relative = |name: &str, sex: Option<Sex>, relation: Relation, relatives: &mut Vec<Relative>| {
        let xref = format!("@I{}@", relatives.len() + 2);
        relatives.push(Relative {
            xref: xref.clone(),
            name: name.to_string(),
            sex,
            person: matching_person(record, name, relation),
        });
        xref
    };

    let father = record
        .parents
        .father
        .as_deref()
        .map(|name| add_relative(name, Some(Sex::Male), Relation::Father, &mut relatives));
    let mother = record
        .parents
        .mother
        .as_deref()
        .map(|name| add_relative(name, Some(Sex::Female), Relation::Mother, &mut relatives));
    let siblings: Vec<String> = record
        .siblings
        .iter()
        .map(|name| add_relative(name, None, Relation::Sibling, &mut relatives))
        .collect();

    if father.is_some() || mother.is_some() || !siblings.is_empty() {
        let mut children = vec![SUBJECT_XREF.to_string()];
        children.extend(siblings);
        families.push(Family {
            xref: String::new(),
            husband: father,
            wife: mother,
            children,
        });
    }
    let parents_family = families.len();

    let spouse_sex = match record.sex {
        Some(Sex::Male) => Some(Sex::Female),
        Some(Sex::Female) => Some(Sex::Male),
        _ => None,
    };
    let subject_is_wife = record.sex == Some(Sex::Female);
    for name in &record.spouses {
        let spouse = add_relative(name, spouse_sex, Relation::Spouse, &mut relatives);
        let (husband, wife) = if subject_is_wife {
            (Some(spouse), Some(SUBJECT_XREF.to_string()))
        } else {
            (Some(SUBJECT_XREF.to_string()), Some(spouse))
        };
        families.push(Family {
            xref: String::new(),
            husband,
            wife,
            children: Vec::new(),
        });
    }

    let children: Vec<String> = record
        .children
        .iter()
        .map(|name| add_relative(name, None, Relation::Child, &mut relatives))
        .collect();
    if !children.is_empty() {
        if families.len() == parents_family {
            let subject = Some(SUBJECT_XREF.to_string());
            let (husband, wife) = if subject_is_wife { (None, subject) } else { (subject, None) };
            families.push(Family {
                xref: String::new(),
                husband,
                wife,
                children: Vec::new(),
            });
        }
        families[parents_family].children = children;
    }

    for (index, family) in families.iter_mut().enumerate() {
        family.xref = format!("@F{}@", index + 1);
    }

    write_header(&mut lines, record);
    write_subject(&mut lines, record, &families, parents_family);
    for relative in &relatives {
        write_relative(&mut lines, relative, &families);
    }
    for family in &families {
        write_family(&mut lines, family);
    }
    lines.raw("0 TRLR");

    tracing::debug!(
        individuals = relatives.len() + 1,
        families = families.len(),
        "GEDCOM generated"
    );
    lines.out
}

fn write_header(lines: &mut Lines, record: &IndividualRecord) {
    lines.raw("0 HEAD");
    lines.value(1, "SOUR", GEDCOM_SOURCE_NAME);
    lines.value(2, "VERS", env!("CARGO_PKG_VERSION"));
    lines.value(2, "NAME", "Lignage extractor");
    lines.value(
        1,
        "DATE",
        &record.extracted_at.format("%d %b %Y").to_string().to_uppercase(),
    );
    lines.value(2, "TIME", &record.extracted_at.format("%H:%M:%S").to_string());
    lines.value(1, "SUBM", SUBMITTER_XREF);
    lines.raw("1 GEDC");
    lines.value(2, "VERS", "5.5.1");
    lines.value(2, "FORM", "LINEAGE-LINKED");
    lines.value(1, "CHAR", "UTF-8");
    lines.raw(&format!("0 {SUBMITTER_XREF} SUBM"));
    lines.value(1, "NAME", GEDCOM_SOURCE_NAME);
}

fn write_subject(lines: &mut Lines, record: &IndividualRecord, families: &[Family], parents_family: usize) {
    lines.raw(&format!("0 {SUBJECT_XREF} INDI"));

    let given = record.given_names.join(" ");
    if !given.is_empty() || record.surname.is_some() {
        write_name(lines, &given, record.surname.as_deref());
    }
    if let Some(maiden) = record.maiden_name.as_deref() {
        write_name(lines, &given, Some(maiden));
        lines.value(2, "TYPE", "birth");
    }
    for alias in &record.aliases {
        lines.value(1, "NAME", alias);
        lines.value(2, "TYPE", "aka");
    }
    if let Some(sex) = record.sex {
        lines.value(1, "SEX", sex.as_code());
    }

    write_event(lines, "BIRT", &record.birth, record.birth_place.as_deref());
    write_event(lines, "DEAT", &record.death, record.death_place.as_deref());

    for residence in &record.residences {
        lines.raw("1 RESI");
        if let Some(year) = residence.year {
            lines.value(2, "DATE", &year.to_string());
        }
        match (residence.place.as_deref(), residence.raw.as_deref()) {
            (Some(place), _) => lines.value(2, "PLAC", place),
            (None, Some(raw)) => lines.value(2, "NOTE", raw),
            (None, None) => {}
        }
    }

    if let Some(occupation) = record.occupation.as_deref() {
        lines.value(1, "OCCU", occupation);
    }
    if let Some(religion) = record.religion.as_deref() {
        lines.value(1, "RELI", religion);
    }
    if let Some(notes) = record.notes.as_deref() {
        lines.value(1, "NOTE", notes);
    }
    if let Some(url) = record.source_url.as_deref() {
        lines.value(1, "SOUR", url);
    }
    for source in &record.sources {
        lines.value(1, "SOUR", source);
    }

    for (index, family) in families.iter().enumerate() {
        let tag = if index < parents_family { "FAMC" } else { "FAMS" };
        lines.value(1, tag, &family.xref);
    }
}

fn write_relative(lines: &mut Lines, relative: &Relative, families: &[Family]) {
    lines.raw(&format!("0 {} INDI", relative.xref));

    let (given, surname) = match &relative.person {
        Some(person) if !person.given_names.is_empty() || person.surname.is_some() => {
            (person.given_names.join(" "), person.surname.clone())
        }
        _ => {
            let parts = parse_name(&relative.name);
            (parts.given_names.join(" "), parts.surname)
        }
    };
    if given.is_empty() && surname.is_none() {
        lines.value(1, "NAME", &relative.name);
    } else {
        write_name(lines, &given, surname.as_deref());
    }
    if let Some(sex) = relative.sex {
        lines.value(1, "SEX", sex.as_code());
    }
    if let Some(person) = &relative.person {
        write_event(lines, "BIRT", &person.birth, None);
        write_event(lines, "DEAT", &person.death, None);
        if let Some(url) = person.url.as_deref() {
            lines.value(1, "SOUR", url);
        }
    }

    for family in families {
        if family.children.contains(&relative.xref) {
            lines.value(1, "FAMC", &family.xref);
        }
        if family.husband.as_ref() == Some(&relative.xref) || family.wife.as_ref() == Some(&relative.xref) {
            lines.value(1, "FAMS", &family.xref);
        }
    }
}

fn write_family(lines: &mut Lines, family: &Family) {
    lines.raw(&format!("0 {} FAM", family.xref));
    if let Some(husband) = &family.husband {
        lines.value(1, "HUSB", husband);
    }
    if let Some(wife) = &family.wife {
        lines.value(1, "WIFE", wife);
    }
    for child in &family.children {
        lines.value(1, "CHIL", child);
    }
}

fn write_name(lines: &mut Lines, given: &str, surname: Option<&str>) {
    lines.value(1, "NAME", &personal_name(given, surname));
    if !given.is_empty() {
        lines.value(2, "GIVN", given);
    }
    if let Some(surname) = surname {
        lines.value(2, "SURN", surname);
    }
}

/// `Given /Surname/`, with the slashes kept even when the surname is unknown.
fn personal_name(given: &str, surname: Option<&str>) -> String {
    let surname = surname.unwrap_or_default().replace('/', "");
    if given.is_empty() {
        format!("/{surname}/")
    } else {
        format!("{given} /{surname}/")
    }
}

fn write_event(lines: &mut Lines, tag: &str, date: &DateFragment, place: Option<&str>) {
    let date = format_date(date);
    if date.is_none() && place.is_none() {
        return;
    }
    lines.raw(&format!("1 {tag}"));
    if let Some(date) = date {
        lines.value(2, "DATE", &date);
    }
    if let Some(place) = place {
        lines.value(2, "PLAC", place);
    }
}

/// Linked person whose name matches a relative listed on the record.
fn matching_person(record: &IndividualRecord, name: &str, relation: Relation) -> Option<LinkedPerson> {
    let key = normalize_token(name);
    let compatible = |candidate: Relation| match relation {
        Relation::Father | Relation::Mother => {
            matches!(candidate, Relation::Parent) || candidate == relation
        }
        other => candidate == other,
    };
    record
        .relatives
        .iter()
        .find(|person| compatible(person.relation) && normalize_token(&person.name) == key)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::parse_date_fragment;
    use crate::types::{Parents, Residence};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn subject() -> IndividualRecord {
        IndividualRecord {
            extracted_at: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).single().unwrap_or_default(),
            given_names: vec!["Jean".to_string(), "Baptiste".to_string()],
            surname: Some("Dupont".to_string()),
            sex: Some(Sex::Male),
            birth: parse_date_fragment("17 Mar 1901"),
            birth_place: Some("Lyon, France".to_string()),
            ..IndividualRecord::default()
        }
    }

    fn block<'a>(gedcom: &'a str, header: &str) -> Vec<&'a str> {
        gedcom
            .lines()
            .skip_while(|line| *line != header)
            .skip(1)
            .take_while(|line| !line.starts_with("0 "))
            .collect()
    }

    #[test]
    fn test_header_and_trailer() {
        let gedcom = generate_gedcom(&subject());
        let head = block(&gedcom, "0 HEAD");
        assert!(head.contains(&"1 SOUR LIGNAGE"));
        assert!(head.contains(&"1 DATE 05 MAR 2024"));
        assert!(head.contains(&"2 TIME 14:30:00"));
        assert!(head.contains(&"2 VERS 5.5.1"));
        assert!(head.contains(&"2 FORM LINEAGE-LINKED"));
        assert!(head.contains(&"1 CHAR UTF-8"));
        assert!(head.contains(&"1 SUBM @U1@"));
        assert!(gedcom.contains("0 @U1@ SUBM\n"));
        assert!(gedcom.ends_with("0 TRLR\n"));
    }

    #[test]
    fn test_subject_individual() {
        let mut record = subject();
        record.maiden_name = None;
        record.aliases = vec!["Jeannot".to_string()];
        record.death = parse_date_fragment("abt 1960");
        record.residences = vec![Residence {
            raw: Some("1931, Paris".to_string()),
            year: Some(1931),
            place: Some("Paris".to_string()),
        }];
        record.occupation = Some("Blacksmith".to_string());
        record.religion = Some("Catholic".to_string());
        record.sources = vec!["Parish register".to_string()];

        let gedcom = generate_gedcom(&record);
        assert_eq!(
            block(&gedcom, "0 @I1@ INDI"),
            vec![
                "1 NAME Jean Baptiste /Dupont/",
                "2 GIVN Jean Baptiste",
                "2 SURN Dupont",
                "1 NAME Jeannot",
                "2 TYPE aka",
                "1 SEX M",
                "1 BIRT",
                "2 DATE 17 MAR 1901",
                "2 PLAC Lyon, France",
                "1 DEAT",
                "2 DATE ABT 1960",
                "1 RESI",
                "2 DATE 1931",
                "2 PLAC Paris",
                "1 OCCU Blacksmith",
                "1 RELI Catholic",
                "1 SOUR Parish register",
            ]
        );
    }

    #[test]
    fn test_maiden_name_is_birth_name() {
        let mut record = subject();
        record.given_names = vec!["Mary".to_string()];
        record.surname = Some("Smith".to_string());
        record.maiden_name = Some("Johnson".to_string());
        record.sex = Some(Sex::Female);
        let gedcom = generate_gedcom(&record);
        assert!(gedcom.contains("1 NAME Mary /Smith/\n"));
        assert!(gedcom.contains("1 NAME Mary /Johnson/\n2 GIVN Mary\n2 SURN Johnson\n2 TYPE birth\n"));
    }

    #[test]
    fn test_families() {
        let mut record = subject();
        record.parents = Parents {
            father: Some("Louis Dupont".to_string()),
            mother: Some("Anne Martin".to_string()),
        };
        record.siblings = vec!["Paul Dupont".to_string()];
        record.spouses = vec!["Marie Curie".to_string(), "Louise Petit".to_string()];
        record.children = vec!["Pierre Dupont".to_string()];

        let gedcom = generate_gedcom(&record);
        let subject = block(&gedcom, "0 @I1@ INDI");
        assert!(subject.ends_with(&["1 FAMC @F1@", "1 FAMS @F2@", "1 FAMS @F3@"]));

        assert_eq!(
            block(&gedcom, "0 @F1@ FAM"),
            vec!["1 HUSB @I2@", "1 WIFE @I3@", "1 CHIL @I1@", "1 CHIL @I4@"]
        );
        assert_eq!(
            block(&gedcom, "0 @F2@ FAM"),
            vec!["1 HUSB @I1@", "1 WIFE @I5@", "1 CHIL @I7@"]
        );
        assert_eq!(block(&gedcom, "0 @F3@ FAM"), vec!["1 HUSB @I1@", "1 WIFE @I6@"]);

        let father = block(&gedcom, "0 @I2@ INDI");
        assert_eq!(
            father,
            vec![
                "1 NAME Louis /Dupont/",
                "2 GIVN Louis",
                "2 SURN Dupont",
                "1 SEX M",
                "1 FAMS @F1@",
            ]
        );
        assert!(block(&gedcom, "0 @I3@ INDI").contains(&"1 SEX F"));
        assert!(block(&gedcom, "0 @I5@ INDI").contains(&"1 SEX F"));
        assert!(block(&gedcom, "0 @I7@ INDI").contains(&"1 FAMC @F2@"));
    }

    #[test]
    fn test_female_subject_is_wife() {
        let mut record = subject();
        record.sex = Some(Sex::Female);
        record.spouses = vec!["Louis Martin".to_string()];
        let gedcom = generate_gedcom(&record);
        assert_eq!(block(&gedcom, "0 @F1@ FAM"), vec!["1 HUSB @I2@", "1 WIFE @I1@"]);
        assert!(block(&gedcom, "0 @I2@ INDI").contains(&"1 SEX M"));
    }

    #[test]
    fn test_children_without_spouse() {
        let mut record = subject();
        record.children = vec!["Pierre Dupont".to_string()];
        let gedcom = generate_gedcom(&record);
        assert_eq!(block(&gedcom, "0 @F1@ FAM"), vec!["1 HUSB @I1@", "1 CHIL @I2@"]);
        assert!(block(&gedcom, "0 @I1@ INDI").contains(&"1 FAMS @F1@"));
    }

    #[test]
    fn test_linked_person_dates() {
        let mut record = subject();
        record.parents.mother = Some("Anne Martin".to_string());
        record.relatives = vec![LinkedPerson {
            relation: Relation::Mother,
            name: "Anne Martin".to_string(),
            given_names: vec!["Anne".to_string()],
            surname: Some("Martin".to_string()),
            birth: parse_date_fragment("c. 1825"),
            death: DateFragment::default(),
            url: Some("https://tree.example/anne".to_string()),
        }];
        let gedcom = generate_gedcom(&record);
        let mother = block(&gedcom, "0 @I2@ INDI");
        assert!(mother.contains(&"2 DATE ABT 1825"));
        assert!(mother.contains(&"1 SOUR https://tree.example/anne"));
    }

    #[test]
    fn test_long_note_wraps() {
        let mut record = subject();
        let sentence = "He worked the forge on the old market square for forty years. ";
        record.notes = Some(format!("{}\n@home", sentence.repeat(3).trim_end()));
        let gedcom = generate_gedcom(&record);

        assert!(gedcom.lines().all(|line| line.chars().count() <= GEDCOM_LINE_WIDTH));
        let note: Vec<&str> = gedcom
            .lines()
            .skip_while(|line| !line.starts_with("1 NOTE "))
            .take_while(|line| line.starts_with("1 NOTE ") || line.starts_with("2 CON"))
            .collect();
        assert!(note.iter().any(|line| line.starts_with("2 CONC ")));
        assert_eq!(note.last().copied(), Some("2 CONT @@home"));

        let rebuilt: String = note
            .iter()
            .filter(|line| !line.starts_with("2 CONT"))
            .map(|line| line.split_once(' ').map_or("", |(_, rest)| rest))
            .map(|rest| rest.split_once(' ').map_or("", |(_, value)| value))
            .collect();
        assert_eq!(rebuilt, sentence.repeat(3).trim_end());
    }
}
