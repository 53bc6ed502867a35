//! Record construction with provenance.
//!
//! Strategies never touch [`IndividualRecord`] fields directly: every write
//! goes through [`RecordBuilder`], which locates the value in the source and
//! appends the matching span. A value that cannot be located is still
//! written, without a span.

use std::ops::Range;

use crate::canon::{parse_place, parse_profession, PlaceDefinition, ProfessionDefinition};
use crate::date::{normalize_year, parse_date_fragment};
use crate::html::SourceMap;
use crate::name::{parse_name, parse_relationship_list, NameParts};
use crate::normalize::clean_text;
use crate::provenance::{ProvenanceSpan, SignalClass};
use crate::types::{IndividualRecord, LinkedPerson, Relation, Residence, Sex, StrategyKind};

use super::event::{split_event, Event};

/// Accumulates one record and its provenance.
pub struct RecordBuilder<'a> {
    source: &'a SourceMap<'a>,
    places: Option<&'a [PlaceDefinition]>,
    professions: Option<&'a [ProfessionDefinition]>,
    record: IndividualRecord,
    cursor: usize,
}

impl<'a> RecordBuilder<'a> {
    /// Start an empty record over `source`.
    pub fn new(
        source: &'a SourceMap<'a>,
        places: Option<&'a [PlaceDefinition]>,
        professions: Option<&'a [ProfessionDefinition]>,
    ) -> Self {
        Self {
            source,
            places,
            professions,
            record: IndividualRecord {
                source_html: source.html().to_string(),
                ..IndividualRecord::default()
            },
            cursor: 0,
        }
    }

    /// The record built so far.
    pub fn record(&self) -> &IndividualRecord {
        &self.record
    }

    /// Finish and return the record.
    pub fn finish(mut self, strategy: StrategyKind) -> IndividualRecord {
        self.record.strategy = Some(strategy);
        self.record
    }

    /// Profession dictionary in use, `None` for the built-in one.
    pub fn professions(&self) -> Option<&'a [ProfessionDefinition]> {
        self.professions
    }

    /// Current search position in the source.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the search position.
    pub fn seek(&mut self, offset: usize) {
        self.cursor = offset.min(self.source.html().len());
    }

    /// Locate a label or other context text and move the cursor past it.
    ///
    /// Records no span.
    pub fn anchor(&mut self, text: &str) -> Option<Range<usize>> {
        let range = self.source.locate(text, self.cursor)?;
        self.cursor = range.end;
        Some(range)
    }

    /// Locate text from the cursor without recording a span.
    ///
    /// The cursor moves to the start of the match so that sub-values of the
    /// located text can still be found.
    pub fn locate(&mut self, text: &str) -> Option<Range<usize>> {
        let range = self.source.locate(text, self.cursor)?;
        self.cursor = range.start;
        Some(range)
    }

    /// Locate `text` and append a span for `field`.
    pub fn cite(&mut self, field: &str, text: &str, signal: SignalClass) -> Option<Range<usize>> {
        let Some(range) = self.locate(text) else {
            tracing::debug!(field, text, "Value not locatable in source, no span recorded");
            return None;
        };
        self.push_span(field, range.clone(), signal);
        Some(range)
    }

    /// Locate `text` inside `within` (after `from` when possible) and append
    /// a span, falling back to a search from the cursor.
    pub fn cite_within(
        &mut self,
        field: &str,
        text: &str,
        within: Option<&Range<usize>>,
        from: usize,
        signal: SignalClass,
    ) -> Option<Range<usize>> {
        if let Some(within) = within {
            let start = from.clamp(within.start, within.end);
            let found = self
                .source
                .locate_in(text, start..within.end)
                .or_else(|| self.source.locate_in(text, within.clone()));
            if let Some(range) = found {
                self.push_span(field, range.clone(), signal);
                return Some(range);
            }
        }
        self.cite(field, text, signal)
    }

    /// Append a span over an already located range.
    pub fn push_span(&mut self, field: &str, range: Range<usize>, signal: SignalClass) {
        let Some(text) = self.source.html().get(range.clone()) else {
            return;
        };
        self.record.provenance.push(ProvenanceSpan {
            field: field.to_string(),
            text: text.to_string(),
            start: range.start,
            end: range.end,
            signal,
        });
    }

    /// Write a full name, its covering span and its component spans.
    ///
    /// `cover` names the covering span (`name.heading`, `name.full`,
    /// `name.title`). Components already set are left untouched.
    pub fn name(&mut self, text: &str, cover: &str, signal: SignalClass) -> NameParts {
        let parts = parse_name(text);
        if parts.is_empty() {
            return parts;
        }
        let whole = self.cite(cover, text, signal);
        self.name_parts(&parts, whole.as_ref(), signal);
        parts
    }

    /// Write pre-parsed name components located inside `within`.
    pub fn name_parts(&mut self, parts: &NameParts, within: Option<&Range<usize>>, signal: SignalClass) {
        let mut from = within.map_or(self.cursor, |w| w.start);

        if self.record.given_names.is_empty() {
            for given in &parts.given_names {
                if let Some(range) = self.cite_within("givenNames", given, within, from, signal) {
                    from = range.end;
                }
                self.record.given_names.push(given.clone());
            }
        }

        if self.record.surname.is_none() {
            if let Some(surname) = &parts.surname {
                self.cite_within("surname", surname, within, from, signal);
                self.record.surname = Some(surname.clone());
            }
        }

        if self.record.maiden_name.is_none() {
            if let (Some(maiden), Some(segment)) = (&parts.maiden_name, &parts.maiden_segment) {
                let start = within.map_or(self.cursor, |w| w.start);
                self.cite_within("maidenName", segment, within, start, signal);
                self.record.maiden_name = Some(maiden.clone());
                self.record.maiden_marker = parts.maiden_marker;
            }
        }

        for alias in &parts.aliases {
            self.alias_within(alias, within, signal);
        }
    }

    /// Write given names from a dedicated value.
    pub fn given_names(&mut self, text: &str, signal: SignalClass) {
        if !self.record.given_names.is_empty() {
            return;
        }
        let text = clean_text(text);
        let whole = self.source.locate(&text, self.cursor);
        let mut from = whole.as_ref().map_or(self.cursor, |w| w.start);
        for given in text.split_whitespace() {
            if let Some(range) = self.cite_within("givenNames", given, whole.as_ref(), from, signal) {
                from = range.end;
            }
            self.record.given_names.push(given.to_string());
        }
    }

    /// Write the surname from a dedicated value.
    pub fn surname(&mut self, text: &str, signal: SignalClass) {
        let text = clean_text(text);
        if text.is_empty() || self.record.surname.is_some() {
            return;
        }
        self.cite("surname", &text, signal);
        self.record.surname = Some(text);
    }

    /// Write the maiden name from a dedicated value.
    ///
    /// The span keeps any bracket or `née` marker present in the value.
    pub fn maiden_name(&mut self, text: &str, signal: SignalClass) {
        let raw = clean_text(text);
        if raw.is_empty() || self.record.maiden_name.is_some() {
            return;
        }
        let parsed = parse_name(&raw);
        let (value, marker) = match (&parsed.maiden_name, parsed.maiden_segment.as_deref()) {
            (Some(maiden), Some(segment)) if segment.len() == raw.len() => {
                (maiden.clone(), parsed.maiden_marker)
            }
            _ => (
                raw.trim_matches(|c: char| matches!(c, '[' | ']' | '(' | ')'))
                    .trim()
                    .to_string(),
                None,
            ),
        };
        if value.is_empty() {
            return;
        }
        self.cite("maidenName", &raw, signal);
        self.record.maiden_name = Some(value);
        self.record.maiden_marker = marker;
    }

    /// Add an alias unless already present.
    pub fn alias(&mut self, text: &str, signal: SignalClass) {
        self.alias_within(&clean_text(text), None, signal);
    }

    fn alias_within(&mut self, alias: &str, within: Option<&Range<usize>>, signal: SignalClass) {
        if alias.is_empty() || self.record.aliases.iter().any(|a| a == alias) {
            return;
        }
        let from = within.map_or(self.cursor, |w| w.start);
        self.cite_within("aliases", alias, within, from, signal);
        self.record.aliases.push(alias.to_string());
    }

    /// Write the sex from a free-text value.
    pub fn sex(&mut self, text: &str, signal: SignalClass) {
        if self.record.sex.is_some() {
            return;
        }
        let text = clean_text(text);
        if let Some(sex) = Sex::from_text(&text) {
            self.cite("sex", &text, signal);
            self.record.sex = Some(sex);
        }
    }

    /// Infer the sex from wording (`son`, `fille`, `née`...), recording the
    /// word that implies it.
    pub fn inferred_sex(&mut self, sex: Sex, word: &str, signal: SignalClass) {
        if self.record.sex.is_some() {
            return;
        }
        self.cite("sex", word, signal);
        self.record.sex = Some(sex);
    }

    /// Write a combined event value (`"17 Mar 1901, Lyon"`).
    pub fn event(&mut self, event: Event, text: &str, signal: SignalClass) {
        let value = clean_text(text);
        let parts = split_event(&value);
        let within = self.source.locate(&value, self.cursor);
        if let Some(date) = parts.date {
            self.event_date_within(event, &value[date], within.as_ref(), signal);
        }
        if let Some(place) = parts.place {
            self.event_place_within(event, &value[place], within.as_ref(), signal);
        }
    }

    /// Write only the date of an event.
    pub fn event_date(&mut self, event: Event, text: &str, signal: SignalClass) {
        let value = clean_text(text);
        self.event_date_within(event, &value, None, signal);
    }

    /// Write only the place of an event.
    pub fn event_place(&mut self, event: Event, text: &str, signal: SignalClass) {
        let value = clean_text(text);
        self.event_place_within(event, &value, None, signal);
    }

    fn event_date_within(
        &mut self,
        event: Event,
        text: &str,
        within: Option<&Range<usize>>,
        signal: SignalClass,
    ) {
        let date = match event {
            Event::Birth => &self.record.birth,
            Event::Death => &self.record.death,
        };
        if !date.is_empty() || text.trim().is_empty() {
            return;
        }
        let from = within.map_or(self.cursor, |w| w.start);
        self.cite_within(&format!("{}.date", event.key()), text, within, from, signal);

        let parsed = parse_date_fragment(text);
        match event {
            Event::Birth => self.record.birth = parsed,
            Event::Death => self.record.death = parsed,
        }
    }

    fn event_place_within(
        &mut self,
        event: Event,
        text: &str,
        within: Option<&Range<usize>>,
        signal: SignalClass,
    ) {
        let existing = match event {
            Event::Birth => &self.record.birth_place,
            Event::Death => &self.record.death_place,
        };
        if existing.is_some() || text.trim().is_empty() {
            return;
        }

        let field = format!("{}.place", event.key());
        let from = within.map_or(self.cursor, |w| w.start);
        let located = self.cite_within(&field, text, within, from, signal);

        let parsed = parse_place(text, self.places);
        for found in &parsed.matches {
            let sub_field = match found.category {
                Some(category) => format!("{field}.{category}"),
                None => format!("{field}.match"),
            };
            let start = located.as_ref().map_or(self.cursor, |r| r.start);
            self.cite_within(&sub_field, &found.fragment, located.as_ref(), start, signal);
        }

        let place = Some(text.to_string());
        match event {
            Event::Birth => self.record.birth_place = place,
            Event::Death => self.record.death_place = place,
        }
    }

    /// Add a residence from a free-text value (`"Lyon, 1881"`).
    pub fn residence(&mut self, text: &str, signal: SignalClass) {
        let value = clean_text(text);
        let parts = split_event(&value);
        let residence = Residence {
            raw: (!value.is_empty()).then(|| value.clone()),
            year: parts.date.as_ref().and_then(|d| normalize_year(&value[d.clone()])),
            place: parts.place.map(|p| value[p].to_string()),
        };
        if residence.is_empty() || self.record.residences.contains(&residence) {
            return;
        }
        self.cite("residences", &value, signal);
        self.record.residences.push(residence);
    }

    /// Write the father's name.
    pub fn father(&mut self, text: &str, signal: SignalClass) {
        let name = clean_text(text);
        if name.is_empty() || self.record.parents.father.is_some() {
            return;
        }
        self.cite("parents.father", &name, signal);
        self.record.parents.father = Some(name);
    }

    /// Write the mother's name.
    pub fn mother(&mut self, text: &str, signal: SignalClass) {
        let name = clean_text(text);
        if name.is_empty() || self.record.parents.mother.is_some() {
            return;
        }
        self.cite("parents.mother", &name, signal);
        self.record.parents.mother = Some(name);
    }

    /// Write both parents from a combined value: the first name listed is
    /// taken as the father, the second as the mother.
    pub fn parents(&mut self, text: &str, signal: SignalClass) {
        let names = parse_relationship_list(text);
        let mut names = names.iter();
        if let Some(father) = names.next() {
            self.father(father, signal);
        }
        if let Some(mother) = names.next() {
            self.mother(mother, signal);
        }
    }

    /// Add one related person by relation.
    pub fn relative_name(&mut self, relation: Relation, text: &str, signal: SignalClass) {
        match relation {
            Relation::Father => self.father(text, signal),
            Relation::Mother => self.mother(text, signal),
            Relation::Parent => {
                if self.record.parents.father.is_none() {
                    self.father(text, signal);
                } else {
                    self.mother(text, signal);
                }
            }
            Relation::Spouse => self.push_list_entry(Relation::Spouse, text, signal),
            Relation::Child => self.push_list_entry(Relation::Child, text, signal),
            Relation::Sibling => self.push_list_entry(Relation::Sibling, text, signal),
        }
    }

    /// Add every name of a free-text list (`"Pierre, Marie et Louise"`).
    pub fn relation_list(&mut self, relation: Relation, text: &str, signal: SignalClass) {
        if matches!(relation, Relation::Parent) {
            self.parents(text, signal);
            return;
        }
        for name in parse_relationship_list(text) {
            self.relative_name(relation, &name, signal);
        }
    }

    fn push_list_entry(&mut self, relation: Relation, text: &str, signal: SignalClass) {
        let name = clean_text(text);
        let (field, list) = match relation {
            Relation::Spouse => ("spouses", &mut self.record.spouses),
            Relation::Child => ("children", &mut self.record.children),
            _ => ("siblings", &mut self.record.siblings),
        };
        if name.is_empty() || list.contains(&name) {
            return;
        }
        list.push(name.clone());
        self.cite(field, &name, signal);
    }

    /// Write the occupation: canonical labels when recognised, else the text.
    pub fn occupation(&mut self, text: &str, signal: SignalClass) {
        let value = clean_text(text);
        if value.is_empty() || self.record.occupation.is_some() {
            return;
        }
        let parsed = parse_profession(&value, self.professions);
        self.cite("occupation", &value, signal);
        self.record.occupation = Some(parsed.profession.unwrap_or(value));
    }

    /// Write the religion.
    pub fn religion(&mut self, text: &str, signal: SignalClass) {
        let value = clean_text(text);
        if value.is_empty() || self.record.religion.is_some() {
            return;
        }
        self.cite("religion", &value, signal);
        self.record.religion = Some(value);
    }

    /// Append to the notes, one span per note.
    pub fn note(&mut self, text: &str, signal: SignalClass) {
        let value = clean_text(text);
        if value.is_empty() {
            return;
        }
        self.cite("notes", &value, signal);
        self.record.notes = Some(match self.record.notes.take() {
            Some(existing) => format!("{existing}\n{value}"),
            None => value,
        });
    }

    /// Add a citation string.
    pub fn source_citation(&mut self, text: &str, signal: SignalClass) {
        let value = clean_text(text);
        if value.is_empty() || self.record.sources.contains(&value) {
            return;
        }
        self.cite("sources", &value, signal);
        self.record.sources.push(value);
    }

    /// Write the detected source URL, citing the attribute it came from.
    pub fn source_url(&mut self, url: &str, signal: SignalClass) {
        let url = url.trim();
        if url.is_empty() || self.record.source_url.is_some() {
            return;
        }
        match self.source.locate_attribute(url, 0) {
            Some(range) => self.push_span("sourceUrl", range, signal),
            None => tracing::debug!(url, "Source URL not locatable, no span recorded"),
        }
        self.record.source_url = Some(url.to_string());
    }

    /// Add a linked person from a tree page, citing `range`.
    pub fn linked_person(&mut self, person: LinkedPerson, range: Option<Range<usize>>, signal: SignalClass) {
        if self.record.relatives.contains(&person) {
            return;
        }
        match range {
            Some(range) => self.push_span("relatives", range, signal),
            None => tracing::debug!(name = %person.name, "Relative not locatable, no span recorded"),
        }
        self.record.relatives.push(person);
    }
}
