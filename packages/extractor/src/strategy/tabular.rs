//! Tabular / labelled-layout strategy.
//!
//! Reads `label → value` pairs from table rows, column-header tables,
//! definition lists and `Label: value` blocks.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::builder::RecordBuilder;
use super::event::Event;
use super::labels::{match_label, LabelKind};
use super::narrative::heading_name;
use super::{linked_tree, ExtractionStrategy};
use crate::html::{child_elements, element_lines, element_text, selector, Document};
use crate::provenance::SignalClass;
use crate::types::{Relation, StrategyKind};

static TABLES: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static DEFINITION_LISTS: LazyLock<Selector> = LazyLock::new(|| selector("dl"));
static BLOCKS: LazyLock<Selector> = LazyLock::new(|| selector("p, li, div"));
static NESTED_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| selector("p, li, div, table, dl, ul, ol, h1, h2, h3, h4, h5, h6"));
static CAPTIONS: LazyLock<Selector> = LazyLock::new(|| selector("caption, h1, h2, h3"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INLINE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]{1,40}?)\s*[:：]\s*(.+)$").expect("valid regex"));

/// Where a labelled value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// `<tr>` with a label cell and a value cell.
    Row,
    /// Column of a table whose first row holds the labels.
    Column,
    /// `<dt>`/`<dd>` pair.
    Definition,
    /// `<p>`, `<li>` or `<div>` starting with `Label:`.
    Block,
}

/// One `label → value` pair found in the document.
#[derive(Debug, Clone)]
pub struct LabelledValue<'d> {
    pub kind: LabelKind,
    pub label: String,
    pub value: String,
    /// Value split at line breaks, for list-valued fields.
    pub lines: Vec<String>,
    pub source: LabelSource,
    pub element: ElementRef<'d>,
}

/// Labelled-layout extraction. Signal class `table-label`.
pub struct TabularStrategy;

impl ExtractionStrategy for TabularStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Tabular
    }

    /// Table rows, definition lists or at least two labelled blocks naming
    /// record fields, on a page without linked-tree sections.
    fn precondition(&self, doc: &Document<'_>) -> bool {
        let items = collect_labelled(doc);
        let structured = items.iter().any(|i| i.source != LabelSource::Block);
        let blocks = items
            .iter()
            .filter(|i| !matches!(i.kind, LabelKind::Source | LabelKind::Notes))
            .count();
        (structured || blocks >= 2) && !linked_tree::has_tree_sections(doc)
    }

    fn extract(&self, doc: &Document<'_>, builder: &mut RecordBuilder<'_>) {
        for item in collect_labelled(doc) {
            apply_labelled(builder, &item, SignalClass::TableLabel);
        }

        // A register table often names its subject only in a caption or heading.
        // That name is recorded the way the narrative strategy records a
        // heading: a `name.heading` cover span and heading-signal parts.
        if builder.record().given_names.is_empty() && builder.record().surname.is_none() {
            builder.seek(doc.source().body_start());
            if let Some((name, _)) = doc
                .select(&CAPTIONS)
                .map(|el| element_text(&el))
                .find_map(|text| heading_name(&text))
            {
                builder.name(&name, "name.heading", SignalClass::Heading);
            }
        }
    }
}

/// Write one labelled value into the record.
pub fn apply_labelled(builder: &mut RecordBuilder<'_>, item: &LabelledValue<'_>, signal: SignalClass) {
    builder.anchor(&item.label);
    let value = item.value.as_str();

    match item.kind {
        LabelKind::Name => {
            builder.name(value, "name.full", signal);
        }
        LabelKind::GivenNames => builder.given_names(value, signal),
        LabelKind::Surname => builder.surname(value, signal),
        LabelKind::MaidenName => builder.maiden_name(value, signal),
        LabelKind::Alias => {
            for line in &item.lines {
                for alias in crate::name::parse_relationship_list(line) {
                    builder.alias(&alias, signal);
                }
            }
        }
        LabelKind::Sex => builder.sex(value, signal),
        LabelKind::Birth => builder.event(Event::Birth, value, signal),
        LabelKind::BirthDate => builder.event_date(Event::Birth, value, signal),
        LabelKind::BirthPlace => builder.event_place(Event::Birth, value, signal),
        LabelKind::Death => builder.event(Event::Death, value, signal),
        LabelKind::DeathDate => builder.event_date(Event::Death, value, signal),
        LabelKind::DeathPlace => builder.event_place(Event::Death, value, signal),
        LabelKind::Residence => {
            for line in &item.lines {
                for entry in line.split(';') {
                    builder.residence(entry, signal);
                }
            }
        }
        LabelKind::Father => builder.father(value, signal),
        LabelKind::Mother => builder.mother(value, signal),
        LabelKind::Parents => builder.parents(&item.lines.join("\n"), signal),
        LabelKind::Spouse => builder.relation_list(Relation::Spouse, &item.lines.join("\n"), signal),
        LabelKind::Children => builder.relation_list(Relation::Child, &item.lines.join("\n"), signal),
        LabelKind::Siblings => builder.relation_list(Relation::Sibling, &item.lines.join("\n"), signal),
        LabelKind::Occupation => builder.occupation(value, signal),
        LabelKind::Religion => builder.religion(value, signal),
        LabelKind::Notes => builder.note(value, signal),
        LabelKind::Source => {
            for line in &item.lines {
                for entry in line.split(';') {
                    builder.source_citation(entry, signal);
                }
            }
        }
    }
}

/// All labelled values of the document: tables first, then definition
/// lists, then labelled blocks, each in document order.
pub fn collect_labelled<'d>(doc: &'d Document<'_>) -> Vec<LabelledValue<'d>> {
    let mut items = Vec::new();
    for table in doc.select(&TABLES) {
        collect_table(&table, &mut items);
    }
    for list in doc.select(&DEFINITION_LISTS) {
        collect_definitions(&list, &mut items);
    }
    for block in doc.select(&BLOCKS) {
        if let Some(item) = labelled_block(&block) {
            items.push(item);
        }
    }
    items
}

fn cells<'d>(row: &ElementRef<'d>) -> Vec<ElementRef<'d>> {
    child_elements(row)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .collect()
}

/// Rows that belong to `table` itself, not to a nested table.
fn own_rows<'d>(table: &ElementRef<'d>) -> Vec<ElementRef<'d>> {
    table
        .select(&ROWS)
        .filter(|row| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| a.value().name() == "table")
                .is_some_and(|t| t.id() == table.id())
        })
        .collect()
}

fn collect_table<'d>(table: &ElementRef<'d>, items: &mut Vec<LabelledValue<'d>>) {
    let rows = own_rows(table);
    let Some(header) = rows.first() else {
        return;
    };

    let header_cells = cells(header);
    let header_kinds: Vec<Option<LabelKind>> = header_cells
        .iter()
        .map(|c| match_label(&element_text(c)))
        .collect();
    let labelled_headers = header_kinds.iter().filter(|k| k.is_some()).count();
    let all_th = !header_cells.is_empty() && header_cells.iter().all(|c| c.value().name() == "th");
    let column_mode = labelled_headers >= 2 && (all_th || header_kinds.get(1).is_some_and(Option::is_some));

    if column_mode {
        // One individual per extraction: the first data row.
        let Some(data_row) = rows.iter().skip(1).find(|r| !cells(r).is_empty()) else {
            return;
        };
        let data_cells = cells(data_row);
        for ((header_cell, kind), value_cell) in header_cells.iter().zip(&header_kinds).zip(&data_cells) {
            if let Some(kind) = kind {
                push_item(items, *kind, header_cell, value_cell, LabelSource::Column);
            }
        }
        return;
    }

    for row in &rows {
        let row_cells = cells(row);
        if row_cells.len() < 2 {
            continue;
        }
        if let Some(kind) = match_label(&element_text(&row_cells[0])) {
            push_item(items, kind, &row_cells[0], &row_cells[1], LabelSource::Row);
        }
    }
}

fn collect_definitions<'d>(list: &ElementRef<'d>, items: &mut Vec<LabelledValue<'d>>) {
    let mut current: Option<(LabelKind, ElementRef<'d>)> = None;
    for child in child_elements(list) {
        match child.value().name() {
            "dt" => current = match_label(&element_text(&child)).map(|kind| (kind, child)),
            "dd" => {
                if let Some((kind, label)) = current {
                    push_item(items, kind, &label, &child, LabelSource::Definition);
                }
            }
            _ => {}
        }
    }
}

fn push_item<'d>(
    items: &mut Vec<LabelledValue<'d>>,
    kind: LabelKind,
    label: &ElementRef<'d>,
    value: &ElementRef<'d>,
    source: LabelSource,
) {
    let text = element_text(value);
    if text.is_empty() {
        return;
    }
    items.push(LabelledValue {
        kind,
        label: element_text(label),
        value: text,
        lines: element_lines(value),
        source,
        element: *value,
    });
}

/// A `<p>`/`<li>`/`<div>` reading `Label: value`, with or without the label
/// in `<b>`, `<strong>` or `<label>`.
fn labelled_block<'d>(block: &ElementRef<'d>) -> Option<LabelledValue<'d>> {
    if block.select(&NESTED_BLOCKS).any(|inner| inner.id() != block.id()) {
        return None;
    }
    let inside_structure = block
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "table" | "dl"));
    if inside_structure {
        return None;
    }

    let text = element_text(block);
    let caps = INLINE_LABEL.captures(&text)?;
    let label = caps.get(1)?.as_str().trim();
    let value = caps.get(2)?.as_str().trim();
    let kind = match_label(label)?;
    if value.is_empty() {
        return None;
    }

    // Keep line structure after the label for list-valued fields.
    let mut lines = element_lines(block);
    if let Some(first) = lines.first_mut() {
        if let Some(rest) = first.split_once([':', '：']).map(|(_, rest)| rest.trim().to_string()) {
            *first = rest;
        }
    }
    lines.retain(|l| !l.is_empty());

    Some(LabelledValue {
        kind,
        label: label.to_string(),
        value: value.to_string(),
        lines,
        source: LabelSource::Block,
        element: *block,
    })
}
