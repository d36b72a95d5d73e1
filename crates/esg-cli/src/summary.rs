use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;

use esg_map::{AliasDictionary, ConfidenceLevel, ConfidenceThresholds, MappingEngine};
use esg_model::MappingResult;

/// One row of the `entities` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub entity: String,
    pub fields: usize,
    pub aliases: usize,
}

pub fn entity_summaries(dictionary: &AliasDictionary) -> Vec<EntitySummary> {
    dictionary
        .iter()
        .map(|(entity, fields)| EntitySummary {
            entity: entity.to_string(),
            fields: fields.len(),
            aliases: fields.values().map(Vec::len).sum(),
        })
        .collect()
}

pub fn print_entities(summaries: &[EntitySummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entity"),
        header_cell("Fields"),
        header_cell("Aliases"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.entity).add_attribute(Attribute::Bold),
            Cell::new(summary.fields),
            Cell::new(summary.aliases),
        ]);
    }
    println!("{table}");
}

/// Prints a mapping result as a table, one row per input header.
///
/// Rows follow input order. Mapped headers show the matched alias when the
/// heuristics can explain the score.
pub fn print_mapping(
    headers: &[String],
    entity: &str,
    result: &MappingResult,
    engine: &MappingEngine,
) {
    println!("Entity: {entity}");
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Header"),
        header_cell("Status"),
        header_cell("Field"),
        header_cell("Confidence"),
        header_cell("Match"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);

    let thresholds = engine.thresholds();
    for header in headers {
        if let Some(mapping) = result.mapping_for(header) {
            let explain = engine
                .best_match(header, entity)
                .map(|m| m.score.explain())
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(header),
                status_cell("mapped", Color::Green),
                Cell::new(&mapping.target_field),
                confidence_cell(mapping.confidence, thresholds),
                dim_cell(&explain),
            ]);
        } else if let Some(suggestion) = result.suggestion_for(header) {
            let fields: Vec<&str> = suggestion
                .possible_targets
                .iter()
                .map(|t| t.field.as_str())
                .collect();
            let best = suggestion.best().map_or(0.0, |t| t.confidence);
            table.add_row(vec![
                Cell::new(header),
                status_cell("suggested", Color::Yellow),
                Cell::new(fields.join(", ")),
                confidence_cell(best, thresholds),
                dim_cell("-"),
            ]);
        } else {
            table.add_row(vec![
                Cell::new(header),
                status_cell("unmapped", Color::Red),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
            ]);
        }
    }
    println!("{table}");
    println!(
        "{} mapped, {} suggested, {} unmapped",
        result.mappings.len(),
        result.suggestions.len(),
        result.unmapped.len()
    );
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn status_cell(label: &str, color: Color) -> Cell {
    Cell::new(label).fg(color).add_attribute(Attribute::Bold)
}

fn confidence_cell(confidence: f64, thresholds: ConfidenceThresholds) -> Cell {
    let cell = Cell::new(format!("{:.0}%", confidence * 100.0));
    match thresholds.categorize(confidence) {
        Some(ConfidenceLevel::High) => cell.fg(Color::Green),
        Some(ConfidenceLevel::Medium) => cell.fg(Color::Yellow),
        None => cell.fg(Color::DarkGrey),
    }
}

fn dim_cell(value: &str) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
