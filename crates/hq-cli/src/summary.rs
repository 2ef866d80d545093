//! Tables printed after a command.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use hq_model::Status;
use hq_report::Section;

use crate::commands::ReportOutcome;

/// Status columns of the summary, in the order they are printed.
pub const SUMMARY_STATUSES: [Status; 7] = [
    Status::Red,
    Status::Yellow,
    Status::Green,
    Status::Perfect,
    Status::Grey,
    Status::Missing,
    Status::MissingSource,
];

pub fn print_summary(outcome: &ReportOutcome) {
    println!("Report: {}", outcome.report.title());
    println!("Output: {}", outcome.output_dir.display());
    if let Some(path) = &outcome.history_file {
        println!("History: {}", path.display());
    }
    println!("{}", summary_table(outcome.report.sections()));
    if outcome.report.direct_action_needed() {
        eprintln!("Direct action needed: metrics are red or could not be measured.");
    }
}

/// Status counts per section with a total row. Meta metrics are left out.
pub fn summary_table(sections: &[Section]) -> Table {
    let mut table = Table::new();
    let mut header = vec![header_cell("Section"), header_cell("Title"), header_cell("Metrics")];
    header.extend(SUMMARY_STATUSES.iter().map(|status| header_cell(&status_label(*status))));
    table.set_header(header);
    apply_table_style(&mut table);
    for index in 2..table.column_count() {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut totals = [0_usize; SUMMARY_STATUSES.len()];
    let mut total_metrics = 0;
    for section in sections.iter().filter(|section| section.id != "MM") {
        let counts = status_counts(section);
        total_metrics += section.metrics.len();
        let mut row = vec![
            Cell::new(&section.id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&section.title),
            Cell::new(section.metrics.len()),
        ];
        for (index, count) in counts.iter().enumerate() {
            totals[index] += count;
            row.push(count_cell(*count, status_color(SUMMARY_STATUSES[index])));
        }
        table.add_row(row);
    }

    let mut total_row = vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new("All sections")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_metrics).add_attribute(Attribute::Bold),
    ];
    for (index, count) in totals.iter().enumerate() {
        let color = status_color(SUMMARY_STATUSES[index]);
        total_row.push(count_cell(*count, color).add_attribute(Attribute::Bold));
    }
    table.add_row(total_row);
    table
}

fn status_counts(section: &Section) -> [usize; SUMMARY_STATUSES.len()] {
    let mut counts = [0; SUMMARY_STATUSES.len()];
    for metric in &section.metrics {
        if let Some(index) = SUMMARY_STATUSES.iter().position(|status| *status == metric.status) {
            counts[index] += 1;
        }
    }
    counts
}

fn status_label(status: Status) -> String {
    let mut label = status.as_str().replace('_', " ");
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    label
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Red => Color::Red,
        Status::Yellow => Color::Yellow,
        Status::Green | Status::Perfect => Color::Green,
        Status::Grey => Color::Grey,
        Status::Missing | Status::MissingSource => Color::Magenta,
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_capitalized() {
        assert_eq!(status_label(Status::MissingSource), "Missing source");
        assert_eq!(status_label(Status::Red), "Red");
    }
}
