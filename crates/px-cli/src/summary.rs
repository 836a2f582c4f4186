use anyhow::Result;
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use px_cli::checks::CheckOutcome;
use px_classification::{Classification, ExportedArtifacts};
use px_model::Placement;
use px_validate::{PercentChange, Verdict};

use crate::commands::BuildSummary;

/// Rows listed per failing check.
const MAX_LISTED: usize = 20;

pub fn print_build_summary(summary: &BuildSummary) {
    let doc = &summary.document;
    println!("Output: {}", summary.output.display());
    println!(
        "Languages: {} (primary {})",
        doc.languages().codes().join(", "),
        doc.primary_language()
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Placement"),
        header_cell("Values"),
        header_cell("Elimination"),
        header_cell("Domain"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for variable in doc.variables() {
        let placement = match variable.placement() {
            Placement::Stub => "stub",
            Placement::Heading => "heading",
        };
        table.add_row(vec![
            Cell::new(variable.code())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(placement),
            Cell::new(variable.value_codes().len()),
            optional_cell(variable.elimination()),
            optional_cell(variable.domain()),
        ]);
    }
    println!("{table}");
    println!("Cells: {}", doc.shape().cell_count());
    for artifacts in &summary.artifacts {
        println!("Classification: {}", artifacts.control.display());
    }
    let pending = doc.pending_translations().len();
    if pending > 0 {
        println!("Pending translations: {pending}");
    }
}

pub fn print_classify_summary((classification, artifacts): &(Classification, ExportedArtifacts)) {
    println!("Control: {}", artifacts.control.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Aggregation"),
        header_cell("Groups"),
        header_cell("File"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (aggregation, path) in classification.aggregations().iter().zip(&artifacts.aggregations) {
        table.add_row(vec![
            Cell::new(aggregation),
            Cell::new(classification.groups(aggregation).len()),
            Cell::new(path.display()),
        ]);
    }
    println!("{table}");
}

pub fn print_validation_json(outcomes: &[CheckOutcome]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcomes)?);
    Ok(())
}

pub fn print_validation_summary(outcomes: &[CheckOutcome]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Check"),
        header_cell("Rows"),
        header_cell("Max |Δ%|"),
        header_cell("Threshold"),
        header_cell("Violations"),
        header_cell("Not comparable"),
        header_cell("Extra reference keys"),
        header_cell("Verdict"),
    ]);
    apply_summary_table_style(&mut table);
    for column in 1..7 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    align_column(&mut table, 7, CellAlignment::Center);
    for outcome in outcomes {
        let result = &outcome.result;
        table.add_row(vec![
            Cell::new(&outcome.name).add_attribute(Attribute::Bold),
            Cell::new(result.compared),
            match result.max_abs_change {
                Some(value) => Cell::new(format!("{value:.3}")),
                None => dim_cell("-"),
            },
            Cell::new(result.threshold),
            count_cell(result.violations.len(), Color::Red),
            count_cell(result.non_finite.len(), Color::Red),
            count_cell(result.unmatched_right.len(), Color::Yellow),
            verdict_cell(result.verdict, outcome.fatal),
        ]);
    }
    println!("{table}");

    for outcome in outcomes.iter().filter(|outcome| !outcome.result.passed()) {
        print_failures(outcome);
    }
}

fn print_failures(outcome: &CheckOutcome) {
    let result = &outcome.result;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Key"), header_cell("Change")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for row in result.non_finite.iter().take(MAX_LISTED) {
        let reason = match row.reason {
            PercentChange::ZeroBase => "zero base",
            PercentChange::Missing | PercentChange::Finite(_) => "missing",
        };
        table.add_row(vec![
            Cell::new(row.key.join(" / ")),
            Cell::new(reason).fg(Color::Red),
        ]);
    }
    for violation in result.violations.iter().take(MAX_LISTED) {
        table.add_row(vec![
            Cell::new(violation.key.join(" / ")),
            Cell::new(format!("{:+.3}%", violation.percent_change)).fg(Color::Red),
        ]);
    }
    let listed = result.non_finite.len().min(MAX_LISTED) + result.violations.len().min(MAX_LISTED);
    let total = result.non_finite.len() + result.violations.len();
    println!();
    println!("{} ({} vs {}):", outcome.name, outcome.left, outcome.right);
    println!("{table}");
    if total > listed {
        println!("... {} more", total - listed);
    }
}

fn verdict_cell(verdict: Verdict, fatal: bool) -> Cell {
    match verdict {
        Verdict::Pass => Cell::new("PASS")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Verdict::Fail if fatal => Cell::new("FAIL")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Verdict::Fail => Cell::new("FAIL (advisory)").fg(Color::Yellow),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
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

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
