use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Color,
    ContentArrangement, Table,
};

use answercheck::batch::ResultTable;
use answercheck::types::FLAG_COLUMN;

/// Map a flag cell to its display color.
fn flag_color(flag: &str) -> Color {
    match flag {
        "1" => Color::Green,
        _ => Color::Red,
    }
}

/// Render the graded table with the flag column colored.
pub fn result_table(result: &ResultTable) -> Table {
    let data = result.table();
    let flag_idx = data.column(FLAG_COLUMN);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            data.headers()
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );

    for row in data.rows() {
        table.add_row(row.iter().enumerate().map(|(i, value)| {
            if Some(i) == flag_idx {
                Cell::new(value).fg(flag_color(value))
            } else {
                Cell::new(value)
            }
        }));
    }
    table
}

/// One-line summary, e.g. `3/4 answers judged correct (1 warning)`.
pub fn summary(result: &ResultTable) -> String {
    let warnings = result.warnings().count();
    let mut line = format!(
        "{}/{} answers judged correct",
        result.correct_count(),
        result.len()
    );
    match warnings {
        0 => {}
        1 => line.push_str(" (1 warning)"),
        n => line.push_str(&format!(" ({n} warnings)")),
    }
    line
}
