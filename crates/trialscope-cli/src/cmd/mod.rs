pub mod enrich;
pub mod fetch;
pub mod reference;
pub mod run;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

/// Print a key-value summary table on stderr
pub(crate) fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}

/// Record count per therapeutic area
pub(crate) fn print_area_counts(counts: &[(String, usize)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Therapeutic area").fg(Color::Cyan),
            Cell::new("Trials").fg(Color::Cyan),
        ]);
    for (label, n) in counts {
        table.add_row(vec![Cell::new(label), Cell::new(trialscope_core::fmt_num(*n))]);
    }
    eprintln!("\n{table}");
}
