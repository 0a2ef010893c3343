use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Multi-line cell listing `items`, or a grey dash when there are none.
pub fn list_cell(items: &[String]) -> Cell {
    if items.is_empty() {
        Cell::new("-").fg(TableColor::DarkGrey)
    } else {
        Cell::new(items.join("\n"))
    }
}

/// Layer cell; jobs stuck in a cycle have no layer and show up red.
pub fn layer_cell(rank: Option<usize>) -> Cell {
    match rank {
        Some(rank) => Cell::new(rank),
        None => Cell::new("cycle").fg(TableColor::Red),
    }
}
