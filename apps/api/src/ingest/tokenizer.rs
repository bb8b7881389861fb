//! Tokenizer — turns raw input into the ordered value list.
//!
//! Order is preserved and duplicates are kept. The only transformation applied
//! to a value is trimming surrounding whitespace.

use serde_json::Value;

/// Splits free text on line breaks, trims each line and drops blank ones.
pub fn tokenize_text(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Reduces a column of cell values (one per row) to the value list.
///
/// Spreadsheet readers hand back typed cells, so numbers and booleans are kept
/// in their JSON text form. `null` cells and blank strings are dropped. A cell
/// holding several lines yields one value per line, as pasted text would.
pub fn tokenize_cells(cells: &[Value]) -> Vec<String> {
    cells
        .iter()
        .filter_map(cell_text)
        .flat_map(|text| tokenize_text(&text))
        .collect()
}

fn cell_text(cell: &Value) -> Option<String> {
    match cell {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Nested structures are not cell values; keep their text so nothing is lost silently.
        other => Some(other.to_string()),
    }
}
