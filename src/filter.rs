use crate::{data::Row, ingest::Dataset};

/// Rows with any cell containing `term`, compared case-insensitively.
/// A blank term keeps every row.
pub fn search_rows<'a>(dataset: &'a Dataset, term: &str) -> Vec<&'a Row> {
    let needle = term.trim().to_lowercase();
    dataset
        .rows()
        .iter()
        .filter(|row| needle.is_empty() || row_matches(row, &needle))
        .collect()
}

fn row_matches(row: &Row, needle: &str) -> bool {
    row.cells()
        .any(|(_, value)| value.as_display().to_lowercase().contains(needle))
}
