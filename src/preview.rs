use crate::{data::Row, ingest::Dataset};

/// Header and cell grid for the first `limit` of `rows`, laid out over the
/// dataset's column union with the source as the leading column, headed by
/// [`Dataset::source_key`]. Columns a row's source never declared render blank.
pub fn preview_grid(
    dataset: &Dataset,
    rows: &[&Row],
    limit: usize,
) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers = Vec::with_capacity(dataset.columns().len() + 1);
    headers.push(dataset.source_key().to_string());
    headers.extend(dataset.columns().iter().cloned());

    let grid = rows
        .iter()
        .take(limit)
        .map(|row| {
            let mut cells = Vec::with_capacity(headers.len());
            cells.push(row.source().unwrap_or_default().to_string());
            cells.extend(
                dataset
                    .columns()
                    .iter()
                    .map(|column| row.get(column).map(|v| v.as_display()).unwrap_or_default()),
            );
            cells
        })
        .collect();
    (headers, grid)
}
