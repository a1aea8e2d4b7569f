use std::sync::Arc;

use crate::data::Row;

/// Stamps every row with the identity of the file it came from, serialised
/// under `key`.
///
/// The tag lives beside the row's columns rather than among them, so a source
/// column that happens to share the tag's name is left untouched.
pub fn tag_rows(rows: Vec<Row>, source: &str, key: &str) -> Vec<Row> {
    let source: Arc<str> = Arc::from(source);
    let key: Arc<str> = Arc::from(key);
    rows.into_iter()
        .map(|row| row.with_tag(Arc::clone(&key), Arc::clone(&source)))
        .collect()
}
