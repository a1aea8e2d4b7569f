//! Spreadsheet workbooks (xlsx, xlsm, xlsb, xls, ods).
//!
//! Only the first sheet in declared order is read. Its first used row is the
//! header; each later non-blank row becomes a row with every header key present,
//! blank cells as [`Value::Empty`].

use std::io::Cursor;

use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};

use crate::{
    data::{Row, Value},
    error::ParseError,
    headers::HeaderSet,
};

use super::{FormatParser, ParsedSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetParser;

impl FormatParser for SpreadsheetParser {
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedSource, ParseError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|err| ParseError::unreadable(format!("{filename}: {err}")))?;
        let sheet_name = workbook.sheet_names().first().cloned().ok_or_else(|| {
            ParseError::UnreadableSource(format!("{filename}: workbook has no sheets"))
        })?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|err| ParseError::unreadable(format!("{filename}: {err}")))?;

        let mut sheet_rows = range.rows();
        let header = match sheet_rows.next() {
            Some(cells) => HeaderSet::from_raw(cells.iter().map(cell_text)),
            None => return Ok(ParsedSource::default()),
        };

        let rows = sheet_rows
            .filter(|cells| !cells.iter().all(|cell| cell_value(cell).is_empty()))
            .map(|cells| {
                let values = header
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| {
                        let value = cells.get(idx).map(cell_value).unwrap_or(Value::Empty);
                        (name.clone(), value)
                    })
                    .collect();
                Row::new(values)
            })
            .collect();

        Ok(ParsedSource {
            header,
            rows,
            truncated_records: 0,
        })
    }
}

/// Largest integer magnitude an `f64` holds exactly (2^53). Bigger integers
/// are kept as text so no digits are lost.
const MAX_EXACT_INT: u64 = 1 << 53;

fn cell_text(cell: &Data) -> String {
    cell_value(cell).as_display()
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::from_text(s),
        Data::Int(i) if i.unsigned_abs() <= MAX_EXACT_INT => Value::from_number(*i as f64),
        Data::Int(i) => Value::Text(i.to_string()),
        Data::Float(f) => Value::from_number(*f),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
                Value::Text(dt.format("%Y-%m-%d").to_string())
            }
            Some(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Value::from_text(&cell.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::from_text(s),
        Data::Error(err) => Value::Text(format!("#{err:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_map_to_values() {
        assert_eq!(cell_value(&Data::Empty), Value::Empty);
        assert_eq!(cell_value(&Data::Int(4)), Value::Number(4.0));
        assert_eq!(cell_value(&Data::Float(2.5)), Value::Number(2.5));
        assert_eq!(
            cell_value(&Data::Bool(true)),
            Value::Text("true".to_string())
        );
        assert_eq!(cell_value(&Data::String("  ".into())), Value::Empty);
    }

    #[test]
    fn integers_beyond_f64_precision_stay_exact() {
        let exact = 1i64 << 53;
        assert_eq!(
            cell_value(&Data::Int(exact)),
            Value::Number(9_007_199_254_740_992.0)
        );
        assert_eq!(
            cell_value(&Data::Int(exact + 1)),
            Value::Text("9007199254740993".to_string())
        );
        assert_eq!(
            cell_value(&Data::Int(i64::MIN)),
            Value::Text(i64::MIN.to_string())
        );
    }

    #[test]
    fn corrupt_bytes_are_unreadable() {
        let err = SpreadsheetParser
            .parse(b"definitely not a zip archive", "corrupt.xlsx")
            .unwrap_err();
        assert!(matches!(err, ParseError::UnreadableSource(_)));
    }
}
