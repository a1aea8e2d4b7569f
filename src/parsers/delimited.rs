//! Delimited text (CSV/TSV).
//!
//! The first record names the columns; every later record is one row. Field
//! counts are strict: a data record whose length differs from the header fails
//! the whole source with [`ParseError::MalformedRow`]. Blank lines are skipped.

use encoding_rs::{Encoding, UTF_8};

use crate::{
    data::{Row, Value},
    error::ParseError,
    headers::HeaderSet,
    io_utils,
};

use super::{FormatParser, ParsedSource};

#[derive(Debug, Clone)]
pub struct DelimitedParser {
    delimiter: Option<u8>,
    encoding: &'static Encoding,
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl DelimitedParser {
    pub fn new(delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        Self {
            delimiter,
            encoding,
        }
    }
}

impl FormatParser for DelimitedParser {
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedSource, ParseError> {
        let delimiter = io_utils::resolve_input_delimiter(filename, self.delimiter);
        let text = io_utils::decode_bytes(bytes, self.encoding).map_err(ParseError::unreadable)?;
        let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter, true);
        let header = HeaderSet::from_raw(
            reader
                .headers()
                .map_err(ParseError::unreadable)?
                .iter()
                .collect::<Vec<_>>(),
        );

        let mut rows = Vec::new();
        let mut record = csv::StringRecord::new();
        let mut index = 0usize;
        loop {
            match reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => return Err(ParseError::unreadable(err)),
            }
            index += 1;
            if record.len() != header.len() {
                return Err(ParseError::MalformedRow {
                    record: index,
                    expected: header.len(),
                    found: record.len(),
                });
            }
            let cells = header
                .iter()
                .zip(record.iter())
                .map(|(name, field)| (name.clone(), Value::from_text(field)))
                .collect();
            rows.push(Row::new(cells));
        }

        Ok(ParsedSource {
            header,
            rows,
            truncated_records: 0,
        })
    }
}
