//! Format parsers: one adapter per input format, each turning raw bytes into
//! ordered rows plus the source's [`HeaderSet`].

pub mod delimited;
pub mod ocr;
pub mod spreadsheet;

use std::fmt;

use serde::Serialize;

use crate::{data::Row, error::ParseError, headers::HeaderSet, io_utils};

pub use delimited::DelimitedParser;
pub use ocr::{OcrGridParser, TesseractRecognizer, TextRecognizer};
pub use spreadsheet::SpreadsheetParser;

/// Output of a single parse: rows in source order and the declared header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSource {
    pub header: HeaderSet,
    pub rows: Vec<Row>,
    /// Records whose excess trailing fields were dropped (OCR grids only).
    pub truncated_records: usize,
}

pub trait FormatParser: Send + Sync {
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedSource, ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
    Image,
}

impl SourceFormat {
    pub fn detect(filename: &str) -> Result<Self, ParseError> {
        let ext = io_utils::extension_of(filename).ok_or_else(|| {
            ParseError::UnsupportedFormat(format!("'{filename}' has no file extension"))
        })?;
        match ext.as_str() {
            "csv" | "tsv" => Ok(SourceFormat::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" | "webp" => {
                Ok(SourceFormat::Image)
            }
            other => Err(ParseError::UnsupportedFormat(format!(
                "extension '.{other}' of '{filename}' is not recognised"
            ))),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceFormat::Delimited => "delimited",
            SourceFormat::Spreadsheet => "spreadsheet",
            SourceFormat::Image => "image",
        };
        f.write_str(label)
    }
}
