use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{chart::ChartType, parsers::ocr::DEFAULT_OCR_LANGUAGES};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ingest CSV, spreadsheet and OCR'd files into one dataset", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest a batch of files and report what was loaded or skipped
    Ingest(IngestArgs),
    /// Show the first rows of the unified dataset
    Preview(PreviewArgs),
    /// Summarise every column by its inferred kind
    Summary(SummaryArgs),
    /// Emit a chart configuration as JSON
    Chart(ChartArgs),
    /// Emit the JSON request body for the remote analysis service
    Payload(PayloadArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Input file (csv, tsv, xlsx, xls, ods, or an image); repeat for a batch
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Delimiter for delimited inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of parser threads (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    pub workers: usize,
    /// OCR program used for image inputs (tesseract-compatible)
    #[arg(long = "ocr-command")]
    pub ocr_command: Option<String>,
    /// OCR language list passed to the OCR program
    #[arg(long = "ocr-lang", default_value = DEFAULT_OCR_LANGUAGES)]
    pub ocr_lang: String,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Write the unified dataset as JSON to this path
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Only show rows with a cell containing this text (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Most frequent values to list per categorical column (0 = all)
    #[arg(long, default_value_t = crate::insights::DEFAULT_TOP_VALUES)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Chart type
    #[arg(long = "type", value_enum, default_value = "auto")]
    pub chart_type: ChartType,
    /// Columns to plot for one source as `SOURCE=col1,col2`; repeatable
    #[arg(long = "select", action = clap::ArgAction::Append)]
    pub select: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PayloadArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Free-text question or instruction for the analysis service
    #[arg(long)]
    pub message: String,
    /// Model name forwarded to the analysis service
    #[arg(long)]
    pub model: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

/// Splits `SOURCE=col1,col2` into the source identifier and its columns.
pub fn parse_selection(value: &str) -> Result<(String, Vec<String>), String> {
    let (source, columns) = value
        .split_once('=')
        .ok_or_else(|| format!("Selection '{value}' must look like SOURCE=col1,col2"))?;
    let source = source.trim();
    if source.is_empty() {
        return Err(format!("Selection '{value}' is missing a source name"));
    }
    let columns = columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    Ok((source.to_string(), columns))
}
