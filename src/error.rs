//! Error taxonomy for ingestion.
//!
//! Per-file problems are [`ParseError`]s. They never abort a batch on their
//! own; the coordinator records them as [`SourceFailure`]s and carries on with
//! the remaining files. Only batch-level conditions become a [`BatchError`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("unreadable source: {0}")]
    UnreadableSource(String),
    #[error("malformed row at data record {record}: expected {expected} field(s), found {found}")]
    MalformedRow {
        record: usize,
        expected: usize,
        found: usize,
    },
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl ParseError {
    pub fn unreadable(detail: impl fmt::Display) -> Self {
        ParseError::UnreadableSource(detail.to_string())
    }

    pub fn reason(&self) -> FailureReason {
        match self {
            ParseError::UnreadableSource(_) => FailureReason::UnreadableSource,
            ParseError::MalformedRow { .. } => FailureReason::MalformedRow,
            ParseError::UnsupportedFormat(_) => FailureReason::UnsupportedFormat,
        }
    }
}

/// Serialisable classification of why a file was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureReason {
    UnreadableSource,
    MalformedRow,
    UnsupportedFormat,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureReason::UnreadableSource => "UnreadableSource",
            FailureReason::MalformedRow => "MalformedRow",
            FailureReason::UnsupportedFormat => "UnsupportedFormat",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: FailureReason,
    pub detail: String,
}

impl SourceFailure {
    pub fn new(source: impl Into<String>, error: &ParseError) -> Self {
        Self {
            source: source.into(),
            reason: error.reason(),
            detail: error.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no files were submitted")]
    EmptyBatch,
    #[error("all {} source(s) failed: {}", .0.len(), describe_failures(.0))]
    AllSourcesFailed(Vec<SourceFailure>),
    #[error("batch {generation} was superseded by a newer batch")]
    Superseded { generation: u64 },
}

fn describe_failures(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{} ({})", failure.source, failure.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("{groups} column group(s) selected but the dataset has {sources} source(s)")]
    SelectionMismatch { groups: usize, sources: usize },
    #[error("column '{column}' is not declared by source '{source_name}'")]
    UnknownColumn { source_name: String, column: String },
    #[error("no columns selected")]
    NothingSelected,
}
