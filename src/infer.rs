//! Column kind inference.
//!
//! A column is [`ColumnKind::Numeric`] only when every non-empty value for its
//! name, across every row of the unified dataset, parses as a finite number.
//! One stray value anywhere makes it categorical, and so does having no
//! non-empty values at all.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::data::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => f.write_str("numeric"),
            ColumnKind::Categorical => f.write_str("categorical"),
        }
    }
}

#[derive(Debug, Clone)]
struct KindCandidate {
    observed: usize,
    possible_numeric: bool,
}

impl KindCandidate {
    fn new() -> Self {
        Self {
            observed: 0,
            possible_numeric: true,
        }
    }

    fn decide(&self) -> ColumnKind {
        if self.observed > 0 && self.possible_numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }
}

pub fn infer_kind(rows: &[Row], column: &str) -> ColumnKind {
    let mut candidate = KindCandidate::new();
    for value in rows.iter().filter_map(|row| row.get(column)) {
        if value.is_empty() {
            continue;
        }
        candidate.observed += 1;
        if value.as_number().is_none() {
            candidate.possible_numeric = false;
            break;
        }
    }
    candidate.decide()
}

/// Classifies each of `columns`, keyed in the order given.
pub fn infer_kinds(rows: &[Row], columns: &[String]) -> IndexMap<String, ColumnKind> {
    columns
        .iter()
        .map(|column| (column.clone(), infer_kind(rows, column)))
        .collect()
}
