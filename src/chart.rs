//! Chart configuration for the charting front end.
//!
//! This builds the data a renderer needs (type, labels, series); drawing is
//! left to the consumer.

use clap::ValueEnum;
use serde::Serialize;

use crate::{error::ChartError, infer::ColumnKind, ingest::Dataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Auto,
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub source: String,
    pub column: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSuggestion {
    pub x: String,
    pub y: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
}

/// First plottable column of every source, skipping placeholder names such as
/// `__EMPTY`.
pub fn default_selection(dataset: &Dataset) -> Vec<Vec<String>> {
    dataset
        .sources()
        .values()
        .map(|headers| {
            headers
                .iter()
                .find(|name| !name.to_ascii_lowercase().contains("empty"))
                .cloned()
                .into_iter()
                .collect()
        })
        .collect()
}

/// A categorical column with values for the x axis and a numeric one for y.
pub fn suggest(dataset: &Dataset) -> Option<ChartSuggestion> {
    let x = dataset.columns().iter().find(|column| {
        dataset.kind(column) == Some(ColumnKind::Categorical)
            && dataset
                .rows()
                .iter()
                .any(|row| row.get(column).is_some_and(|value| !value.is_empty()))
    })?;
    let y = dataset
        .columns()
        .iter()
        .find(|column| dataset.kind(column) == Some(ColumnKind::Numeric))?;
    Some(ChartSuggestion {
        x: x.clone(),
        y: y.clone(),
        chart_type: ChartType::Bar,
    })
}

/// Builds a chart from per-source column groups, aligned with the dataset's
/// source order.
pub fn build_chart(
    dataset: &Dataset,
    selection: &[Vec<String>],
    chart_type: ChartType,
) -> Result<ChartSpec, ChartError> {
    let sources = dataset.sources();
    if selection.len() != sources.len() {
        return Err(ChartError::SelectionMismatch {
            groups: selection.len(),
            sources: sources.len(),
        });
    }
    let multi_source = selection.iter().filter(|cols| !cols.is_empty()).count() > 1;

    let mut series = Vec::new();
    for ((source, headers), columns) in sources.iter().zip(selection) {
        for column in columns {
            if headers.position(column).is_none() {
                return Err(ChartError::UnknownColumn {
                    source_name: source.clone(),
                    column: column.clone(),
                });
            }
            let data = dataset
                .rows_for(source)
                .map(|row| row.get(column).and_then(|v| v.as_number()).unwrap_or(0.0))
                .collect();
            let label = if multi_source {
                format!("{column} - {source}")
            } else {
                column.clone()
            };
            series.push(ChartSeries {
                label,
                source: source.clone(),
                column: column.clone(),
                data,
            });
        }
    }
    let first = series.first().ok_or(ChartError::NothingSelected)?;

    let resolved = match chart_type {
        ChartType::Auto => match dataset.kind(&first.column) {
            Some(ColumnKind::Numeric) => ChartType::Line,
            _ => ChartType::Bar,
        },
        explicit => explicit,
    };

    if resolved == ChartType::Pie {
        let labels = series.iter().map(|s| s.label.clone()).collect();
        let totals = series.iter().map(|s| s.data.iter().sum()).collect();
        return Ok(ChartSpec {
            chart_type: ChartType::Pie,
            labels,
            series: vec![ChartSeries {
                label: "total".to_string(),
                source: String::new(),
                column: String::new(),
                data: totals,
            }],
        });
    }

    let longest = series.iter().map(|s| s.data.len()).max().unwrap_or(0);
    Ok(ChartSpec {
        chart_type: resolved,
        labels: (1..=longest).map(|idx| idx.to_string()).collect(),
        series,
    })
}
