//! Quick per-column summaries over a unified dataset.
//!
//! Numeric columns get count/min/max/mean; categorical columns get the most
//! frequent values. Columns with no non-empty values summarise to a zero count
//! without dividing by it.

use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    data::{Value, format_number},
    infer::ColumnKind,
    ingest::Dataset,
};

pub const DEFAULT_TOP_VALUES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub kind: ColumnKind,
    pub count: usize,
    pub detail: SummaryDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryDetail {
    Numeric { min: f64, max: f64, mean: f64 },
    Categorical { top: Vec<FrequencyEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

pub fn summarize(dataset: &Dataset, top: usize) -> Vec<ColumnSummary> {
    dataset
        .columns()
        .iter()
        .map(|column| {
            let values = dataset
                .rows()
                .iter()
                .filter_map(|row| row.get(column))
                .filter(|value| !value.is_empty());
            let kind = dataset.kind(column).unwrap_or(ColumnKind::Categorical);
            summarize_column(column, kind, values, top)
        })
        .collect()
}

fn summarize_column<'a, I>(column: &str, kind: ColumnKind, values: I, top: usize) -> ColumnSummary
where
    I: Iterator<Item = &'a Value>,
{
    match kind {
        ColumnKind::Numeric => {
            let mut stats = NumericStats::default();
            for number in values.filter_map(Value::as_number) {
                stats.add(number);
            }
            let detail = match (stats.min, stats.max, stats.mean()) {
                (Some(min), Some(max), Some(mean)) => SummaryDetail::Numeric { min, max, mean },
                _ => SummaryDetail::Categorical { top: Vec::new() },
            };
            ColumnSummary {
                column: column.to_string(),
                kind,
                count: stats.count,
                detail,
            }
        }
        ColumnKind::Categorical => {
            let mut counts: HashMap<String, usize> = HashMap::new();
            let mut total = 0usize;
            for value in values {
                *counts.entry(value.as_display()).or_insert(0) += 1;
                total += 1;
            }
            let mut top_values = counts
                .into_iter()
                .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
                .map(|(value, count)| FrequencyEntry { value, count })
                .collect::<Vec<_>>();
            if top > 0 {
                top_values.truncate(top);
            }
            ColumnSummary {
                column: column.to_string(),
                kind,
                count: total,
                detail: SummaryDetail::Categorical { top: top_values },
            }
        }
    }
}

#[derive(Debug, Default)]
struct NumericStats {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl NumericStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
    }

    fn mean(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }
}

/// Table rows: column, kind, count, min, max, mean, top values.
pub fn render_rows(summaries: &[ColumnSummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|summary| {
            let (min, max, mean, top) = match &summary.detail {
                SummaryDetail::Numeric { min, max, mean } => (
                    format_number(*min),
                    format_number(*max),
                    format!("{mean:.2}"),
                    String::new(),
                ),
                SummaryDetail::Categorical { top } => (
                    String::new(),
                    String::new(),
                    String::new(),
                    top.iter()
                        .map(|entry| format!("{} ({})", entry.value, entry.count))
                        .join(", "),
                ),
            };
            vec![
                summary.column.clone(),
                summary.kind.to_string(),
                summary.count.to_string(),
                min,
                max,
                mean,
                top,
            ]
        })
        .collect()
}

/// One-line digest, e.g. `Average of Sales: 12.50 | Most frequent Region: North`.
pub fn digest(summaries: &[ColumnSummary]) -> String {
    if summaries.is_empty() {
        return "No columns to analyze.".to_string();
    }
    summaries
        .iter()
        .map(|summary| match &summary.detail {
            SummaryDetail::Numeric { mean, .. } => {
                format!("Average of {}: {mean:.2}", summary.column)
            }
            SummaryDetail::Categorical { top } => match top.first() {
                Some(entry) => format!("Most frequent {}: {}", summary.column, entry.value),
                None => format!("No values in {}", summary.column),
            },
        })
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Value {
        Value::from_text(value)
    }

    #[test]
    fn numeric_summary_reports_min_max_mean() {
        let values = [text("4"), Value::Number(10.0), text("1")];
        let summary = summarize_column("qty", ColumnKind::Numeric, values.iter(), 3);
        assert_eq!(summary.count, 3);
        assert_eq!(
            summary.detail,
            SummaryDetail::Numeric {
                min: 1.0,
                max: 10.0,
                mean: 5.0
            }
        );
    }

    #[test]
    fn categorical_summary_orders_by_count_then_value() {
        let values = [text("b"), text("a"), text("b"), text("c"), text("a")];
        let summary = summarize_column("tag", ColumnKind::Categorical, values.iter(), 2);
        assert_eq!(summary.count, 5);
        assert_eq!(
            summary.detail,
            SummaryDetail::Categorical {
                top: vec![
                    FrequencyEntry {
                        value: "a".into(),
                        count: 2
                    },
                    FrequencyEntry {
                        value: "b".into(),
                        count: 2
                    },
                ]
            }
        );
    }

    #[test]
    fn empty_column_summarises_without_division() {
        let summary = summarize_column("blank", ColumnKind::Categorical, std::iter::empty(), 3);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.detail, SummaryDetail::Categorical { top: Vec::new() });
        assert_eq!(digest(&[summary]), "No values in blank");
    }

    #[test]
    fn digest_joins_each_column() {
        let summaries = vec![
            summarize_column("Sales", ColumnKind::Numeric, [text("10"), text("15")].iter(), 3),
            summarize_column("Region", ColumnKind::Categorical, [text("North")].iter(), 3),
        ];
        assert_eq!(
            digest(&summaries),
            "Average of Sales: 12.50 | Most frequent Region: North"
        );
    }

    #[test]
    fn render_rows_formats_both_kinds() {
        let summaries = vec![
            summarize_column("Sales", ColumnKind::Numeric, [text("10"), text("15")].iter(), 3),
            summarize_column("Region", ColumnKind::Categorical, [text("N"), text("N")].iter(), 3),
        ];
        let rows = render_rows(&summaries);
        assert_eq!(rows[0], ["Sales", "numeric", "2", "10", "15", "12.50", ""]);
        assert_eq!(rows[1], ["Region", "categorical", "2", "", "", "", "N (2)"]);
    }
}
