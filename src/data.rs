use std::{collections::HashSet, fmt, sync::Arc};

use serde::{Serialize, Serializer, ser::SerializeMap};

/// Preferred key under which a row's provenance is emitted in flat JSON objects.
///
/// A batch whose sources declare a column of this name uses the key returned
/// by [`provenance_key`] instead, so the tag and the column stay distinct.
pub const SOURCE_TAG_KEY: &str = "__source__";

/// [`SOURCE_TAG_KEY`], or the first `__source___N` that is not one of `columns`.
pub fn provenance_key<'a, I>(columns: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = columns.into_iter().collect();
    let mut key = SOURCE_TAG_KEY.to_string();
    let mut suffix = 1usize;
    while taken.contains(key.as_str()) {
        key = format!("{SOURCE_TAG_KEY}_{suffix}");
        suffix += 1;
    }
    key
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Empty,
}

impl Value {
    /// Builds a cell from raw text. Blank or whitespace-only input is `Empty`.
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Value::Empty
        } else {
            Value::Text(raw.to_string())
        }
    }

    /// Builds a numeric cell, falling back to text for values JSON cannot carry.
    pub fn from_number(number: f64) -> Self {
        if number.is_finite() {
            Value::Number(number)
        } else {
            Value::Text(number.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric reading of the cell, if it holds a finite real number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
            Value::Empty => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Empty => String::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Empty => serializer.serialize_str(""),
        }
    }
}

/// Parses `value` as a finite real number. Surrounding whitespace is ignored;
/// `NaN` and infinities are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// One ingested record: the columns its source declared, in header order,
/// plus the identity of that source.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    tag: Option<SourceTag>,
    cells: Vec<(String, Value)>,
}

#[derive(Debug, Clone, PartialEq)]
struct SourceTag {
    key: Arc<str>,
    source: Arc<str>,
}

impl Row {
    pub fn new(cells: Vec<(String, Value)>) -> Self {
        Self { tag: None, cells }
    }

    /// Attaches provenance under [`SOURCE_TAG_KEY`].
    pub fn with_source(self, source: Arc<str>) -> Self {
        self.with_tag(Arc::from(SOURCE_TAG_KEY), source)
    }

    /// Attaches provenance, serialised under `key`. A row is tagged once;
    /// later calls keep the first tag.
    pub fn with_tag(mut self, key: Arc<str>, source: Arc<str>) -> Self {
        if self.tag.is_none() {
            self.tag = Some(SourceTag { key, source });
        }
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.tag.as_ref().map(|tag| tag.source.as_ref())
    }

    /// JSON key the provenance is written under, if the row is tagged.
    pub fn tag_key(&self) -> Option<&str> {
        self.tag.as_ref().map(|tag| tag.key.as_ref())
    }

    /// Looks up a column. `None` means the source never declared it, which is
    /// distinct from `Some(&Value::Empty)`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let tagged = usize::from(self.tag.is_some());
        let mut map = serializer.serialize_map(Some(self.cells.len() + tagged))?;
        if let Some(tag) = &self.tag {
            map.serialize_entry(tag.key.as_ref(), tag.source.as_ref())?;
        }
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row() -> Row {
        Row::new(vec![
            ("Name".to_string(), Value::from_text("Ada")),
            ("Sales".to_string(), Value::from_number(12.5)),
            ("Notes".to_string(), Value::from_text("   ")),
        ])
    }

    #[test]
    fn parse_number_accepts_only_finite_values() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("-1.5e2"), Some(-150.0));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("12abc"), None);
    }

    #[test]
    fn whitespace_only_text_becomes_empty() {
        assert_eq!(Value::from_text("  \t"), Value::Empty);
        assert_eq!(Value::from_text(" x "), Value::Text(" x ".to_string()));
    }

    #[test]
    fn non_finite_numbers_are_kept_as_text() {
        assert!(matches!(Value::from_number(f64::NAN), Value::Text(_)));
        assert_eq!(Value::from_number(3.0), Value::Number(3.0));
    }

    #[test]
    fn absent_column_differs_from_empty_cell() {
        let row = sample_row();
        assert_eq!(row.get("Notes"), Some(&Value::Empty));
        assert_eq!(row.get("Region"), None);
    }

    #[test]
    fn source_tag_is_set_once() {
        let row = sample_row()
            .with_source(Arc::from("a.csv"))
            .with_source(Arc::from("b.csv"));
        assert_eq!(row.source(), Some("a.csv"));
    }

    #[test]
    fn row_serializes_as_flat_tagged_object() {
        let row = sample_row().with_source(Arc::from("sales.csv"));
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(
            value,
            json!({"__source__": "sales.csv", "Name": "Ada", "Sales": 12.5, "Notes": ""})
        );
    }

    #[test]
    fn provenance_key_avoids_declared_columns() {
        assert_eq!(provenance_key(["Name", "Sales"]), "__source__");
        assert_eq!(provenance_key(["__source__", "v"]), "__source___1");
        assert_eq!(
            provenance_key(["__source__", "__source___1"]),
            "__source___2"
        );
    }

    #[test]
    fn tag_and_same_named_column_serialize_under_distinct_keys() {
        let row = Row::new(vec![
            ("__source__".to_string(), Value::from_text("crm")),
            ("v".to_string(), Value::from_text("1")),
        ])
        .with_tag(Arc::from("__source___1"), Arc::from("leads.csv"));
        assert_eq!(row.get("__source__"), Some(&Value::Text("crm".into())));
        assert_eq!(row.tag_key(), Some("__source___1"));
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"__source___1": "leads.csv", "__source__": "crm", "v": "1"})
        );
    }

    #[test]
    fn display_drops_trailing_zero_fraction() {
        assert_eq!(Value::Number(7.0).as_display(), "7");
        assert_eq!(Value::Number(7.25).as_display(), "7.25");
    }
}
