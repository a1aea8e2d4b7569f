//! Per-source header sets and the cross-source header union.
//!
//! A [`HeaderSet`] is the ordered, duplicate-free list of column names one
//! source declares. [`unify_headers`] folds the header sets of a batch into a
//! [`HeaderUnion`]: the verbatim source→header mapping, the first-seen-order
//! union of all names, and which sources contributed each name.

use std::{collections::HashSet, ops::Deref};

use indexmap::IndexMap;
use serde::Serialize;

/// Name given to a blank header cell before de-duplication.
pub const BLANK_HEADER: &str = "__EMPTY";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSet(Vec<String>);

impl HeaderSet {
    /// Normalises raw header cells: blanks become [`BLANK_HEADER`], and repeats
    /// are suffixed `_1`, `_2`, ... Every other name is kept verbatim.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut taken: HashSet<String> = HashSet::new();
        let mut names = Vec::new();
        for cell in raw {
            let base = match cell.as_ref().trim() {
                "" => BLANK_HEADER.to_string(),
                _ => cell.as_ref().to_string(),
            };
            let mut candidate = base.clone();
            let mut suffix = 1usize;
            while taken.contains(&candidate) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            taken.insert(candidate.clone());
            names.push(candidate);
        }
        HeaderSet(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|h| h == name)
    }
}

impl Deref for HeaderSet {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeaderUnion {
    pub sources: IndexMap<String, HeaderSet>,
    pub columns: Vec<String>,
    pub contributors: IndexMap<String, Vec<String>>,
}

pub fn unify_headers<I>(per_source: I) -> HeaderUnion
where
    I: IntoIterator<Item = (String, HeaderSet)>,
{
    let mut union = HeaderUnion::default();
    for (source, headers) in per_source {
        for name in headers.iter() {
            let contributors = union.contributors.entry(name.clone()).or_insert_with(|| {
                union.columns.push(name.clone());
                Vec::new()
            });
            contributors.push(source.clone());
        }
        union.sources.insert(source, headers);
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> HeaderSet {
        HeaderSet::from_raw(names.iter().copied())
    }

    #[test]
    fn from_raw_disambiguates_duplicates_in_order() {
        let set = headers(&["a", "b", "a", "a"]);
        assert_eq!(set.names(), ["a", "b", "a_1", "a_2"]);
    }

    #[test]
    fn from_raw_names_blank_cells() {
        let set = headers(&["id", "", " ", "total"]);
        assert_eq!(set.names(), ["id", "__EMPTY", "__EMPTY_1", "total"]);
    }

    #[test]
    fn from_raw_keeps_a_column_named_like_the_tag() {
        let set = headers(&["__source__", "value"]);
        assert_eq!(set.names(), ["__source__", "value"]);
    }

    #[test]
    fn from_raw_skips_suffix_already_declared() {
        let set = headers(&["a", "a_1", "a"]);
        assert_eq!(set.names(), ["a", "a_1", "a_2"]);
    }

    #[test]
    fn union_keeps_first_seen_order() {
        let union = unify_headers(vec![
            ("A.csv".to_string(), headers(&["Name", "Sales"])),
            ("B.xlsx".to_string(), headers(&["Sales", "Region"])),
        ]);
        assert_eq!(union.columns, ["Name", "Sales", "Region"]);
        assert_eq!(
            union.sources.keys().collect::<Vec<_>>(),
            ["A.csv", "B.xlsx"]
        );
        assert_eq!(union.contributors["Sales"], ["A.csv", "B.xlsx"]);
        assert_eq!(union.contributors["Region"], ["B.xlsx"]);
    }

    #[test]
    fn union_of_nothing_is_empty() {
        let union = unify_headers(Vec::new());
        assert!(union.columns.is_empty());
        assert!(union.sources.is_empty());
    }
}
