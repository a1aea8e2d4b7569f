//! JSON bodies for the remote analysis service.
//!
//! Rows go out flat and source-tagged; every cell is a string or a finite
//! number, so the body is always valid JSON.

use serde::Serialize;

use crate::{data::Row, ingest::Dataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
}

const ARABIC_BLOCK: std::ops::RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

/// Arabic script anywhere in the text means Arabic; everything else English.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|c| ARABIC_BLOCK.contains(&c)) {
        Language::Ar
    } else {
        Language::En
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest<'a> {
    pub message: &'a str,
    pub data: &'a [Row],
    pub lang: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(message: &'a str, dataset: &'a Dataset) -> Self {
        Self {
            message,
            data: dataset.rows(),
            lang: detect_language(message),
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<&'a str>) -> Self {
        self.model = model;
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyDetectionFile<'a> {
    #[serde(rename = "fileName")]
    pub file_name: &'a str,
    pub data: Vec<&'a Row>,
}

/// Rows grouped per source, for the join-key detection endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct KeyDetectionRequest<'a> {
    pub files: Vec<KeyDetectionFile<'a>>,
}

impl<'a> KeyDetectionRequest<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        let files = dataset
            .sources()
            .keys()
            .map(|source| KeyDetectionFile {
                file_name: source,
                data: dataset.rows_for(source).collect(),
            })
            .collect();
        Self { files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_arabic_script() {
        assert_eq!(detect_language("ما هي النسبة بين الربح والتكلفة؟"), Language::Ar);
        assert_eq!(detect_language("What is the margin?"), Language::En);
        assert_eq!(detect_language("Sales مبيعات"), Language::Ar);
        assert_eq!(detect_language("\u{0600}"), Language::Ar);
        assert_eq!(detect_language("\u{06FF}"), Language::Ar);
        assert_eq!(detect_language("\u{0700} Syriac"), Language::En);
        assert_eq!(detect_language(""), Language::En);
    }
}
