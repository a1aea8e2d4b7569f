//! Text grids recovered from images.
//!
//! Recognition itself is delegated to a [`TextRecognizer`]. The recognised text
//! is read as a whitespace-separated grid: the first non-blank line names the
//! columns, every later non-blank line is a row zipped by position. Short lines
//! are padded with empty cells; long lines are truncated to the header width and
//! counted in [`ParsedSource::truncated_records`].

use std::{
    io::Write,
    process::{Command, Stdio},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::{
    data::{Row, Value},
    error::ParseError,
    headers::HeaderSet,
};

use super::{FormatParser, ParsedSource};

pub const DEFAULT_OCR_LANGUAGES: &str = "eng+ara";

/// Turns image bytes into plain text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<String>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&[u8]) -> Result<String> + Send + Sync,
{
    fn recognize(&self, image: &[u8]) -> Result<String> {
        self(image)
    }
}

/// Runs the `tesseract` command line tool, feeding the image on stdin.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: String,
    languages: String,
}

impl TesseractRecognizer {
    pub fn new(program: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            languages: languages.into(),
        }
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract", DEFAULT_OCR_LANGUAGES)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<String> {
        debug!("Running {} -l {}", self.program, self.languages);
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "-l", &self.languages])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Starting OCR program '{}'", self.program))?;
        let sent = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(image)
                .context("Sending image to OCR program"),
            None => Err(anyhow!("OCR program stdin unavailable")),
        };
        if let Err(err) = sent {
            // Reap the child so a failed send does not leave it running.
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }
        let output = child
            .wait_with_output()
            .context("Waiting for OCR program")?;
        if !output.status.success() {
            return Err(anyhow!(
                "OCR program exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        String::from_utf8(output.stdout).context("OCR output is not valid UTF-8")
    }
}

#[derive(Clone)]
pub struct OcrGridParser {
    recognizer: Arc<dyn TextRecognizer>,
}

impl OcrGridParser {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }
}

impl FormatParser for OcrGridParser {
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedSource, ParseError> {
        let text = self
            .recognizer
            .recognize(bytes)
            .map_err(|err| ParseError::unreadable(format!("{filename}: {err:#}")))?;
        Ok(parse_text_grid(&text))
    }
}

pub fn parse_text_grid(text: &str) -> ParsedSource {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let header = match lines.next() {
        Some(line) => HeaderSet::from_raw(line.split_whitespace()),
        None => return ParsedSource::default(),
    };

    let mut truncated_records = 0usize;
    let rows = lines
        .map(|line| {
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            if tokens.len() > header.len() {
                truncated_records += 1;
            }
            let cells = header
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let value = tokens
                        .get(idx)
                        .map(|token| Value::from_text(token))
                        .unwrap_or(Value::Empty);
                    (name.clone(), value)
                })
                .collect();
            Row::new(cells)
        })
        .collect();

    ParsedSource {
        header,
        rows,
        truncated_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_pads_short_lines_with_empty_cells() {
        let parsed = parse_text_grid("Name Qty Price\nbolt 4\n");
        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.get("Qty"), Some(&Value::Text("4".into())));
        assert_eq!(row.get("Price"), Some(&Value::Empty));
        assert_eq!(row.len(), 3);
        assert_eq!(parsed.truncated_records, 0);
    }

    #[test]
    fn grid_truncates_long_lines_and_counts_them() {
        let parsed = parse_text_grid("Name Qty\nbolt 4 extra tokens\nnut 2\n");
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].len(), 2);
        assert_eq!(parsed.rows[0].get("Qty"), Some(&Value::Text("4".into())));
        assert_eq!(parsed.truncated_records, 1);
    }

    #[test]
    fn grid_skips_blank_lines_before_and_between_rows() {
        let parsed = parse_text_grid("\n   \nA  B\n\n1 2\n  \n3 4\n");
        assert_eq!(parsed.header.names(), ["A", "B"]);
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn blank_text_yields_empty_source() {
        let parsed = parse_text_grid(" \n\n");
        assert!(parsed.header.is_empty());
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn missing_ocr_program_is_reported() {
        let recognizer = TesseractRecognizer::new("definitely-not-an-ocr-binary", "eng");
        let err = recognizer.recognize(b"img").unwrap_err();
        assert!(format!("{err:#}").contains("definitely-not-an-ocr-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn program_that_ignores_stdin_is_reaped() {
        // `true` exits without reading, so a large image hits a closed pipe.
        let recognizer = TesseractRecognizer::new("true", "eng");
        let image = vec![0u8; 4 * 1024 * 1024];
        let err = recognizer.recognize(&image).unwrap_err();
        assert!(format!("{err:#}").contains("Sending image to OCR program"));
    }

    #[test]
    fn recognizer_failure_is_unreadable() {
        let recognizer = |_: &[u8]| -> Result<String> { Err(anyhow!("engine crashed")) };
        let parser = OcrGridParser::new(Arc::new(recognizer));
        let err = parser.parse(b"\x89PNG", "scan.png").unwrap_err();
        assert!(matches!(err, ParseError::UnreadableSource(ref d) if d.contains("engine crashed")));
    }

    #[test]
    fn closure_recognizer_feeds_grid_parser() {
        let recognizer = |_: &[u8]| -> Result<String> { Ok("Item Count\npen 3\n".to_string()) };
        let parser = OcrGridParser::new(Arc::new(recognizer));
        let parsed = parser.parse(b"img", "scan.png").unwrap();
        assert_eq!(parsed.header.names(), ["Item", "Count"]);
        assert_eq!(parsed.rows[0].get("Count"), Some(&Value::Text("3".into())));
    }
}
