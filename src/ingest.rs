//! Batch ingestion coordinator.
//!
//! An [`Ingestor`] turns one submission of files into a [`Dataset`] and an
//! [`IngestReport`]:
//!
//! `Idle → Parsing(k of n) → Tagging → Unifying → Inferring → Ready`, or
//! `Failed(reason)`.
//!
//! Files are parsed in parallel on a rayon pool. Results are always assembled in
//! submission order, never completion order. A file that fails to parse is
//! skipped and listed in the report; the batch only fails when every file does.
//! Each batch takes a fresh generation number, and a batch that is no longer the
//! newest when it finishes is discarded instead of committed.

use std::{
    borrow::Cow,
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{
    data::{Row, provenance_key},
    error::{BatchError, ParseError, SourceFailure},
    headers::{HeaderSet, unify_headers},
    infer::{ColumnKind, infer_kinds},
    io_utils,
    parsers::{
        DelimitedParser, FormatParser, OcrGridParser, ParsedSource, SourceFormat,
        SpreadsheetParser, TextRecognizer,
    },
    tagger::tag_rows,
};

/// One uploaded file, either already in memory or still on disk.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    input: SourceInput,
}

#[derive(Debug, Clone)]
enum SourceInput {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl SourceFile {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            input: SourceInput::Bytes(bytes.into()),
        }
    }

    /// Defers reading until the file is parsed, so reads run on the pool too.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            name: io_utils::file_name_of(path),
            input: SourceInput::Path(path.to_path_buf()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Cow<'_, [u8]>, ParseError> {
        match &self.input {
            SourceInput::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            SourceInput::Path(path) => io_utils::read_file(path)
                .map(Cow::Owned)
                .map_err(|err| ParseError::unreadable(format!("{err:#}"))),
        }
    }
}

#[derive(Clone)]
pub struct IngestOptions {
    /// Overrides extension-based delimiter detection for delimited files.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    /// Parser threads; 0 lets rayon choose.
    pub workers: usize,
    /// Required for image sources; without it images are unsupported.
    pub recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            workers: 0,
            recognizer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IngestState {
    Idle,
    Parsing { done: usize, total: usize },
    Tagging,
    Unifying,
    Inferring,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub format: SourceFormat,
    pub rows: usize,
    pub columns: Vec<String>,
    pub truncated_records: usize,
    pub empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub generation: u64,
    pub sources: Vec<SourceReport>,
    pub failures: Vec<SourceFailure>,
}

impl IngestReport {
    pub fn total_rows(&self) -> usize {
        self.sources.iter().map(|s| s.rows).sum()
    }

    pub fn render_rows(&self) -> Vec<Vec<String>> {
        let ingested = self.sources.iter().map(|source| {
            let note = if source.empty {
                "no data rows".to_string()
            } else if source.truncated_records > 0 {
                format!("{} line(s) truncated", source.truncated_records)
            } else {
                String::new()
            };
            vec![
                source.source.clone(),
                source.format.to_string(),
                "ingested".to_string(),
                source.rows.to_string(),
                source.columns.len().to_string(),
                note,
            ]
        });
        let skipped = self.failures.iter().map(|failure| {
            vec![
                failure.source.clone(),
                String::new(),
                format!("skipped: {}", failure.reason),
                String::new(),
                String::new(),
                failure.detail.clone(),
            ]
        });
        ingested.chain(skipped).collect()
    }
}

/// Unified, read-only result of one ingestion batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    rows: Vec<Row>,
    sources: IndexMap<String, HeaderSet>,
    columns: Vec<String>,
    contributors: IndexMap<String, Vec<String>>,
    kinds: IndexMap<String, ColumnKind>,
    failures: Vec<SourceFailure>,
    source_key: String,
}

impl Dataset {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Source identifiers mapped to their header sets, in submission order.
    pub fn sources(&self) -> &IndexMap<String, HeaderSet> {
        &self.sources
    }

    /// Union of all column names, first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contributors(&self, column: &str) -> &[String] {
        self.contributors
            .get(column)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> &IndexMap<String, ColumnKind> {
        &self.kinds
    }

    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.kinds.get(column).copied()
    }

    pub fn failures(&self) -> &[SourceFailure] {
        &self.failures
    }

    /// Key carrying each row's source in flat JSON; never one of [`Self::columns`].
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    pub fn rows_for<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.source() == Some(source))
    }

    /// SHA-256 of the canonical JSON form; equal datasets share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub dataset: Arc<Dataset>,
    pub report: IngestReport,
}

pub struct Ingestor {
    options: IngestOptions,
    pool: rayon::ThreadPool,
    generation: AtomicU64,
    state: Mutex<IngestState>,
    committed: Mutex<Option<Arc<Dataset>>>,
}

impl Ingestor {
    pub fn new(options: IngestOptions) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .thread_name(|idx| format!("ingest-{idx}"))
            .build()
            .context("Building parser thread pool")?;
        Ok(Self {
            options,
            pool,
            generation: AtomicU64::new(0),
            state: Mutex::new(IngestState::Idle),
            committed: Mutex::new(None),
        })
    }

    pub fn state(&self) -> IngestState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Dataset of the most recent batch that reached `Ready`.
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn ingest(&self, files: Vec<SourceFile>) -> Result<IngestOutcome, BatchError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if files.is_empty() {
            self.transition(generation, IngestState::Failed("EmptyBatch".to_string()));
            return Err(BatchError::EmptyBatch);
        }

        let total = files.len();
        info!("Batch {generation}: ingesting {total} file(s)");
        self.transition(generation, IngestState::Parsing { done: 0, total });
        let identities = assign_identities(&files);

        // Collecting an indexed parallel iterator keeps submission order.
        let results: Vec<Result<(SourceFormat, ParsedSource), ParseError>> =
            self.pool.install(|| {
                files
                    .par_iter()
                    .map(|file| {
                        let result = self.parse_file(file);
                        self.record_progress(generation);
                        result
                    })
                    .collect()
            });
        if !self.is_current(generation) {
            return Err(BatchError::Superseded { generation });
        }

        let mut parsed = Vec::new();
        let mut failures = Vec::new();
        for (identity, result) in identities.into_iter().zip(results) {
            match result {
                Ok((format, source)) => parsed.push((identity, format, source)),
                Err(err) => {
                    warn!("Skipping '{identity}': {err}");
                    failures.push(SourceFailure::new(identity, &err));
                }
            }
        }
        if parsed.is_empty() {
            self.transition(
                generation,
                IngestState::Failed("AllSourcesFailed".to_string()),
            );
            return Err(BatchError::AllSourcesFailed(failures));
        }

        self.transition(generation, IngestState::Tagging);
        let source_key = provenance_key(
            parsed
                .iter()
                .flat_map(|(_, _, source)| source.header.iter().map(String::as_str)),
        );
        let mut rows = Vec::new();
        let mut headers = Vec::with_capacity(parsed.len());
        let mut reports = Vec::with_capacity(parsed.len());
        for (identity, format, source) in parsed {
            let row_count = source.rows.len();
            if row_count == 0 {
                info!("'{identity}' has no data rows");
            } else {
                info!("✓ Parsed '{identity}' ({format}, {row_count} row(s))");
            }
            rows.extend(tag_rows(source.rows, &identity, &source_key));
            reports.push(SourceReport {
                source: identity.clone(),
                format,
                rows: row_count,
                columns: source.header.names().to_vec(),
                truncated_records: source.truncated_records,
                empty: row_count == 0,
            });
            headers.push((identity, source.header));
        }

        self.transition(generation, IngestState::Unifying);
        let union = unify_headers(headers);

        self.transition(generation, IngestState::Inferring);
        let kinds = infer_kinds(&rows, &union.columns);

        let dataset = Arc::new(Dataset {
            rows,
            sources: union.sources,
            columns: union.columns,
            contributors: union.contributors,
            kinds,
            failures: failures.clone(),
            source_key,
        });
        let report = IngestReport {
            generation,
            sources: reports,
            failures,
        };
        self.commit(generation, Arc::clone(&dataset))?;
        info!(
            "Batch {generation}: {} row(s) from {} source(s), {} skipped",
            report.total_rows(),
            report.sources.len(),
            report.failures.len()
        );
        Ok(IngestOutcome { dataset, report })
    }

    fn parse_file(&self, file: &SourceFile) -> Result<(SourceFormat, ParsedSource), ParseError> {
        let format = SourceFormat::detect(file.name())?;
        let parser = self.parser_for(format, file.name())?;
        let bytes = file.load()?;
        let parsed = parser.parse(&bytes, file.name())?;
        Ok((format, parsed))
    }

    fn parser_for(
        &self,
        format: SourceFormat,
        filename: &str,
    ) -> Result<Box<dyn FormatParser>, ParseError> {
        match format {
            SourceFormat::Delimited => Ok(Box::new(DelimitedParser::new(
                self.options.delimiter,
                self.options.encoding,
            ))),
            SourceFormat::Spreadsheet => Ok(Box::new(SpreadsheetParser)),
            SourceFormat::Image => match &self.options.recognizer {
                Some(recognizer) => Ok(Box::new(OcrGridParser::new(Arc::clone(recognizer)))),
                None => Err(ParseError::UnsupportedFormat(format!(
                    "no text recognizer configured for image '{filename}'"
                ))),
            },
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn transition(&self, generation: u64, next: IngestState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_current(generation) {
            debug!("Batch {generation}: {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    fn record_progress(&self, generation: u64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(generation) {
            return;
        }
        if let IngestState::Parsing { done, total } = &mut *state {
            *done += 1;
            debug!("Batch {generation}: parsed {done} of {total}");
        }
    }

    fn commit(&self, generation: u64, dataset: Arc<Dataset>) -> Result<(), BatchError> {
        let mut committed = self
            .committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(generation) {
            warn!("Batch {generation} finished after a newer batch started; discarding");
            return Err(BatchError::Superseded { generation });
        }
        *committed = Some(dataset);
        self.transition(generation, IngestState::Ready);
        Ok(())
    }
}

/// Source identifiers for a batch: the file name, with `#2`, `#3`, ... appended
/// to repeats so every identifier is unique.
fn assign_identities(files: &[SourceFile]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    files
        .iter()
        .map(|file| {
            let count = seen.entry(file.name()).or_insert(0);
            *count += 1;
            if *count == 1 {
                file.name().to_string()
            } else {
                format!("{}#{count}", file.name())
            }
        })
        .collect()
}
