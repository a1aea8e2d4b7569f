pub mod chart;
pub mod cli;
pub mod data;
pub mod error;
pub mod filter;
pub mod headers;
pub mod infer;
pub mod ingest;
pub mod insights;
pub mod io_utils;
pub mod parsers;
pub mod payload;
pub mod preview;
pub mod table;
pub mod tagger;

use std::{
    env,
    fs::File,
    io::BufWriter,
    sync::{Arc, OnceLock},
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    ingest::{IngestOptions, IngestOutcome, Ingestor, SourceFile},
    parsers::TesseractRecognizer,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tabular_ingest", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => handle_ingest(&args),
        Commands::Preview(args) => handle_preview(&args),
        Commands::Summary(args) => handle_summary(&args),
        Commands::Chart(args) => handle_chart(&args),
        Commands::Payload(args) => handle_payload(&args),
    }
}

fn ingest_sources(args: &SourceArgs) -> Result<IngestOutcome> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let recognizer = args.ocr_command.as_ref().map(|program| {
        Arc::new(TesseractRecognizer::new(program.clone(), args.ocr_lang.clone()))
            as Arc<dyn parsers::TextRecognizer>
    });
    let options = IngestOptions {
        delimiter: args.delimiter,
        encoding,
        workers: args.workers,
        recognizer,
    };
    debug!("Ingesting {:?}", args.inputs);
    let files = args.inputs.iter().map(SourceFile::from_path).collect();
    let ingestor = Ingestor::new(options)?;
    ingestor
        .ingest(files)
        .with_context(|| format!("Ingesting {} file(s)", args.inputs.len()))
}

fn handle_ingest(args: &cli::IngestArgs) -> Result<()> {
    let outcome = ingest_sources(&args.sources)?;
    let headers = ["source", "format", "status", "rows", "columns", "note"]
        .map(String::from)
        .to_vec();
    table::print_table(&headers, &outcome.report.render_rows());

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), outcome.dataset.as_ref())
            .with_context(|| format!("Writing dataset JSON to {path:?}"))?;
        info!(
            "Dataset {} written to {:?}",
            outcome.dataset.fingerprint()?,
            path
        );
    }
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let outcome = ingest_sources(&args.sources)?;
    let dataset = outcome.dataset.as_ref();
    let rows = filter::search_rows(dataset, args.search.as_deref().unwrap_or_default());
    let (headers, grid) = preview::preview_grid(dataset, &rows, args.rows);
    table::print_table(&headers, &grid);
    info!(
        "Displayed {} of {} matching row(s)",
        grid.len(),
        rows.len()
    );
    Ok(())
}

fn handle_summary(args: &cli::SummaryArgs) -> Result<()> {
    let outcome = ingest_sources(&args.sources)?;
    let summaries = insights::summarize(&outcome.dataset, args.top);
    let headers = ["column", "kind", "count", "min", "max", "mean", "top"]
        .map(String::from)
        .to_vec();
    table::print_table(&headers, &insights::render_rows(&summaries));
    println!();
    println!("{}", insights::digest(&summaries));
    info!("Summarised {} column(s)", summaries.len());
    Ok(())
}

fn handle_chart(args: &cli::ChartArgs) -> Result<()> {
    let outcome = ingest_sources(&args.sources)?;
    let dataset = outcome.dataset.as_ref();
    let selection = if args.select.is_empty() {
        chart::default_selection(dataset)
    } else {
        let mut groups = vec![Vec::new(); dataset.sources().len()];
        for raw in &args.select {
            let (source, columns) = cli::parse_selection(raw).map_err(|err| anyhow!(err))?;
            let idx = dataset
                .sources()
                .get_index_of(source.as_str())
                .ok_or_else(|| anyhow!("Source '{source}' was not ingested"))?;
            groups[idx].extend(columns);
        }
        groups
    };
    let spec = chart::build_chart(dataset, &selection, args.chart_type)?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    if let Some(suggestion) = chart::suggest(dataset) {
        info!(
            "Suggested chart: {:?} of {} by {}",
            suggestion.chart_type, suggestion.y, suggestion.x
        );
    }
    Ok(())
}

fn handle_payload(args: &cli::PayloadArgs) -> Result<()> {
    let outcome = ingest_sources(&args.sources)?;
    let request = payload::AnalysisRequest::new(&args.message, &outcome.dataset)
        .with_model(args.model.as_deref());
    println!("{}", request.to_json()?);
    Ok(())
}
