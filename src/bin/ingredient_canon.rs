//! Thin CLI wrapper around the pipeline. Reads newline-delimited input rows,
//! runs the batch, and writes the canonical-record stream, the error stream,
//! and a human-readable report. Exit code 0 on completion regardless of
//! per-row failures; nonzero only for I/O or reference-load errors.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ingredient_canon::config::PipelineConfig;
use ingredient_canon::error::DriverError;
use ingredient_canon::record::InputRow;
use ingredient_canon::reference::ReferenceRepository;
use ingredient_canon::{pipeline, report};

#[derive(Debug, Parser)]
#[command(name = "ingredient-canon", about = "Stage-2 ingredient canonicalization pipeline")]
struct DriverArgs {
    /// Path to the newline-delimited input row stream.
    #[arg(long)]
    input: PathBuf,
    /// Path to the reference data snapshot (TOML).
    #[arg(long)]
    reference: PathBuf,
    /// Path to write the canonical-record output stream (NDJSON).
    #[arg(long)]
    output: PathBuf,
    /// Path to write the structured error stream (NDJSON).
    #[arg(long)]
    error_stream: PathBuf,
    /// Path to write the human-readable summary report.
    #[arg(long)]
    report: PathBuf,
    /// Optional pipeline configuration (TOML); defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// How many sample recipe ids to include per failure code in the report.
    #[arg(long, default_value_t = 10)]
    sample_size: usize,
}

fn run(args: DriverArgs) -> Result<(), DriverError> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let repo = ReferenceRepository::load(&args.reference)?;

    let input_file = File::open(&args.input).map_err(DriverError::InputIo)?;
    let reader = BufReader::new(input_file);
    let mut rows = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.map_err(DriverError::InputIo)?;
        if line.trim().is_empty() {
            continue;
        }
        let row: InputRow = serde_json::from_str(&line).map_err(|source| DriverError::MalformedRow {
            line: line_idx + 1,
            source,
        })?;
        rows.push(row);
    }

    tracing::info!(rows = rows.len(), "starting canonicalization batch");
    let (records, rejections) = pipeline::run_batch(&rows, &repo, &config);
    tracing::info!(
        accepted = records.len(),
        rejected = rejections.len(),
        "batch complete"
    );

    let output_file = File::create(&args.output).map_err(DriverError::OutputIo)?;
    let mut writer = BufWriter::new(output_file);
    for record in &records {
        let line = serde_json::to_string(record).expect("CanonicalRecord always serializes");
        writeln!(writer, "{line}").map_err(DriverError::OutputIo)?;
    }
    writer.flush().map_err(DriverError::OutputIo)?;

    let entries = report::structured_stream(&records, &rejections);
    let error_file = File::create(&args.error_stream).map_err(DriverError::OutputIo)?;
    let mut error_writer = BufWriter::new(error_file);
    for entry in &entries {
        let line = serde_json::to_string(entry).expect("RowDiagnosticEntry always serializes");
        writeln!(error_writer, "{line}").map_err(DriverError::OutputIo)?;
    }
    error_writer.flush().map_err(DriverError::OutputIo)?;

    let summaries = report::summarize(&entries, args.sample_size);
    let rendered = report::render_human_summary(&summaries);
    std::fs::write(&args.report, rendered).map_err(DriverError::OutputIo)?;

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = DriverArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ingredient-canon: {err}");
            let _ = io::stderr().flush();
            ExitCode::FAILURE
        }
    }
}
