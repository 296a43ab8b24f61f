//! Batch processing command for multiple invoice files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use facture_core::{Document, ExtractionPipeline, PipelineOutcome};

use super::{file_label, load_config};
use crate::ledger::Ledger;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input PDFs
    #[arg(required = true)]
    input: String,

    /// Number of documents processed at once (default from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// CSV ledger to append to (default from config)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write a per-file status CSV
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// How one file went.
enum FileStatus {
    Extracted(PipelineOutcome),
    Empty(PipelineOutcome),
    Skipped(String),
    Failed(String),
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    status: FileStatus,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.is_file()
                && p
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let jobs = args.jobs.unwrap_or(config.output.jobs).max(1);
    let ledger = Ledger::new(args.csv.clone().unwrap_or_else(|| config.output.csv_path.clone()));

    println!(
        "{} Found {} files to process ({} at a time)",
        style("ℹ").blue(),
        files.len(),
        jobs
    );

    let pipeline = Arc::new(ExtractionPipeline::from_config(&config)?);
    debug!("Strategies: {:?}", pipeline.strategies());

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut outcomes = stream::iter(files)
        .map(|path| {
            let pipeline = Arc::clone(&pipeline);
            async move {
                let worker_path = path.clone();
                let status =
                    tokio::task::spawn_blocking(move || process_single_file(&pipeline, &worker_path))
                        .await
                        .unwrap_or_else(|e| FileStatus::Failed(format!("worker panicked: {}", e)));
                ProcessResult { path, status }
            }
        })
        .buffer_unordered(jobs);

    let mut results = Vec::new();
    let mut rows = 0;

    while let Some(result) = outcomes.next().await {
        overall_pb.inc(1);

        match &result.status {
            FileStatus::Extracted(outcome) => {
                rows += ledger.append(&outcome.result)?;
            }
            FileStatus::Empty(_) => {
                debug!("No relevant data found in {}", result.path.display());
            }
            FileStatus::Skipped(reason) => {
                warn!("Skipping {}: {}", result.path.display(), reason);
            }
            FileStatus::Failed(reason) => {
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", result.path.display(), reason);
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", result.path.display(), reason);
                    anyhow::bail!("Processing failed: {}", reason);
                }
            }
        }

        results.push(result);
    }

    overall_pb.finish_with_message("Complete");

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let count = |pred: fn(&FileStatus) -> bool| results.iter().filter(|r| pred(&r.status)).count();
    let extracted = count(|s| matches!(s, FileStatus::Extracted(_)));
    let empty = count(|s| matches!(s, FileStatus::Empty(_)));
    let skipped = count(|s| matches!(s, FileStatus::Skipped(_) | FileStatus::Failed(_)));

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} with data, {} without, {} skipped",
        style(extracted).green(),
        style(empty).yellow(),
        style(skipped).red()
    );
    if rows > 0 {
        println!(
            "   {} rows appended to {}",
            rows,
            ledger.path().display()
        );
    }

    Ok(())
}

fn process_single_file(pipeline: &ExtractionPipeline, path: &Path) -> FileStatus {
    let document = match Document::from_path(path) {
        Ok(document) => document,
        Err(e) => return FileStatus::Failed(e.to_string()),
    };

    match pipeline.run(&document) {
        Ok(outcome) if outcome.is_empty() => FileStatus::Empty(outcome),
        Ok(outcome) => FileStatus::Extracted(outcome),
        Err(e) => FileStatus::Skipped(e.to_string()),
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "status", "strategy", "fields", "elapsed_ms", "error"])?;

    for result in results {
        let file = file_label(&result.path);
        let record = match &result.status {
            FileStatus::Extracted(outcome) | FileStatus::Empty(outcome) => [
                file,
                if outcome.is_empty() { "empty" } else { "extracted" }.to_string(),
                outcome.strategy.map(|s| s.to_string()).unwrap_or_default(),
                outcome.result.len().to_string(),
                outcome.elapsed.as_millis().to_string(),
                String::new(),
            ],
            FileStatus::Skipped(reason) => [
                file,
                "skipped".to_string(),
                String::new(),
                String::new(),
                String::new(),
                reason.clone(),
            ],
            FileStatus::Failed(reason) => [
                file,
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                reason.clone(),
            ],
        };
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
