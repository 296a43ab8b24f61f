//! Process command - extract fields from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use facture_core::{Document, ExtractionPipeline, ExtractionResult, PipelineOutcome, StrategyKind};

use super::{file_label, load_config};
use crate::ledger::Ledger;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Append the fields to the CSV ledger (configured path if none given)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    append_csv: Option<Option<PathBuf>>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Field,Value CSV
    Csv,
    /// Plain text summary
    Text,
}

/// Output of one processed document.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub file: String,
    pub strategy: Option<StrategyKind>,
    pub elapsed_ms: u64,
    pub fields: &'a ExtractionResult,
}

impl<'a> Report<'a> {
    pub fn new(file: String, outcome: &'a PipelineOutcome) -> Self {
        Self {
            file,
            strategy: outcome.strategy,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
            fields: &outcome.result,
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);

    pb.set_message("Loading extraction pipeline...");
    let pipeline = ExtractionPipeline::from_config(&config)?;
    debug!("Strategies: {:?}", pipeline.strategies());

    pb.set_message("Extracting fields...");
    let document = Document::from_path(&args.input)?;
    let outcome = pipeline.run(&document).map_err(|e| {
        anyhow::anyhow!("Skipping {}: {}", args.input.display(), e)
    })?;

    pb.finish_and_clear();

    if outcome.is_empty() {
        println!("No relevant data found");
        debug!("Total processing time: {:?}", start.elapsed());
        return Ok(());
    }

    let report = Report::new(file_label(&args.input), &outcome);
    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output.trim_end());
    }

    if let Some(csv_path) = args.append_csv {
        let ledger = Ledger::new(csv_path.unwrap_or(config.output.csv_path));
        let rows = ledger.append(&outcome.result)?;
        println!(
            "{} Appended {} rows to {}",
            style("✓").green(),
            rows,
            ledger.path().display()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_report(report: &Report<'_>, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report.fields),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["Field", "Value"])?;
    for (field, value) in result.iter() {
        wtr.write_record([field.label(), value])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &Report<'_>) -> String {
    let mut output = String::new();

    output.push_str(&format!("File: {}\n", report.file));
    if let Some(strategy) = report.strategy {
        output.push_str(&format!("Strategy: {}\n", strategy));
    }
    output.push('\n');

    let width = report
        .fields
        .iter()
        .map(|(f, _)| f.label().chars().count())
        .max()
        .unwrap_or(0);
    for (field, value) in report.fields.iter() {
        output.push_str(&format!("  {:<width$}  {}\n", field.label(), value, width = width));
    }

    output
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use facture_core::Field;

    fn outcome() -> PipelineOutcome {
        PipelineOutcome {
            result: [
                (Field::AmountDue, "1 234,56 €".to_string()),
                (Field::Quantity, "3".to_string()),
            ]
            .into_iter()
            .collect(),
            strategy: Some(StrategyKind::TextLayer),
            elapsed: Duration::from_millis(42),
        }
    }

    #[test]
    fn test_json_report() {
        let outcome = outcome();
        let report = Report::new("invoice.pdf".to_string(), &outcome);
        let json: serde_json::Value =
            serde_json::from_str(&format_report(&report, OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["file"], "invoice.pdf");
        assert_eq!(json["strategy"], "text_layer");
        assert_eq!(json["elapsed_ms"], 42);
        assert_eq!(json["fields"]["amount_due"], "1 234,56 €");
    }

    #[test]
    fn test_csv_report_uses_labels() {
        let outcome = outcome();
        let report = Report::new("invoice.pdf".to_string(), &outcome);
        assert_eq!(
            format_report(&report, OutputFormat::Csv).unwrap(),
            "Field,Value\nMontant Dû,\"1 234,56 €\"\nQuantité,3\n"
        );
    }

    #[test]
    fn test_text_report() {
        let outcome = outcome();
        let text = format_text(&Report::new("invoice.pdf".to_string(), &outcome));
        assert!(text.contains("Strategy: text_layer"));
        assert!(text.contains("Montant Dû  1 234,56 €"));
        assert!(text.contains("Quantité    3"));
    }
}
