//! Rollview CLI
//!
//! Command-line interface for turning rollout analysis runs into chart and
//! table data.
//!
//! # Usage
//!
//! ```bash
//! rollview --help
//! rollview transform --file snapshot.json --pretty
//! kubectl get analysisrun canary -o json | rollview summary
//! ROLLVIEW_MALFORMED_VALUES=tabulate rollview report --file run.json
//! ```

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use shared::config::{MalformedValuePolicy, TransformConfig};
use shared::models::{AnalysisRunInfo, AnalysisSpecAndStatus};
use shared::transform::{
    build_report, functional_status, legend_entries, sorted_metrics, summarize_analysis,
    transform_metrics_with_config,
};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Rollview CLI - rollout analysis run transforms
#[derive(Parser)]
#[command(name = "rollview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Policy for measurement values that are not valid JSON (propagate, tabulate)
    #[arg(long, global = true, env = "ROLLVIEW_MALFORMED_VALUES")]
    malformed_values: Option<String>,

    /// Table text shown for tabulated malformed values
    #[arg(long, global = true, env = "ROLLVIEW_MALFORMED_PLACEHOLDER")]
    placeholder: Option<String>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform the metrics of an analysis spec and status document
    Transform(InputArgs),
    /// Print a readable summary of an analysis run
    Summary(InputArgs),
    /// Build the summary, legend and metrics of an analysis run as JSON
    Report(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Read the document from a file instead of stdin
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

impl InputArgs {
    fn read(&self) -> Result<String> {
        match &self.file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display())),
            None => {
                let mut input = String::new();
                std::io::stdin()
                    .read_to_string(&mut input)
                    .context("Failed to read stdin")?;
                Ok(input)
            }
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let input = self.read()?;
        serde_json::from_str(&input).context("Failed to parse input document")
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Loads the transform configuration from the environment, then applies
/// command-line overrides.
fn load_config(cli: &Cli) -> Result<TransformConfig> {
    let mut config = TransformConfig::from_env().context("Invalid environment configuration")?;

    if let Some(policy) = &cli.malformed_values {
        config.malformed_values = policy.parse::<MalformedValuePolicy>()?;
    }
    if let Some(placeholder) = &cli.placeholder {
        config.malformed_placeholder.clone_from(placeholder);
    }

    config.validate_config()?;
    Ok(config)
}

fn write_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

fn print_summary(run: &AnalysisRunInfo, config: &TransformConfig) -> Result<()> {
    let summary = summarize_analysis(run);
    let mut out = std::io::stdout().lock();

    write!(out, "{} [{}]", summary.title, functional_status(summary.phase))?;
    if let Some(substatus) = summary.substatus {
        write!(out, " ({substatus})")?;
    }
    writeln!(out)?;

    if let Some(message) = &summary.message {
        writeln!(out, "  {message}")?;
    }

    let legend: Vec<String> =
        legend_entries(run.successful, run.failed, run.error, run.inconclusive)
            .into_iter()
            .map(|entry| entry.label)
            .collect();
    if !legend.is_empty() {
        writeln!(out, "  {}", legend.join(", "))?;
    }

    let metrics = match &run.spec_and_status {
        Some(snapshot) => transform_metrics_with_config(snapshot, config)?,
        None => return Ok(()),
    };

    for metric in sorted_metrics(&metrics) {
        writeln!(
            out,
            "- {}: {} ({} measurements, {:?} view)",
            metric.name,
            metric.status.status_label,
            metric.status.transformed_measurements.len(),
            metric.default_view(),
        )?;
        for query in metric.spec.queries.iter().flatten() {
            writeln!(out, "    query: {query}")?;
        }
        if let Some(label) = &metric.spec.fail_condition_label {
            writeln!(out, "    fail when: {label}")?;
        }
        if let Some(label) = &metric.spec.success_condition_label {
            writeln!(out, "    pass when: {label}")?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let Some(command) = &cli.command else {
        println!("Rollview CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for usage information");
        return Ok(());
    };

    let config = load_config(&cli)?;
    tracing::debug!(malformed_values = %config.malformed_values, "Loaded transform configuration");

    match command {
        Commands::Transform(input) => {
            let snapshot: AnalysisSpecAndStatus = input.parse()?;
            let metrics = transform_metrics_with_config(&snapshot, &config)?;
            write_json(&metrics, input.pretty)?;
        }
        Commands::Summary(input) => {
            let run: AnalysisRunInfo = input.parse()?;
            print_summary(&run, &config)?;
        }
        Commands::Report(input) => {
            let run: AnalysisRunInfo = input.parse()?;
            let report = build_report(&run, &config)?;
            write_json(&report, input.pretty)?;
        }
    }

    Ok(())
}
