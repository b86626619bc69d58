//! CLI for perfledger.
//!
//! This crate provides the command-line interface for the baseline pipeline:
//! `extract` appends a run to the ledger, `compare` writes the comparison
//! report for the two most recent runs, and `trends` writes one chart per
//! metric.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use perfledger_benchmarks::io::{write_json_report, write_markdown_report};
use perfledger_benchmarks::{
    compare_ledger, record_baseline, render_trends, BaselineLedger, Change, Comparison,
    ComparisonReport, SvgTrendSink,
};
use perfledger_core::{
    GitCommitResolver, PipelineConfig, RunEnvironment, SysinfoProvider, SystemClock,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// perfledger CLI.
#[derive(Parser, Debug)]
#[command(name = "perfledger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./perfledger.toml when present).
    #[arg(long, global = true, env = "PERFLEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract metrics from test output and append them to the baseline ledger.
    Extract {
        /// File containing the raw test-run output.
        input: PathBuf,

        /// Build configuration label recorded with the run.
        build_config: String,

        /// Ledger to append to (overrides configuration).
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// Compare the two most recent baselines and write a markdown report.
    Compare {
        /// Baseline ledger (CSV).
        ledger: PathBuf,

        /// Report path (overrides configuration).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the report as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Only compare runs recorded with this build configuration.
        #[arg(long)]
        build_config: Option<String>,
    },

    /// Write one trend chart per metric from the full ledger history.
    Trends {
        /// Baseline ledger (CSV).
        ledger: PathBuf,

        /// Chart directory (overrides configuration).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Initialise logging to stderr. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if the command fails. Argument
/// errors are reported by clap, which exits with a non-zero status.
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

/// Execute a parsed command line.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from(path),
        None => PipelineConfig::load(),
    }
    .context("load configuration")?;
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Extract {
            input,
            build_config,
            ledger,
        } => {
            let ledger = BaselineLedger::new(ledger.unwrap_or(config.ledger_path));
            let commit = match config.repo_dir {
                Some(dir) => GitCommitResolver::in_dir(dir),
                None => GitCommitResolver::new(),
            };
            let env = RunEnvironment::new(&SysinfoProvider, &commit, &SystemClock);

            record_baseline(&input, &build_config, &ledger, &env).context("extract")?;
            println!("Metrics extracted and written to {}", ledger.path().display());
            Ok(())
        }
        Commands::Compare {
            ledger,
            output,
            json,
            build_config,
        } => {
            let ledger = BaselineLedger::new(ledger);
            let report = match compare_ledger(&ledger, build_config.as_deref()).context("compare")? {
                Comparison::Report(report) => report,
                Comparison::InsufficientData { available } => {
                    println!("Need at least 2 baselines for comparison (found {available})");
                    return Ok(());
                }
            };

            let output = output.unwrap_or(config.report_path);
            write_markdown_report(&report, &output).context("compare")?;
            if let Some(json) = &json {
                write_json_report(&report, json).context("compare")?;
            }

            print_summary(&report);
            println!("Comparison report written to {}", output.display());
            Ok(())
        }
        Commands::Trends { ledger, output_dir } => {
            let ledger = BaselineLedger::new(ledger);
            let mut sink = SvgTrendSink::new(output_dir.unwrap_or(config.trends_dir));
            render_trends(&ledger, &mut sink).context("trends")?;
            for path in sink.written() {
                println!("Generated trend plot {}", path.display());
            }
            Ok(())
        }
    }
}

fn print_summary(report: &ComparisonReport) {
    println!(
        "{} ({}) vs {} ({})",
        report.latest.date.bold(),
        report.latest.commit,
        report.previous.date,
        report.previous.commit
    );
    for entry in &report.changes {
        let text = entry.change.to_string();
        // Every tracked metric is a cost: growth is a regression.
        let styled = match entry.change {
            Change::Percent(p) if p > 0.0 => text.red(),
            Change::Percent(p) if p < 0.0 => text.green(),
            Change::Percent(_) => text.normal(),
            Change::NotApplicable => text.dimmed(),
        };
        println!("  {:<20} {}", entry.metric.name(), styled);
    }
}
