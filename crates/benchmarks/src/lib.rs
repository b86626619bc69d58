//! Benchmark-baseline pipeline for perfledger.
//!
//! This crate turns raw performance-test output into ledger records and turns
//! the ledger into comparison reports and trend charts.
//!
//! # Quick Start
//!
//! ```no_run
//! use perfledger_benchmarks::{compare_ledger, BaselineLedger, Comparison};
//!
//! let ledger = BaselineLedger::new("large_file_baselines.csv");
//! match compare_ledger(&ledger, None)? {
//!     Comparison::Report(report) => {
//!         print!("{}", perfledger_benchmarks::markdown::generate_report(&report));
//!     }
//!     Comparison::InsufficientData { available } => {
//!         println!("only {available} baseline(s) recorded");
//!     }
//! }
//! # Ok::<(), perfledger_benchmarks::PipelineError>(())
//! ```
//!
//! # Modules
//!
//! - [`extract`] - Metric extraction from test output
//! - [`ledger`] - The append-only CSV ledger
//! - [`compare`] - Percentage-change comparison of the latest two runs
//! - [`markdown`] - Markdown report generation
//! - [`io`] - Report output
//! - [`trend`] - Per-metric trend series and charts

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod compare;
pub mod extract;
pub mod io;
pub mod ledger;
pub mod markdown;
pub mod trend;

pub use compare::{compare, compare_matching, Change, Comparison, ComparisonReport};
pub use extract::MetricExtractor;
pub use ledger::{BaselineLedger, LedgerError};
pub use trend::{render_all, SvgTrendSink, TrendSeries, TrendSink};

use perfledger_core::{BaselineRecord, RunEnvironment};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors surfaced by the pipeline entry points.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The raw test output could not be read
    #[error("failed to read test output {}", .path.display())]
    Input {
        /// Input path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Ledger failure
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Report output failure
    #[error(transparent)]
    Report(#[from] io::ReportError),

    /// Trend rendering failure
    #[error(transparent)]
    Trend(#[from] trend::TrendError),
}

/// Extract metrics from the test output at `input` and append them to `ledger`.
///
/// # Returns
///
/// The record as appended.
///
/// # Errors
///
/// Fails if the input cannot be read, the host cannot be identified, or the
/// ledger cannot be written. Unmatched metrics are not errors.
pub fn record_baseline(
    input: &Path,
    build_config: &str,
    ledger: &BaselineLedger,
    env: &RunEnvironment<'_>,
) -> Result<BaselineRecord, PipelineError> {
    let text = fs::read_to_string(input).map_err(|source| PipelineError::Input {
        path: input.to_path_buf(),
        source,
    })?;
    let readings = MetricExtractor::shared().extract(&text);
    let record = ledger.append(readings, build_config, env)?;
    info!(
        input = %input.display(),
        measured = record.metrics.measured_count(),
        "Recorded baseline"
    );
    Ok(record)
}

/// Load `ledger` and compare its two most recent entries, optionally only
/// among entries with the given build configuration.
pub fn compare_ledger(
    ledger: &BaselineLedger,
    build_config: Option<&str>,
) -> Result<Comparison, PipelineError> {
    let records = ledger.load_all()?;
    Ok(match build_config {
        Some(label) => compare_matching(&records, label),
        None => compare(&records),
    })
}

/// Load `ledger` and emit one trend series per metric to `sink`.
///
/// # Returns
///
/// The number of series emitted.
pub fn render_trends(
    ledger: &BaselineLedger,
    sink: &mut dyn TrendSink,
) -> Result<usize, PipelineError> {
    let records = ledger.load_all()?;
    Ok(render_all(&records, sink)?)
}
