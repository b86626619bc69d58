// Copyright 2025 Perfledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pipeline configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults (the paths the pipeline has always used)
//! 2. `perfledger.toml` in the working directory, or an explicit file
//! 3. `PERFLEDGER_*` environment variables, e.g. `PERFLEDGER_LEDGER_PATH`
//!
//! Command-line flags are applied on top by the CLI.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default ledger location.
pub const DEFAULT_LEDGER_PATH: &str = "large_file_baselines.csv";

/// Default comparison report location.
pub const DEFAULT_REPORT_PATH: &str = "docs/performance_comparisons.md";

/// Default directory for trend charts.
pub const DEFAULT_TRENDS_DIR: &str = "benchmarks";

/// Base name of the optional configuration file.
pub const CONFIG_FILE_STEM: &str = "perfledger";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "PERFLEDGER";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist
    #[error("configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Underlying source or deserialization failure
    #[error("failed to load configuration")]
    Load(#[from] config::ConfigError),
}

/// Resolved pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    /// Baseline ledger (CSV).
    pub ledger_path: PathBuf,
    /// Markdown comparison report.
    pub report_path: PathBuf,
    /// Directory receiving per-metric trend charts.
    pub trends_dir: PathBuf,
    /// Working directory for commit resolution; current directory if unset.
    #[serde(default)]
    pub repo_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            trends_dir: PathBuf::from(DEFAULT_TRENDS_DIR),
            repo_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from defaults, the optional `perfledger.toml`, and
    /// the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name(CONFIG_FILE_STEM).required(false))
    }

    /// Load configuration using `path` as the configuration file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let cfg = Config::builder()
            .set_default("ledger_path", DEFAULT_LEDGER_PATH)?
            .set_default("report_path", DEFAULT_REPORT_PATH)?
            .set_default("trends_dir", DEFAULT_TRENDS_DIR)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
