//! I/O operations for comparison reports.
//!
//! This module writes rendered comparison reports to the filesystem,
//! creating parent directories as needed.

use crate::compare::ComparisonReport;
use crate::markdown;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure
    #[error("failed to write report {}", .path.display())]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// JSON encoding failure
    #[error("failed to encode report {}", .path.display())]
    Json {
        /// Destination path
        path: PathBuf,
        /// Underlying serde error
        source: serde_json::Error,
    },
}

/// Result type for report output.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    ensure_parent_dir(path)
        .and_then(|()| fs::write(path, contents))
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Render `report` as markdown and write it to `path`.
pub fn write_markdown_report(report: &ComparisonReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_file(path, markdown::generate_report(report))?;
    info!(path = %path.display(), "Comparison report written");
    Ok(())
}

/// Write `report` as pretty-printed JSON to `path`.
pub fn write_json_report(report: &ComparisonReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(report).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_file(path, json)?;
    info!(path = %path.display(), "JSON comparison report written");
    Ok(())
}
