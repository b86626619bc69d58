// Copyright 2025 Perfledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Baseline record: one observation of the system under test.
//!
//! The ledger row schema is fixed: six metadata columns followed by one column
//! per [`Metric`] in declared order. [`BaselineRecord::to_row`] and
//! [`BaselineRecord::from_row`] are the only places that know the layout.

use crate::host::SystemInfo;
use crate::metric::{Metric, MetricReadings, MetricValue};
use chrono::NaiveDate;
use thiserror::Error;

/// Commit identifier recorded when source control cannot be queried.
pub const COMMIT_SENTINEL: &str = "TBD";

/// Date format used in the ledger (ISO 8601 calendar date).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Metadata columns preceding the metric columns.
pub const METADATA_COLUMNS: [&str; 6] = ["Date", "CommitHash", "CPUModel", "RAM", "OS", "BuildConfig"];

/// Total number of columns in a ledger row.
pub const COLUMN_COUNT: usize = METADATA_COLUMNS.len() + Metric::COUNT;

/// The ledger header, in column order.
pub fn ledger_header() -> Vec<&'static str> {
    METADATA_COLUMNS
        .iter()
        .copied()
        .chain(Metric::ALL.iter().map(|m| m.name()))
        .collect()
}

/// Errors converting between rows and records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Row does not have exactly [`COLUMN_COUNT`] cells.
    #[error("expected {expected} columns, found {found}")]
    ColumnCount {
        /// Required column count
        expected: usize,
        /// Column count of the offending row
        found: usize,
    },
}

/// One row of the baseline ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRecord {
    /// Calendar date of the run (`YYYY-MM-DD`).
    pub date: String,
    /// Source-control revision, or [`COMMIT_SENTINEL`].
    pub commit_hash: String,
    /// CPU model string reported by the host.
    pub cpu_model: String,
    /// Human-readable RAM size, e.g. `32GB`.
    pub ram: String,
    /// OS family and release.
    pub os: String,
    /// Caller-supplied build configuration label.
    pub build_config: String,
    /// One value per tracked metric.
    pub metrics: MetricReadings,
}

impl BaselineRecord {
    /// Merge extracted readings with run metadata.
    pub fn stamp(
        metrics: MetricReadings,
        build_config: impl Into<String>,
        date: NaiveDate,
        commit_hash: impl Into<String>,
        system: SystemInfo,
    ) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            commit_hash: commit_hash.into(),
            cpu_model: system.cpu_model,
            ram: system.ram,
            os: system.os,
            build_config: build_config.into(),
            metrics,
        }
    }

    /// Value recorded for `metric`.
    pub fn metric(&self, metric: Metric) -> MetricValue {
        self.metrics.get(metric)
    }

    /// Parse [`BaselineRecord::date`] as a calendar date.
    pub fn parsed_date(&self) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
    }

    /// Cells in ledger column order.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(COLUMN_COUNT);
        row.push(self.date.clone());
        row.push(self.commit_hash.clone());
        row.push(self.cpu_model.clone());
        row.push(self.ram.clone());
        row.push(self.os.clone());
        row.push(self.build_config.clone());
        row.extend(self.metrics.iter().map(|(_, v)| v.to_string()));
        row
    }

    /// Build a record from cells in ledger column order.
    pub fn from_row<'a, I>(cells: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cells: Vec<&str> = cells.into_iter().collect();
        if cells.len() != COLUMN_COUNT {
            return Err(RecordError::ColumnCount {
                expected: COLUMN_COUNT,
                found: cells.len(),
            });
        }

        let (meta, values) = cells.split_at(METADATA_COLUMNS.len());
        let mut metrics = MetricReadings::new();
        for (metric, cell) in Metric::ALL.into_iter().zip(values) {
            metrics.set(metric, MetricValue::parse_lenient(cell));
        }

        Ok(Self {
            date: meta[0].to_string(),
            commit_hash: meta[1].to_string(),
            cpu_model: meta[2].to_string(),
            ram: meta[3].to_string(),
            os: meta[4].to_string(),
            build_config: meta[5].to_string(),
            metrics,
        })
    }
}
