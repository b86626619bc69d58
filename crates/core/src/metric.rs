// Copyright 2025 Perfledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! The fixed set of tracked performance metrics.
//!
//! Every baseline carries exactly one [`MetricValue`] per [`Metric`]. The set
//! is closed: adding a metric means adding an enum variant, which also changes
//! the ledger column layout.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token written in place of a metric that could not be measured.
pub const NOT_AVAILABLE: &str = "N/A";

/// A tracked performance metric.
///
/// Variant order is the declared column order of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    /// Time to open a file, in milliseconds.
    FileOpenTime,
    /// Time to save a file, in milliseconds.
    FileSaveTime,
    /// Resident memory, in megabytes.
    MemoryUsage,
    /// Time to insert text, in milliseconds.
    TextInsertionTime,
    /// Time to navigate through a document, in milliseconds.
    NavigationTime,
    /// Time to scroll through a document, in milliseconds.
    ScrollingTime,
    /// Time to run a search/replace, in milliseconds.
    SearchReplaceTime,
}

impl Metric {
    /// Number of tracked metrics.
    pub const COUNT: usize = 7;

    /// All metrics, in declared order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::FileOpenTime,
        Metric::FileSaveTime,
        Metric::MemoryUsage,
        Metric::TextInsertionTime,
        Metric::NavigationTime,
        Metric::ScrollingTime,
        Metric::SearchReplaceTime,
    ];

    /// Column / display name.
    pub fn name(self) -> &'static str {
        match self {
            Metric::FileOpenTime => "FileOpenTime",
            Metric::FileSaveTime => "FileSaveTime",
            Metric::MemoryUsage => "MemoryUsage",
            Metric::TextInsertionTime => "TextInsertionTime",
            Metric::NavigationTime => "NavigationTime",
            Metric::ScrollingTime => "ScrollingTime",
            Metric::SearchReplaceTime => "SearchReplaceTime",
        }
    }

    /// Label that precedes the value in test-run output.
    pub fn label(self) -> &'static str {
        match self {
            Metric::FileOpenTime => "File open time",
            Metric::FileSaveTime => "File save time",
            Metric::MemoryUsage => "Memory usage",
            Metric::TextInsertionTime => "Text insertion time",
            Metric::NavigationTime => "Navigation time",
            Metric::ScrollingTime => "Scrolling time",
            Metric::SearchReplaceTime => "Search/Replace time",
        }
    }

    /// Unit suffix printed after the value in test-run output.
    pub fn unit(self) -> &'static str {
        match self {
            Metric::MemoryUsage => "MB",
            _ => "ms",
        }
    }

    /// Position of this metric in [`Metric::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single metric observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricValue {
    /// Integer measurement in the metric's native unit.
    Measured(u64),
    /// The metric was absent from the run output (or unparseable in the ledger).
    #[default]
    NotAvailable,
}

impl MetricValue {
    /// Returns the measurement, if any.
    pub fn measured(self) -> Option<u64> {
        match self {
            MetricValue::Measured(v) => Some(v),
            MetricValue::NotAvailable => None,
        }
    }

    /// Parse a ledger cell. Anything that is not a plain non-negative integer
    /// is treated as not available.
    pub fn parse_lenient(cell: &str) -> Self {
        cell.trim()
            .parse::<u64>()
            .map(MetricValue::Measured)
            .unwrap_or(MetricValue::NotAvailable)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Measured(v) => write!(f, "{v}"),
            MetricValue::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// One value per tracked metric.
///
/// Backed by a fixed array, so a reading can never be missing an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricReadings {
    values: [MetricValue; Metric::COUNT],
}

impl MetricReadings {
    /// All metrics not available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value recorded for `metric`.
    pub fn get(&self, metric: Metric) -> MetricValue {
        self.values[metric.index()]
    }

    /// Record `value` for `metric`.
    pub fn set(&mut self, metric: Metric, value: MetricValue) {
        self.values[metric.index()] = value;
    }

    /// Builder-style shorthand for recording a measurement.
    pub fn with(mut self, metric: Metric, value: u64) -> Self {
        self.set(metric, MetricValue::Measured(value));
        self
    }

    /// `(metric, value)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, MetricValue)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Number of metrics with a measurement.
    pub fn measured_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| matches!(v, MetricValue::Measured(_)))
            .count()
    }
}
