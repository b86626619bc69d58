//! Baseline comparison.
//!
//! Compares the two most recent ledger entries (by date, not file order) and
//! reports a per-metric percentage change.

use perfledger_core::{BaselineRecord, Metric, MetricValue, NOT_AVAILABLE};
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// Change of a single metric between two runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change {
    /// Signed percentage change relative to the previous run.
    Percent(f64),
    /// Either value is missing, or the previous value is zero.
    NotApplicable,
}

impl Change {
    /// The percentage, if computable.
    pub fn percent(self) -> Option<f64> {
        match self {
            Change::Percent(p) => Some(p),
            Change::NotApplicable => None,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Percent(p) => write!(f, "{p:+.2}%"),
            Change::NotApplicable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Change::Percent(p) => serializer.serialize_f64(*p),
            Change::NotApplicable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// Percentage change from `previous` to `latest`.
pub fn percent_change(previous: MetricValue, latest: MetricValue) -> Change {
    match (previous.measured(), latest.measured()) {
        (Some(0), _) => Change::NotApplicable,
        (Some(prev), Some(cur)) => {
            let prev = prev as f64;
            Change::Percent((cur as f64 - prev) / prev * 100.0)
        }
        _ => Change::NotApplicable,
    }
}

/// The identifying fields of a compared run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Run date.
    pub date: String,
    /// Commit identifier.
    pub commit: String,
    /// Build configuration label.
    pub build_config: String,
}

impl From<&BaselineRecord> for RunSummary {
    fn from(record: &BaselineRecord) -> Self {
        Self {
            date: record.date.clone(),
            commit: record.commit_hash.clone(),
            build_config: record.build_config.clone(),
        }
    }
}

/// Change of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricChange {
    /// The metric.
    pub metric: Metric,
    /// Its change.
    pub change: Change,
}

/// Percentage-change report between the two most recent baselines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Most recent run.
    pub latest: RunSummary,
    /// Run before it.
    pub previous: RunSummary,
    /// One entry per tracked metric, in declared order.
    pub changes: Vec<MetricChange>,
}

impl ComparisonReport {
    /// Change recorded for `metric`.
    pub fn change(&self, metric: Metric) -> Change {
        self.changes
            .iter()
            .find(|c| c.metric == metric)
            .map_or(Change::NotApplicable, |c| c.change)
    }
}

/// Outcome of [`compare`].
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// Two or more records were available.
    Report(ComparisonReport),
    /// Fewer than two records; nothing to compare.
    InsufficientData {
        /// Number of records supplied.
        available: usize,
    },
}

impl Comparison {
    /// The report, if one was produced.
    pub fn report(&self) -> Option<&ComparisonReport> {
        match self {
            Comparison::Report(report) => Some(report),
            Comparison::InsufficientData { .. } => None,
        }
    }
}

/// Compare `previous` against `latest` directly, without any ordering.
pub fn compare_pair(previous: &BaselineRecord, latest: &BaselineRecord) -> ComparisonReport {
    let changes = Metric::ALL
        .into_iter()
        .map(|metric| MetricChange {
            metric,
            change: percent_change(previous.metric(metric), latest.metric(metric)),
        })
        .collect();

    ComparisonReport {
        latest: latest.into(),
        previous: previous.into(),
        changes,
    }
}

/// Compare the two most recent records.
///
/// Records are stably sorted by their ISO date string first; records sharing
/// a date keep their ledger order.
pub fn compare(records: &[BaselineRecord]) -> Comparison {
    if records.len() < 2 {
        debug!(available = records.len(), "Not enough baselines to compare");
        return Comparison::InsufficientData {
            available: records.len(),
        };
    }

    let mut ordered: Vec<&BaselineRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date));

    let latest = ordered[ordered.len() - 1];
    let previous = ordered[ordered.len() - 2];
    debug!(
        latest = %latest.date,
        previous = %previous.date,
        "Comparing baselines"
    );
    Comparison::Report(compare_pair(previous, latest))
}

/// Like [`compare`], restricted to records carrying `build_config`.
pub fn compare_matching(records: &[BaselineRecord], build_config: &str) -> Comparison {
    let matching: Vec<BaselineRecord> = records
        .iter()
        .filter(|r| r.build_config == build_config)
        .cloned()
        .collect();
    compare(&matching)
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfledger_core::MetricReadings;

    fn record(date: &str, build_config: &str, metrics: MetricReadings) -> BaselineRecord {
        BaselineRecord {
            date: date.to_string(),
            commit_hash: format!("commit-{date}"),
            cpu_model: "cpu".to_string(),
            ram: "16GB".to_string(),
            os: "Linux 6.1.0".to_string(),
            build_config: build_config.to_string(),
            metrics,
        }
    }

    fn file_open(date: &str, value: u64) -> BaselineRecord {
        record(date, "Release", MetricReadings::new().with(Metric::FileOpenTime, value))
    }

    #[test]
    fn test_fifty_percent_increase() {
        let records = vec![file_open("2024-01-01", 100), file_open("2024-02-01", 150)];
        let report = compare(&records).report().cloned().unwrap();
        assert_eq!(report.change(Metric::FileOpenTime), Change::Percent(50.0));
        assert_eq!(report.change(Metric::FileOpenTime).to_string(), "+50.00%");
        assert_eq!(report.latest.date, "2024-02-01");
        assert_eq!(report.previous.date, "2024-01-01");
    }

    #[test]
    fn test_zero_previous_is_not_applicable() {
        let records = vec![
            record("2024-01-01", "Release", MetricReadings::new().with(Metric::MemoryUsage, 0)),
            record("2024-01-02", "Release", MetricReadings::new().with(Metric::MemoryUsage, 50)),
        ];
        let report = compare(&records).report().cloned().unwrap();
        assert_eq!(report.change(Metric::MemoryUsage), Change::NotApplicable);
        assert_eq!(report.change(Metric::MemoryUsage).to_string(), "N/A");
    }

    #[test]
    fn test_missing_values_are_not_applicable() {
        let records = vec![file_open("2024-01-01", 100), file_open("2024-01-02", 110)];
        let report = compare(&records).report().cloned().unwrap();
        for metric in Metric::ALL.into_iter().skip(1) {
            assert_eq!(report.change(metric), Change::NotApplicable);
        }
        assert_eq!(percent_change(MetricValue::Measured(5), MetricValue::NotAvailable), Change::NotApplicable);
        assert_eq!(percent_change(MetricValue::NotAvailable, MetricValue::Measured(5)), Change::NotApplicable);
    }

    #[test]
    fn test_sorts_by_date_not_file_order() {
        let records = vec![
            file_open("2024-03-01", 200),
            file_open("2024-01-01", 100),
            file_open("2024-02-01", 400),
        ];
        let report = compare(&records).report().cloned().unwrap();
        assert_eq!(report.previous.date, "2024-02-01");
        assert_eq!(report.latest.date, "2024-03-01");
        assert_eq!(report.change(Metric::FileOpenTime), Change::Percent(-50.0));
        assert_eq!(report.change(Metric::FileOpenTime).to_string(), "-50.00%");
    }

    #[test]
    fn test_equal_dates_keep_ledger_order() {
        let records = vec![
            file_open("2024-01-01", 100),
            file_open("2024-01-01", 120),
            file_open("2023-12-31", 999),
        ];
        let report = compare(&records).report().cloned().unwrap();
        assert_eq!(report.change(Metric::FileOpenTime), Change::Percent(20.0));
    }

    #[test]
    fn test_insufficient_data_boundary() {
        assert_eq!(compare(&[]), Comparison::InsufficientData { available: 0 });
        let one = vec![file_open("2024-01-01", 1)];
        assert_eq!(compare(&one), Comparison::InsufficientData { available: 1 });
        assert!(compare(&one).report().is_none());

        let two = vec![file_open("2024-01-01", 1), file_open("2024-01-02", 2)];
        assert!(compare(&two).report().is_some());
    }

    #[test]
    fn test_report_covers_every_metric_in_order() {
        let records = vec![file_open("2024-01-01", 1), file_open("2024-01-02", 2)];
        let report = compare(&records).report().cloned().unwrap();
        let metrics: Vec<Metric> = report.changes.iter().map(|c| c.metric).collect();
        assert_eq!(metrics, Metric::ALL.to_vec());
    }

    #[test]
    fn test_swapping_runs_inverts_sign() {
        let a = record(
            "2024-01-01",
            "Release",
            MetricReadings::new()
                .with(Metric::FileOpenTime, 100)
                .with(Metric::FileSaveTime, 80)
                .with(Metric::MemoryUsage, 0)
                .with(Metric::ScrollingTime, 40),
        );
        let b = record(
            "2024-01-02",
            "Release",
            MetricReadings::new()
                .with(Metric::FileOpenTime, 130)
                .with(Metric::FileSaveTime, 60)
                .with(Metric::MemoryUsage, 0)
                .with(Metric::ScrollingTime, 40),
        );

        let forward = compare_pair(&a, &b);
        let backward = compare_pair(&b, &a);
        for metric in Metric::ALL {
            match (forward.change(metric), backward.change(metric)) {
                (Change::Percent(f), Change::Percent(r)) => {
                    assert!(
                        (f == 0.0 && r == 0.0) || f.signum() == -r.signum(),
                        "{metric}: {f} vs {r}"
                    );
                }
                (Change::NotApplicable, Change::NotApplicable) => {}
                other => panic!("{metric}: asymmetric applicability {other:?}"),
            }
        }
    }

    #[test]
    fn test_compare_matching_filters_build_config() {
        let records = vec![
            record("2024-01-01", "Release", MetricReadings::new().with(Metric::FileOpenTime, 100)),
            record("2024-01-02", "Debug", MetricReadings::new().with(Metric::FileOpenTime, 900)),
            record("2024-01-03", "Release", MetricReadings::new().with(Metric::FileOpenTime, 110)),
        ];

        let unfiltered = compare(&records).report().cloned().unwrap();
        assert_eq!(unfiltered.previous.build_config, "Debug");

        let filtered = compare_matching(&records, "Release").report().cloned().unwrap();
        assert_eq!(filtered.previous.date, "2024-01-01");
        let pct = filtered.change(Metric::FileOpenTime).percent().unwrap();
        assert!((pct - 10.0).abs() < 1e-9);

        assert_eq!(
            compare_matching(&records, "Debug"),
            Comparison::InsufficientData { available: 1 }
        );
    }

    #[test]
    fn test_change_serializes_as_number_or_marker() {
        assert_eq!(serde_json::to_string(&Change::Percent(12.5)).unwrap(), "12.5");
        assert_eq!(serde_json::to_string(&Change::NotApplicable).unwrap(), "\"N/A\"");
    }
}
