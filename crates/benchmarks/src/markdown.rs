//! Markdown output generation for comparison reports.
//!
//! This module renders a [`ComparisonReport`] into the performance
//! comparison document: an overview of both runs followed by a
//! `Metric | Change` table.

use crate::compare::ComparisonReport;
use std::fmt::Write;

/// Generate the markdown comparison report.
pub fn generate_report(report: &ComparisonReport) -> String {
    let mut output = String::new();

    writeln!(output, "# Performance Comparison Report").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## Overview").unwrap();
    writeln!(output, "- **Date**: {}", report.latest.date).unwrap();
    writeln!(output, "- **Previous Date**: {}", report.previous.date).unwrap();
    writeln!(output, "- **Commit**: {}", report.latest.commit).unwrap();
    writeln!(output, "- **Previous Commit**: {}", report.previous.commit).unwrap();
    writeln!(output, "- **Build Config**: {}", report.latest.build_config).unwrap();
    writeln!(
        output,
        "- **Previous Build Config**: {}",
        report.previous.build_config
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## Performance Changes").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "| Metric | Change |").unwrap();
    writeln!(output, "|--------|--------|").unwrap();

    for entry in &report.changes {
        writeln!(output, "| {} | {} |", entry.metric, entry.change).unwrap();
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare_pair, Change};
    use perfledger_core::{BaselineRecord, Metric, MetricReadings};

    fn record(date: &str, commit: &str, metrics: MetricReadings) -> BaselineRecord {
        BaselineRecord {
            date: date.to_string(),
            commit_hash: commit.to_string(),
            cpu_model: "cpu".to_string(),
            ram: "16GB".to_string(),
            os: "Linux".to_string(),
            build_config: "Release".to_string(),
            metrics,
        }
    }

    fn sample_report() -> ComparisonReport {
        let previous = record(
            "2024-01-01",
            "aaa111",
            MetricReadings::new()
                .with(Metric::FileOpenTime, 100)
                .with(Metric::MemoryUsage, 0)
                .with(Metric::ScrollingTime, 300),
        );
        let latest = record(
            "2024-02-01",
            "bbb222",
            MetricReadings::new()
                .with(Metric::FileOpenTime, 150)
                .with(Metric::MemoryUsage, 50)
                .with(Metric::ScrollingTime, 200),
        );
        compare_pair(&previous, &latest)
    }

    #[test]
    fn test_overview_block() {
        let doc = generate_report(&sample_report());
        assert!(doc.starts_with("# Performance Comparison Report\n\n## Overview\n"));
        assert!(doc.contains("- **Date**: 2024-02-01\n"));
        assert!(doc.contains("- **Previous Date**: 2024-01-01\n"));
        assert!(doc.contains("- **Commit**: bbb222\n"));
        assert!(doc.contains("- **Previous Commit**: aaa111\n"));
        assert!(doc.contains("- **Build Config**: Release\n"));
        assert!(doc.contains("- **Previous Build Config**: Release\n"));
    }

    #[test]
    fn test_table_rows() {
        let doc = generate_report(&sample_report());
        assert!(doc.contains("| Metric | Change |\n|--------|--------|\n"));
        assert!(doc.contains("| FileOpenTime | +50.00% |\n"));
        assert!(doc.contains("| MemoryUsage | N/A |\n"));
        assert!(doc.contains("| ScrollingTime | -33.33% |\n"));
        assert!(doc.contains("| FileSaveTime | N/A |\n"));
        assert_eq!(doc.matches("\n| ").count(), Metric::COUNT + 1);
    }

    #[test]
    fn test_two_decimal_rounding() {
        assert_eq!(Change::Percent(0.004).to_string(), "+0.00%");
        assert_eq!(Change::Percent(12.345_6).to_string(), "+12.35%");
        assert_eq!(Change::Percent(-0.5).to_string(), "-0.50%");
    }
}
