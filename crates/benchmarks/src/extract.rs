//! Metric extraction from raw test-run output.
//!
//! Each metric is located by its own labeled pattern (`<Label>: <digits><unit>`).
//! Patterns are evaluated independently; a miss only affects its own metric.

use once_cell::sync::Lazy;
use perfledger_core::{Metric, MetricReadings, MetricValue};
use regex::Regex;
use tracing::{debug, warn};

static DEFAULT_EXTRACTOR: Lazy<MetricExtractor> = Lazy::new(MetricExtractor::new);

/// Parses free-form test output into [`MetricReadings`].
#[derive(Debug, Clone)]
pub struct MetricExtractor {
    matchers: Vec<(Metric, Regex)>,
}

impl MetricExtractor {
    /// Build the matcher table for every tracked metric.
    pub fn new() -> Self {
        let matchers = Metric::ALL
            .into_iter()
            .map(|metric| {
                let pattern = pattern_for(metric);
                // Labels and units are fixed literals and always escape cleanly.
                let regex = Regex::new(&pattern).expect("metric pattern is a valid regex");
                (metric, regex)
            })
            .collect();
        Self { matchers }
    }

    /// Shared extractor instance.
    pub fn shared() -> &'static MetricExtractor {
        &DEFAULT_EXTRACTOR
    }

    /// Extract one value per metric from `text`. Only the first match counts.
    pub fn extract(&self, text: &str) -> MetricReadings {
        let mut readings = MetricReadings::new();
        for (metric, regex) in &self.matchers {
            let value = match regex.captures(text).and_then(|caps| caps.get(1)) {
                Some(m) => match m.as_str().parse::<u64>() {
                    Ok(v) => MetricValue::Measured(v),
                    Err(err) => {
                        warn!(metric = %metric, raw = m.as_str(), error = %err, "Value does not fit in u64");
                        MetricValue::NotAvailable
                    }
                },
                None => {
                    debug!(metric = %metric, "Pattern not found in output");
                    MetricValue::NotAvailable
                }
            };
            readings.set(*metric, value);
        }
        debug!(
            measured = readings.measured_count(),
            total = Metric::COUNT,
            "Extracted metrics"
        );
        readings
    }
}

impl Default for MetricExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Regex source for `metric`: the escaped label, a captured integer, the unit.
pub fn pattern_for(metric: Metric) -> String {
    format!(
        r"{}: ([0-9]+){}",
        regex::escape(metric.label()),
        regex::escape(metric.unit())
    )
}
