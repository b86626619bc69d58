//! Per-metric trend series and chart output.
//!
//! [`build_series`] turns the whole ledger into one chronologically ordered
//! series per metric. Missing observations are skipped and split the series
//! into segments, so a chart never draws a line across a gap.
//!
//! Where the series end up is the job of a [`TrendSink`]. [`SvgTrendSink`]
//! writes one SVG line chart per metric; [`CollectingSink`] keeps them in
//! memory.

use chrono::NaiveDate;
use perfledger_core::record::DATE_FORMAT;
use perfledger_core::{BaselineRecord, Metric};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 130.0;
const Y_TICKS: usize = 5;
const MAX_X_LABELS: usize = 20;
const LINE_COLOR: &str = "#1f77b4";

/// Errors raised while rendering trends.
#[derive(Debug, Error)]
pub enum TrendError {
    /// A ledger date is not `YYYY-MM-DD`
    #[error("invalid date {value:?} in ledger row {row}")]
    InvalidDate {
        /// The offending date string
        value: String,
        /// 1-based data row index
        row: usize,
        /// Parse failure
        source: chrono::ParseError,
    },

    /// Writing a chart failed
    #[error("failed to write trend chart {}", .path.display())]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

/// Result type for trend rendering.
pub type Result<T> = std::result::Result<T, TrendError>;

/// One observation in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPoint {
    /// Run date.
    pub date: NaiveDate,
    /// Measured value.
    pub value: u64,
}

/// Time series of one metric across the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendSeries {
    /// The metric plotted.
    pub metric: Metric,
    /// Runs of consecutive measured points, split wherever a run lacked the metric.
    pub segments: Vec<Vec<TrendPoint>>,
}

impl TrendSeries {
    /// All points, in date order.
    pub fn points(&self) -> impl Iterator<Item = &TrendPoint> + '_ {
        self.segments.iter().flatten()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chart title.
    pub fn title(&self) -> String {
        format!("{} Trend Over Time", self.metric)
    }

    /// Artifact file name for this series with the given extension.
    pub fn file_name(&self, extension: &str) -> String {
        format!("performance_trends_{}.{extension}", self.metric)
    }
}

/// Destination for rendered series.
pub trait TrendSink {
    /// Consume one series.
    fn emit(&mut self, series: &TrendSeries) -> Result<()>;
}

/// Build one series per tracked metric from `records`.
///
/// Dates are parsed, not compared as strings; records sharing a date keep
/// ledger order.
pub fn build_series(records: &[BaselineRecord]) -> Result<Vec<TrendSeries>> {
    let mut dated = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let date = record
            .parsed_date()
            .map_err(|source| TrendError::InvalidDate {
                value: record.date.clone(),
                row: idx + 1,
                source,
            })?;
        dated.push((date, record));
    }
    dated.sort_by_key(|(date, _)| *date);

    let series = Metric::ALL
        .into_iter()
        .map(|metric| {
            let mut segments = Vec::new();
            let mut current = Vec::new();
            for (date, record) in &dated {
                match record.metric(metric).measured() {
                    Some(value) => current.push(TrendPoint { date: *date, value }),
                    None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                    None => {}
                }
            }
            if !current.is_empty() {
                segments.push(current);
            }
            TrendSeries { metric, segments }
        })
        .collect();
    Ok(series)
}

/// Build every series and hand each to `sink`. Returns the number emitted.
pub fn render_all(records: &[BaselineRecord], sink: &mut dyn TrendSink) -> Result<usize> {
    let series = build_series(records)?;
    for s in &series {
        debug!(metric = %s.metric, points = s.len(), segments = s.segments.len(), "Emitting trend");
        sink.emit(s)?;
    }
    Ok(series.len())
}

/// Keeps emitted series in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Series in emission order.
    pub series: Vec<TrendSeries>,
}

impl TrendSink for CollectingSink {
    fn emit(&mut self, series: &TrendSeries) -> Result<()> {
        self.series.push(series.clone());
        Ok(())
    }
}

/// Writes `performance_trends_<Metric>.svg` files into a directory.
#[derive(Debug)]
pub struct SvgTrendSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl SvgTrendSink {
    /// Sink writing into `dir` (created on first emit).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl TrendSink for SvgTrendSink {
    fn emit(&mut self, series: &TrendSeries) -> Result<()> {
        let path = self.dir.join(series.file_name("svg"));
        fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&path, render_svg(series)))
            .map_err(|source| TrendError::Io {
                path: path.clone(),
                source,
            })?;
        info!(metric = %series.metric, path = %path.display(), "Generated trend plot");
        self.written.push(path);
        Ok(())
    }
}

struct Scale {
    min: f64,
    max: f64,
    lo: f64,
    hi: f64,
}

impl Scale {
    /// Map `v` in `[min, max]` onto `[lo, hi]`; a degenerate domain maps to the midpoint.
    fn map(&self, v: f64) -> f64 {
        if (self.max - self.min).abs() < f64::EPSILON {
            return (self.lo + self.hi) / 2.0;
        }
        self.lo + (v - self.min) / (self.max - self.min) * (self.hi - self.lo)
    }
}

fn value_scale(series: &TrendSeries) -> Scale {
    let (mut min, mut max) = series
        .points()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.value as f64), hi.max(p.value as f64))
        });
    if !min.is_finite() {
        min = 0.0;
        max = 1.0;
    }
    let mut span = max - min;
    if span == 0.0 {
        span = (max.abs() * 0.1).max(1.0);
        min -= span / 2.0;
        max += span / 2.0;
        span = max - min;
    }
    Scale {
        min: min - span * 0.05,
        max: max + span * 0.05,
        // SVG y grows downwards.
        lo: HEIGHT - MARGIN_BOTTOM,
        hi: MARGIN_TOP,
    }
}

fn date_scale(series: &TrendSeries) -> Scale {
    let first = series.points().map(|p| p.date).min();
    let last = series.points().map(|p| p.date).max();
    let (min, max) = match (first, last) {
        (Some(first), Some(last)) => (0.0, (last - first).num_days() as f64),
        _ => (0.0, 0.0),
    };
    Scale {
        min,
        max,
        lo: MARGIN_LEFT + 20.0,
        hi: WIDTH - MARGIN_RIGHT - 20.0,
    }
}

fn format_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Render `series` as a standalone SVG line chart.
pub fn render_svg(series: &TrendSeries) -> String {
    let ys = value_scale(series);
    let xs = date_scale(series);
    let origin = series.points().map(|p| p.date).min();
    let x_of = |date: NaiveDate| {
        let days = origin.map_or(0, |o| (date - o).num_days());
        xs.map(days as f64)
    };

    let plot_left = MARGIN_LEFT;
    let plot_right = WIDTH - MARGIN_RIGHT;
    let plot_top = MARGIN_TOP;
    let plot_bottom = HEIGHT - MARGIN_BOTTOM;

    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    )
    .unwrap();
    writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#).unwrap();
    writeln!(
        out,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="18">{}</text>"#,
        WIDTH / 2.0,
        MARGIN_TOP / 2.0,
        series.title()
    )
    .unwrap();

    // Horizontal grid and y tick labels.
    for i in 0..Y_TICKS {
        let v = ys.min + (ys.max - ys.min) * i as f64 / (Y_TICKS - 1) as f64;
        let y = ys.map(v);
        writeln!(
            out,
            r##"<line x1="{plot_left}" y1="{y:.1}" x2="{plot_right}" y2="{y:.1}" stroke="#b0b0b0" stroke-dasharray="6,4" stroke-opacity="0.7"/>"##
        )
        .unwrap();
        writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="12">{}</text>"#,
            plot_left - 8.0,
            y + 4.0,
            format_tick(v)
        )
        .unwrap();
    }

    // Vertical grid and rotated date labels.
    let mut dates: Vec<NaiveDate> = series.points().map(|p| p.date).collect();
    dates.dedup();
    let step = dates.len().div_ceil(MAX_X_LABELS).max(1);
    for date in dates.iter().step_by(step) {
        let x = x_of(*date);
        writeln!(
            out,
            r##"<line x1="{x:.1}" y1="{plot_top}" x2="{x:.1}" y2="{plot_bottom}" stroke="#b0b0b0" stroke-dasharray="6,4" stroke-opacity="0.7"/>"##
        )
        .unwrap();
        writeln!(
            out,
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="end" font-size="12" transform="rotate(-45 {x:.1} {:.1})">{}</text>"#,
            plot_bottom + 18.0,
            plot_bottom + 18.0,
            date.format(DATE_FORMAT)
        )
        .unwrap();
    }

    // Axes.
    writeln!(
        out,
        r#"<rect x="{plot_left}" y="{plot_top}" width="{}" height="{}" fill="none" stroke="black"/>"#,
        plot_right - plot_left,
        plot_bottom - plot_top
    )
    .unwrap();
    writeln!(
        out,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14">Date</text>"#,
        (plot_left + plot_right) / 2.0,
        HEIGHT - 15.0
    )
    .unwrap();
    writeln!(
        out,
        r#"<text x="20" y="{y:.1}" text-anchor="middle" font-size="14" transform="rotate(-90 20 {y:.1})">{}</text>"#,
        series.metric,
        y = (plot_top + plot_bottom) / 2.0
    )
    .unwrap();

    if series.is_empty() {
        writeln!(
            out,
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="16" fill="#808080">No data</text>"##,
            (plot_left + plot_right) / 2.0,
            (plot_top + plot_bottom) / 2.0
        )
        .unwrap();
    }

    for segment in &series.segments {
        let coords: Vec<String> = segment
            .iter()
            .map(|p| format!("{:.1},{:.1}", x_of(p.date), ys.map(p.value as f64)))
            .collect();
        if coords.len() > 1 {
            writeln!(
                out,
                r#"<polyline points="{}" fill="none" stroke="{LINE_COLOR}" stroke-width="2"/>"#,
                coords.join(" ")
            )
            .unwrap();
        }
        for p in segment {
            writeln!(
                out,
                r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{LINE_COLOR}"><title>{}: {}</title></circle>"#,
                x_of(p.date),
                ys.map(p.value as f64),
                p.date.format(DATE_FORMAT),
                p.value
            )
            .unwrap();
        }
    }

    writeln!(out, "</svg>").unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfledger_core::MetricReadings;

    fn record(date: &str, metrics: MetricReadings) -> BaselineRecord {
        BaselineRecord {
            date: date.to_string(),
            commit_hash: "abc".to_string(),
            cpu_model: "cpu".to_string(),
            ram: "8GB".to_string(),
            os: "Linux".to_string(),
            build_config: "Release".to_string(),
            metrics,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_one_series_per_metric() {
        let records = vec![record("2024-01-01", MetricReadings::new())];
        let series = build_series(&records).unwrap();
        assert_eq!(series.len(), Metric::COUNT);
        assert!(series.iter().all(TrendSeries::is_empty));
    }

    #[test]
    fn test_orders_by_parsed_date() {
        let records = vec![
            record("2024-10-01", MetricReadings::new().with(Metric::FileOpenTime, 3)),
            record("2024-02-01", MetricReadings::new().with(Metric::FileOpenTime, 1)),
            record("2024-09-15", MetricReadings::new().with(Metric::FileOpenTime, 2)),
        ];
        let series = build_series(&records).unwrap();
        let values: Vec<u64> = series[0].points().map(|p| p.value).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_points_split_segments() {
        let records = vec![
            record("2024-01-01", MetricReadings::new().with(Metric::MemoryUsage, 100)),
            record("2024-01-02", MetricReadings::new().with(Metric::MemoryUsage, 110)),
            record("2024-01-03", MetricReadings::new()),
            record("2024-01-04", MetricReadings::new().with(Metric::MemoryUsage, 90)),
        ];
        let series = build_series(&records).unwrap();
        let memory = &series[Metric::MemoryUsage.index()];
        assert_eq!(memory.metric, Metric::MemoryUsage);
        assert_eq!(memory.len(), 3);
        assert_eq!(memory.segments.len(), 2);
        assert_eq!(
            memory.segments[1],
            vec![TrendPoint {
                date: date("2024-01-04"),
                value: 90
            }]
        );
    }

    #[test]
    fn test_malformed_date_is_fatal() {
        let records = vec![
            record("2024-01-01", MetricReadings::new()),
            record("01/02/2024", MetricReadings::new()),
        ];
        let err = build_series(&records).unwrap_err();
        match &err {
            TrendError::InvalidDate { value, row, .. } => {
                assert_eq!(value, "01/02/2024");
                assert_eq!(*row, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("01/02/2024"));
    }

    #[test]
    fn test_render_all_emits_every_metric() {
        let records = vec![
            record("2024-01-01", MetricReadings::new().with(Metric::NavigationTime, 5)),
            record("2024-01-08", MetricReadings::new().with(Metric::NavigationTime, 7)),
        ];
        let mut sink = CollectingSink::default();
        let emitted = render_all(&records, &mut sink).unwrap();
        assert_eq!(emitted, Metric::COUNT);
        let metrics: Vec<Metric> = sink.series.iter().map(|s| s.metric).collect();
        assert_eq!(metrics, Metric::ALL.to_vec());
    }

    #[test]
    fn test_svg_contents() {
        let records = vec![
            record("2024-01-01", MetricReadings::new().with(Metric::ScrollingTime, 100)),
            record("2024-01-02", MetricReadings::new()),
            record("2024-01-03", MetricReadings::new().with(Metric::ScrollingTime, 120)),
            record("2024-01-04", MetricReadings::new().with(Metric::ScrollingTime, 80)),
        ];
        let series = build_series(&records).unwrap();
        let svg = render_svg(&series[Metric::ScrollingTime.index()]);

        assert!(svg.starts_with("<svg "));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("ScrollingTime Trend Over Time"));
        assert!(svg.contains(">Date</text>"));
        assert_eq!(svg.matches("<circle").count(), 3);
        // The gap on 2024-01-02 leaves a single-point segment with no line.
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("2024-01-03: 120"));
        assert!(!svg.contains("No data"));
    }

    #[test]
    fn test_svg_for_empty_and_flat_series() {
        let empty = TrendSeries {
            metric: Metric::FileSaveTime,
            segments: Vec::new(),
        };
        let svg = render_svg(&empty);
        assert!(svg.contains("No data"));
        assert!(!svg.contains("NaN"));

        let flat = TrendSeries {
            metric: Metric::FileSaveTime,
            segments: vec![vec![
                TrendPoint {
                    date: date("2024-01-01"),
                    value: 10,
                },
                TrendPoint {
                    date: date("2024-01-01"),
                    value: 10,
                },
            ]],
        };
        let svg = render_svg(&flat);
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn test_svg_sink_writes_one_file_per_metric() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("benchmarks");
        let records = vec![record("2024-01-01", MetricReadings::new().with(Metric::FileOpenTime, 1))];

        let mut sink = SvgTrendSink::new(&out);
        render_all(&records, &mut sink).unwrap();

        assert_eq!(sink.written().len(), Metric::COUNT);
        for metric in Metric::ALL {
            let path = out.join(format!("performance_trends_{metric}.svg"));
            assert!(path.is_file(), "missing {}", path.display());
        }
    }
}
