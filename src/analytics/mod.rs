//! Analytics module - workout log filtering, charting and trends
//!
//! Features:
//! - Fuzzy exercise/workout matching with ranked candidates
//! - Daily bucketing of any metric into a chart series
//! - Trend line (linfa) and direction classification

pub mod aggregator;
pub mod matcher;
pub mod regression;
pub mod scoring;
pub mod trend;

pub use aggregator::{aggregate, aggregate_at, MetricColumns, Series, SeriesRequest};
pub use matcher::{Criteria, MatchResult, MatchStrategy, Matcher};
pub use regression::{TrendLine, Variation};
pub use trend::{classify, TrendDescriptor, TrendDirection};

use std::collections::{BTreeSet, HashMap};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::log::LogRecord;
use crate::metrics::MetricKey;

/// Everything a chart view needs for one request
#[derive(Debug, Clone)]
pub struct ChartReport<'a> {
    pub matched: MatchResult<'a>,
    pub series: Series,
    pub line: TrendLine,
    pub trend: TrendDescriptor,
    pub variation: Option<Variation>,
}

impl ChartReport<'_> {
    /// (day label, value, trend line value) per point
    pub fn rows(&self) -> Vec<(&str, f64, f64)> {
        self.series
            .points()
            .zip(self.line.points())
            .map(|((day, value), fitted)| (day, value, fitted))
            .collect()
    }
}

/// Per-exercise record count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseCount {
    pub exercise: String,
    pub records: usize,
}

/// Workout log analytics
pub struct Analytics {
    records: Vec<LogRecord>,
    matcher: Matcher,
}

impl Analytics {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self {
            records,
            matcher: Matcher::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Records matching `criteria`; `names` are known exercise file names
    pub fn filter(&self, criteria: &Criteria, names: &[String]) -> MatchResult<'_> {
        self.matcher.filter(&self.records, criteria, names)
    }

    /// Filter, chart and classify against the current local time
    pub fn chart(&self, criteria: &Criteria, names: &[String], request: &SeriesRequest) -> ChartReport<'_> {
        self.chart_at(criteria, names, request, Local::now().naive_local())
    }

    pub fn chart_at(
        &self,
        criteria: &Criteria,
        names: &[String],
        request: &SeriesRequest,
        now: NaiveDateTime,
    ) -> ChartReport<'_> {
        let matched = self.filter(criteria, names);
        let series = aggregate_at(matched.records.iter().copied(), request, now);
        let line = TrendLine::fit(&series.data);
        let trend = classify(line.slope, &series.data, series.metric.direction());
        let variation = Variation::of(&series.data);

        ChartReport {
            matched,
            series,
            line,
            trend,
            variation,
        }
    }

    /// Distinct exercise names with record counts, most logged first
    pub fn exercise_counts(&self) -> Vec<ExerciseCount> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for record in &self.records {
            let name = record.exercise.trim();
            if name.is_empty() {
                continue;
            }
            let key = scoring::normalize(name);
            let count = counts.entry(key).or_insert_with(|| {
                order.push(name.to_string());
                0
            });
            *count += 1;
        }

        let mut result: Vec<ExerciseCount> = order
            .into_iter()
            .map(|exercise| {
                let records = counts[&scoring::normalize(&exercise)];
                ExerciseCount { exercise, records }
            })
            .collect();
        result.sort_by(|a, b| b.records.cmp(&a.records));
        result
    }

    /// Custom field keys present anywhere in the log, sorted
    pub fn custom_keys(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|r| r.custom_fields.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Built-in metrics followed by the log's custom keys
    pub fn available_metrics(&self) -> Vec<MetricKey> {
        MetricKey::standard()
            .iter()
            .cloned()
            .chain(self.custom_keys().into_iter().map(MetricKey::Custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{CustomValue, Protocol};
    use crate::metrics::DisplayMode;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn create_record(date: &str, exercise: &str, reps: u32, weight: f64) -> LogRecord {
        let mut r = LogRecord::new(date, exercise, reps, weight);
        r.workout = Some("Push Day".to_string());
        r
    }

    fn create_run(date: &str, pace_minutes: f64) -> LogRecord {
        let mut r = LogRecord::new(date, "Easy Run", 0, 0.0);
        r.custom_fields.insert("duration".to_string(), CustomValue::Number(pace_minutes * 5.0));
        r.custom_fields.insert("distance".to_string(), CustomValue::Number(5.0));
        r
    }

    fn log() -> Vec<LogRecord> {
        vec![
            create_record("2024-03-01T18:00:00", "Bench Press", 8, 60.0),
            create_record("2024-03-01T18:10:00", "Bench Press", 8, 60.0),
            create_record("2024-03-04T18:00:00", "Bench Press", 8, 70.0),
            create_record("2024-03-04T18:20:00", "Overhead Press", 10, 30.0),
            create_record("2024-03-07T18:00:00", "Bench Press", 8, 80.0),
            create_record("2024-03-09T18:00:00", "bench press", 8, 90.0),
        ]
    }

    #[test]
    fn test_filter_then_aggregate_buckets_distinct_days() {
        let analytics = Analytics::new(log());
        let criteria = Criteria::exercise("bench press");
        let matched = analytics.filter(&criteria, &[]);

        let days: BTreeSet<_> = matched
            .records
            .iter()
            .filter_map(|r| r.parsed_date())
            .map(|d| d.date())
            .collect();

        let series = aggregate_at(
            matched.records.iter().copied(),
            &SeriesRequest::default().with_window(365),
            now(),
        );
        assert_eq!(series.len(), days.len());
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn test_chart_increasing_volume() {
        let analytics = Analytics::new(log());
        let report = analytics.chart_at(
            &Criteria::exercise("bench press"),
            &[],
            &SeriesRequest::new(MetricKey::Volume).with_mode(DisplayMode::Exercise),
            now(),
        );

        assert_eq!(report.series.data, vec![480.0, 560.0, 640.0, 720.0]);
        assert!((report.line.slope - 80.0).abs() < 1e-6, "Slope: {}", report.line.slope);
        assert_eq!(report.trend.direction, TrendDirection::Increasing);
        let variation = report.variation.unwrap();
        assert!((variation.percent_change.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_chart_rows_overlay_trend_line() {
        let analytics = Analytics::new(log());
        let report = analytics.chart_at(
            &Criteria::exercise("bench press"),
            &[],
            &SeriesRequest::new(MetricKey::Weight).with_mode(DisplayMode::Exercise),
            now(),
        );

        let rows = report.rows();
        assert_eq!(rows.len(), report.series.len());
        assert_eq!(rows[0].0, "01/03/2024");
        for (i, (_, value, fitted)) in rows.iter().enumerate() {
            assert_eq!(*value, report.series.data[i]);
            assert!((fitted - report.line.value_at(i)).abs() < 1e-9);
        }
        assert!(report.trend.direction.is_positive());
        assert_eq!(report.variation.unwrap().absolute_change(), 30.0);
    }

    #[test]
    fn test_chart_pace_improving() {
        let records = vec![
            create_run("2024-03-01", 9.0),
            create_run("2024-03-03", 7.5),
            create_run("2024-03-05", 6.0),
            create_run("2024-03-07", 4.5),
        ];
        let analytics = Analytics::new(records);
        let report = analytics.chart_at(
            &Criteria::exercise("run"),
            &[],
            &SeriesRequest::new(MetricKey::Pace),
            now(),
        );
        assert_eq!(report.series.data, vec![9.0, 7.5, 6.0, 4.5]);
        assert_eq!(report.trend.direction, TrendDirection::Improving);
        assert_eq!(report.trend.color, trend::GREEN);
    }

    #[test]
    fn test_chart_no_match_is_empty_not_error() {
        let analytics = Analytics::new(log());
        let report = analytics.chart_at(&Criteria::exercise("snatch"), &[], &SeriesRequest::default(), now());
        assert!(report.matched.is_empty());
        assert!(report.series.is_empty());
        assert_eq!(report.trend.direction, TrendDirection::InsufficientData);
        assert!(report.variation.is_none());
    }

    #[test]
    fn test_protocol_narrows_chart() {
        let mut records = log();
        records[4].protocol = Some(Protocol::DropSet.to_string());
        let analytics = Analytics::new(records);
        let criteria = Criteria::workout("push").with_protocol(Protocol::DropSet);
        let matched = analytics.filter(&criteria, &[]);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched.records[0].weight, 80.0);
    }

    #[test]
    fn test_exercise_counts() {
        let analytics = Analytics::new(log());
        let counts = analytics.exercise_counts();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].exercise, "Bench Press");
        assert_eq!(counts[0].records, 5);
        assert_eq!(counts[1].records, 1);
    }

    #[test]
    fn test_custom_keys() {
        let analytics = Analytics::new(vec![create_run("2024-03-01", 6.0)]);
        assert_eq!(analytics.custom_keys(), vec!["distance".to_string(), "duration".to_string()]);
        assert!(Analytics::new(log()).custom_keys().is_empty());
    }

    #[test]
    fn test_available_metrics_lists_builtins_then_custom() {
        let analytics = Analytics::new(vec![create_run("2024-03-01", 6.0)]);
        let metrics = analytics.available_metrics();
        assert_eq!(metrics.len(), MetricKey::standard().len() + 2);
        assert_eq!(metrics[0], MetricKey::Volume);
        assert_eq!(metrics.last(), Some(&MetricKey::Custom("duration".to_string())));
    }
}
