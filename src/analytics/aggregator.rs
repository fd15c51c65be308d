//! Time-series aggregator - buckets records by calendar day and turns the
//! buckets into a labelled chart series

use std::collections::HashMap;

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::log::{FieldKey, LogRecord};
use crate::metrics::{DateFormat, DisplayMode, MetricKey};

const DURATION_KEY: &str = "duration";
const DISTANCE_KEY: &str = "distance";
const HEART_RATE_KEY: &str = "heartRate";

/// What to chart and how
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub metric: MetricKey,
    /// Records older than this many days before "now" are dropped
    pub window_days: u32,
    pub date_format: DateFormat,
    pub display_mode: DisplayMode,
    /// Replaces the human-cased key in custom metric labels
    pub custom_label: Option<String>,
}

impl Default for SeriesRequest {
    fn default() -> Self {
        Self {
            metric: MetricKey::Volume,
            window_days: 30,
            date_format: DateFormat::default(),
            display_mode: DisplayMode::default(),
            custom_label: None,
        }
    }
}

impl SeriesRequest {
    pub fn new(metric: MetricKey) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }

    pub fn with_window(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.display_mode = mode;
        self
    }

    pub fn with_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.custom_label = Some(label.into());
        self
    }
}

/// Every metric's per-bucket values, in bucket order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricColumns {
    pub volume: Vec<f64>,
    pub weight: Vec<f64>,
    pub reps: Vec<f64>,
    pub duration: Vec<f64>,
    pub distance: Vec<f64>,
    pub pace: Vec<f64>,
    pub heart_rate: Vec<f64>,
    /// Values of the requested custom key; empty for built-in metrics
    pub custom: Vec<f64>,
}

impl MetricColumns {
    pub fn get(&self, metric: &MetricKey) -> &[f64] {
        match metric {
            MetricKey::Volume => &self.volume,
            MetricKey::Weight => &self.weight,
            MetricKey::Reps => &self.reps,
            MetricKey::Duration => &self.duration,
            MetricKey::Distance => &self.distance,
            MetricKey::Pace => &self.pace,
            MetricKey::HeartRate => &self.heart_rate,
            MetricKey::Custom(_) => &self.custom,
        }
    }
}

/// Labelled chart series. `labels` and `data` have one entry per populated
/// day, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub label: String,
    pub color: String,
    /// Metric actually charted, after any fallback
    pub metric: MetricKey,
    pub mode: DisplayMode,
    pub columns: MetricColumns,
}

impl Series {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// (day label, value) pairs
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().copied())
    }
}

/// Running sums for one calendar day
#[derive(Debug, Default)]
struct Bucket {
    label: String,
    count: usize,
    volume: f64,
    weight: f64,
    reps: f64,
    duration: f64,
    distance: f64,
    heart_rate: f64,
    custom: f64,
    has_custom: bool,
}

/// Final values of one bucket
struct BucketValues {
    volume: f64,
    weight: f64,
    reps: f64,
    duration: f64,
    distance: f64,
    pace: f64,
    heart_rate: f64,
    custom: f64,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

impl Bucket {
    fn values(&self, aggregate: bool) -> BucketValues {
        let n = self.count as f64;
        let heart_rate = ratio(self.heart_rate, n);

        if aggregate {
            BucketValues {
                volume: self.volume,
                weight: self.weight,
                reps: self.reps,
                duration: self.duration,
                distance: self.distance,
                pace: ratio(self.duration, self.distance),
                heart_rate,
                custom: self.custom,
            }
        } else {
            let duration = ratio(self.duration, n);
            let distance = ratio(self.distance, n);
            BucketValues {
                volume: ratio(self.volume, n),
                weight: ratio(self.weight, n),
                reps: ratio(self.reps, n),
                duration,
                distance,
                pace: ratio(duration, distance),
                heart_rate,
                custom: ratio(self.custom, n),
            }
        }
    }
}

/// Aggregate against the current local time
pub fn aggregate<'a, I>(records: I, request: &SeriesRequest) -> Series
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    aggregate_at(records, request, Local::now().naive_local())
}

/// Aggregate with an explicit "now", for reproducible windows
pub fn aggregate_at<'a, I>(records: I, request: &SeriesRequest, now: NaiveDateTime) -> Series
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    // A window reaching past the calendar's range keeps everything
    let cutoff = Duration::try_days(i64::from(request.window_days))
        .and_then(|span| now.checked_sub_signed(span));

    let mut unparsable = 0usize;
    let mut windowed: Vec<(NaiveDateTime, &LogRecord)> = records
        .into_iter()
        .filter_map(|r| match r.parsed_date() {
            Some(date) => Some((date, r)),
            None => {
                unparsable += 1;
                None
            }
        })
        .filter(|(date, _)| cutoff.is_none_or(|c| *date >= c))
        .collect();
    windowed.sort_by_key(|(date, _)| *date);

    let duration_key = FieldKey::new(DURATION_KEY);
    let distance_key = FieldKey::new(DISTANCE_KEY);
    let heart_rate_key = FieldKey::new(HEART_RATE_KEY);
    let custom_key = match &request.metric {
        MetricKey::Custom(key) => Some(FieldKey::new(key)),
        _ => None,
    };

    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (date, record) in &windowed {
        let label = request.date_format.format(date);
        let slot = *index.entry(label.clone()).or_insert_with(|| {
            buckets.push(Bucket {
                label,
                ..Bucket::default()
            });
            buckets.len() - 1
        });
        let bucket = &mut buckets[slot];

        bucket.count += 1;
        bucket.volume += record.volume;
        bucket.weight += record.weight;
        bucket.reps += f64::from(record.reps);
        let fields = record.custom_index();
        bucket.duration += fields.number(&duration_key);
        bucket.distance += fields.number(&distance_key);
        bucket.heart_rate += fields.number(&heart_rate_key);

        if let Some(key) = &custom_key {
            if let Some(value) = fields.get(key) {
                bucket.custom += value.as_number();
                bucket.has_custom = true;
            }
        }
    }

    debug!(
        windowed = windowed.len(),
        unparsable,
        buckets = buckets.len(),
        window_days = request.window_days,
        "records bucketed"
    );

    let aggregate = request.display_mode.is_aggregate();

    if buckets.is_empty() {
        debug!(metric = %request.metric, "no data in window, using volume series");
        return Series {
            labels: Vec::new(),
            data: Vec::new(),
            label: MetricKey::Volume.label(aggregate, None),
            color: MetricKey::Volume.color().to_string(),
            metric: MetricKey::Volume,
            mode: request.display_mode,
            columns: MetricColumns::default(),
        };
    }

    let mut metric = request.metric.clone();
    if metric.is_custom() && !buckets.iter().any(|b| b.has_custom) {
        debug!(metric = %metric, "custom field missing from windowed records, using volume");
        metric = MetricKey::Volume;
    }

    let mut columns = MetricColumns::default();
    let mut labels = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        let v = bucket.values(aggregate);
        columns.volume.push(v.volume);
        columns.weight.push(v.weight);
        columns.reps.push(v.reps);
        columns.duration.push(v.duration);
        columns.distance.push(v.distance);
        columns.pace.push(v.pace);
        columns.heart_rate.push(v.heart_rate);
        if metric.is_custom() {
            columns.custom.push(v.custom);
        }
        labels.push(bucket.label);
    }

    Series {
        labels,
        data: columns.get(&metric).to_vec(),
        label: metric.label(aggregate, request.custom_label.as_deref()),
        color: metric.color().to_string(),
        metric,
        mode: request.display_mode,
        columns,
    }
}
