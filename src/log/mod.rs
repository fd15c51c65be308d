//! Log module - workout log records as consumed by the analytics core

pub mod protocol;

pub use protocol::Protocol;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Date-time layouts accepted besides RFC 3339, tried in order
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Value stored in a record's open field bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl CustomValue {
    /// Numeric reading: text is parsed, flags and garbage read as 0
    pub fn as_number(&self) -> f64 {
        match self {
            CustomValue::Number(n) if n.is_finite() => *n,
            CustomValue::Number(_) => 0.0,
            CustomValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
            CustomValue::Flag(_) => 0.0,
        }
    }
}

/// One completed set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub date: String,
    pub exercise: String,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default, alias = "workoutName", skip_serializing_if = "Option::is_none")]
    pub workout: Option<String>,
    /// Legacy name of the workout field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origine: Option<String>,
    /// Precise instant in epoch millis, for ordering sets inside a session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, CustomValue>,
    /// Exercise page/file the entry was logged from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LogRecord {
    /// Strength set with volume = reps * weight
    pub fn new(date: impl Into<String>, exercise: impl Into<String>, reps: u32, weight: f64) -> Self {
        Self {
            date: date.into(),
            exercise: exercise.into(),
            reps,
            weight,
            volume: reps as f64 * weight,
            ..Self::default()
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        parse_log_date(&self.date)
    }

    /// Workout name. The legacy `origine` link wins when both are set.
    pub fn workout_label(&self) -> Option<&str> {
        [self.origine.as_deref(), self.workout.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol.as_deref().map(Protocol::from_tag).unwrap_or_default()
    }

    /// Numeric custom field, exact key first, then case-insensitive.
    /// Missing keys read as 0.
    pub fn custom_number(&self, key: &str) -> f64 {
        self.custom_value(key).map_or(0.0, CustomValue::as_number)
    }

    pub fn custom_value(&self, key: &str) -> Option<&CustomValue> {
        self.custom_index().get(&FieldKey::new(key))
    }

    pub fn custom_index(&self) -> CustomIndex<'_> {
        CustomIndex::new(&self.custom_fields)
    }
}

/// Custom-field key, lowercased once so it can be reused across records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKey {
    exact: String,
    folded: String,
}

impl FieldKey {
    pub fn new(key: &str) -> Self {
        Self {
            exact: key.to_string(),
            folded: key.to_lowercase(),
        }
    }
}

/// One record's custom fields keyed by lowercased name. Exact spelling is
/// tried first; among case variants the first in key order wins.
#[derive(Debug)]
pub struct CustomIndex<'r> {
    fields: &'r BTreeMap<String, CustomValue>,
    folded: HashMap<String, &'r CustomValue>,
}

impl<'r> CustomIndex<'r> {
    pub fn new(fields: &'r BTreeMap<String, CustomValue>) -> Self {
        let mut folded = HashMap::with_capacity(fields.len());
        for (key, value) in fields {
            folded.entry(key.to_lowercase()).or_insert(value);
        }
        Self { fields, folded }
    }

    pub fn get(&self, key: &FieldKey) -> Option<&'r CustomValue> {
        self.fields
            .get(&key.exact)
            .or_else(|| self.folded.get(&key.folded).copied())
    }

    /// Missing keys read as 0
    pub fn number(&self, key: &FieldKey) -> f64 {
        self.get(key).map_or(0.0, CustomValue::as_number)
    }
}

/// Parse a log date leniently. Offsets are honored by keeping the wall-clock
/// time they denote; anything unrecognized is `None`.
pub fn parse_log_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Load records from a JSON array. Entries that do not deserialize are
/// skipped with a warning; an unreadable file or non-array document is an
/// error.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<LogRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let records = parse_records(&content)?;
    debug!(path = %path.display(), count = records.len(), "loaded log records");
    Ok(records)
}

/// Parse records from JSON text, skipping malformed entries
pub fn parse_records(content: &str) -> Result<Vec<LogRecord>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(content)?;
    let mut records = Vec::with_capacity(raw.len());

    for (idx, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<LogRecord>(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!(index = idx, error = %e, "skipping malformed log record"),
        }
    }

    Ok(records)
}

/// Write records as a pretty-printed JSON array
pub fn save_records(path: impl AsRef<Path>, records: &[LogRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_plain_date() {
        let dt = parse_log_date("2024-03-05").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_rfc3339_keeps_wall_time() {
        let dt = parse_log_date("2024-03-05T23:30:00+03:00").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn test_parse_naive_date_time_variants() {
        assert!(parse_log_date("2024-03-05T18:30:00").is_some());
        assert!(parse_log_date("2024-03-05T18:30:00.250").is_some());
        assert!(parse_log_date("2024-03-05 18:30:00").is_some());
        assert!(parse_log_date("2024-03-05 18:30").is_some());
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_log_date("").is_none());
        assert!(parse_log_date("yesterday").is_none());
        assert!(parse_log_date("2024-13-45").is_none());
    }

    #[test]
    fn test_new_computes_volume() {
        let r = LogRecord::new("2024-03-05", "Squat", 5, 100.0);
        assert_eq!(r.volume, 500.0);
        assert_eq!(r.protocol(), Protocol::Standard);
    }

    #[test]
    fn test_workout_label_skips_blank_origine() {
        let mut r = LogRecord::new("2024-03-05", "Squat", 5, 100.0);
        assert_eq!(r.workout_label(), None);

        r.workout = Some("Push".to_string());
        assert_eq!(r.workout_label(), Some("Push"));

        r.origine = Some("  ".to_string());
        assert_eq!(r.workout_label(), Some("Push"));
    }

    #[test]
    fn test_workout_label_prefers_origine_on_conflict() {
        let mut r = LogRecord::new("2024-03-05", "Squat", 5, 100.0);
        r.workout = Some("Push".to_string());
        r.origine = Some("[[Leg Day]]".to_string());
        assert_eq!(r.workout_label(), Some("[[Leg Day]]"));
    }

    #[test]
    fn test_custom_index_prefers_exact_spelling() {
        let mut r = LogRecord::new("2024-03-05", "Circuit", 0, 0.0);
        r.custom_fields.insert("Rounds".to_string(), CustomValue::Number(3.0));
        r.custom_fields.insert("rounds".to_string(), CustomValue::Number(10.0));

        let index = r.custom_index();
        assert_eq!(index.number(&FieldKey::new("rounds")), 10.0);
        assert_eq!(index.number(&FieldKey::new("Rounds")), 3.0);
        assert_eq!(index.number(&FieldKey::new("ROUNDS")), 3.0);
        assert!(index.get(&FieldKey::new("laps")).is_none());
    }

    #[test]
    fn test_custom_number_case_insensitive() {
        let mut r = LogRecord::new("2024-03-05", "Run", 0, 0.0);
        r.custom_fields.insert("Duration".to_string(), CustomValue::Number(30.0));
        r.custom_fields.insert("distance".to_string(), CustomValue::Text("5.5".to_string()));
        r.custom_fields.insert("felt_good".to_string(), CustomValue::Flag(true));

        assert_eq!(r.custom_number("duration"), 30.0);
        assert_eq!(r.custom_number("DISTANCE"), 5.5);
        assert_eq!(r.custom_number("felt_good"), 0.0);
        assert_eq!(r.custom_number("missing"), 0.0);
    }

    #[test]
    fn test_custom_text_not_numeric_reads_zero() {
        assert_eq!(CustomValue::Text("fast".to_string()).as_number(), 0.0);
        assert_eq!(CustomValue::Text("NaN".to_string()).as_number(), 0.0);
    }

    #[test]
    fn test_parse_records_skips_malformed() {
        let json = r#"[
            {"date": "2024-03-05", "exercise": "Squat", "reps": 5, "weight": 100, "volume": 500},
            {"date": "2024-03-05", "reps": "many"},
            {"date": "2024-03-06", "exercise": "Run", "customFields": {"duration": 30, "distance": "5"}, "workoutName": "Cardio"}
        ]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].workout.as_deref(), Some("Cardio"));
        assert_eq!(records[1].custom_number("distance"), 5.0);
    }

    #[test]
    fn test_parse_records_rejects_non_array() {
        assert!(parse_records("{\"date\": \"2024-03-05\"}").is_err());
    }
}
