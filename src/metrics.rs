//! Metric catalog - chartable metrics, display modes, date formats and
//! exercise types

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Color used for custom metrics when nothing else applies
pub const DEFAULT_CUSTOM_COLOR: &str = "#607D8B";

/// Palette custom metric keys hash into
const CUSTOM_PALETTE: &[&str] = &[
    "#607D8B", "#00BCD4", "#8BC34A", "#FF5722", "#3F51B5", "#CDDC39", "#795548", "#009688",
];

/// A metric that can be charted over time
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetricKey {
    #[default]
    Volume,
    Weight,
    Reps,
    Duration,
    Distance,
    Pace,
    HeartRate,
    /// Key inside a record's custom fields
    Custom(String),
}

/// Which way a metric improves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    HigherIsBetter,
    LowerIsBetter,
}

impl MetricKey {
    pub fn as_key(&self) -> &str {
        match self {
            MetricKey::Volume => "volume",
            MetricKey::Weight => "weight",
            MetricKey::Reps => "reps",
            MetricKey::Duration => "duration",
            MetricKey::Distance => "distance",
            MetricKey::Pace => "pace",
            MetricKey::HeartRate => "heartRate",
            MetricKey::Custom(key) => key.as_str(),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, MetricKey::Custom(_))
    }

    pub fn direction(&self) -> MetricDirection {
        match self {
            MetricKey::Pace => MetricDirection::LowerIsBetter,
            _ => MetricDirection::HigherIsBetter,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricKey::Volume | MetricKey::Weight => "kg",
            MetricKey::Reps => "",
            MetricKey::Duration => "sec",
            MetricKey::Distance => "km",
            MetricKey::Pace => "min/km",
            MetricKey::HeartRate => "bpm",
            MetricKey::Custom(_) => "",
        }
    }

    /// Chart color; custom keys map deterministically into a palette
    pub fn color(&self) -> &'static str {
        match self {
            MetricKey::Volume => "#4CAF50",
            MetricKey::Weight | MetricKey::Reps => "#FF9800",
            MetricKey::Duration => "#2196F3",
            MetricKey::Distance => "#9C27B0",
            MetricKey::Pace => "#E91E63",
            MetricKey::HeartRate => "#F44336",
            MetricKey::Custom(key) => color_for_key(key),
        }
    }

    /// Series label. `aggregate` selects the "Total" wording over "Avg";
    /// rate metrics ignore it.
    pub fn label(&self, aggregate: bool, custom_label: Option<&str>) -> String {
        let prefix = if aggregate { "Total" } else { "Avg" };
        match self {
            MetricKey::Volume => format!("{prefix} Volume"),
            MetricKey::Weight => format!("{prefix} Weight"),
            MetricKey::Reps => format!("{prefix} Reps"),
            MetricKey::Duration => format!("{prefix} Duration"),
            MetricKey::Distance => format!("{prefix} Distance"),
            MetricKey::Pace => "Pace".to_string(),
            MetricKey::HeartRate => "Avg Heart Rate".to_string(),
            MetricKey::Custom(key) => {
                let name = custom_label
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| key_to_label(key));
                format!("{prefix} {name}")
            }
        }
    }

    /// Built-in metrics, in catalog order
    pub fn standard() -> &'static [MetricKey] {
        &[
            MetricKey::Volume,
            MetricKey::Weight,
            MetricKey::Reps,
            MetricKey::Duration,
            MetricKey::Distance,
            MetricKey::Pace,
            MetricKey::HeartRate,
        ]
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Metric key cannot be empty".to_string());
        }
        Ok(match trimmed.to_lowercase().as_str() {
            "volume" => MetricKey::Volume,
            "weight" => MetricKey::Weight,
            "reps" => MetricKey::Reps,
            "duration" => MetricKey::Duration,
            "distance" => MetricKey::Distance,
            "pace" => MetricKey::Pace,
            "heartrate" | "heart_rate" => MetricKey::HeartRate,
            _ => MetricKey::Custom(trimmed.to_string()),
        })
    }
}

impl TryFrom<String> for MetricKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetricKey> for String {
    fn from(key: MetricKey) -> Self {
        key.as_key().to_string()
    }
}

/// How daily buckets are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Single exercise: per-day averages
    #[default]
    Exercise,
    /// Whole workout: per-day totals
    Workout,
    Combined,
    All,
}

impl DisplayMode {
    /// Totals rather than averages
    pub fn is_aggregate(&self) -> bool {
        !matches!(self, DisplayMode::Exercise)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exercise => write!(f, "exercise"),
            Self::Workout => write!(f, "workout"),
            Self::Combined => write!(f, "combined"),
            Self::All => write!(f, "all"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exercise" => Ok(Self::Exercise),
            "workout" => Ok(Self::Workout),
            "combined" => Ok(Self::Combined),
            "all" => Ok(Self::All),
            _ => Err(format!("Unknown display mode: {}", s)),
        }
    }
}

/// Day label layout for series buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
}

impl DateFormat {
    fn pattern(&self) -> &'static str {
        match self {
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::MonthDayYear => "%m/%d/%Y",
            DateFormat::Iso => "%Y-%m-%d",
        }
    }

    pub fn format(&self, date: &NaiveDateTime) -> String {
        date.format(self.pattern()).to_string()
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayMonthYear => write!(f, "DD/MM/YYYY"),
            Self::MonthDayYear => write!(f, "MM/DD/YYYY"),
            Self::Iso => write!(f, "YYYY-MM-DD"),
        }
    }
}

impl FromStr for DateFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DD/MM/YYYY" => Ok(Self::DayMonthYear),
            "MM/DD/YYYY" => Ok(Self::MonthDayYear),
            "YYYY-MM-DD" => Ok(Self::Iso),
            _ => Err(format!("Unknown date format: {}", s)),
        }
    }
}

/// Kind of exercise, deciding which metrics make sense to chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    #[default]
    Strength,
    Timed,
    Distance,
    Cardio,
    Custom,
}

impl ExerciseType {
    /// Metrics available for this type. Custom types expose their numeric
    /// parameter keys instead.
    pub fn available_metrics(&self, custom_keys: &[String]) -> Vec<MetricKey> {
        match self {
            ExerciseType::Strength => vec![MetricKey::Volume, MetricKey::Weight, MetricKey::Reps],
            ExerciseType::Timed => vec![MetricKey::Duration],
            ExerciseType::Distance => vec![MetricKey::Distance, MetricKey::Duration, MetricKey::Pace],
            ExerciseType::Cardio => vec![MetricKey::Duration, MetricKey::Distance, MetricKey::HeartRate],
            ExerciseType::Custom => custom_keys
                .iter()
                .filter_map(|k| k.parse::<MetricKey>().ok())
                .collect(),
        }
    }

    pub fn default_metric(&self, custom_keys: &[String]) -> MetricKey {
        match self {
            ExerciseType::Strength => MetricKey::Volume,
            ExerciseType::Timed | ExerciseType::Cardio => MetricKey::Duration,
            ExerciseType::Distance => MetricKey::Distance,
            ExerciseType::Custom => custom_keys
                .iter()
                .find_map(|k| k.parse::<MetricKey>().ok())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strength => write!(f, "strength"),
            Self::Timed => write!(f, "timed"),
            Self::Distance => write!(f, "distance"),
            Self::Cardio => write!(f, "cardio"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for ExerciseType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strength" => Ok(Self::Strength),
            "timed" => Ok(Self::Timed),
            "distance" => Ok(Self::Distance),
            "cardio" => Ok(Self::Cardio),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Unknown exercise type: {}", s)),
        }
    }
}

/// Pick the metric to chart: an explicit request wins, otherwise the
/// exercise type's default
pub fn resolve_metric(
    requested: Option<MetricKey>,
    exercise_type: ExerciseType,
    custom_keys: &[String],
) -> MetricKey {
    requested.unwrap_or_else(|| exercise_type.default_metric(custom_keys))
}

/// Check a metric against an exercise type. The `all` display mode accepts
/// any metric.
pub fn validate_metric(
    metric: &MetricKey,
    exercise_type: ExerciseType,
    custom_keys: &[String],
    mode: DisplayMode,
) -> Result<(), String> {
    if mode == DisplayMode::All {
        return Ok(());
    }

    let available = exercise_type.available_metrics(custom_keys);
    if available.contains(metric) {
        return Ok(());
    }

    let list = if available.is_empty() {
        "no chart types available".to_string()
    } else {
        available.iter().map(|m| m.as_key()).collect::<Vec<_>>().join(", ")
    };
    Err(format!(
        "Metric \"{}\" is not available for {} exercises. Available: {}",
        metric, exercise_type, list
    ))
}

/// Human-cased label for a field key: `heartRate` -> `Heart Rate`,
/// `my_custom-param` -> `My Custom Param`
pub fn key_to_label(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_uppercase() {
            spaced.push(' ');
            spaced.push(c);
        } else if c == '_' || c == '-' {
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable palette color for a custom key (FNV-1a over the lowercased key)
pub fn color_for_key(key: &str) -> &'static str {
    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return DEFAULT_CUSTOM_COLOR;
    }

    let mut hash: u32 = 0x811c_9dc5;
    for byte in normalized.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    CUSTOM_PALETTE[hash as usize % CUSTOM_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_metric_parse_known() {
        assert_eq!("volume".parse::<MetricKey>().unwrap(), MetricKey::Volume);
        assert_eq!("PACE".parse::<MetricKey>().unwrap(), MetricKey::Pace);
        assert_eq!("heartRate".parse::<MetricKey>().unwrap(), MetricKey::HeartRate);
        assert_eq!("heart_rate".parse::<MetricKey>().unwrap(), MetricKey::HeartRate);
    }

    #[test]
    fn test_metric_parse_custom_and_empty() {
        assert_eq!(
            "rpe".parse::<MetricKey>().unwrap(),
            MetricKey::Custom("rpe".to_string())
        );
        assert!("  ".parse::<MetricKey>().is_err());
    }

    #[test]
    fn test_metric_direction() {
        assert_eq!(MetricKey::Pace.direction(), MetricDirection::LowerIsBetter);
        assert_eq!(MetricKey::Volume.direction(), MetricDirection::HigherIsBetter);
        assert_eq!(MetricKey::HeartRate.direction(), MetricDirection::HigherIsBetter);
    }

    #[test]
    fn test_labels_total_vs_avg() {
        assert_eq!(MetricKey::Volume.label(true, None), "Total Volume");
        assert_eq!(MetricKey::Volume.label(false, None), "Avg Volume");
        assert_eq!(MetricKey::Pace.label(true, None), "Pace");
        assert_eq!(MetricKey::HeartRate.label(true, None), "Avg Heart Rate");
    }

    #[test]
    fn test_custom_label() {
        let key = MetricKey::Custom("rest_time".to_string());
        assert_eq!(key.label(true, None), "Total Rest Time");
        assert_eq!(key.label(false, Some("Rest")), "Avg Rest");
        assert_eq!(key.label(false, Some("  ")), "Avg Rest Time");
    }

    #[test]
    fn test_key_to_label() {
        assert_eq!(key_to_label("heartRate"), "Heart Rate");
        assert_eq!(key_to_label("my_custom_param"), "My Custom Param");
        assert_eq!(key_to_label("rpe"), "Rpe");
        assert_eq!(key_to_label(""), "");
    }

    #[test]
    fn test_color_for_key_is_stable() {
        assert_eq!(color_for_key("rpe"), color_for_key("RPE"));
        assert_eq!(color_for_key("rpe"), color_for_key("rpe"));
        assert!(CUSTOM_PALETTE.contains(&color_for_key("anything")));
        assert_eq!(color_for_key(""), DEFAULT_CUSTOM_COLOR);
    }

    #[test]
    fn test_display_mode_aggregate() {
        assert!(!DisplayMode::Exercise.is_aggregate());
        assert!(DisplayMode::Workout.is_aggregate());
        assert!(DisplayMode::Combined.is_aggregate());
        assert!(DisplayMode::All.is_aggregate());
        assert_eq!("ALL".parse::<DisplayMode>().unwrap(), DisplayMode::All);
        assert!("weekly".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_date_format() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(DateFormat::DayMonthYear.format(&dt), "05/03/2024");
        assert_eq!(DateFormat::MonthDayYear.format(&dt), "03/05/2024");
        assert_eq!(DateFormat::Iso.format(&dt), "2024-03-05");
        assert_eq!("yyyy-mm-dd".parse::<DateFormat>().unwrap(), DateFormat::Iso);
    }

    #[test]
    fn test_exercise_type_defaults() {
        let none: Vec<String> = vec![];
        assert_eq!(ExerciseType::Strength.default_metric(&none), MetricKey::Volume);
        assert_eq!(ExerciseType::Timed.default_metric(&none), MetricKey::Duration);
        assert_eq!(ExerciseType::Distance.default_metric(&none), MetricKey::Distance);
        assert_eq!(ExerciseType::Custom.default_metric(&none), MetricKey::Volume);

        let keys = vec!["laps".to_string(), "rpe".to_string()];
        assert_eq!(
            ExerciseType::Custom.default_metric(&keys),
            MetricKey::Custom("laps".to_string())
        );
    }

    #[test]
    fn test_resolve_metric_prefers_request() {
        let none: Vec<String> = vec![];
        assert_eq!(
            resolve_metric(Some(MetricKey::Reps), ExerciseType::Timed, &none),
            MetricKey::Reps
        );
        assert_eq!(resolve_metric(None, ExerciseType::Cardio, &none), MetricKey::Duration);
    }

    #[test]
    fn test_validate_metric() {
        let none: Vec<String> = vec![];
        assert!(validate_metric(&MetricKey::Pace, ExerciseType::Distance, &none, DisplayMode::Exercise).is_ok());

        let err = validate_metric(&MetricKey::Pace, ExerciseType::Strength, &none, DisplayMode::Exercise)
            .unwrap_err();
        assert!(err.contains("volume, weight, reps"), "Error: {}", err);

        assert!(validate_metric(&MetricKey::Pace, ExerciseType::Strength, &none, DisplayMode::All).is_ok());

        let err = validate_metric(&MetricKey::Volume, ExerciseType::Custom, &none, DisplayMode::Exercise)
            .unwrap_err();
        assert!(err.contains("no chart types available"), "Error: {}", err);
    }
}
