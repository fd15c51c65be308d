//! Trend classifier - turns a slope into a direction, color and icon

use std::fmt;

use serde::Serialize;

use crate::metrics::MetricDirection;

pub const GREEN: &str = "#4CAF50";
pub const RED: &str = "#F44336";
pub const AMBER: &str = "#FFC107";
pub const MUTED: &str = "#888888";

/// Relative band around the mean inside which a slope counts as flat
const RELATIVE_BAND: f64 = 0.05;
/// Absolute floor of the band, for series averaging near zero
const MIN_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    /// Falling values on a lower-is-better metric
    Improving,
    /// Rising values on a lower-is-better metric
    Declining,
    Stable,
    InsufficientData,
}

impl TrendDirection {
    /// Whether the direction reads as progress
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Increasing | Self::Improving)
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::Improving => write!(f, "improving"),
            Self::Declining => write!(f, "declining"),
            Self::Stable => write!(f, "stable"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendDescriptor {
    pub direction: TrendDirection,
    pub color: &'static str,
    pub icon: &'static str,
}

impl TrendDescriptor {
    const fn new(direction: TrendDirection, color: &'static str, icon: &'static str) -> Self {
        Self {
            direction,
            color,
            icon,
        }
    }

    pub const INSUFFICIENT: Self = Self::new(TrendDirection::InsufficientData, MUTED, "·");
    pub const STABLE: Self = Self::new(TrendDirection::Stable, AMBER, "→");
}

/// `max(5% of the mean, 1)`
pub fn slope_threshold(values: &[f64]) -> f64 {
    if values.is_empty() {
        return MIN_THRESHOLD;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (RELATIVE_BAND * mean).max(MIN_THRESHOLD)
}

/// Classify `slope` for a series. A slope exactly on the threshold is stable.
pub fn classify(slope: f64, values: &[f64], direction: MetricDirection) -> TrendDescriptor {
    if values.len() < 2 {
        return TrendDescriptor::INSUFFICIENT;
    }

    let threshold = slope_threshold(values);
    let rising = slope > threshold;
    let falling = slope < -threshold;

    match direction {
        MetricDirection::HigherIsBetter if rising => {
            TrendDescriptor::new(TrendDirection::Increasing, GREEN, "↗")
        }
        MetricDirection::HigherIsBetter if falling => {
            TrendDescriptor::new(TrendDirection::Decreasing, RED, "↘")
        }
        MetricDirection::LowerIsBetter if falling => {
            TrendDescriptor::new(TrendDirection::Improving, GREEN, "↘")
        }
        MetricDirection::LowerIsBetter if rising => {
            TrendDescriptor::new(TrendDirection::Declining, RED, "↗")
        }
        _ => TrendDescriptor::STABLE,
    }
}
