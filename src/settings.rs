//! User settings - chart defaults and matcher tuning, read from JSON

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::scoring::{DEFAULT_MAX_EDIT_DISTANCE, MATCH_THRESHOLD};
use crate::analytics::{Matcher, SeriesRequest};
use crate::metrics::{DateFormat, DisplayMode, MetricKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub date_range_days: u32,
    pub date_format: DateFormat,
    pub display_mode: DisplayMode,
    pub default_metric: MetricKey,
    pub max_edit_distance: usize,
    pub match_threshold: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            date_range_days: 30,
            date_format: DateFormat::DayMonthYear,
            display_mode: DisplayMode::Exercise,
            default_metric: MetricKey::Volume,
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
            match_threshold: MATCH_THRESHOLD,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        debug!(path = %path.display(), ?settings, "settings loaded");
        Ok(settings)
    }

    /// Defaults when no file is given
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.match_threshold, self.max_edit_distance)
    }

    /// Series request seeded from these settings
    pub fn series_request(&self) -> SeriesRequest {
        SeriesRequest {
            metric: self.default_metric.clone(),
            window_days: self.date_range_days,
            date_format: self.date_format,
            display_mode: self.display_mode,
            custom_label: None,
        }
    }
}
