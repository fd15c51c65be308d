//! gymtrend - workout log analytics
//!
//! Fuzzy record filtering, daily metric series and trend classification
//! over a JSON workout log.

pub mod analytics;
pub mod log;
pub mod metrics;
pub mod sample;
pub mod settings;

pub use analytics::Analytics;
pub use log::LogRecord;
pub use settings::Settings;
