//! gymtrend - workout log analytics from the command line

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use gymtrend::analytics::{Criteria, SeriesRequest};
use gymtrend::log::{self, Protocol};
use gymtrend::metrics::{self, DateFormat, DisplayMode, ExerciseType, MetricKey};
use gymtrend::{sample, Analytics, Settings};

const DEFAULT_LOG: &str = "workout_log.json";

#[derive(Parser)]
#[command(name = "gymtrend")]
#[command(author, version, about = "Workout log analytics: filter, chart and trend")]
struct Cli {
    /// Workout log (JSON array of records)
    #[arg(long, global = true, env = "GYMTREND_LOG", default_value = DEFAULT_LOG)]
    log: PathBuf,

    /// Settings file (JSON)
    #[arg(long, global = true, env = "GYMTREND_SETTINGS")]
    settings: Option<PathBuf>,

    /// Known exercise file names (JSON array of strings)
    #[arg(long, global = true)]
    names: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct CriteriaArgs {
    /// Exercise name, matched loosely unless --exact
    #[arg(short, long)]
    exercise: Option<String>,

    /// Workout name
    #[arg(short, long)]
    workout: Option<String>,

    /// Protocol tag (repeatable, e.g. "drop_set")
    #[arg(short, long = "protocol")]
    protocols: Vec<String>,

    /// Require the exercise name to match exactly
    #[arg(long)]
    exact: bool,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl CriteriaArgs {
    fn to_criteria(&self) -> Criteria {
        Criteria {
            exercise: self.exercise.clone(),
            workout: self.workout.clone(),
            protocols: self.protocols.iter().map(|p| parse_protocol(p)).collect(),
            exact_match: self.exact,
            from: self.from,
            to: self.to,
        }
    }
}

fn parse_protocol(tag: &str) -> Protocol {
    let protocol = Protocol::from_tag(tag);
    if !protocol.is_builtin() {
        let known: Vec<&str> = Protocol::builtins().iter().map(Protocol::as_tag).collect();
        warn!(tag, ?known, "unrecognized protocol tag, matching it as a custom tag");
    }
    protocol
}

#[derive(Subcommand)]
enum Commands {
    /// List records matching the criteria
    Filter {
        #[command(flatten)]
        criteria: CriteriaArgs,

        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Chart a metric over time with its trend
    Chart {
        #[command(flatten)]
        criteria: CriteriaArgs,

        /// Metric: volume, weight, reps, duration, distance, pace, heartRate or a custom field
        #[arg(short, long)]
        metric: Option<MetricKey>,

        /// Window in days
        #[arg(short, long)]
        days: Option<u32>,

        /// Display mode: exercise, workout, combined, all
        #[arg(long)]
        mode: Option<DisplayMode>,

        /// Date label format: DD/MM/YYYY, MM/DD/YYYY, YYYY-MM-DD
        #[arg(long)]
        format: Option<DateFormat>,

        /// Label for a custom metric
        #[arg(long)]
        label: Option<String>,

        /// Exercise type, to pick and check the metric
        #[arg(long = "exercise-type")]
        exercise_type: Option<ExerciseType>,

        /// Print the series as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a generated sample log
    Sample {
        /// Days of history
        #[arg(short, long, default_value = "42")]
        days: u32,

        /// Output file (defaults to --log)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List exercises with record counts
    Exercises,
}

fn load_names(path: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = fs::read_to_string(path)?;
    let names: Vec<String> = serde_json::from_str(&content)?;
    Ok(names)
}

fn load_analytics(cli: &Cli, settings: &Settings) -> Result<Analytics> {
    let records = log::load_records(&cli.log)?;
    info!(path = %cli.log.display(), records = records.len(), "log loaded");
    Ok(Analytics::new(records).with_matcher(settings.matcher()))
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::load_optional(cli.settings.as_deref())?;

    match &cli.command {
        Some(Commands::Filter { criteria, limit }) => {
            let analytics = load_analytics(&cli, &settings)?;
            let names = load_names(cli.names.as_deref())?;
            let result = analytics.filter(&criteria.to_criteria(), &names);

            println!("{} ({} records)", result.title, result.len());
            println!("Match: {} - {}", result.strategy, result.description);
            println!("{:-<72}", "");
            for r in result.records.iter().take(*limit) {
                println!(
                    "{:19} | {:24} | {:>3} x {:>6.1} | {:8} | {}",
                    r.date,
                    r.exercise,
                    r.reps,
                    r.weight,
                    r.protocol().to_string(),
                    r.workout_label().unwrap_or("-")
                );
            }
        }

        Some(Commands::Chart {
            criteria,
            metric,
            days,
            mode,
            format,
            label,
            exercise_type,
            json,
        }) => {
            let analytics = load_analytics(&cli, &settings)?;
            let names = load_names(cli.names.as_deref())?;

            let mut request: SeriesRequest = settings.series_request();
            if let Some(days) = days {
                request.window_days = *days;
            }
            if let Some(mode) = mode {
                request.display_mode = *mode;
            }
            if let Some(format) = format {
                request.date_format = *format;
            }
            request.custom_label = label.clone();
            request.metric = match exercise_type {
                Some(kind) => {
                    let keys = analytics.custom_keys();
                    let chosen = metrics::resolve_metric(metric.clone(), *kind, &keys);
                    metrics::validate_metric(&chosen, *kind, &keys, request.display_mode)
                        .map_err(|e| anyhow!(e))?;
                    chosen
                }
                None => {
                    let chosen = metric.clone().unwrap_or_else(|| settings.default_metric.clone());
                    let known: Vec<String> =
                        analytics.available_metrics().iter().map(MetricKey::to_string).collect();
                    let wanted = chosen.to_string().to_lowercase();
                    if chosen.is_custom() && !known.iter().any(|k| k.to_lowercase() == wanted) {
                        warn!(metric = %chosen, ?known, "no record carries this field, volume will be charted");
                    }
                    chosen
                }
            };

            let report = analytics.chart(&criteria.to_criteria(), &names, &request);

            if *json {
                println!("{}", serde_json::to_string_pretty(&report.series)?);
                return Ok(());
            }

            println!("{} - {}", report.matched.title, report.series.label);
            println!("Match: {} - {}", report.matched.strategy, report.matched.description);
            println!("{:-<40}", "");
            let unit = report.series.metric.unit();
            for (day, value, fitted) in report.rows() {
                println!("{:12} {:>10.2} {:6} trend {:>10.2}", day, value, unit, fitted);
            }
            println!("{:-<40}", "");
            println!(
                "Trend: {} {}{} (slope {:.2}, r2 {:.2})",
                report.trend.icon,
                report.trend.direction,
                if report.trend.direction.is_positive() { ", progressing" } else { "" },
                report.line.slope,
                report.line.r2
            );
            if let Some(variation) = report.variation {
                let change = variation.absolute_change();
                match variation.percent_change {
                    Some(pct) => println!("Change: {:+.2} {} ({:+.1}%)", change, unit, pct),
                    None => println!("Change: {:+.2} {} (from zero)", change, unit),
                }
            }
        }

        Some(Commands::Sample { days, out }) => {
            let path = out.as_ref().unwrap_or(&cli.log);
            let records = sample::generate(*days, Local::now().naive_local());
            log::save_records(path, &records)?;
            info!(path = %path.display(), records = records.len(), "sample log written");
            println!("Wrote {} records to {}", records.len(), path.display());
        }

        Some(Commands::Exercises) | None => {
            let analytics = load_analytics(&cli, &settings)?;
            println!("Exercises");
            println!("{:-<40}", "");
            for entry in analytics.exercise_counts() {
                println!("{:30} {:>6}", entry.exercise, entry.records);
            }
        }
    }

    Ok(())
}
