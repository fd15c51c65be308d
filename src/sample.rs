//! Sample log generator - a believable few weeks of lifting and running

use chrono::{Duration, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::log::{CustomValue, LogRecord, Protocol};

const STRENGTH_WORKOUT: &str = "Lower Body A";
const CARDIO_WORKOUT: &str = "Cardio";
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Lift template: name, starting weight, weekly increase, reps per set
struct Lift {
    name: &'static str,
    base_weight: f64,
    weekly_step: f64,
    reps: [u32; 4],
    /// Technique on the last set, and how often (every nth session)
    finisher: Option<(Protocol, usize)>,
}

fn lifts() -> [Lift; 4] {
    [
        Lift {
            name: "Squat",
            base_weight: 70.0,
            weekly_step: 2.5,
            reps: [10, 9, 8, 8],
            finisher: Some((Protocol::MyoReps, 3)),
        },
        Lift {
            name: "Romanian Deadlift",
            base_weight: 50.0,
            weekly_step: 2.5,
            reps: [12, 11, 10, 10],
            finisher: None,
        },
        Lift {
            name: "Leg Press",
            base_weight: 100.0,
            weekly_step: 5.0,
            reps: [12, 12, 10, 10],
            finisher: Some((Protocol::DropSet, 4)),
        },
        Lift {
            name: "Leg Curl",
            base_weight: 30.0,
            weekly_step: 1.25,
            reps: [12, 12, 12, 10],
            finisher: Some((Protocol::RestPause, 5)),
        },
    ]
}

const RUNS: &[&str] = &["Easy Run", "Tempo Run"];

fn round_plate(weight: f64) -> f64 {
    (weight / 2.5).round() * 2.5
}

fn stamp(record: &mut LogRecord, at: NaiveDateTime) {
    record.date = at.format(DATE_FORMAT).to_string();
    record.timestamp = Some(at.and_utc().timestamp_millis());
}

/// Generate records spread over the `days` days before `now`
pub fn generate(days: u32, now: NaiveDateTime) -> Vec<LogRecord> {
    generate_with(&mut rand::thread_rng(), days, now)
}

/// Same as [`generate`] with a caller-supplied RNG
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, days: u32, now: NaiveDateTime) -> Vec<LogRecord> {
    let days = i64::from(days);
    let mut records = Vec::new();
    let lifts = lifts();

    // Strength every 3-4 days, oldest first so weights progress
    let mut offsets = Vec::new();
    let mut days_ago = days - 1;
    let mut short_gap = true;
    while days_ago >= 1 {
        offsets.push(days_ago);
        days_ago -= if short_gap { 3 } else { 4 };
        short_gap = !short_gap;
    }

    for (session, &days_ago) in offsets.iter().enumerate() {
        let weeks = ((days - days_ago) / 7) as f64;
        let tough_day = session % 4 == 2;
        let modifier = if tough_day { 0.95 } else { 1.0 };

        let Some(day) = now.checked_sub_signed(Duration::days(days_ago)).map(|d| d.date()) else {
            continue;
        };
        let Some(mut at) = day.and_hms_opt(rng.gen_range(7..10), rng.gen_range(0..60), 0) else {
            continue;
        };

        for lift in &lifts {
            let weight = round_plate((lift.base_weight + weeks * lift.weekly_step) * modifier);
            for (set, &base_reps) in lift.reps.iter().enumerate() {
                let bonus = u32::from(rng.gen_bool(0.3));
                let reps = (base_reps + bonus).saturating_sub(u32::from(tough_day));

                let mut record = LogRecord::new("", lift.name, reps, weight);
                stamp(&mut record, at);
                record.workout = Some(STRENGTH_WORKOUT.to_string());
                record.origine = Some(format!("[[{STRENGTH_WORKOUT}]]"));
                record.source = Some(lift.name.to_string());

                if let Some((protocol, every)) = &lift.finisher {
                    if set == lift.reps.len() - 1 && session % every == 0 {
                        record.protocol = Some(protocol.to_string());
                        record.notes = Some(format!("{}: {reps} reps", protocol.badge().unwrap_or("")));
                    }
                }

                records.push(record);
                at += Duration::seconds(rng.gen_range(180..240));
            }
        }
    }

    // Runs on the day after most strength sessions
    for &days_ago in &offsets {
        let run_day = days_ago - 1;
        if run_day < 1 || rng.gen_bool(0.2) {
            continue;
        }
        let Some(day) = now.checked_sub_signed(Duration::days(run_day)).map(|d| d.date()) else {
            continue;
        };
        let Some(at) = day.and_hms_opt(rng.gen_range(17..20), rng.gen_range(0..60), 0) else {
            continue;
        };

        let progress = (days - run_day) as f64 / days.max(1) as f64;
        let distance = (rng.gen_range(4.0..7.0_f64) * 10.0).round() / 10.0;
        let pace = 6.5 - progress + rng.gen_range(-0.2..0.2);
        let duration = (distance * pace * 10.0).round() / 10.0;
        let heart_rate: u32 = rng.gen_range(135..160);

        let name = RUNS.choose(rng).copied().unwrap_or("Easy Run");
        let mut record = LogRecord::new("", name, 0, 0.0);
        stamp(&mut record, at);
        record.workout = Some(CARDIO_WORKOUT.to_string());
        record.source = Some(name.to_string());
        record.custom_fields.insert("duration".to_string(), CustomValue::Number(duration));
        record.custom_fields.insert("distance".to_string(), CustomValue::Number(distance));
        record
            .custom_fields
            .insert("heartRate".to_string(), CustomValue::Number(f64::from(heart_rate)));
        records.push(record);
    }

    records.sort_by_key(|r| r.timestamp);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{aggregate_at, Analytics, Criteria, MatchStrategy, SeriesRequest};
    use crate::metrics::MetricKey;
    use chrono::{NaiveDate, Timelike};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn seeded(days: u32) -> Vec<LogRecord> {
        generate_with(&mut StdRng::seed_from_u64(7), days, now())
    }

    #[test]
    fn test_records_parse_and_fall_inside_window() {
        let records = seeded(42);
        assert!(!records.is_empty());
        let cutoff = now() - Duration::days(42);
        for r in &records {
            let date = r.parsed_date().unwrap();
            assert!(date >= cutoff && date <= now(), "Date out of window: {}", r.date);
        }
    }

    #[test]
    fn test_strength_and_runs_present() {
        let records = seeded(42);
        assert!(records.iter().any(|r| r.exercise == "Squat" && r.volume > 0.0));
        let run = records
            .iter()
            .find(|r| r.workout.as_deref() == Some(CARDIO_WORKOUT))
            .unwrap();
        assert!(run.custom_number("distance") >= 4.0);
        assert!(run.custom_number("heartRate") >= 135.0);
    }

    #[test]
    fn test_protocols_are_used() {
        let records = seeded(42);
        assert!(records.iter().any(|r| r.protocol() == Protocol::MyoReps));
        assert!(records.iter().any(|r| r.protocol() == Protocol::DropSet));
    }

    #[test]
    fn test_volume_is_reps_times_weight() {
        for r in seeded(28) {
            assert_eq!(r.volume, r.reps as f64 * r.weight, "Record: {:?}", r);
        }
    }

    #[test]
    fn test_sorted_by_timestamp() {
        let records = seeded(30);
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_tiny_window_is_empty() {
        assert!(seeded(1).is_empty());
    }

    #[test]
    fn test_sample_feeds_analytics() {
        let analytics = Analytics::new(seeded(42));
        let matched = analytics.filter(&Criteria::exercise("squat"), &[]);
        assert_eq!(matched.strategy, MatchStrategy::Field);
        assert!(matched.records.iter().all(|r| r.exercise == "Squat"));

        let series = aggregate_at(
            matched.records.iter().copied(),
            &SeriesRequest::new(MetricKey::Weight).with_window(42),
            now(),
        );
        assert!(series.len() >= 10, "Buckets: {}", series.len());
        assert!(series.data.last().unwrap() > series.data.first().unwrap());
        let hour = matched.records[0].parsed_date().unwrap().hour();
        assert!((7..=10).contains(&hour), "Hour: {}", hour);
    }
}
