//! Record matcher - resolves loose filter criteria into a record subset
//!
//! Exercise text is matched against two candidate pools: the distinct values
//! of the records' exercise field, and the exercise file names the caller
//! knows about. Every candidate gets a rank (token score, or an edit distance
//! when no token score clears the threshold) and the best one decides which
//! records survive. Workout, protocol and date filters are plain AND steps.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use super::scoring::{self, normalize, token_score, DEFAULT_MAX_EDIT_DISTANCE, MATCH_THRESHOLD};
use crate::log::{LogRecord, Protocol};

/// Title used when no exercise or workout names the result
pub const DEFAULT_TITLE: &str = "Workout data";

/// Loose filter criteria. Populated fields combine with AND; protocols
/// combine with OR among themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub exercise: Option<String>,
    pub workout: Option<String>,
    pub protocols: Vec<Protocol>,
    pub exact_match: bool,
    pub from: Option<NaiveDate>,
    /// Inclusive through the end of this day
    pub to: Option<NaiveDate>,
}

impl Criteria {
    pub fn exercise(name: impl Into<String>) -> Self {
        Self {
            exercise: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn workout(name: impl Into<String>) -> Self {
        Self {
            workout: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_workout(mut self, name: impl Into<String>) -> Self {
        self.workout = Some(name.into());
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocols.push(protocol);
        self
    }

    pub fn exact(mut self) -> Self {
        self.exact_match = true;
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    fn exercise_text(&self) -> Option<&str> {
        self.exercise.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn workout_text(&self) -> Option<&str> {
        self.workout.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn has_date_range(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// No field populated
    pub fn is_empty(&self) -> bool {
        self.exercise_text().is_none()
            && self.workout_text().is_none()
            && self.protocols.is_empty()
            && !self.has_date_range()
    }
}

/// How the subset was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Fuzzy match on the records' exercise field
    Field,
    /// Fuzzy match on a known exercise file name
    Filename,
    Exact,
    Workout,
    Protocol,
    None,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field-match"),
            Self::Filename => write!(f, "filename-match"),
            Self::Exact => write!(f, "exact-match"),
            Self::Workout => write!(f, "workout-match"),
            Self::Protocol => write!(f, "protocol-match"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Filtered subset (input order) plus how it was obtained
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    pub records: Vec<&'a LogRecord>,
    pub strategy: MatchStrategy,
    /// Human-readable account of the filters applied
    pub description: String,
    pub title: String,
}

impl<'a> MatchResult<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Pool a candidate name came from. Field data wins ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CandidatePool {
    Filename,
    Field,
}

/// Strength of a candidate. Any token match outranks any edit-distance match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRank {
    Token(u8),
    Edit(usize),
}

impl Ord for MatchRank {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (MatchRank::Token(a), MatchRank::Token(b)) => a.cmp(b),
            (MatchRank::Edit(a), MatchRank::Edit(b)) => b.cmp(a),
            (MatchRank::Token(_), MatchRank::Edit(_)) => Ordering::Greater,
            (MatchRank::Edit(_), MatchRank::Token(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for MatchRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A ranked exercise name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'c> {
    pub pool: CandidatePool,
    pub key: &'c str,
    pub rank: MatchRank,
    /// Position within its pool, earlier wins remaining ties
    pub order: usize,
}

/// Total order on candidates: rank, then pool preference, then first seen.
/// `Greater` means `a` is the better candidate.
pub fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then(a.pool.cmp(&b.pool))
        .then(b.order.cmp(&a.order))
}

/// Record matcher with tunable thresholds
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    pub threshold: u8,
    pub max_edit_distance: usize,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
        }
    }
}

/// Outcome of the exercise step
struct ExerciseMatch<'a> {
    records: Vec<&'a LogRecord>,
    strategy: MatchStrategy,
    description: String,
}

impl Matcher {
    pub fn new(threshold: u8, max_edit_distance: usize) -> Self {
        Self {
            threshold,
            max_edit_distance,
        }
    }

    /// Resolve `criteria` against `records`. `candidate_names` are known
    /// exercise file names for the filename strategy; they are only read.
    pub fn filter<'a>(
        &self,
        records: &'a [LogRecord],
        criteria: &Criteria,
        candidate_names: &[String],
    ) -> MatchResult<'a> {
        if records.is_empty() {
            return MatchResult {
                records: Vec::new(),
                strategy: MatchStrategy::None,
                description: "none".to_string(),
                title: DEFAULT_TITLE.to_string(),
            };
        }

        if criteria.is_empty() {
            return MatchResult {
                records: records.iter().collect(),
                strategy: MatchStrategy::None,
                description: "none".to_string(),
                title: DEFAULT_TITLE.to_string(),
            };
        }

        let mut subset: Vec<&'a LogRecord> = records.iter().collect();
        let mut steps: Vec<String> = Vec::new();
        let mut strategy = MatchStrategy::None;
        let mut title = DEFAULT_TITLE.to_string();

        match (criteria.exercise_text(), criteria.workout_text()) {
            (Some(exercise), Some(workout)) => {
                title = format!("{exercise} + {workout}");
                subset = filter_by_workout(subset, workout);
                if subset.is_empty() {
                    debug!(workout, "workout matched nothing, skipping exercise match");
                    return MatchResult {
                        records: Vec::new(),
                        strategy: MatchStrategy::None,
                        description: "no data for workout".to_string(),
                        title,
                    };
                }
                steps.push(format!("workout field: \"{workout}\""));

                let found = self.match_exercise(subset, exercise, criteria.exact_match, candidate_names);
                subset = found.records;
                strategy = found.strategy;
                steps.push(found.description);
            }
            (Some(exercise), None) => {
                title = exercise.to_string();
                let found = self.match_exercise(subset, exercise, criteria.exact_match, candidate_names);
                subset = found.records;
                strategy = found.strategy;
                steps.push(found.description);
            }
            (None, Some(workout)) => {
                title = workout.to_string();
                subset = filter_by_workout(subset, workout);
                strategy = MatchStrategy::Workout;
                steps.push(format!("workout field: \"{workout}\""));
            }
            (None, None) => {}
        }

        if !criteria.protocols.is_empty() {
            let had_text_filter = !steps.is_empty();
            subset.retain(|r| criteria.protocols.contains(&r.protocol()));
            let tags: Vec<&str> = criteria.protocols.iter().map(Protocol::as_tag).collect();
            steps.push(format!("protocol: [{}]", tags.join(", ")));
            if !had_text_filter {
                strategy = MatchStrategy::Protocol;
            }
        }

        if criteria.has_date_range() {
            subset.retain(|r| within_dates(r, criteria.from, criteria.to));
            steps.push(format!(
                "date range: {}..{}",
                criteria.from.map_or("*".to_string(), |d| d.to_string()),
                criteria.to.map_or("*".to_string(), |d| d.to_string()),
            ));
        }

        debug!(
            strategy = %strategy,
            matched = subset.len(),
            total = records.len(),
            "records filtered"
        );

        MatchResult {
            records: subset,
            strategy,
            description: steps.join(" + "),
            title,
        }
    }

    fn match_exercise<'a>(
        &self,
        subset: Vec<&'a LogRecord>,
        exercise: &str,
        exact: bool,
        candidate_names: &[String],
    ) -> ExerciseMatch<'a> {
        if exact {
            let wanted = normalize(exercise);
            let records = subset
                .into_iter()
                .filter(|r| normalize(&r.exercise) == wanted)
                .collect();
            return ExerciseMatch {
                records,
                strategy: MatchStrategy::Exact,
                description: format!("exact match on exercise field: \"{exercise}\""),
            };
        }

        let field_pool = distinct(subset.iter().map(|&r| r.exercise.as_str()));
        let file_pool = distinct(candidate_names.iter().map(String::as_str));

        let ranked: Vec<Candidate<'_>> = field_pool
            .iter()
            .enumerate()
            .filter_map(|(order, key)| self.rank(CandidatePool::Field, key, order, exercise))
            .chain(
                file_pool
                    .iter()
                    .enumerate()
                    .filter_map(|(order, key)| self.rank(CandidatePool::Filename, key, order, exercise)),
            )
            .collect();

        let Some(best) = ranked.iter().copied().max_by(compare_candidates) else {
            debug!(exercise, "no exercise candidate matched");
            return ExerciseMatch {
                records: Vec::new(),
                strategy: MatchStrategy::None,
                description: "no match found".to_string(),
            };
        };

        debug!(
            exercise,
            key = best.key,
            pool = ?best.pool,
            rank = ?best.rank,
            "exercise candidate selected"
        );

        match (best.pool, best.rank) {
            (CandidatePool::Field, MatchRank::Token(score)) => ExerciseMatch {
                records: subset
                    .into_iter()
                    .filter(|r| token_score(&r.exercise, best.key) >= self.threshold)
                    .collect(),
                strategy: MatchStrategy::Field,
                description: format!("exercise field: \"{}\" (score: {score})", best.key),
            },
            (CandidatePool::Filename, MatchRank::Token(score)) => {
                let names: HashSet<String> = ranked
                    .iter()
                    .filter(|c| c.pool == CandidatePool::Filename)
                    .filter(|c| matches!(c.rank, MatchRank::Token(_)))
                    .map(|c| normalize(c.key))
                    .collect();
                ExerciseMatch {
                    records: subset
                        .into_iter()
                        .filter(|r| names.contains(&normalize(file_key(r))))
                        .collect(),
                    strategy: MatchStrategy::Filename,
                    description: format!("file name: \"{}\" (score: {score})", best.key),
                }
            }
            (CandidatePool::Field, MatchRank::Edit(distance)) => {
                let wanted = normalize(best.key);
                ExerciseMatch {
                    records: subset
                        .into_iter()
                        .filter(|r| normalize(&r.exercise) == wanted)
                        .collect(),
                    strategy: MatchStrategy::Field,
                    description: format!(
                        "exercise field: \"{}\" (edit distance: {distance})",
                        best.key
                    ),
                }
            }
            (CandidatePool::Filename, MatchRank::Edit(distance)) => {
                let wanted = normalize(best.key);
                ExerciseMatch {
                    records: subset
                        .into_iter()
                        .filter(|r| normalize(file_key(r)) == wanted)
                        .collect(),
                    strategy: MatchStrategy::Filename,
                    description: format!("file name: \"{}\" (edit distance: {distance})", best.key),
                }
            }
        }
    }

    fn rank<'c>(
        &self,
        pool: CandidatePool,
        key: &'c str,
        order: usize,
        query: &str,
    ) -> Option<Candidate<'c>> {
        let score = token_score(key, query);
        let rank = if score >= self.threshold {
            MatchRank::Token(score)
        } else {
            MatchRank::Edit(scoring::edit_similarity(key, query, self.max_edit_distance)?)
        };
        Some(Candidate {
            pool,
            key,
            rank,
            order,
        })
    }
}

/// Filter with the default matcher
pub fn filter<'a>(
    records: &'a [LogRecord],
    criteria: &Criteria,
    candidate_names: &[String],
) -> MatchResult<'a> {
    Matcher::default().filter(records, criteria, candidate_names)
}

/// Name the filename strategy compares against: the source file when known
fn file_key(record: &LogRecord) -> &str {
    record
        .source
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&record.exercise)
}

/// Distinct non-empty names by normalized form, first spelling kept
fn distinct<'s>(names: impl Iterator<Item = &'s str>) -> Vec<&'s str> {
    let mut seen = HashSet::new();
    names
        .filter(|n| {
            let key = normalize(n);
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

fn normalize_workout(s: &str) -> String {
    normalize(&s.replace("[[", "").replace("]]", ""))
}

fn filter_by_workout<'a>(subset: Vec<&'a LogRecord>, workout: &str) -> Vec<&'a LogRecord> {
    let wanted = normalize_workout(workout);
    subset
        .into_iter()
        .filter(|r| {
            r.workout_label()
                .is_some_and(|w| normalize_workout(w).contains(&wanted))
        })
        .collect()
}

/// Inclusive on both ends; unparsable dates never match
fn within_dates(record: &LogRecord, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    let Some(date) = record.parsed_date().map(|dt| dt.date()) else {
        return false;
    };
    from.is_none_or(|f| date >= f) && to.is_none_or(|t| date <= t)
}
