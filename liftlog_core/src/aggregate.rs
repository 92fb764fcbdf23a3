//! Derived statistics over fetched workouts.
//!
//! Everything here is a pure function of the workouts passed in and the
//! caller's notion of "now". Day bucketing uses the local calendar day of
//! `now`'s time zone, so callers pass `Local::now()` in production and a
//! fixed instant in tests.
//!
//! Produces:
//! - A fixed-length daily series for charting (7, 30 or 365 days)
//! - A muscle group tally over the full input
//! - Lifetime totals over the full input
//! - Dashboard counters

use crate::calendar::week_start_of;
use crate::{Error, Exercise, MuscleGroup, Result, Workout};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Window selector for the daily series
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Number of daily buckets in the window
    pub fn bucket_count(&self) -> usize {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Year => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "year" => Ok(TimeRange::Year),
            other => Err(Error::Validation(format!(
                "Unknown time range: {} (expected week, month or year)",
                other
            ))),
        }
    }
}

// ============================================================================
// Per-record totals
// ============================================================================

impl Exercise {
    /// Sum of weight x reps over every set
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(|set| set.weight * set.reps as f64).sum()
    }

    pub fn reps(&self) -> i64 {
        self.sets.iter().map(|set| set.reps).sum()
    }
}

impl Workout {
    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(Exercise::volume).sum()
    }

    pub fn total_reps(&self) -> i64 {
        self.exercises.iter().map(Exercise::reps).sum()
    }

    /// Local calendar day the workout was created on
    pub fn created_day<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        local_day(&self.created, tz)
    }
}

/// Truncate an instant to its calendar day in `tz`
pub fn local_day<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

// ============================================================================
// Daily series
// ============================================================================

/// Totals for one calendar day
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub workouts: usize,
    pub total_volume: f64,
    pub total_reps: i64,
    pub exercises: usize,
}

impl DaySummary {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            workouts: 0,
            total_volume: 0.0,
            total_reps: 0,
            exercises: 0,
        }
    }

    fn add(&mut self, workout: &Workout) {
        self.workouts += 1;
        self.total_volume += workout.total_volume();
        self.total_reps += workout.total_reps();
        self.exercises += workout.exercises.len();
    }

    pub fn is_empty(&self) -> bool {
        self.workouts == 0
    }

    /// Axis label: weekday name for a week, month/day otherwise
    pub fn label(&self, range: TimeRange) -> String {
        match range {
            TimeRange::Week => self.date.format("%a").to_string(),
            TimeRange::Month | TimeRange::Year => self.date.format("%m/%d").to_string(),
        }
    }
}

/// Bucket workouts by local creation day
///
/// Returns exactly `range.bucket_count()` entries, oldest first, the last
/// one being `now`'s day. Days without workouts are zero-valued entries.
/// Workouts created outside the window are ignored.
pub fn daily_series<Tz: TimeZone>(
    workouts: &[Workout],
    range: TimeRange,
    now: &DateTime<Tz>,
) -> Vec<DaySummary> {
    let count = range.bucket_count();
    let today = now.date_naive();
    let first = today - Duration::days(count as i64 - 1);

    let mut buckets: Vec<DaySummary> = (0..count)
        .map(|i| DaySummary::empty(first + Duration::days(i as i64)))
        .collect();

    let tz = now.timezone();
    for workout in workouts {
        let offset = (workout.created_day(&tz) - first).num_days();
        if offset < 0 {
            continue;
        }
        if let Some(bucket) = buckets.get_mut(offset as usize) {
            bucket.add(workout);
        }
    }

    buckets
}

// ============================================================================
// Full-input summaries
// ============================================================================

/// Count every muscle tag across every exercise
///
/// Tags are not deduplicated per exercise or per workout. Groups that never
/// occur are absent from the map.
pub fn muscle_tally(workouts: &[Workout]) -> BTreeMap<MuscleGroup, usize> {
    let mut tally = BTreeMap::new();
    for muscle in workouts
        .iter()
        .flat_map(|w| &w.exercises)
        .flat_map(|e| &e.muscles)
    {
        *tally.entry(muscle.muscle_group).or_insert(0) += 1;
    }
    tally
}

/// Totals over every workout ever fetched
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LifetimeTotals {
    pub workouts: usize,
    pub total_volume: f64,
    pub total_reps: i64,
    /// Distinct exercise names, compared exactly
    pub distinct_exercises: usize,
}

pub fn lifetime_totals(workouts: &[Workout]) -> LifetimeTotals {
    let names: HashSet<&str> = workouts
        .iter()
        .flat_map(|w| &w.exercises)
        .map(|e| e.name.as_str())
        .collect();

    LifetimeTotals {
        workouts: workouts.len(),
        total_volume: workouts.iter().map(Workout::total_volume).sum(),
        total_reps: workouts.iter().map(Workout::total_reps).sum(),
        distinct_exercises: names.len(),
    }
}

/// Everything the progress view renders
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressReport {
    pub range: TimeRange,
    pub days: Vec<DaySummary>,
    pub muscles: BTreeMap<MuscleGroup, usize>,
    pub totals: LifetimeTotals,
}

impl ProgressReport {
    pub fn compute<Tz: TimeZone>(workouts: &[Workout], range: TimeRange, now: &DateTime<Tz>) -> Self {
        let report = Self {
            range,
            days: daily_series(workouts, range, now),
            muscles: muscle_tally(workouts),
            totals: lifetime_totals(workouts),
        };

        tracing::debug!(
            "Computed {} progress over {} workouts ({} active days)",
            range,
            workouts.len(),
            report.days.iter().filter(|d| !d.is_empty()).count()
        );

        report
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Headline counters for the dashboard
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_workouts: usize,
    /// Workouts created on or after the start of the current Sunday-based week
    pub this_week_workouts: usize,
    pub total_exercises: usize,
}

impl DashboardStats {
    pub fn compute<Tz: TimeZone>(workouts: &[Workout], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let week_start = week_start_of(now.date_naive());

        Self {
            total_workouts: workouts.len(),
            this_week_workouts: workouts
                .iter()
                .filter(|w| w.created_day(&tz) >= week_start)
                .count(),
            total_exercises: workouts.iter().map(|w| w.exercises.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Muscle, WorkoutSet};
    use chrono::FixedOffset;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn exercise(name: &str, groups: &[MuscleGroup], sets: &[(f64, i64)]) -> Exercise {
        Exercise {
            name: name.into(),
            muscles: groups
                .iter()
                .map(|g| Muscle {
                    name: format!("{} muscle", g),
                    muscle_group: *g,
                })
                .collect(),
            sets: sets
                .iter()
                .map(|&(weight, reps)| WorkoutSet { weight, reps })
                .collect(),
        }
    }

    fn workout(id: &str, created: DateTime<Utc>, exercises: Vec<Exercise>) -> Workout {
        Workout {
            id: id.into(),
            name: format!("Workout {}", id),
            user_id: "u1".into(),
            created,
            updated: created,
            exercises,
        }
    }

    #[test]
    fn test_single_workout_lands_in_its_day() {
        crate::logging::init_test();

        let created = now() - Duration::days(2);
        let workouts = vec![workout(
            "w1",
            created,
            vec![exercise("Squat", &[], &[(100.0, 5), (100.0, 5)])],
        )];

        let days = daily_series(&workouts, TimeRange::Week, &now());
        assert_eq!(days.len(), 7);

        let hit = days.iter().find(|d| d.date == created.date_naive()).unwrap();
        assert_eq!(hit.workouts, 1);
        assert_eq!(hit.total_volume, 1000.0);
        assert_eq!(hit.total_reps, 10);
        assert_eq!(hit.exercises, 1);

        let others: Vec<_> = days.iter().filter(|d| d.date != created.date_naive()).collect();
        assert_eq!(others.len(), 6);
        assert!(others.iter().all(|d| d.is_empty() && d.total_volume == 0.0));
    }

    #[test]
    fn test_series_length_matches_range() {
        let workouts = vec![workout("w1", now() - Duration::days(400), vec![])];

        for range in [TimeRange::Week, TimeRange::Month, TimeRange::Year] {
            let days = daily_series(&workouts, range, &now());
            assert_eq!(days.len(), range.bucket_count());
            assert!(days.iter().all(DaySummary::is_empty));
        }
        assert!(daily_series(&[], TimeRange::Year, &now()).len() == 365);
    }

    #[test]
    fn test_series_is_chronological_and_ends_today() {
        let days = daily_series(&[], TimeRange::Month, &now());
        assert_eq!(days.first().unwrap().date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(days.last().unwrap().date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(days.windows(2).all(|w| w[1].date - w[0].date == Duration::days(1)));
    }

    #[test]
    fn test_buckets_use_local_day() {
        // 23:30 UTC on the 14th is already the 15th at UTC+2
        let created = Utc.with_ymd_and_hms(2024, 3, 14, 23, 30, 0).unwrap();
        let workouts = vec![workout("w1", created, vec![])];

        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_now = now().with_timezone(&tz);

        let days = daily_series(&workouts, TimeRange::Week, &local_now);
        assert_eq!(days.last().unwrap().workouts, 1);

        let utc_days = daily_series(&workouts, TimeRange::Week, &now());
        assert_eq!(utc_days.last().unwrap().workouts, 0);
        assert_eq!(utc_days[5].workouts, 1);
    }

    #[test]
    fn test_future_workouts_are_ignored() {
        let workouts = vec![workout("w1", now() + Duration::days(1), vec![])];
        let days = daily_series(&workouts, TimeRange::Week, &now());
        assert!(days.iter().all(DaySummary::is_empty));
    }

    #[test]
    fn test_zero_exercise_workouts() {
        for n in [0usize, 1, 5] {
            let workouts: Vec<Workout> = (0..n)
                .map(|i| workout(&i.to_string(), now(), vec![]))
                .collect();

            let totals = lifetime_totals(&workouts);
            assert_eq!(
                totals,
                LifetimeTotals {
                    workouts: n,
                    total_volume: 0.0,
                    total_reps: 0,
                    distinct_exercises: 0,
                }
            );
            assert!(muscle_tally(&workouts).is_empty());
        }
    }

    #[test]
    fn test_muscle_tally_counts_every_tag() {
        let workouts = vec![
            workout(
                "w1",
                now() - Duration::days(300),
                vec![
                    exercise("Bench", &[MuscleGroup::Chest, MuscleGroup::Arms], &[]),
                    exercise("Dips", &[MuscleGroup::Chest, MuscleGroup::Chest], &[]),
                ],
            ),
            workout(
                "w2",
                now(),
                vec![exercise("Run", &[MuscleGroup::Heart, MuscleGroup::Legs], &[])],
            ),
        ];

        let tally = muscle_tally(&workouts);
        assert_eq!(tally[&MuscleGroup::Chest], 3);
        assert_eq!(tally[&MuscleGroup::Arms], 1);
        assert_eq!(tally[&MuscleGroup::Heart], 1);
        assert_eq!(tally[&MuscleGroup::Legs], 1);
        assert!(!tally.contains_key(&MuscleGroup::Back));
        assert_eq!(tally.values().sum::<usize>(), 6);

        // Range never narrows the tally
        let report = ProgressReport::compute(&workouts, TimeRange::Week, &now());
        assert_eq!(report.muscles, tally);
    }

    #[test]
    fn test_lifetime_totals_distinct_names_are_case_sensitive() {
        let workouts = vec![
            workout("w1", now(), vec![exercise("Squat", &[], &[(50.0, 10)])]),
            workout(
                "w2",
                now() - Duration::days(500),
                vec![
                    exercise("Squat", &[], &[(60.0, 5)]),
                    exercise("squat", &[], &[(20.0, 3)]),
                ],
            ),
        ];

        let totals = lifetime_totals(&workouts);
        assert_eq!(totals.workouts, 2);
        assert_eq!(totals.total_volume, 500.0 + 300.0 + 60.0);
        assert_eq!(totals.total_reps, 18);
        assert_eq!(totals.distinct_exercises, 2);
    }

    #[test]
    fn test_negative_values_pass_through() {
        let workouts = vec![workout("w1", now(), vec![exercise("Odd", &[], &[(-10.0, 3)])])];
        let totals = lifetime_totals(&workouts);
        assert_eq!(totals.total_volume, -30.0);
        assert_eq!(totals.total_reps, 3);
    }

    #[test]
    fn test_labels() {
        let summary = DaySummary::empty(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(summary.label(TimeRange::Week), "Fri");
        assert_eq!(summary.label(TimeRange::Month), "03/15");
        assert_eq!(summary.label(TimeRange::Year), "03/15");
    }

    #[test]
    fn test_time_range_parsing() {
        assert_eq!("Week".parse::<TimeRange>().unwrap(), TimeRange::Week);
        assert_eq!("year".parse::<TimeRange>().unwrap(), TimeRange::Year);
        assert!("decade".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_dashboard_week_starts_on_sunday() {
        // 2024-03-15 is a Friday, so the week began on Sunday 2024-03-10
        let sunday = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let workouts = vec![
            workout("w1", sunday, vec![exercise("A", &[], &[])]),
            workout("w2", sunday - Duration::seconds(1), vec![]),
            workout("w3", now(), vec![exercise("B", &[], &[]), exercise("C", &[], &[])]),
        ];

        let stats = DashboardStats::compute(&workouts, &now());
        assert_eq!(stats.total_workouts, 3);
        assert_eq!(stats.this_week_workouts, 2);
        assert_eq!(stats.total_exercises, 3);
    }

    #[test]
    fn test_empty_input_is_total() {
        let report = ProgressReport::compute(&[], TimeRange::Month, &now());
        assert_eq!(report.days.len(), 30);
        assert!(report.muscles.is_empty());
        assert_eq!(report.totals, LifetimeTotals::default());
        assert_eq!(DashboardStats::compute(&[], &now()), DashboardStats::default());
    }
}
