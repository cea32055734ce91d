//! Stats module - training summaries and progression
//!
//! Features:
//! - Workout, set and volume totals with weekly frequency
//! - Consistency streak
//! - Volume per primary muscle
//! - Estimated 1RM progression with a linear trend (linfa)

pub mod muscle_volume;
pub mod predictor;

pub use muscle_volume::{MuscleVolume, MuscleVolumeTracker};
pub use predictor::{ProgressPredictor, Trend};

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::calc::estimate_one_rep_max;
use crate::db::{Database, Set, Workout};

/// Gap in days that still keeps a streak alive
const STREAK_GAP_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub workouts: usize,
    pub sets: usize,
    pub total_volume: f64,
    pub avg_duration_minutes: Option<f64>,
    pub weekly_frequency: f64,
}

/// Best estimated 1RM of one exercise in one workout
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPoint {
    pub workout_id: i64,
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub reps: u32,
    pub estimated_1rm: f64,
}

/// Training analytics over a slice of history
pub struct Analytics {
    workouts: Vec<Workout>,
    sets: Vec<Set>,
}

impl Analytics {
    pub fn new(workouts: Vec<Workout>, sets: Vec<Set>) -> Self {
        Self { workouts, sets }
    }

    /// Everything dated on or after `since`
    pub fn load(db: &Database, since: Option<DateTime<Utc>>) -> Result<Self> {
        Ok(Self::new(db.workouts_since(since)?, db.sets_since(since)?))
    }

    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    pub fn summary(&self) -> Summary {
        let durations: Vec<u32> = self.workouts.iter().filter_map(|w| w.duration_minutes).collect();
        Summary {
            workouts: self.workouts.len(),
            sets: self.sets.len(),
            total_volume: self.total_volume(),
            avg_duration_minutes: if durations.is_empty() {
                None
            } else {
                Some(durations.iter().sum::<u32>() as f64 / durations.len() as f64)
            },
            weekly_frequency: self.weekly_frequency(),
        }
    }

    /// Volume over working sets
    pub fn total_volume(&self) -> f64 {
        self.sets
            .iter()
            .filter(|s| s.set_type.is_working())
            .map(Set::volume)
            .sum()
    }

    /// Workouts per week between the first and the last workout
    pub fn weekly_frequency(&self) -> f64 {
        let (Some(first), Some(last)) = (
            self.workouts.iter().map(|w| w.date).min(),
            self.workouts.iter().map(|w| w.date).max(),
        ) else {
            return 0.0;
        };
        if self.workouts.len() < 2 {
            return 0.0;
        }

        let days = (last.date_naive() - first.date_naive()).num_days() as f64;
        if days == 0.0 {
            return self.workouts.len() as f64;
        }
        (self.workouts.len() as f64 / days) * 7.0
    }

    /// Days covered by the current streak, counting from the newest workout.
    ///
    /// Zero if the newest workout is more than three days before `today`.
    pub fn streak_days(&self, today: NaiveDate) -> i64 {
        let mut dates: Vec<NaiveDate> = self.workouts.iter().map(|w| w.date.date_naive()).collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();

        let Some(newest) = dates.first() else {
            return 0;
        };
        if (today - *newest).num_days() > STREAK_GAP_DAYS {
            return 0;
        }

        let mut streak = 1;
        for pair in dates.windows(2) {
            let gap = (pair[0] - pair[1]).num_days();
            if gap > STREAK_GAP_DAYS {
                break;
            }
            streak += gap;
        }
        streak
    }

    /// Per-workout best estimated 1RM of an exercise, oldest first
    pub fn progression(&self, exercise_id: i64) -> Vec<ProgressPoint> {
        let dates: BTreeMap<i64, DateTime<Utc>> = self.workouts.iter().map(|w| (w.id, w.date)).collect();

        let mut best: BTreeMap<i64, ProgressPoint> = BTreeMap::new();
        for set in self
            .sets
            .iter()
            .filter(|s| s.exercise_id == exercise_id && s.set_type.is_working())
        {
            let estimated_1rm = estimate_one_rep_max(set.weight, set.reps);
            let point = ProgressPoint {
                workout_id: set.workout_id,
                date: dates.get(&set.workout_id).copied().unwrap_or(set.completed_at),
                weight: set.weight,
                reps: set.reps,
                estimated_1rm,
            };
            match best.get(&set.workout_id) {
                Some(existing) if existing.estimated_1rm >= estimated_1rm => {}
                _ => {
                    best.insert(set.workout_id, point);
                }
            }
        }

        let mut points: Vec<ProgressPoint> = best.into_values().collect();
        points.sort_by_key(|p| (p.date, p.workout_id));
        points
    }
}
