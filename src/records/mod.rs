//! Personal record detection
//!
//! Records are derived from the stored sets of one workout and compared against
//! the best value already recorded. Only a strictly greater value is a new record,
//! so re-running detection never emits the same record twice unless the
//! history was deleted in between.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use anyhow::Result;
use tracing::{debug, info};

use crate::calc::estimate_one_rep_max;
use crate::db::{NewRecord, PersonalRecord, RecordStore, RecordType, Set, SetStore};

/// Heaviest first, then most reps, then the earliest stored set
fn rank(a: &&Set, b: &&Set) -> Ordering {
    b.weight
        .total_cmp(&a.weight)
        .then_with(|| b.reps.cmp(&a.reps))
        .then_with(|| a.id.cmp(&b.id))
}

/// First set in rank order whose key is maximal
fn best_by<'s>(sets: &[&'s Set], key: impl Fn(&Set) -> f64) -> Option<&'s Set> {
    let mut best: Option<(&'s Set, f64)> = None;
    for &set in sets {
        let value = key(set);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((set, value)),
        }
    }
    best.map(|(set, _)| set)
}

/// Candidate records of one exercise, before comparing against history
fn candidates(ranked: &[&Set]) -> Vec<(RecordType, f64, Set)> {
    let mut found = Vec::new();

    for &record_type in RecordType::rep_maxes() {
        let Some(target) = record_type.target_reps() else {
            continue;
        };
        // ranked order puts the heaviest matching set first
        if let Some(set) = ranked.iter().find(|s| s.reps == target) {
            found.push((record_type, estimate_one_rep_max(set.weight, set.reps), (*set).clone()));
        }
    }

    if let Some(set) = best_by(ranked, Set::volume) {
        found.push((RecordType::Volume, set.volume(), set.clone()));
    }
    if let Some(set) = ranked.first() {
        found.push((RecordType::MaxWeight, set.weight, (*set).clone()));
    }
    found
}

/// Detect and store the personal records set in a workout.
///
/// Warmup sets never count. Returns the records written, in exercise order
/// and then 1RM, 3RM, 5RM, 10RM, volume, max weight.
pub fn detect<S, R>(sets: &S, records: &R, workout_id: i64) -> Result<Vec<PersonalRecord>>
where
    S: SetStore + ?Sized,
    R: RecordStore + ?Sized,
{
    let workout_sets = sets.sets_for_workout(workout_id)?;

    let mut by_exercise: BTreeMap<i64, Vec<&Set>> = BTreeMap::new();
    for set in workout_sets.iter().filter(|s| s.set_type.is_working()) {
        by_exercise.entry(set.exercise_id).or_default().push(set);
    }

    let mut new_records = Vec::new();
    for (exercise_id, mut ranked) in by_exercise {
        ranked.sort_by(rank);

        for (record_type, value, set) in candidates(&ranked) {
            let current = records.current_best(exercise_id, record_type)?;
            if current.is_some_and(|best| value <= best) {
                debug!(
                    "Exercise {}: {} {:.1} does not beat {:?}",
                    exercise_id, record_type, value, current
                );
                continue;
            }

            let record = records.insert_record(&NewRecord {
                exercise_id,
                record_type,
                value,
                weight: Some(set.weight),
                reps: Some(set.reps),
                date: set.completed_at,
                workout_id: Some(workout_id),
                set_id: Some(set.id),
            })?;
            info!(
                "New {} record for exercise {}: {:.1} ({} x {})",
                record_type, exercise_id, value, set.weight, set.reps
            );
            new_records.push(record);
        }
    }

    Ok(new_records)
}
