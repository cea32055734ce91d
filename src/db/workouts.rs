//! Workouts and the set record store

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Database, SetStore, conversion_error, format_ts, parse_ts};

/// Workout session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub name: Option<String>,
    pub date: DateTime<Utc>,
    pub program_workout_id: Option<i64>,
    pub duration_minutes: Option<u32>,
    pub bodyweight: Option<f64>,
    pub notes: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewWorkout {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub program_workout_id: Option<i64>,
    pub bodyweight: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetType {
    Warmup,
    Working,
    Dropset,
    Failure,
    Amrap,
}

impl SetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetType::Warmup => "warmup",
            SetType::Working => "working",
            SetType::Dropset => "dropset",
            SetType::Failure => "failure",
            SetType::Amrap => "amrap",
        }
    }

    /// Everything except warmups counts toward volume and records
    pub fn is_working(&self) -> bool {
        !matches!(self, SetType::Warmup)
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warmup" => Ok(SetType::Warmup),
            "working" => Ok(SetType::Working),
            "dropset" => Ok(SetType::Dropset),
            "failure" => Ok(SetType::Failure),
            "amrap" => Ok(SetType::Amrap),
            _ => bail!("unknown set type: {}", s),
        }
    }
}

/// One logged set; immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
    pub set_type: SetType,
    pub completed_at: DateTime<Utc>,
}

impl Set {
    pub fn volume(&self) -> f64 {
        crate::calc::volume_load(self.weight, self.reps)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSet {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
    pub set_type: SetType,
    pub completed_at: DateTime<Utc>,
}

impl NewSet {
    pub fn validate(&self) -> Result<()> {
        if self.set_number < 1 {
            bail!("set number must be at least 1");
        }
        if !(self.weight > 0.0) || !self.weight.is_finite() {
            bail!("weight must be positive, got {}", self.weight);
        }
        if self.reps < 1 {
            bail!("reps must be at least 1");
        }
        if let Some(rpe) = self.rpe
            && !(6.0..=10.0).contains(&rpe)
        {
            bail!("RPE must be between 6 and 10, got {}", rpe);
        }
        Ok(())
    }
}

/// Aggregates of one workout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutSummary {
    pub total_sets: usize,
    pub total_volume: f64,
    pub exercises: usize,
}

const WORKOUT_COLUMNS: &str =
    "id, name, date, program_workout_id, duration_minutes, bodyweight, notes, completed";

const SET_COLUMNS: &str =
    "id, workout_id, exercise_id, set_number, weight, reps, rpe, set_type, completed_at";

fn row_to_workout(row: &Row) -> rusqlite::Result<Workout> {
    let date: String = row.get(2)?;
    Ok(Workout {
        id: row.get(0)?,
        name: row.get(1)?,
        date: parse_ts(2, &date)?,
        program_workout_id: row.get(3)?,
        duration_minutes: row.get(4)?,
        bodyweight: row.get(5)?,
        notes: row.get(6)?,
        completed: row.get(7)?,
    })
}

fn row_to_set(row: &Row) -> rusqlite::Result<Set> {
    let set_type: String = row.get(7)?;
    let completed_at: String = row.get(8)?;
    Ok(Set {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        set_number: row.get(3)?,
        weight: row.get(4)?,
        reps: row.get(5)?,
        rpe: row.get(6)?,
        set_type: set_type
            .parse()
            .map_err(|e: anyhow::Error| conversion_error(7, e))?,
        completed_at: parse_ts(8, &completed_at)?,
    })
}

impl Database {
    pub fn create_workout(&self, workout: &NewWorkout) -> Result<Workout> {
        if let Some(bw) = workout.bodyweight
            && bw <= 0.0
        {
            bail!("bodyweight must be positive");
        }
        let date = workout.date.unwrap_or_else(Utc::now);
        self.conn.execute(
            "INSERT INTO workouts (name, date, program_workout_id, bodyweight, notes, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                workout.name,
                format_ts(&date),
                workout.program_workout_id,
                workout.bodyweight,
                workout.notes,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Started workout {} ({})", id, workout.name.as_deref().unwrap_or("Workout"));
        self.workout(id)?
            .ok_or_else(|| anyhow::anyhow!("workout {} vanished after insert", id))
    }

    pub fn workout(&self, id: i64) -> Result<Option<Workout>> {
        let workout = self
            .conn
            .query_row(
                &format!("SELECT {} FROM workouts WHERE id = ?1", WORKOUT_COLUMNS),
                params![id],
                row_to_workout,
            )
            .optional()?;
        Ok(workout)
    }

    /// Most recent workouts first
    pub fn recent_workouts(&self, limit: usize) -> Result<Vec<Workout>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM workouts ORDER BY date DESC, id DESC LIMIT ?1",
            WORKOUT_COLUMNS
        ))?;
        let workouts = stmt
            .query_map(params![limit as i64], row_to_workout)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    pub fn last_workout(&self) -> Result<Option<Workout>> {
        Ok(self.recent_workouts(1)?.into_iter().next())
    }

    /// Newest workout that was started but never finished
    pub fn last_unfinished_workout(&self) -> Result<Option<Workout>> {
        let workout = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM workouts WHERE completed = 0 ORDER BY date DESC, id DESC LIMIT 1",
                    WORKOUT_COLUMNS
                ),
                [],
                row_to_workout,
            )
            .optional()?;
        Ok(workout)
    }

    pub fn finish_workout(&self, id: i64, duration_minutes: u32) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE workouts SET completed = 1, duration_minutes = ?2 WHERE id = ?1",
            params![id, duration_minutes],
        )?;
        if updated == 0 {
            bail!("workout {} not found", id);
        }
        info!("Finished workout {} after {} min", id, duration_minutes);
        Ok(())
    }

    /// Delete a workout together with its sets and records
    pub fn delete_workout(&self, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM personal_records WHERE workout_id = ?1", params![id])?;
        tx.execute("DELETE FROM sets WHERE workout_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        tx.commit()?;
        if deleted > 0 {
            info!("Deleted workout {}", id);
        }
        Ok(deleted > 0)
    }

    pub fn set(&self, id: i64) -> Result<Option<Set>> {
        let set = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sets WHERE id = ?1", SET_COLUMNS),
                params![id],
                row_to_set,
            )
            .optional()?;
        Ok(set)
    }

    pub fn delete_set(&self, id: i64) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM sets WHERE id = ?1", params![id])?;
        if deleted > 0 {
            info!("Deleted set {}", id);
        }
        Ok(deleted > 0)
    }

    pub fn workout_summary(&self, id: i64) -> Result<WorkoutSummary> {
        let sets = self.sets_for_workout(id)?;
        let exercises: BTreeSet<i64> = sets.iter().map(|s| s.exercise_id).collect();
        Ok(WorkoutSummary {
            total_sets: sets.len(),
            total_volume: sets
                .iter()
                .filter(|s| s.set_type.is_working())
                .map(Set::volume)
                .sum(),
            exercises: exercises.len(),
        })
    }

    /// Workouts dated on or after `since`, oldest first
    pub fn workouts_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Workout>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM workouts WHERE ?1 IS NULL OR date >= ?1 ORDER BY date, id",
            WORKOUT_COLUMNS
        ))?;
        let workouts = stmt
            .query_map(params![since.as_ref().map(format_ts)], row_to_workout)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    /// Sets of every workout dated on or after `since`
    pub fn sets_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Set>> {
        let columns = SET_COLUMNS
            .split(", ")
            .map(|c| format!("s.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sets s JOIN workouts w ON w.id = s.workout_id
             WHERE ?1 IS NULL OR w.date >= ?1
             ORDER BY s.completed_at, s.id",
            columns
        ))?;
        let sets = stmt
            .query_map(params![since.as_ref().map(format_ts)], row_to_set)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    /// Sets of an exercise from the latest workout other than `exclude_workout`
    pub fn last_performance(&self, exercise_id: i64, exclude_workout: Option<i64>) -> Result<Vec<Set>> {
        let recent = self.sets_for_exercise(exercise_id, 100)?;
        let Some(workout_id) = recent
            .iter()
            .map(|s| s.workout_id)
            .find(|id| Some(*id) != exclude_workout)
        else {
            return Ok(Vec::new());
        };
        let mut sets: Vec<Set> = recent.into_iter().filter(|s| s.workout_id == workout_id).collect();
        sets.sort_by_key(|s| s.set_number);
        Ok(sets)
    }
}

impl SetStore for Database {
    fn insert_set(&self, set: &NewSet) -> Result<Set> {
        set.validate()?;
        self.conn.execute(
            "INSERT INTO sets (workout_id, exercise_id, set_number, weight, reps, rpe, set_type, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                set.workout_id,
                set.exercise_id,
                set.set_number,
                set.weight,
                set.reps,
                set.rpe,
                set.set_type.as_str(),
                format_ts(&set.completed_at),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(
            "Stored set {} (workout {}, exercise {}, #{}: {}x{})",
            id, set.workout_id, set.exercise_id, set.set_number, set.weight, set.reps
        );
        Ok(Set {
            id,
            workout_id: set.workout_id,
            exercise_id: set.exercise_id,
            set_number: set.set_number,
            weight: set.weight,
            reps: set.reps,
            rpe: set.rpe,
            set_type: set.set_type,
            completed_at: set.completed_at,
        })
    }

    fn sets_for_workout(&self, workout_id: i64) -> Result<Vec<Set>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sets WHERE workout_id = ?1 ORDER BY completed_at, set_number, id",
            SET_COLUMNS
        ))?;
        let sets = stmt
            .query_map(params![workout_id], row_to_set)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    fn sets_for_exercise(&self, exercise_id: i64, limit: usize) -> Result<Vec<Set>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sets WHERE exercise_id = ?1 ORDER BY completed_at DESC, id DESC LIMIT ?2",
            SET_COLUMNS
        ))?;
        let sets = stmt
            .query_map(params![exercise_id, limit as i64], row_to_set)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::test_support::{exercise_id, memory_db};
    use super::*;

    pub fn new_set(workout_id: i64, exercise_id: i64, set_number: u32, weight: f64, reps: u32) -> NewSet {
        NewSet {
            workout_id,
            exercise_id,
            set_number,
            weight,
            reps,
            rpe: None,
            set_type: SetType::Working,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_query_workout_sets() {
        let db = memory_db();
        let bench = exercise_id(&db, "Bench Press");
        let w = db.create_workout(&NewWorkout::default()).unwrap();
        assert!(!w.completed);

        db.insert_set(&new_set(w.id, bench, 1, 185.0, 10)).unwrap();
        db.insert_set(&new_set(w.id, bench, 2, 185.0, 8)).unwrap();

        let sets = db.sets_for_workout(w.id).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].set_number, 1);
        assert_eq!(sets[1].reps, 8);
    }

    #[test]
    fn test_insert_rejects_out_of_bounds() {
        let db = memory_db();
        let bench = exercise_id(&db, "Bench Press");
        let w = db.create_workout(&NewWorkout::default()).unwrap();

        assert!(db.insert_set(&new_set(w.id, bench, 1, 0.0, 5)).is_err());
        assert!(db.insert_set(&new_set(w.id, bench, 1, 100.0, 0)).is_err());
        let mut bad_rpe = new_set(w.id, bench, 1, 100.0, 5);
        bad_rpe.rpe = Some(11.0);
        assert!(db.insert_set(&bad_rpe).is_err());
        assert!(db.sets_for_workout(w.id).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_set_row_fails_to_load() {
        let db = memory_db();
        let bench = exercise_id(&db, "Bench Press");
        let w = db.create_workout(&NewWorkout::default()).unwrap();
        db.conn
            .execute(
                "INSERT INTO sets (workout_id, exercise_id, set_number, weight, reps, set_type, completed_at)
                 VALUES (?1, ?2, 1, 500.0, 1, 'warm-up', ?3)",
                params![w.id, bench, format_ts(&Utc::now())],
            )
            .unwrap();
        assert!(db.sets_for_workout(w.id).is_err());

        db.conn
            .execute(
                "UPDATE sets SET set_type = 'warmup', completed_at = 'garbage' WHERE workout_id = ?1",
                params![w.id],
            )
            .unwrap();
        assert!(db.sets_for_workout(w.id).is_err());
        assert!(crate::records::detect(&db, &db, w.id).is_err());
    }

    #[test]
    fn test_sets_for_exercise_most_recent_first() {
        let db = memory_db();
        let squat = exercise_id(&db, "Squat");
        let w = db.create_workout(&NewWorkout::default()).unwrap();
        let mut first = new_set(w.id, squat, 1, 225.0, 5);
        first.completed_at = Utc::now() - chrono::Duration::minutes(5);
        db.insert_set(&first).unwrap();
        db.insert_set(&new_set(w.id, squat, 2, 235.0, 5)).unwrap();

        let sets = db.sets_for_exercise(squat, 10).unwrap();
        assert_eq!(sets[0].weight, 235.0);
        assert_eq!(db.sets_for_exercise(squat, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_last_unfinished_and_finish() {
        let db = memory_db();
        let w = db.create_workout(&NewWorkout::default()).unwrap();
        assert_eq!(db.last_unfinished_workout().unwrap().unwrap().id, w.id);

        db.finish_workout(w.id, 45).unwrap();
        let done = db.workout(w.id).unwrap().unwrap();
        assert!(done.completed);
        assert_eq!(done.duration_minutes, Some(45));
        assert!(db.last_unfinished_workout().unwrap().is_none());
        assert!(db.finish_workout(9999, 1).is_err());
    }

    #[test]
    fn test_summary_ignores_warmup_volume() {
        let db = memory_db();
        let bench = exercise_id(&db, "Bench Press");
        let row = exercise_id(&db, "Barbell Row");
        let w = db.create_workout(&NewWorkout::default()).unwrap();
        let mut warmup = new_set(w.id, bench, 1, 95.0, 10);
        warmup.set_type = SetType::Warmup;
        db.insert_set(&warmup).unwrap();
        db.insert_set(&new_set(w.id, bench, 2, 185.0, 5)).unwrap();
        db.insert_set(&new_set(w.id, row, 1, 135.0, 10)).unwrap();

        let summary = db.workout_summary(w.id).unwrap();
        assert_eq!(summary.total_sets, 3);
        assert_eq!(summary.total_volume, 185.0 * 5.0 + 1350.0);
        assert_eq!(summary.exercises, 2);
    }

    #[test]
    fn test_delete_workout_removes_sets() {
        let db = memory_db();
        let bench = exercise_id(&db, "Bench Press");
        let w = db.create_workout(&NewWorkout::default()).unwrap();
        let set = db.insert_set(&new_set(w.id, bench, 1, 185.0, 5)).unwrap();

        assert!(db.delete_workout(w.id).unwrap());
        assert!(db.set(set.id).unwrap().is_none());
        assert!(!db.delete_workout(w.id).unwrap());
    }

    #[test]
    fn test_last_performance_skips_current_workout() {
        let db = memory_db();
        let bench = exercise_id(&db, "Bench Press");
        let old = db.create_workout(&NewWorkout::default()).unwrap();
        let mut s1 = new_set(old.id, bench, 1, 175.0, 8);
        s1.completed_at = Utc::now() - chrono::Duration::days(3);
        let mut s2 = new_set(old.id, bench, 2, 175.0, 7);
        s2.completed_at = s1.completed_at + chrono::Duration::minutes(3);
        db.insert_set(&s1).unwrap();
        db.insert_set(&s2).unwrap();

        let current = db.create_workout(&NewWorkout::default()).unwrap();
        db.insert_set(&new_set(current.id, bench, 1, 185.0, 5)).unwrap();

        let last = db.last_performance(bench, Some(current.id)).unwrap();
        assert_eq!(last.len(), 2);
        assert!(last.iter().all(|s| s.workout_id == old.id));
        assert_eq!(last[0].set_number, 1);
    }

    #[test]
    fn test_history_since() {
        let db = memory_db();
        let squat = exercise_id(&db, "Squat");
        let old = db
            .create_workout(&NewWorkout {
                date: Some(Utc::now() - chrono::Duration::days(40)),
                ..Default::default()
            })
            .unwrap();
        let recent = db.create_workout(&NewWorkout::default()).unwrap();
        db.insert_set(&new_set(old.id, squat, 1, 225.0, 5)).unwrap();
        db.insert_set(&new_set(recent.id, squat, 1, 235.0, 5)).unwrap();

        let cutoff = Some(Utc::now() - chrono::Duration::days(30));
        assert_eq!(db.workouts_since(None).unwrap().len(), 2);
        assert_eq!(db.workouts_since(None).unwrap()[0].id, old.id);
        assert_eq!(db.workouts_since(cutoff).unwrap().len(), 1);

        let sets = db.sets_since(cutoff).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].workout_id, recent.id);
    }

    #[test]
    fn test_set_type_parse() {
        assert_eq!("amrap".parse::<SetType>().unwrap(), SetType::Amrap);
        assert!("rest".parse::<SetType>().is_err());
        assert!(!SetType::Warmup.is_working());
        assert!(SetType::Failure.is_working());
    }
}
