//! Program templates - programs, their workouts (days) and prescribed exercises

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Database, ExerciseLookup, TemplateProvider, format_ts};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub days_per_week: Option<u32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramWorkout {
    pub id: i64,
    pub program_id: i64,
    pub name: String,
    pub day_number: u32,
    pub estimated_duration_minutes: Option<u32>,
}

/// Target for one exercise of a program workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub target_sets: u32,
    pub reps_min: u32,
    pub reps_max: u32,
    pub target_rpe: Option<f64>,
    pub rest_seconds: Option<u32>,
    pub tempo: Option<String>,
    pub notes: Option<String>,
}

impl Prescription {
    /// e.g. "3 x 8-12 @ RPE 8, rest 120s, tempo 3-1-1"
    pub fn describe(&self) -> String {
        let mut text = if self.reps_min == self.reps_max {
            format!("{} x {}", self.target_sets, self.reps_min)
        } else {
            format!("{} x {}-{}", self.target_sets, self.reps_min, self.reps_max)
        };
        if let Some(rpe) = self.target_rpe {
            text.push_str(&format!(" @ RPE {}", rpe));
        }
        if let Some(rest) = self.rest_seconds {
            text.push_str(&format!(", rest {}s", rest));
        }
        if let Some(tempo) = &self.tempo {
            text.push_str(&format!(", tempo {}", tempo));
        }
        text
    }
}

/// One row of a program workout template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateExercise {
    pub exercise_id: i64,
    /// None when the exercise has since been deleted
    pub exercise_name: Option<String>,
    pub prescription: Prescription,
}

/// JSON shape accepted by `program import`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProgramFile {
    Many(Vec<ProgramSpec>),
    One(ProgramSpec),
}

impl ProgramFile {
    pub fn into_programs(self) -> Vec<ProgramSpec> {
        match self {
            ProgramFile::Many(programs) => programs,
            ProgramFile::One(program) => vec![program],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub days_per_week: Option<u32>,
    pub workouts: Vec<ProgramWorkoutSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramWorkoutSpec {
    pub name: String,
    #[serde(default)]
    pub day_number: Option<u32>,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    pub exercises: Vec<ProgramExerciseSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramExerciseSpec {
    pub exercise: String,
    pub sets: u32,
    pub reps_min: u32,
    #[serde(default)]
    pub reps_max: Option<u32>,
    #[serde(default)]
    pub rpe: Option<f64>,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    #[serde(default)]
    pub tempo: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

const PROGRAM_COLUMNS: &str = "id, name, description, days_per_week, is_active";
const PROGRAM_WORKOUT_COLUMNS: &str = "id, program_id, name, day_number, estimated_duration_minutes";

fn row_to_program(row: &Row) -> rusqlite::Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        days_per_week: row.get(3)?,
        is_active: row.get(4)?,
    })
}

fn row_to_program_workout(row: &Row) -> rusqlite::Result<ProgramWorkout> {
    Ok(ProgramWorkout {
        id: row.get(0)?,
        program_id: row.get(1)?,
        name: row.get(2)?,
        day_number: row.get(3)?,
        estimated_duration_minutes: row.get(4)?,
    })
}

fn validate_spec(spec: &ProgramExerciseSpec) -> Result<()> {
    if spec.sets < 1 {
        bail!("{}: target sets must be at least 1", spec.exercise);
    }
    if spec.reps_min < 1 {
        bail!("{}: target reps must be at least 1", spec.exercise);
    }
    if let Some(max) = spec.reps_max
        && max < spec.reps_min
    {
        bail!("{}: reps_max must be >= reps_min", spec.exercise);
    }
    if let Some(rpe) = spec.rpe
        && !(6.0..=10.0).contains(&rpe)
    {
        bail!("{}: target RPE must be between 6 and 10", spec.exercise);
    }
    Ok(())
}

impl Database {
    /// Store a program template; exercise names must resolve to known exercises
    pub fn import_program(&self, spec: &ProgramSpec) -> Result<i64> {
        if self.program_by_name(&spec.name)?.is_some() {
            bail!("program '{}' already exists", spec.name);
        }
        if spec.workouts.is_empty() {
            bail!("program '{}' has no workouts", spec.name);
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO programs (name, description, days_per_week, is_active, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![spec.name, spec.description, spec.days_per_week, format_ts(&Utc::now())],
        )?;
        let program_id = tx.last_insert_rowid();

        for (idx, day) in spec.workouts.iter().enumerate() {
            let day_number = day.day_number.unwrap_or(idx as u32 + 1);
            tx.execute(
                "INSERT INTO program_workouts (program_id, name, day_number, estimated_duration_minutes)
                 VALUES (?1, ?2, ?3, ?4)",
                params![program_id, day.name, day_number, day.estimated_duration_minutes],
            )?;
            let workout_id = tx.last_insert_rowid();

            for (order, ex) in day.exercises.iter().enumerate() {
                validate_spec(ex)?;
                let exercise = self
                    .find_exercise(&ex.exercise)?
                    .with_context(|| format!("unknown exercise '{}' in {}", ex.exercise, day.name))?;
                tx.execute(
                    "INSERT INTO program_exercises (
                        program_workout_id, exercise_id, order_number, target_sets,
                        target_reps_min, target_reps_max, target_rpe, rest_seconds, tempo, notes
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        workout_id,
                        exercise.id,
                        order as u32 + 1,
                        ex.sets,
                        ex.reps_min,
                        ex.reps_max.unwrap_or(ex.reps_min),
                        ex.rpe,
                        ex.rest_seconds,
                        ex.tempo,
                        ex.notes,
                    ],
                )?;
            }
        }

        tx.commit()?;
        info!("Imported program '{}' (id: {})", spec.name, program_id);
        Ok(program_id)
    }

    pub fn programs(&self) -> Result<Vec<Program>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM programs ORDER BY name", PROGRAM_COLUMNS))?;
        let programs = stmt
            .query_map([], row_to_program)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(programs)
    }

    pub fn program_by_name(&self, name: &str) -> Result<Option<Program>> {
        let program = self
            .conn
            .query_row(
                &format!("SELECT {} FROM programs WHERE LOWER(name) = LOWER(?1)", PROGRAM_COLUMNS),
                params![name.trim()],
                row_to_program,
            )
            .optional()?;
        Ok(program)
    }

    pub fn active_program(&self) -> Result<Option<Program>> {
        let program = self
            .conn
            .query_row(
                &format!("SELECT {} FROM programs WHERE is_active = 1 LIMIT 1", PROGRAM_COLUMNS),
                [],
                row_to_program,
            )
            .optional()?;
        Ok(program)
    }

    /// Make one program active; all others become inactive
    pub fn activate_program(&self, id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("UPDATE programs SET is_active = 0", [])?;
        let updated = tx.execute("UPDATE programs SET is_active = 1 WHERE id = ?1", params![id])?;
        if updated == 0 {
            bail!("program {} not found", id);
        }
        tx.commit()?;
        info!("Activated program {}", id);
        Ok(())
    }

    pub fn delete_program(&self, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM program_exercises WHERE program_workout_id IN
                (SELECT id FROM program_workouts WHERE program_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM program_workouts WHERE program_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM programs WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Workouts of a program ordered by day
    pub fn program_workouts(&self, program_id: i64) -> Result<Vec<ProgramWorkout>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM program_workouts WHERE program_id = ?1 ORDER BY day_number, id",
            PROGRAM_WORKOUT_COLUMNS
        ))?;
        let workouts = stmt
            .query_map(params![program_id], row_to_program_workout)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    pub fn program_workout(&self, id: i64) -> Result<Option<ProgramWorkout>> {
        let workout = self
            .conn
            .query_row(
                &format!("SELECT {} FROM program_workouts WHERE id = ?1", PROGRAM_WORKOUT_COLUMNS),
                params![id],
                row_to_program_workout,
            )
            .optional()?;
        Ok(workout)
    }

    /// Next day in rotation: the one after the last performed, cycling to the first
    pub fn next_program_workout(&self, program_id: i64) -> Result<Option<ProgramWorkout>> {
        let days = self.program_workouts(program_id)?;
        if days.is_empty() {
            return Ok(None);
        }

        let last: Option<i64> = self
            .conn
            .query_row(
                "SELECT pw.id FROM workouts w
                 JOIN program_workouts pw ON w.program_workout_id = pw.id
                 WHERE pw.program_id = ?1
                 ORDER BY w.date DESC, w.id DESC LIMIT 1",
                params![program_id],
                |row| row.get(0),
            )
            .optional()?;

        let next = match last.and_then(|id| days.iter().position(|d| d.id == id)) {
            Some(idx) => days[(idx + 1) % days.len()].clone(),
            None => days[0].clone(),
        };
        Ok(Some(next))
    }
}

impl TemplateProvider for Database {
    fn workout_exercises(&self, program_workout_id: i64) -> Result<Vec<TemplateExercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT pe.exercise_id, e.name, pe.target_sets, pe.target_reps_min, pe.target_reps_max,
                    pe.target_rpe, pe.rest_seconds, pe.tempo, pe.notes
             FROM program_exercises pe
             LEFT JOIN exercises e ON pe.exercise_id = e.id
             WHERE pe.program_workout_id = ?1
             ORDER BY pe.order_number, pe.id",
        )?;
        let rows = stmt
            .query_map(params![program_workout_id], |row| {
                Ok(TemplateExercise {
                    exercise_id: row.get(0)?,
                    exercise_name: row.get(1)?,
                    prescription: Prescription {
                        target_sets: row.get(2)?,
                        reps_min: row.get(3)?,
                        reps_max: row.get(4)?,
                        target_rpe: row.get(5)?,
                        rest_seconds: row.get(6)?,
                        tempo: row.get(7)?,
                        notes: row.get(8)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::test_support::memory_db;
    use super::super::{NewWorkout, SetStore};
    use super::*;

    pub const PPL_JSON: &str = r#"{
        "name": "Push Pull Legs",
        "days_per_week": 3,
        "workouts": [
            {"name": "Push", "exercises": [
                {"exercise": "Bench Press", "sets": 4, "reps_min": 5, "reps_max": 8, "rpe": 8.0, "rest_seconds": 180},
                {"exercise": "Overhead Press", "sets": 3, "reps_min": 8, "reps_max": 10},
                {"exercise": "Tricep Pushdown", "sets": 3, "reps_min": 12}
            ]},
            {"name": "Pull", "exercises": [
                {"exercise": "Deadlift", "sets": 3, "reps_min": 5},
                {"exercise": "Barbell Row", "sets": 3, "reps_min": 8, "reps_max": 12}
            ]},
            {"name": "Legs", "exercises": [
                {"exercise": "Squat", "sets": 4, "reps_min": 5, "reps_max": 8},
                {"exercise": "Romanian Deadlift", "sets": 3, "reps_min": 8},
                {"exercise": "Leg Press", "sets": 3, "reps_min": 10, "reps_max": 15},
                {"exercise": "Standing Calf Raise", "sets": 4, "reps_min": 12}
            ]}
        ]
    }"#;

    pub fn import_ppl(db: &Database) -> i64 {
        let file: ProgramFile = serde_json::from_str(PPL_JSON).unwrap();
        let spec = file.into_programs().remove(0);
        db.import_program(&spec).unwrap()
    }

    #[test]
    fn test_import_and_template() {
        let db = memory_db();
        let id = import_ppl(&db);
        let days = db.program_workouts(id).unwrap();
        assert_eq!(days.iter().map(|d| d.day_number).collect::<Vec<_>>(), vec![1, 2, 3]);

        let push = db.workout_exercises(days[0].id).unwrap();
        assert_eq!(push.len(), 3);
        assert_eq!(push[0].exercise_name.as_deref(), Some("Bench Press"));
        assert_eq!(push[0].prescription.describe(), "4 x 5-8 @ RPE 8, rest 180s");
        assert_eq!(push[2].prescription.reps_max, 12);
    }

    #[test]
    fn test_import_unknown_exercise_rolls_back() {
        let db = memory_db();
        let json = r#"[{"name": "Bad", "workouts": [{"name": "A", "exercises": [
            {"exercise": "Squat", "sets": 3, "reps_min": 5},
            {"exercise": "Moon Jump", "sets": 3, "reps_min": 5}
        ]}]}]"#;
        let file: ProgramFile = serde_json::from_str(json).unwrap();
        let spec = file.into_programs().remove(0);
        assert!(db.import_program(&spec).is_err());
        assert!(db.programs().unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_bad_rep_range() {
        let db = memory_db();
        let json = r#"{"name": "Bad", "workouts": [{"name": "A", "exercises": [
            {"exercise": "Squat", "sets": 3, "reps_min": 8, "reps_max": 5}
        ]}]}"#;
        let file: ProgramFile = serde_json::from_str(json).unwrap();
        assert!(db.import_program(&file.into_programs()[0]).is_err());
    }

    #[test]
    fn test_single_active_program() {
        let db = memory_db();
        let ppl = import_ppl(&db);
        let json = r#"{"name": "Full Body", "workouts": [{"name": "A", "exercises": [
            {"exercise": "Squat", "sets": 3, "reps_min": 5}
        ]}]}"#;
        let file: ProgramFile = serde_json::from_str(json).unwrap();
        let fb = db.import_program(&file.into_programs()[0]).unwrap();

        db.activate_program(ppl).unwrap();
        db.activate_program(fb).unwrap();
        let active: Vec<_> = db.programs().unwrap().into_iter().filter(|p| p.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, fb);
        assert!(db.activate_program(9999).is_err());
    }

    #[test]
    fn test_rotation_cycles() {
        let db = memory_db();
        let id = import_ppl(&db);
        let days = db.program_workouts(id).unwrap();

        assert_eq!(db.next_program_workout(id).unwrap().unwrap().id, days[0].id);

        for expected_next in [1usize, 2, 0] {
            let current = db.next_program_workout(id).unwrap().unwrap();
            db.create_workout(&NewWorkout {
                program_workout_id: Some(current.id),
                ..Default::default()
            })
            .unwrap();
            assert_eq!(db.next_program_workout(id).unwrap().unwrap().id, days[expected_next].id);
        }
    }

    #[test]
    fn test_template_survives_deleted_exercise() {
        let db = memory_db();
        let id = import_ppl(&db);
        let day = db.program_workouts(id).unwrap().remove(0);
        let first = db.workout_exercises(day.id).unwrap().remove(0);
        db.conn
            .execute("DELETE FROM exercises WHERE id = ?1", params![first.exercise_id])
            .unwrap();

        let template = db.workout_exercises(day.id).unwrap();
        assert_eq!(template.len(), 3);
        assert_eq!(template[0].exercise_id, first.exercise_id);
        assert_eq!(template[0].exercise_name, None);
        // sets can still reference it
        assert!(db.sets_for_exercise(first.exercise_id, 5).unwrap().is_empty());
    }

    #[test]
    fn test_delete_program() {
        let db = memory_db();
        let id = import_ppl(&db);
        assert!(db.delete_program(id).unwrap());
        assert!(db.program_workouts(id).unwrap().is_empty());
        assert!(!db.delete_program(id).unwrap());
    }
}
