//! Database module - SQLite storage for exercises, programs, workouts, sets and records

mod exercises;
mod programs;
mod records;
mod settings;
mod workouts;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::debug;

pub use exercises::{Exercise, NewExercise};
pub use programs::{
    Prescription, Program, ProgramExerciseSpec, ProgramFile, ProgramSpec, ProgramWorkout,
    ProgramWorkoutSpec, TemplateExercise,
};
pub use records::{NewRecord, PersonalRecord, RecordType};
pub use settings::Setting;
pub use workouts::{NewSet, NewWorkout, Set, SetType, Workout, WorkoutSummary};

/// Durable, append-only set history
pub trait SetStore {
    fn insert_set(&self, set: &NewSet) -> Result<Set>;

    /// Sets of one workout in the order they were logged
    fn sets_for_workout(&self, workout_id: i64) -> Result<Vec<Set>>;

    /// Sets of one exercise across all workouts, most recent first
    fn sets_for_exercise(&self, exercise_id: i64, limit: usize) -> Result<Vec<Set>>;
}

/// Append-only personal record history
pub trait RecordStore {
    /// Highest value ever recorded for the pair, if any
    fn current_best(&self, exercise_id: i64, record_type: RecordType) -> Result<Option<f64>>;

    fn insert_record(&self, record: &NewRecord) -> Result<PersonalRecord>;
}

/// Program workout templates
pub trait TemplateProvider {
    /// Prescribed exercises of a program workout in order
    fn workout_exercises(&self, program_workout_id: i64) -> Result<Vec<TemplateExercise>>;
}

pub trait ExerciseLookup {
    /// Case-insensitive exact match first, then substring match
    fn find_exercise(&self, name: &str) -> Result<Option<Exercise>>;
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        db.seed_exercises()?;
        debug!("Opened database at {}", path);
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                category TEXT NOT NULL,
                primary_muscle TEXT NOT NULL,
                secondary_muscles TEXT NOT NULL DEFAULT '[]',
                equipment TEXT NOT NULL,
                is_custom INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS programs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                description TEXT,
                days_per_week INTEGER,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS program_workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                program_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                day_number INTEGER NOT NULL,
                estimated_duration_minutes INTEGER
            );

            CREATE TABLE IF NOT EXISTS program_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                program_workout_id INTEGER NOT NULL,
                exercise_id INTEGER NOT NULL,
                order_number INTEGER NOT NULL,
                target_sets INTEGER NOT NULL,
                target_reps_min INTEGER NOT NULL,
                target_reps_max INTEGER NOT NULL,
                target_rpe REAL,
                rest_seconds INTEGER,
                tempo TEXT,
                notes TEXT
            );

            CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                date TEXT NOT NULL,
                program_workout_id INTEGER,
                duration_minutes INTEGER,
                bodyweight REAL,
                notes TEXT,
                completed INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_id INTEGER NOT NULL,
                exercise_id INTEGER NOT NULL,
                set_number INTEGER NOT NULL,
                weight REAL NOT NULL,
                reps INTEGER NOT NULL,
                rpe REAL,
                set_type TEXT NOT NULL DEFAULT 'working',
                completed_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sets_workout ON sets (workout_id);
            CREATE INDEX IF NOT EXISTS idx_sets_exercise ON sets (exercise_id, completed_at);

            CREATE TABLE IF NOT EXISTS personal_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exercise_id INTEGER NOT NULL,
                record_type TEXT NOT NULL,
                value REAL NOT NULL,
                weight REAL,
                reps INTEGER,
                date TEXT NOT NULL,
                workout_id INTEGER,
                set_id INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_records_exercise ON personal_records (exercise_id, record_type);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                description TEXT,
                updated_at TEXT NOT NULL
            );",
        )?;

        Ok(())
    }
}

/// Timestamps are stored as fixed-width RFC 3339 so text order is time order
pub(crate) fn format_ts(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored timestamp; `column` is reported in the conversion error
pub(crate) fn parse_ts(column: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

/// Text column that does not decode into its Rust type
pub(crate) fn conversion_error(
    column: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, err.into())
}
