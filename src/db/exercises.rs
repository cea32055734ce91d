//! Exercise catalog storage

use anyhow::{Result, bail};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Database, ExerciseLookup, conversion_error, format_ts};
use crate::exercises::{BUILTIN_EXERCISES, Category, Equipment, MuscleGroup};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub primary_muscle: MuscleGroup,
    pub secondary_muscles: Vec<MuscleGroup>,
    pub equipment: Equipment,
    pub is_custom: bool,
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub category: Category,
    pub primary_muscle: MuscleGroup,
    pub secondary_muscles: Vec<MuscleGroup>,
    pub equipment: Equipment,
}

const EXERCISE_COLUMNS: &str =
    "id, name, category, primary_muscle, secondary_muscles, equipment, is_custom";

fn row_to_exercise(row: &Row) -> rusqlite::Result<Exercise> {
    let category: String = row.get(2)?;
    let primary: String = row.get(3)?;
    let secondary: String = row.get(4)?;
    let equipment: String = row.get(5)?;
    Ok(Exercise {
        id: row.get(0)?,
        name: row.get(1)?,
        category: category.parse().map_err(|e: anyhow::Error| conversion_error(2, e))?,
        primary_muscle: primary.parse().map_err(|e: anyhow::Error| conversion_error(3, e))?,
        secondary_muscles: serde_json::from_str(&secondary).map_err(|e| conversion_error(4, e))?,
        equipment: equipment.parse().map_err(|e: anyhow::Error| conversion_error(5, e))?,
        is_custom: row.get(6)?,
    })
}

impl Database {
    /// Insert the built-in catalog into an empty exercises table
    pub(super) fn seed_exercises(&self) -> Result<()> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM exercises", [], |r| r.get(0))?;
        if count > 0 {
            return Ok(());
        }

        for ex in BUILTIN_EXERCISES {
            self.conn.execute(
                "INSERT INTO exercises (name, category, primary_muscle, secondary_muscles, equipment, is_custom, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![
                    ex.name,
                    ex.category.name(),
                    ex.primary_muscle.name(),
                    serde_json::to_string(ex.secondary_muscles)?,
                    ex.equipment.name(),
                    format_ts(&Utc::now()),
                ],
            )?;
        }
        info!("Seeded {} built-in exercises", BUILTIN_EXERCISES.len());
        Ok(())
    }

    /// Add a custom exercise
    pub fn add_exercise(&self, exercise: &NewExercise) -> Result<i64> {
        let name = exercise.name.trim();
        if name.is_empty() {
            bail!("exercise name must not be empty");
        }
        if self.exact_exercise(name)?.is_some() {
            bail!("exercise '{}' already exists", name);
        }

        self.conn.execute(
            "INSERT INTO exercises (name, category, primary_muscle, secondary_muscles, equipment, is_custom, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                name,
                exercise.category.name(),
                exercise.primary_muscle.name(),
                serde_json::to_string(&exercise.secondary_muscles)?,
                exercise.equipment.name(),
                format_ts(&Utc::now()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Added custom exercise '{}' (id: {})", name, id);
        Ok(id)
    }

    /// All exercises ordered by name, optionally of one category
    pub fn exercises(&self, category: Option<Category>) -> Result<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM exercises WHERE ?1 IS NULL OR category = ?1 ORDER BY name",
            EXERCISE_COLUMNS
        ))?;
        let exercises = stmt
            .query_map(params![category.map(|c| c.name())], row_to_exercise)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises)
    }

    pub fn exercise(&self, id: i64) -> Result<Option<Exercise>> {
        let exercise = self
            .conn
            .query_row(
                &format!("SELECT {} FROM exercises WHERE id = ?1", EXERCISE_COLUMNS),
                params![id],
                row_to_exercise,
            )
            .optional()?;
        Ok(exercise)
    }

    /// Display name for an exercise id; deleted exercises fall back to the id
    pub fn exercise_label(&self, id: i64) -> Result<String> {
        Ok(self
            .exercise(id)?
            .map(|e| e.name)
            .unwrap_or_else(|| format!("Exercise #{}", id)))
    }

    fn exact_exercise(&self, name: &str) -> Result<Option<Exercise>> {
        let exercise = self
            .conn
            .query_row(
                &format!("SELECT {} FROM exercises WHERE LOWER(name) = LOWER(?1)", EXERCISE_COLUMNS),
                params![name.trim()],
                row_to_exercise,
            )
            .optional()?;
        Ok(exercise)
    }
}

impl ExerciseLookup for Database {
    fn find_exercise(&self, name: &str) -> Result<Option<Exercise>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(exercise) = self.exact_exercise(name)? {
            return Ok(Some(exercise));
        }

        // one letter matches too much to guess from
        if name.chars().count() < 2 {
            return Ok(None);
        }

        let escaped = name
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{}%", escaped);
        let exercise = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM exercises WHERE LOWER(name) LIKE ?1 ESCAPE '\\' ORDER BY LENGTH(name), name LIMIT 1",
                    EXERCISE_COLUMNS
                ),
                params![pattern],
                row_to_exercise,
            )
            .optional()?;
        Ok(exercise)
    }
}
