//! Personal record store - append-only, the current best is always max(value)

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Database, RecordStore, conversion_error, format_ts, parse_ts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "1RM")]
    OneRm,
    #[serde(rename = "3RM")]
    ThreeRm,
    #[serde(rename = "5RM")]
    FiveRm,
    #[serde(rename = "10RM")]
    TenRm,
    #[serde(rename = "volume")]
    Volume,
    #[serde(rename = "max_weight")]
    MaxWeight,
}

impl RecordType {
    pub fn all() -> &'static [RecordType] {
        &[
            RecordType::OneRm,
            RecordType::ThreeRm,
            RecordType::FiveRm,
            RecordType::TenRm,
            RecordType::Volume,
            RecordType::MaxWeight,
        ]
    }

    /// The rep-max records, in detection order
    pub fn rep_maxes() -> &'static [RecordType] {
        &[
            RecordType::OneRm,
            RecordType::ThreeRm,
            RecordType::FiveRm,
            RecordType::TenRm,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::OneRm => "1RM",
            RecordType::ThreeRm => "3RM",
            RecordType::FiveRm => "5RM",
            RecordType::TenRm => "10RM",
            RecordType::Volume => "volume",
            RecordType::MaxWeight => "max_weight",
        }
    }

    /// Exact rep count a rep-max record is taken from
    pub fn target_reps(&self) -> Option<u32> {
        match self {
            RecordType::OneRm => Some(1),
            RecordType::ThreeRm => Some(3),
            RecordType::FiveRm => Some(5),
            RecordType::TenRm => Some(10),
            RecordType::Volume | RecordType::MaxWeight => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordType::OneRm => "1RM",
            RecordType::ThreeRm => "3RM",
            RecordType::FiveRm => "5RM",
            RecordType::TenRm => "10RM",
            RecordType::Volume => "Volume",
            RecordType::MaxWeight => "Max weight",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecordType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        RecordType::all()
            .iter()
            .find(|t| t.as_str().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown record type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub id: i64,
    pub exercise_id: i64,
    pub record_type: RecordType,
    pub value: f64,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub date: DateTime<Utc>,
    pub workout_id: Option<i64>,
    pub set_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub exercise_id: i64,
    pub record_type: RecordType,
    pub value: f64,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub date: DateTime<Utc>,
    pub workout_id: Option<i64>,
    pub set_id: Option<i64>,
}

const RECORD_COLUMNS: &str = "id, exercise_id, record_type, value, weight, reps, date, workout_id, set_id";

fn row_to_record(row: &Row) -> rusqlite::Result<PersonalRecord> {
    let record_type: String = row.get(2)?;
    let date: String = row.get(6)?;
    Ok(PersonalRecord {
        id: row.get(0)?,
        exercise_id: row.get(1)?,
        record_type: record_type
            .parse()
            .map_err(|e: anyhow::Error| conversion_error(2, e))?,
        value: row.get(3)?,
        weight: row.get(4)?,
        reps: row.get(5)?,
        date: parse_ts(6, &date)?,
        workout_id: row.get(7)?,
        set_id: row.get(8)?,
    })
}

impl Database {
    /// Best record of each type, per exercise, optionally for a single exercise
    pub fn best_records(&self, exercise_id: Option<i64>) -> Result<Vec<PersonalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM personal_records
             WHERE ?1 IS NULL OR exercise_id = ?1
             ORDER BY exercise_id, record_type, value DESC, date ASC, id ASC",
            RECORD_COLUMNS
        ))?;
        let all = stmt
            .query_map(params![exercise_id], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut best: Vec<PersonalRecord> = Vec::new();
        for record in all {
            let seen = best
                .last()
                .is_some_and(|b| b.exercise_id == record.exercise_id && b.record_type == record.record_type);
            if !seen {
                best.push(record);
            }
        }
        best.sort_by_key(|r| (r.exercise_id, r.record_type));
        Ok(best)
    }

    /// Chronological progression of one record type
    pub fn record_history(&self, exercise_id: i64, record_type: RecordType) -> Result<Vec<PersonalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM personal_records
             WHERE exercise_id = ?1 AND record_type = ?2
             ORDER BY date ASC, id ASC",
            RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![exercise_id, record_type.as_str()], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Most recently set records across all exercises
    pub fn recent_records(&self, limit: usize) -> Result<Vec<PersonalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM personal_records ORDER BY date DESC, id DESC LIMIT ?1",
            RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![limit as i64], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn delete_record(&self, id: i64) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM personal_records WHERE id = ?1", params![id])?;
        if deleted > 0 {
            info!("Deleted personal record {}", id);
        }
        Ok(deleted > 0)
    }
}

impl RecordStore for Database {
    fn current_best(&self, exercise_id: i64, record_type: RecordType) -> Result<Option<f64>> {
        let best: Option<f64> = self.conn.query_row(
            "SELECT MAX(value) FROM personal_records WHERE exercise_id = ?1 AND record_type = ?2",
            params![exercise_id, record_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(best)
    }

    fn insert_record(&self, record: &NewRecord) -> Result<PersonalRecord> {
        if !(record.value > 0.0) {
            bail!("record value must be positive, got {}", record.value);
        }
        self.conn.execute(
            "INSERT INTO personal_records (exercise_id, record_type, value, weight, reps, date, workout_id, set_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.exercise_id,
                record.record_type.as_str(),
                record.value,
                record.weight,
                record.reps,
                format_ts(&record.date),
                record.workout_id,
                record.set_id,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(PersonalRecord {
            id,
            exercise_id: record.exercise_id,
            record_type: record.record_type,
            value: record.value,
            weight: record.weight,
            reps: record.reps,
            date: record.date,
            workout_id: record.workout_id,
            set_id: record.set_id,
        })
    }
}
