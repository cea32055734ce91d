//! Key/value settings table

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use super::{Database, format_ts, parse_ts};

#[derive(Debug, Clone)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Insert or update; an absent description keeps the stored one
    pub fn put_setting(&self, key: &str, value: &str, description: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value, description, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                description = COALESCE(excluded.description, settings.description),
                updated_at = excluded.updated_at",
            params![key, value, description, format_ts(&Utc::now())],
        )?;
        Ok(())
    }

    pub fn stored_settings(&self) -> Result<Vec<Setting>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, description, updated_at FROM settings ORDER BY key")?;
        let settings = stmt
            .query_map([], |row| {
                let updated_at: String = row.get(3)?;
                Ok(Setting {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    description: row.get(2)?,
                    updated_at: parse_ts(3, &updated_at)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(settings)
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        Ok(self.conn.execute("DELETE FROM settings WHERE key = ?1", params![key])? > 0)
    }

    pub fn clear_settings(&self) -> Result<()> {
        self.conn.execute("DELETE FROM settings", [])?;
        Ok(())
    }
}
