//! Configuration - database location and user settings stored in the database

use std::path::PathBuf;

use anyhow::{Result, bail};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::db::Database;

/// Database file used when neither `--db` nor `LIFT_DB_PATH` is given
pub fn default_db_path() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".lift").join("lift.db"))
        .unwrap_or_else(|| PathBuf::from("lift.db"))
}

/// Known settings: key, default value, description
pub const DEFAULT_SETTINGS: &[(&str, &str, &str)] = &[
    ("weight_unit", "lbs", "Unit shown next to weights (lbs or kg)"),
    ("enable_rpe", "true", "Record RPE when given as the third token of a set"),
    ("rest_timer_seconds", "90", "Rest hint shown after each set, in seconds"),
    ("auto_detect_pr", "true", "Detect personal records when a workout is finished"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Lbs,
    Kg,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Lbs => "lbs",
            WeightUnit::Kg => "kg",
        }
    }
}

/// Typed view of the settings table
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub weight_unit: WeightUnit,
    pub rpe_enabled: bool,
    pub rest_timer_seconds: u32,
    pub auto_detect_pr: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weight_unit: WeightUnit::Lbs,
            rpe_enabled: true,
            rest_timer_seconds: 90,
            auto_detect_pr: true,
        }
    }
}

impl Settings {
    pub fn load(db: &Database) -> Result<Self> {
        Ok(Self {
            weight_unit: match get_setting(db, "weight_unit")?.as_str() {
                "kg" => WeightUnit::Kg,
                _ => WeightUnit::Lbs,
            },
            rpe_enabled: parse_bool(&get_setting(db, "enable_rpe")?)?,
            rest_timer_seconds: get_setting(db, "rest_timer_seconds")?.parse()?,
            auto_detect_pr: parse_bool(&get_setting(db, "auto_detect_pr")?)?,
        })
    }
}

fn default_for(key: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    DEFAULT_SETTINGS.iter().find(|(k, _, _)| *k == key)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("expected true or false, got '{}'", other),
    }
}

/// Check a value before storing it; returns the normalized form
pub fn validate_setting(key: &str, value: &str) -> Result<String> {
    let value = value.trim();
    match key {
        "weight_unit" => match value.to_lowercase().as_str() {
            "lbs" | "lb" => Ok("lbs".to_string()),
            "kg" | "kgs" => Ok("kg".to_string()),
            _ => bail!("weight_unit must be lbs or kg"),
        },
        "enable_rpe" | "auto_detect_pr" => Ok(parse_bool(value)?.to_string()),
        "rest_timer_seconds" => match value.parse::<u32>() {
            Ok(secs) if secs <= 3600 => Ok(secs.to_string()),
            _ => bail!("rest_timer_seconds must be a number of seconds up to 3600"),
        },
        _ => bail!("unknown setting: {}", key),
    }
}

/// Stored value, or the default for a known key
pub fn get_setting(db: &Database, key: &str) -> Result<String> {
    let Some((_, default, _)) = default_for(key) else {
        bail!("unknown setting: {}", key);
    };
    Ok(db.get_setting(key)?.unwrap_or_else(|| default.to_string()))
}

pub fn set_setting(db: &Database, key: &str, value: &str) -> Result<String> {
    let normalized = validate_setting(key, value)?;
    let description = default_for(key).map(|(_, _, d)| *d);
    db.put_setting(key, &normalized, description)?;
    Ok(normalized)
}

/// Every known setting with its effective value and whether it differs from the default
pub fn list_settings(db: &Database) -> Result<Vec<(&'static str, String, bool)>> {
    DEFAULT_SETTINGS
        .iter()
        .map(|(key, default, _)| {
            let value = get_setting(db, key)?;
            let customized = value != *default;
            Ok((*key, value, customized))
        })
        .collect()
}

pub fn reset_settings(db: &Database) -> Result<()> {
    db.clear_settings()?;
    for (key, value, description) in DEFAULT_SETTINGS {
        db.put_setting(key, value, Some(description))?;
    }
    Ok(())
}
