//! Clinic configuration.
//!
//! Loaded from JSON. Every field has a default, so `{}` is a valid
//! configuration.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::numbering::VISIT_NUMBER_SEQUENCE;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level clinic configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    /// SQLite file; `None` opens an in-memory database
    pub database_path: Option<String>,
    /// Name of the counter behind visit numbers
    pub visit_number_sequence: String,
    pub assignment: AssignmentConfig,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            visit_number_sequence: VISIT_NUMBER_SEQUENCE.to_string(),
            assignment: AssignmentConfig::default(),
        }
    }
}

/// Automatic nurse assignment settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssignmentConfig {
    /// Run the assignment engine after visit creation
    pub enabled: bool,
    /// Minutes of turnaround required between two visits of the same nurse.
    /// Zero means only truly overlapping visits conflict.
    pub buffer_minutes: i64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_minutes: 0,
        }
    }
}

/// Largest accepted turnaround buffer: one day.
pub const MAX_BUFFER_MINUTES: i64 = 24 * 60;

impl AssignmentConfig {
    /// The buffer as a duration, or `None` if it does not fit one.
    pub fn buffer(&self) -> Option<Duration> {
        Duration::try_minutes(self.buffer_minutes)
    }
}

impl ClinicConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: ClinicConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.visit_number_sequence.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "visit_number_sequence must not be empty".into(),
            ));
        }
        if !(0..=MAX_BUFFER_MINUTES).contains(&self.assignment.buffer_minutes) {
            return Err(ConfigError::Invalid(format!(
                "assignment.buffer_minutes must be between 0 and {}, got {}",
                MAX_BUFFER_MINUTES, self.assignment.buffer_minutes
            )));
        }
        Ok(())
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
