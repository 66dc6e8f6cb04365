//! JSON configuration for embedders and the CLI.
//!
//! # Invariants
//! - Every field is optional; a missing file section means built-in defaults.
//! - Unknown keys are rejected so typos surface at load time.
//! - A loaded config always carries a valid default color.

use crate::logging::{default_log_level, LogSettings, LoggingError};
use crate::model::routine::{RoutineColor, RoutineDefaults, DEFAULT_ROUTINE_ICON};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// `default_color` is not a known color token.
    InvalidColor(String),
    InvalidLogging(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidColor(token) => write!(f, "unknown default_color `{token}`"),
            Self::InvalidLogging(err) => write!(f, "invalid logging config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidColor(_) => None,
            Self::InvalidLogging(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::InvalidLogging(value)
    }
}

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file. `None` lets the caller decide.
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
    /// Absolute log directory. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub default_icon: String,
    pub default_color: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: None,
            log_dir: None,
            default_icon: DEFAULT_ROUTINE_ICON.to_string(),
            default_color: RoutineColor::default().as_str().to_string(),
        }
    }
}

impl CoreConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.routine_defaults()?;
        Ok(config)
    }

    /// Presentation defaults for new and imported routines.
    pub fn routine_defaults(&self) -> Result<RoutineDefaults, ConfigError> {
        let color = RoutineColor::parse(&self.default_color)
            .ok_or_else(|| ConfigError::InvalidColor(self.default_color.clone()))?;
        let icon = match self.default_icon.trim() {
            "" => DEFAULT_ROUTINE_ICON.to_string(),
            icon => icon.to_string(),
        };
        Ok(RoutineDefaults { icon, color })
    }

    /// Log settings when a log directory is configured.
    pub fn log_settings(&self) -> Result<Option<LogSettings>, ConfigError> {
        let Some(dir) = &self.log_dir else {
            return Ok(None);
        };
        let level = self.log_level.as_deref().unwrap_or(default_log_level());
        Ok(Some(LogSettings::new(level, dir)?))
    }
}
