// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logging configuration file (JSON5).
//!
//! Supports comments and trailing commas. Every field is optional; missing
//! fields take the logger defaults.
//!
//! ```json5
//! {
//!   min_level: "info",
//!   always_print_level: "error",
//!   destinations: ["stderr", "file"],
//!   log_file: "/var/log/app.log",
//!   prefix: "app",
//! }
//! ```

use crate::logging::{
    Destination, DestinationMask, LoggingSettings, Severity, NUM_SEVERITIES,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Logging configuration as stored in a file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Records below this level are dropped. Name or number; negative numbers
    /// and `verboseN` enable verbose levels.
    pub min_level: Severity,

    /// Records at or above this level reach stderr when no other non-file
    /// sink is configured
    pub always_print_level: Severity,

    /// Sinks to write to
    pub destinations: Vec<Destination>,

    /// Log file path, used when `destinations` includes `file`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    pub process_id: bool,
    pub thread_id: bool,
    pub timestamp: bool,
    pub tickcount: bool,

    /// Line prefix; ASCII letters and digits only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Replacement names for debug, info, warning, error, fatal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_names: Option<Vec<String>>,

    /// Print a backtrace with fatal records
    pub fatal_backtrace: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let defaults = LoggingSettings::default();
        Self {
            min_level: defaults.min_level,
            always_print_level: defaults.always_print_level,
            destinations: defaults.dest.iter().collect(),
            log_file: None,
            process_id: defaults.process_id,
            thread_id: defaults.thread_id,
            timestamp: defaults.timestamp,
            tickcount: defaults.tickcount,
            prefix: None,
            severity_names: None,
            fatal_backtrace: defaults.fatal_backtrace,
        }
    }
}

impl LoggingConfig {
    /// Load configuration from a JSON5 file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to pretty JSON (valid JSON5)
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_level > Severity::FATAL {
            return Err(ConfigError::InvalidSeverity {
                field: "min_level",
                value: self.min_level.as_i32(),
            });
        }
        if self.always_print_level.name_index().is_none() {
            return Err(ConfigError::InvalidSeverity {
                field: "always_print_level",
                value: self.always_print_level.as_i32(),
            });
        }

        if let Some(prefix) = &self.prefix {
            if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(ConfigError::InvalidPrefix {
                    prefix: prefix.clone(),
                });
            }
        }

        if let Some(names) = &self.severity_names {
            if names.len() != NUM_SEVERITIES {
                return Err(ConfigError::InvalidSeverityName {
                    reason: format!("expected {} names, got {}", NUM_SEVERITIES, names.len()),
                });
            }
            if let Some(idx) = names.iter().position(|n| n.trim().is_empty()) {
                return Err(ConfigError::InvalidSeverityName {
                    reason: format!("name {} is empty", idx),
                });
            }
        }

        Ok(())
    }

    /// Combined destination mask
    pub fn dest(&self) -> DestinationMask {
        self.destinations.iter().copied().collect()
    }

    /// Validate and convert to settings for `init`
    pub fn into_settings(self) -> Result<LoggingSettings, ConfigError> {
        self.validate()?;
        let dest = self.dest();
        let defaults = LoggingSettings::default();

        let severity_names = match self.severity_names {
            Some(names) => {
                let mut table = defaults.severity_names.clone();
                for (slot, name) in table.iter_mut().zip(names) {
                    *slot = name;
                }
                table
            }
            None => defaults.severity_names,
        };

        Ok(LoggingSettings {
            log_file_path: self.log_file,
            min_level: self.min_level,
            always_print_level: self.always_print_level,
            dest,
            process_id: self.process_id,
            thread_id: self.thread_id,
            timestamp: self.timestamp,
            tickcount: self.tickcount,
            prefix: self.prefix,
            severity_names,
            fatal_backtrace: self.fatal_backtrace,
        })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid prefix '{prefix}': only ASCII letters and digits are allowed")]
    InvalidPrefix { prefix: String },

    #[error("invalid {field} {value}: must be within debug..=fatal")]
    InvalidSeverity { field: &'static str, value: i32 },

    #[error("invalid severity_names: {reason}")]
    InvalidSeverityName { reason: String },
}
