// SPDX-License-Identifier: Apache-2.0 OR MIT
// Severity levels for logging

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Number of named severities (DEBUG..=FATAL)
pub const NUM_SEVERITIES: usize = 5;

/// Default names, indexed by severity value
pub const DEFAULT_SEVERITY_NAMES: [&str; NUM_SEVERITIES] =
    ["debug", "info", "warning", "error", "fatal"];

/// Log severity (higher is more severe)
///
/// Negative values are verbose levels: `Severity::verbose(2)` is `-2` and
/// renders as `VERBOSE2`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Severity(i32);

impl Severity {
    /// Debugging detail
    pub const DEBUG: Severity = Severity(0);
    /// Normal operation
    pub const INFO: Severity = Severity(1);
    /// Something looks wrong but work continues
    pub const WARNING: Severity = Severity(2);
    /// Operation failed
    pub const ERROR: Severity = Severity(3);
    /// Process terminates after the record is written
    pub const FATAL: Severity = Severity(4);

    /// Create from a raw value
    #[inline]
    pub const fn from_i32(value: i32) -> Self {
        Severity(value)
    }

    /// Verbose level `n` (stored as `-n`)
    #[inline]
    pub const fn verbose(level: u16) -> Self {
        Severity(-(level as i32))
    }

    /// Get the raw value
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    pub const fn is_verbose(self) -> bool {
        self.0 < 0
    }

    /// Verbose level for negative severities, 0 otherwise
    pub const fn verbose_level(self) -> u32 {
        if self.0 < 0 {
            self.0.unsigned_abs()
        } else {
            0
        }
    }

    /// Index into a severity name table, if this is a named severity
    pub const fn name_index(self) -> Option<usize> {
        if self.0 >= 0 && (self.0 as usize) < NUM_SEVERITIES {
            Some(self.0 as usize)
        } else {
            None
        }
    }

    /// Resolve the display name against a name table
    pub fn name_in(self, names: &[&'static str; NUM_SEVERITIES]) -> &'static str {
        match self.name_index() {
            Some(idx) => names[idx],
            None if self.is_verbose() => "VERBOSE",
            None => "Unknown",
        }
    }

    /// Clamp into the named range (DEBUG..=FATAL)
    pub fn clamp_named(self) -> Self {
        Severity(self.0.clamp(Self::DEBUG.0, Self::FATAL.0))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_verbose() {
            write!(f, "VERBOSE{}", self.verbose_level())
        } else {
            f.write_str(self.name_in(&DEFAULT_SEVERITY_NAMES))
        }
    }
}

/// Error returned when a severity string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity '{0}'")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i32>() {
            return Ok(Severity(value));
        }

        let lower = trimmed.to_ascii_lowercase();
        if let Some(idx) = DEFAULT_SEVERITY_NAMES.iter().position(|n| *n == lower) {
            return Ok(Severity(idx as i32));
        }
        if let Some(level) = lower.strip_prefix("verbose") {
            if let Ok(level) = level.parse::<u16>() {
                return Ok(Severity::verbose(level));
            }
        }
        Err(ParseSeverityError(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeverityVisitor;

        impl<'de> Visitor<'de> for SeverityVisitor {
            type Value = Severity;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a severity number or name")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Severity, E> {
                i32::try_from(v)
                    .map(Severity)
                    .map_err(|_| E::custom(format!("severity {} out of range", v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Severity, E> {
                i32::try_from(v)
                    .map(Severity)
                    .map_err(|_| E::custom(format!("severity {} out of range", v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Severity, E> {
                // json5 reports every number as f64
                if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
                    Ok(Severity(v as i32))
                } else {
                    Err(E::custom(format!("severity {} is not an integer", v)))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Severity, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SeverityVisitor)
    }
}
