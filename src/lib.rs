// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Process-local line logger.
//!
//! Records are built on the caller's stack, decorated with a syslog-style
//! header and written to stderr, a log file and/or syslog. Writes from many
//! threads are serialized per sink, so every line arrives whole.
//!
//! ```ignore
//! use linelog::logging::{self, LoggingSettings};
//!
//! logging::init(&LoggingSettings::default());
//! linelog::log!(INFO, "started with {} workers", 4);
//! linelog::check!(workers > 0, "no workers");
//! ```

pub mod config;
pub mod logging;

pub use config::{ConfigError, LoggingConfig};
pub use logging::{LogRecord, Logger, LoggingError, LoggingSettings, Severity};
