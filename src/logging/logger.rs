// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logger: one Settings + one Emitter, and the process-wide instance

use super::arena::DEFAULT_SLOTS;
use super::destination::{Destination, DestinationMask};
use super::emitter::{Emitter, StatsSnapshot};
use super::error::LoggingError;
use super::record::LogRecord;
use super::settings::{LogItems, LoggingSettings, Settings};
use super::severity::Severity;
use super::sink::{FileSink, LogSink};
use crate::config::LoggingConfig;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

/// Settings plus the emitter writing to the configured sinks.
///
/// Most programs use [`Logger::global`] through the free functions in this
/// module and the `log!` macros. Separate instances are useful for tests and
/// for embedding with custom sinks.
pub struct Logger {
    settings: Settings,
    emitter: Emitter,
    /// Path of the open file sink, if any
    file_path: Mutex<Option<PathBuf>>,
}

static GLOBAL: OnceLock<Logger> = OnceLock::new();

impl Logger {
    /// Default settings, stderr and syslog sinks, no file
    pub fn new() -> Self {
        Self {
            settings: Settings::new(),
            emitter: Emitter::new(),
            file_path: Mutex::new(None),
        }
    }

    /// The process-wide logger, created with defaults on first use and
    /// never dropped
    pub fn global() -> &'static Logger {
        GLOBAL.get_or_init(Logger::new)
    }

    /// Logger with explicit sinks. `settings.log_file_path` is ignored; the
    /// given `file` sink (if any) receives FILE output.
    pub fn with_sinks(
        settings: &LoggingSettings,
        file: Option<Box<dyn LogSink>>,
        system_debug: Option<Box<dyn LogSink>>,
        stderr: Option<Box<dyn LogSink>>,
    ) -> Result<Self, LoggingError> {
        Ok(Self {
            settings: Settings::from_settings(settings)?,
            emitter: Emitter::with_sinks(file, system_debug, stderr, DEFAULT_SLOTS),
            file_path: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Apply `settings` and open the log file when FILE is requested.
    ///
    /// Calling again re-routes: the file sink is reopened only when its path
    /// changes and closed when FILE is no longer requested. A file that cannot
    /// be opened is reported through an ERROR record and the error; other
    /// sinks keep working.
    pub fn init(&self, settings: &LoggingSettings) -> Result<(), LoggingError> {
        self.settings.apply(settings)?;

        let mut current = self
            .file_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !settings.dest.contains(Destination::File) {
            if current.take().is_some() {
                self.emitter.set_sink(Destination::File, None);
            }
            return Ok(());
        }

        let path = settings.effective_log_file();
        if current.as_ref() == Some(&path) {
            return Ok(());
        }

        match FileSink::open(&path) {
            Ok(sink) => {
                self.emitter.set_sink(Destination::File, Some(Box::new(sink)));
                *current = Some(path);
                Ok(())
            }
            Err(source) => {
                self.emitter.set_sink(Destination::File, None);
                *current = None;
                drop(current);

                let _ = LogRecord::new_in(self, file!(), "init", line!(), Severity::ERROR)
                    << "failed to open log file "
                    << path.display()
                    << ": "
                    << &source;
                Err(LoggingError::OpenLogFile { path, source })
            }
        }
    }

    /// Load a JSON5 config file and [`init`](Self::init) from it
    pub fn init_from_file(&self, path: &Path) -> Result<(), LoggingError> {
        let settings = LoggingConfig::load_from_file(path)?.into_settings()?;
        self.init(&settings)
    }

    #[inline]
    pub fn should_create_log_message(&self, severity: Severity) -> bool {
        self.settings.should_create_log_message(severity)
    }

    /// Hand a finished line to the emitter
    pub fn emit(&self, severity: Severity, payload: &[u8]) {
        self.emitter.emit(&self.settings, severity, payload);
    }

    /// Write out queued lines and flush every sink
    pub fn flush(&self) {
        self.emitter.flush(&self.settings);
    }

    /// Copy of the current settings
    pub fn logging_settings(&self) -> LoggingSettings {
        self.settings.snapshot()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.emitter.stats()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination alias: every sink
pub const LOG_TO_ALL: DestinationMask = DestinationMask::ALL;
/// Destination alias: syslog and stderr
pub const LOG_DEFAULT: DestinationMask = DestinationMask::DEFAULT;

/// Configure the global logger. Returns false if the prefix is invalid or the
/// log file cannot be opened; stderr stays usable either way.
pub fn init(settings: &LoggingSettings) -> bool {
    try_init(settings).is_ok()
}

/// Configure the global logger, reporting why it failed
pub fn try_init(settings: &LoggingSettings) -> Result<(), LoggingError> {
    Logger::global().init(settings)
}

/// Configure the global logger from a JSON5 config file
pub fn try_init_from_file(path: &Path) -> Result<(), LoggingError> {
    Logger::global().init_from_file(path)
}

/// Set the global minimum level (clamped to FATAL)
pub fn set_min_level(level: Severity) {
    Logger::global().settings().set_min_level(level);
}

pub fn get_min_level() -> Severity {
    Logger::global().settings().min_level()
}

/// Toggle the optional header items
pub fn set_log_items(process_id: bool, thread_id: bool, timestamp: bool, tickcount: bool) {
    Logger::global().settings().set_log_items(LogItems {
        process_id,
        thread_id,
        timestamp,
        tickcount,
    });
}

/// Set or clear the line prefix. Non-alphanumeric characters are dropped;
/// a prefix with nothing left is rejected and the old one kept.
pub fn set_log_prefix(prefix: Option<&str>) -> Result<(), LoggingError> {
    Logger::global().settings().set_log_prefix(prefix)
}

pub fn should_create_log_message(severity: Severity) -> bool {
    Logger::global().should_create_log_message(severity)
}

pub fn get_logging_settings() -> LoggingSettings {
    Logger::global().logging_settings()
}

/// Drain queued lines and flush sinks of the global logger
pub fn flush() {
    Logger::global().flush();
}
