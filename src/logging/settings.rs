// SPDX-License-Identifier: Apache-2.0 OR MIT
// Process-wide logging settings: lock-free reads, setter-only writes

use super::destination::{Destination, DestinationMask};
use super::error::LoggingError;
use super::severity::{Severity, DEFAULT_SEVERITY_NAMES, NUM_SEVERITIES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicPtr, AtomicU32, Ordering};
use std::sync::Mutex;

/// Log file used when FILE is requested without a path
pub const DEFAULT_LOG_FILE: &str = "debug.log";

type NameTable = [&'static str; NUM_SEVERITIES];

/// Plain settings value, passed to `init` and returned by snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Path of the log file (used when `dest` has FILE)
    pub log_file_path: Option<PathBuf>,
    /// Records below this severity are dropped
    pub min_level: Severity,
    /// Records at or above this severity reach stderr unless another
    /// non-file sink is configured
    pub always_print_level: Severity,
    pub dest: DestinationMask,
    pub process_id: bool,
    pub thread_id: bool,
    pub timestamp: bool,
    pub tickcount: bool,
    /// Optional alphanumeric token written before each line
    pub prefix: Option<String>,
    pub severity_names: [String; NUM_SEVERITIES],
    /// Append a backtrace to the fatal banner output
    pub fatal_backtrace: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_file_path: None,
            min_level: Severity::INFO,
            always_print_level: Severity::ERROR,
            dest: DestinationMask::DEFAULT,
            process_id: true,
            thread_id: true,
            timestamp: true,
            tickcount: false,
            prefix: None,
            severity_names: DEFAULT_SEVERITY_NAMES.map(str::to_string),
            fatal_backtrace: false,
        }
    }
}

impl LoggingSettings {
    /// Settings that write only to stderr, with every optional prefix item off
    pub fn stderr_only() -> Self {
        Self {
            dest: DestinationMask::STDERR,
            process_id: false,
            thread_id: false,
            timestamp: false,
            ..Self::default()
        }
    }

    /// Log file path, falling back to `debug.log`
    pub fn effective_log_file(&self) -> PathBuf {
        self.log_file_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }
}

/// Keep only ASCII letters and digits.
///
/// Returns `InvalidPrefix` when nothing is left.
pub fn sanitize_prefix(prefix: &str) -> Result<String, LoggingError> {
    let clean: String = prefix.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if clean.is_empty() {
        return Err(LoggingError::InvalidPrefix {
            prefix: prefix.to_string(),
        });
    }
    Ok(clean)
}

/// Snapshot of the prefix-related toggles, read once per record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogItems {
    pub process_id: bool,
    pub thread_id: bool,
    pub timestamp: bool,
    pub tickcount: bool,
}

const ITEM_PID: u32 = 1 << 0;
const ITEM_TID: u32 = 1 << 1;
const ITEM_TIMESTAMP: u32 = 1 << 2;
const ITEM_TICKCOUNT: u32 = 1 << 3;

impl LogItems {
    const fn to_bits(self) -> u32 {
        (if self.process_id { ITEM_PID } else { 0 })
            | (if self.thread_id { ITEM_TID } else { 0 })
            | (if self.timestamp { ITEM_TIMESTAMP } else { 0 })
            | (if self.tickcount { ITEM_TICKCOUNT } else { 0 })
    }

    const fn from_bits(bits: u32) -> Self {
        Self {
            process_id: bits & ITEM_PID != 0,
            thread_id: bits & ITEM_TID != 0,
            timestamp: bits & ITEM_TIMESTAMP != 0,
            tickcount: bits & ITEM_TICKCOUNT != 0,
        }
    }
}

/// Live settings shared by every producer.
///
/// Every field is an atomic word, so readers never lock. String fields are
/// interned into leaked `'static` storage; they change rarely (init and
/// `set_log_prefix`), so the leak is bounded by the number of updates.
pub struct Settings {
    min_level: AtomicI32,
    always_print_level: AtomicI32,
    dest: AtomicU32,
    items: AtomicU32,
    fatal_backtrace: AtomicBool,
    /// Null means no prefix
    prefix: AtomicPtr<&'static str>,
    /// Null means the default name table
    names: AtomicPtr<NameTable>,
    /// Only touched by init and snapshots, never on the emission path
    log_file_path: Mutex<Option<PathBuf>>,
}

impl Settings {
    /// Defaults matching `LoggingSettings::default()`; usable in statics
    pub const fn new() -> Self {
        Self {
            min_level: AtomicI32::new(Severity::INFO.as_i32()),
            always_print_level: AtomicI32::new(Severity::ERROR.as_i32()),
            dest: AtomicU32::new(DestinationMask::DEFAULT.bits()),
            items: AtomicU32::new(ITEM_PID | ITEM_TID | ITEM_TIMESTAMP),
            fatal_backtrace: AtomicBool::new(false),
            prefix: AtomicPtr::new(ptr::null_mut()),
            names: AtomicPtr::new(ptr::null_mut()),
            log_file_path: Mutex::new(None),
        }
    }

    /// Build live settings from a value
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self, LoggingError> {
        let live = Self::new();
        live.apply(settings)?;
        Ok(live)
    }

    /// Replace every field. Levels are clamped into range; the prefix is
    /// sanitized and rejected if nothing alphanumeric remains.
    pub fn apply(&self, settings: &LoggingSettings) -> Result<(), LoggingError> {
        let prefix = settings.prefix.as_deref().map(sanitize_prefix).transpose()?;

        self.set_min_level(settings.min_level);
        self.always_print_level.store(
            settings.always_print_level.clamp_named().as_i32(),
            Ordering::Relaxed,
        );
        self.dest.store(settings.dest.bits(), Ordering::Relaxed);
        self.set_log_items(LogItems {
            process_id: settings.process_id,
            thread_id: settings.thread_id,
            timestamp: settings.timestamp,
            tickcount: settings.tickcount,
        });
        self.fatal_backtrace
            .store(settings.fatal_backtrace, Ordering::Relaxed);
        self.store_prefix(prefix);
        self.store_names(&settings.severity_names);
        *self
            .log_file_path
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = settings.log_file_path.clone();
        Ok(())
    }

    /// Snapshot as a plain value
    pub fn snapshot(&self) -> LoggingSettings {
        let items = self.log_items();
        LoggingSettings {
            log_file_path: self
                .log_file_path
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone(),
            min_level: self.min_level(),
            always_print_level: self.always_print_level(),
            dest: self.dest(),
            process_id: items.process_id,
            thread_id: items.thread_id,
            timestamp: items.timestamp,
            tickcount: items.tickcount,
            prefix: self.prefix().map(str::to_string),
            severity_names: self.severity_names().map(str::to_string),
            fatal_backtrace: self.fatal_backtrace(),
        }
    }

    /// Set the minimum level, clamped to at most FATAL.
    ///
    /// Negative values enable verbose levels.
    pub fn set_min_level(&self, level: Severity) {
        let level = level.min(Severity::FATAL);
        self.min_level.store(level.as_i32(), Ordering::Relaxed);
    }

    #[inline]
    pub fn min_level(&self) -> Severity {
        Severity::from_i32(self.min_level.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn always_print_level(&self) -> Severity {
        Severity::from_i32(self.always_print_level.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn dest(&self) -> DestinationMask {
        DestinationMask::from_bits_truncate(self.dest.load(Ordering::Relaxed))
    }

    pub fn set_dest(&self, dest: DestinationMask) {
        self.dest.store(dest.bits(), Ordering::Relaxed);
    }

    pub fn set_log_items(&self, items: LogItems) {
        self.items.store(items.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn log_items(&self) -> LogItems {
        LogItems::from_bits(self.items.load(Ordering::Relaxed))
    }

    pub fn fatal_backtrace(&self) -> bool {
        self.fatal_backtrace.load(Ordering::Relaxed)
    }

    /// Set or clear the line prefix. See [`sanitize_prefix`].
    pub fn set_log_prefix(&self, prefix: Option<&str>) -> Result<(), LoggingError> {
        let prefix = prefix.map(sanitize_prefix).transpose()?;
        self.store_prefix(prefix);
        Ok(())
    }

    #[inline]
    pub fn prefix(&self) -> Option<&'static str> {
        let ptr = self.prefix.load(Ordering::Acquire);
        // SAFETY: non-null pointers come from Box::leak in store_prefix and
        // are never freed
        unsafe { ptr.as_ref().copied() }
    }

    fn store_prefix(&self, prefix: Option<String>) {
        if self.prefix() == prefix.as_deref() {
            return;
        }
        let ptr = match prefix {
            Some(p) => {
                let text: &'static str = Box::leak(p.into_boxed_str());
                Box::leak(Box::new(text)) as *mut &'static str
            }
            None => ptr::null_mut(),
        };
        self.prefix.store(ptr, Ordering::Release);
    }

    /// Current severity name table
    #[inline]
    pub fn severity_names(&self) -> &'static NameTable {
        let ptr = self.names.load(Ordering::Acquire);
        // SAFETY: non-null pointers come from Box::leak in store_names and
        // are never freed
        unsafe { ptr.as_ref() }.unwrap_or(&DEFAULT_SEVERITY_NAMES)
    }

    fn store_names(&self, names: &[String; NUM_SEVERITIES]) {
        let current = self.severity_names();
        if current.iter().zip(names.iter()).all(|(a, b)| *a == b.as_str()) {
            return;
        }
        let table: NameTable = std::array::from_fn(|i| {
            let name: &'static str = Box::leak(names[i].clone().into_boxed_str());
            name
        });
        self.names
            .store(Box::leak(Box::new(table)) as *mut NameTable, Ordering::Release);
    }

    /// The cheap gate evaluated before a record is built.
    ///
    /// False below the minimum level; otherwise true unless no destination is
    /// configured and the severity is below the always-print level.
    #[inline]
    pub fn should_create_log_message(&self, severity: Severity) -> bool {
        if severity < self.min_level() {
            return false;
        }
        !self.dest().is_none() || severity >= self.always_print_level()
    }

    /// True when STDERR is configured, or when `severity` is at or above the
    /// always-print level and nothing but FILE is configured.
    #[inline]
    pub fn should_also_stderr(&self, severity: Severity) -> bool {
        let dest = self.dest();
        if dest.contains(Destination::Stderr) {
            return true;
        }
        severity >= self.always_print_level() && dest.without(Destination::File).is_none()
    }

    /// Sinks a record of `severity` goes to; empty when suppressed
    pub fn routes(&self, severity: Severity) -> DestinationMask {
        if !self.should_create_log_message(severity) {
            return DestinationMask::NONE;
        }
        let dest = self.dest();
        let mut routes = DestinationMask::NONE;
        if dest.contains(Destination::File) {
            routes |= DestinationMask::FILE;
        }
        if dest.contains(Destination::SystemDebug) {
            routes |= DestinationMask::SYSTEM_DEBUG;
        }
        if self.should_also_stderr(severity) {
            routes |= DestinationMask::STDERR;
        }
        routes
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
