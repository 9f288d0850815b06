// SPDX-License-Identifier: Apache-2.0 OR MIT
// Line header rendering: `[PREFIX:][TICK ]<LEVEL> PROG[PID]: [NAME(TID) - ]FILE(FUNC-LINE)] `

use super::platform;
use super::settings::Settings;
use super::severity::Severity;
use chrono::Local;
use std::fmt::{self, Write};

/// Length of a rendered timestamp, `2024-01-02T03:04:05.123456+08:00 `
pub const TIMESTAMP_LEN: usize = 33;

/// Where a record was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Basename only
    pub file: &'static str,
    pub func: &'static str,
    pub line: u32,
}

impl SourceLocation {
    /// Build a location, trimming `file` to its basename
    pub fn new(file: &'static str, func: &'static str, line: u32) -> Self {
        Self {
            file: platform::basename(file),
            func,
            line,
        }
    }
}

/// Fixed-capacity text buffer on the stack.
///
/// Writes past capacity are truncated at a character boundary and reported as
/// `fmt::Error`, so formatting never allocates.
pub struct StackBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> StackBuf<N> {
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    pub fn as_str(&self) -> &str {
        // Only whole &str pieces are ever copied in
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<const N: usize> Default for StackBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Write for StackBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = N - self.len;
        if s.len() <= room {
            self.buf[self.len..self.len + s.len()].copy_from_slice(s.as_bytes());
            self.len += s.len();
            return Ok(());
        }
        let mut cut = room;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buf[self.len..self.len + cut].copy_from_slice(&s.as_bytes()[..cut]);
        self.len += cut;
        Err(fmt::Error)
    }
}

impl<const N: usize> fmt::Debug for StackBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StackBuf").field(&self.as_str()).finish()
    }
}

/// Buffer sized for one timestamp
pub type TimestampBuf = StackBuf<48>;

/// Render the current local time as `YYYY-MM-DDThh:mm:ss.uuuuuu+HH:MM `
/// (note the trailing space) into `out`, replacing its contents.
pub fn render_timestamp(out: &mut TimestampBuf) {
    out.clear();
    let now = Local::now();
    // Formatting only fails on overflow, which the buffer size rules out
    let _ = write!(out, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6f%:z"));
}

/// Render the header for one record into `out`.
///
/// Reads the prefix token, toggles and name table from `settings` once.
pub fn write_prefix<W: Write>(
    out: &mut W,
    settings: &Settings,
    severity: Severity,
    loc: &SourceLocation,
) -> fmt::Result {
    let items = settings.log_items();

    if let Some(prefix) = settings.prefix() {
        out.write_str(prefix)?;
        out.write_char(':')?;
    }
    if items.tickcount {
        write!(out, "{} ", platform::tick_count_us())?;
    }

    out.write_char('<')?;
    out.write_str(severity.name_in(settings.severity_names()))?;
    if severity.is_verbose() {
        write!(out, "{}", severity.verbose_level())?;
    }
    out.write_char('>')?;

    out.write_char(' ')?;
    out.write_str(platform::program_name())?;
    if items.process_id {
        write!(out, "[{}]", platform::process_id())?;
    }
    out.write_str(": [")?;

    if items.thread_id {
        let mut name = [0u8; platform::THREAD_NAME_LEN];
        let name = platform::thread_name(&mut name);
        write!(out, "{}({}) - ", name, platform::thread_id())?;
    }
    write!(out, "{}({}-{})] ", loc.file, loc.func, loc.line)
}
