// SPDX-License-Identifier: Apache-2.0 OR MIT
// Per-record builder: header, streamed message, emission on drop

use super::fatal;
use super::logger::Logger;
use super::platform::ErrnoGuard;
use super::prefix::{write_prefix, SourceLocation};
use super::severity::Severity;
use smallvec::SmallVec;
use std::fmt::{self, Write};
use std::ops::Shl;

/// Inline capacity of a line before it spills to the heap
pub const INLINE_LINE_BYTES: usize = 256;

/// Growable text buffer that stays on the stack for typical lines
#[derive(Default, Clone)]
pub struct LineBuf(SmallVec<[u8; INLINE_LINE_BYTES]>);

impl LineBuf {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Only &str pieces and '\n' are ever appended
        std::str::from_utf8(&self.0).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True once the line outgrew the inline buffer
    pub fn spilled(&self) -> bool {
        self.0.spilled()
    }

    fn push_newline(&mut self) {
        self.0.push(b'\n');
    }
}

impl Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl fmt::Debug for LineBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LineBuf").field(&self.as_str()).finish()
    }
}

/// One log record under construction.
///
/// Build it with [`LogRecord::new`] (or the `log!` family of macros), stream
/// text into it, and let it drop: the header, message and a newline are then
/// handed to the logger's emitter. A FATAL record terminates the process after
/// emission, even if emission panics.
///
/// Header rendering and emission each run with errno saved and cleared, and
/// restore it when done, so streamed arguments still see the caller's errno.
///
/// ```ignore
/// let _ = LogRecord::new(file!(), "main", line!(), Severity::INFO) << "started " << 3;
/// ```
pub struct LogRecord<'a> {
    logger: &'a Logger,
    buf: LineBuf,
    message_start: usize,
    location: SourceLocation,
    severity: Severity,
}

impl LogRecord<'static> {
    /// Record on the process-wide logger
    pub fn new(file: &'static str, func: &'static str, line: u32, severity: Severity) -> Self {
        LogRecord::new_in(Logger::global(), file, func, line, severity)
    }

    /// FATAL record on the process-wide logger, starting with
    /// `Check failed: <condition>. `
    pub fn check(file: &'static str, func: &'static str, line: u32, condition: &str) -> Self {
        LogRecord::check_in(Logger::global(), file, func, line, condition)
    }
}

impl<'a> LogRecord<'a> {
    pub fn new_in(
        logger: &'a Logger,
        file: &'static str,
        func: &'static str,
        line: u32,
        severity: Severity,
    ) -> Self {
        let _errno = ErrnoGuard::save_and_clear();
        let location = SourceLocation::new(file, func, line);
        let mut buf = LineBuf::new();
        let _ = write_prefix(&mut buf, logger.settings(), severity, &location);
        let message_start = buf.len();
        Self {
            logger,
            buf,
            message_start,
            location,
            severity,
        }
    }

    pub fn check_in(
        logger: &'a Logger,
        file: &'static str,
        func: &'static str,
        line: u32,
        condition: &str,
    ) -> Self {
        let mut record = Self::new_in(logger, file, func, line, Severity::FATAL);
        let _ = write!(record.buf, "Check failed: {}. ", condition);
        record
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Append formatted text; used by the macros
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        let _ = self.buf.write_fmt(args);
        self
    }

    /// Direct access to the text sink
    pub fn stream(&mut self) -> &mut LineBuf {
        &mut self.buf
    }

    /// Text streamed so far, without the header
    pub fn message(&self) -> &str {
        self.buf.as_str().get(self.message_start..).unwrap_or("")
    }

    /// Header plus message
    pub fn str(&self) -> &str {
        self.buf.as_str()
    }

    /// Byte offset where the message starts
    pub fn message_start(&self) -> usize {
        self.message_start
    }
}

impl Write for LogRecord<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.write_str(s)
    }
}

impl<'a, T: fmt::Display> Shl<T> for LogRecord<'a> {
    type Output = LogRecord<'a>;

    fn shl(mut self, value: T) -> Self::Output {
        let _ = write!(self.buf, "{}", value);
        self
    }
}

impl<T: fmt::Display> Shl<T> for &mut LogRecord<'_> {
    type Output = Self;

    fn shl(self, value: T) -> Self::Output {
        let _ = write!(self.buf, "{}", value);
        self
    }
}

/// Terminates the process when dropped, including during unwinding
struct FatalGuard<'b> {
    payload: &'b [u8],
    stack_start: usize,
    backtrace: bool,
}

impl Drop for FatalGuard<'_> {
    fn drop(&mut self) {
        fatal::handle(self.payload, self.stack_start, self.backtrace);
    }
}

impl Drop for LogRecord<'_> {
    fn drop(&mut self) {
        let _errno = ErrnoGuard::save_and_clear();
        let stack_start = self.buf.len();
        self.buf.push_newline();
        let payload = self.buf.as_bytes();

        let fatal = self.severity == Severity::FATAL;
        let _guard = fatal.then(|| FatalGuard {
            payload,
            stack_start,
            backtrace: self.logger.settings().fatal_backtrace(),
        });

        self.logger.emit(self.severity, payload);
        if fatal {
            self.logger.flush();
        }
    }
}
