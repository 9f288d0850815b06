// SPDX-License-Identifier: Apache-2.0 OR MIT
// Byte-oriented log sinks

use super::platform::write_all_retry;
use super::severity::Severity;
use smallvec::SmallVec;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One finished record as handed to a sink
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub severity: Severity,
    /// Rendered timestamp with trailing space, or empty
    pub timestamp: &'a str,
    /// Header, message and trailing newline
    pub payload: &'a [u8],
}

impl Line<'_> {
    /// Timestamp and payload joined, on the stack for typical lines
    fn joined(&self) -> SmallVec<[u8; 512]> {
        let mut buf = SmallVec::with_capacity(self.timestamp.len() + self.payload.len());
        buf.extend_from_slice(self.timestamp.as_bytes());
        buf.extend_from_slice(self.payload);
        buf
    }
}

/// Output sink for finished lines.
///
/// Called with the sink's mutex held, so implementations need no locking of
/// their own. A failed write truncates that line only.
pub trait LogSink: Send {
    /// Write one line in full
    fn write_line(&mut self, line: &Line<'_>) -> io::Result<()>;

    /// Flush any buffered output
    fn flush(&mut self) {}
}

/// Standard error (fd 2), written with EINTR-safe raw writes
pub struct StderrSink;

impl StderrSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StderrSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for StderrSink {
    fn write_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        // SAFETY: fd 2 stays open for the life of the process
        let fd = unsafe { BorrowedFd::borrow_raw(libc::STDERR_FILENO) };
        write_all_retry(fd, &line.joined())
    }
}

/// Append-only log file
pub struct FileSink {
    file: File,
    path: PathBuf,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn write_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        write_all_retry(self.file.as_fd(), &line.joined())
    }

    fn flush(&mut self) {
        let _ = self.file.sync_data();
    }
}

/// System debug channel: syslog(3).
///
/// syslog stamps its own time, so the line timestamp is not forwarded.
pub struct SyslogSink;

impl SyslogSink {
    pub fn new() -> Self {
        Self
    }

    /// Map a severity onto a syslog priority
    pub fn priority(severity: Severity) -> libc::c_int {
        match severity {
            s if s >= Severity::FATAL => libc::LOG_CRIT,
            Severity::ERROR => libc::LOG_ERR,
            Severity::WARNING => libc::LOG_WARNING,
            Severity::INFO => libc::LOG_INFO,
            _ => libc::LOG_DEBUG,
        }
    }
}

impl Default for SyslogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for SyslogSink {
    fn write_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        let payload = line.payload.strip_suffix(b"\n").unwrap_or(line.payload);
        let text: Vec<u8> = payload.iter().map(|&b| if b == 0 { b' ' } else { b }).collect();
        let text = CString::new(text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        // SAFETY: both pointers are valid NUL-terminated strings and the
        // format string consumes exactly one %s argument
        unsafe {
            libc::syslog(
                Self::priority(line.severity),
                b"%s\0".as_ptr() as *const libc::c_char,
                text.as_ptr(),
            );
        }
        Ok(())
    }
}

/// In-memory sink sharing its buffer with the creator.
///
/// Used to embed the logger in tests or to capture output in-process.
#[derive(Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.buf
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Contents as lossy UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl LogSink for MemorySink {
    fn write_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        let mut buf = self
            .buf
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        buf.extend_from_slice(line.timestamp.as_bytes());
        buf.extend_from_slice(line.payload);
        Ok(())
    }
}
