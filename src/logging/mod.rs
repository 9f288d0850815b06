// SPDX-License-Identifier: Apache-2.0 OR MIT
// Process-local line logger
//
// Producers build a LogRecord on their own stack, render the header, stream
// the message and hand the finished line to the Emitter on drop. Lines bound
// for several sinks travel through a lock-free ReadyList over a fixed slot
// arena and are drained under the sink mutexes; when no slot is free the line
// goes straight to stderr.

mod arena;
mod destination;
mod emitter;
mod error;
mod fatal;
mod flusher;
mod logger;
#[macro_use]
mod macros;
pub mod platform;
mod prefix;
mod queue;
mod record;
mod settings;
mod severity;
mod sink;

// Public exports
pub use arena::{PendingLine, SlotArena, DEFAULT_SLOTS};
pub use destination::{Destination, DestinationMask};
pub use emitter::{Emitter, StatsSnapshot};
pub use error::LoggingError;
pub use fatal::{fatal_message, FATAL_BANNER, FATAL_EXIT_CODE};
pub use flusher::{AsyncFlusher, Flusher, DEFAULT_FLUSH_INTERVAL};
pub use logger::{
    flush, get_logging_settings, get_min_level, init, set_log_items, set_log_prefix,
    set_min_level, should_create_log_message, try_init, try_init_from_file, Logger, LOG_DEFAULT,
    LOG_TO_ALL,
};
pub use prefix::{render_timestamp, write_prefix, SourceLocation, StackBuf, TimestampBuf, TIMESTAMP_LEN};
pub use queue::{Chain, Head, IndexQueue, Linked, NULL_INDEX};
pub use record::{LineBuf, LogRecord, INLINE_LINE_BYTES};
pub use settings::{sanitize_prefix, LogItems, LoggingSettings, Settings, DEFAULT_LOG_FILE};
pub use severity::{ParseSeverityError, Severity, DEFAULT_SEVERITY_NAMES, NUM_SEVERITIES};
pub use sink::{FileSink, Line, LogSink, MemorySink, StderrSink, SyslogSink};
