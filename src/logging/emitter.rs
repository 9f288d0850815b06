// SPDX-License-Identifier: Apache-2.0 OR MIT
// Serializes finished lines from many producers onto the configured sinks
//
// Each sink sits behind its own mutex. Records that go to a single sink are
// written directly under that sink's lock. Records that go to several sinks,
// or that arrive while other lines are still queued, are published on the
// ReadyList and drained under all sink locks (taken in File, SystemDebug,
// Stderr order), so every sink sees the same line order.

use super::arena::{PendingLine, SlotArena, DEFAULT_SLOTS};
use super::destination::Destination;
#[cfg(test)]
use super::destination::DestinationMask;
use super::prefix::{render_timestamp, TimestampBuf};
use super::settings::Settings;
use super::severity::Severity;
use super::sink::{Line, LogSink, StderrSink, SyslogSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

type SinkSlot = Mutex<Option<Box<dyn LogSink>>>;

/// Emission counters, updated with relaxed atomics
#[derive(Debug, Default)]
pub struct EmitterStats {
    direct_writes: AtomicU64,
    queued: AtomicU64,
    drained: AtomicU64,
    fallback_writes: AtomicU64,
    write_errors: AtomicU64,
}

/// Point-in-time copy of [`EmitterStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Records written straight to their single sink
    pub direct_writes: u64,
    /// Records published on the ReadyList
    pub queued: u64,
    /// Queued records written out by a drain
    pub drained: u64,
    /// Records written to stderr because no slot was free
    pub fallback_writes: u64,
    /// Sink writes that failed (the line was truncated on that sink)
    pub write_errors: u64,
}

impl EmitterStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            direct_writes: self.direct_writes.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            fallback_writes: self.fallback_writes.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Sink fan-out plus the slot arena feeding it
pub struct Emitter {
    /// Indexed by `Destination::index()`
    sinks: [SinkSlot; 3],
    arena: SlotArena,
    stats: EmitterStats,
}

impl Emitter {
    /// Stderr and syslog sinks installed, no file sink, default arena size
    pub fn new() -> Self {
        Self::with_sinks(
            None,
            Some(Box::new(SyslogSink::new())),
            Some(Box::new(StderrSink::new())),
            DEFAULT_SLOTS,
        )
    }

    /// Build an emitter from explicit sinks
    pub fn with_sinks(
        file: Option<Box<dyn LogSink>>,
        system_debug: Option<Box<dyn LogSink>>,
        stderr: Option<Box<dyn LogSink>>,
        capacity: u32,
    ) -> Self {
        Self {
            sinks: [Mutex::new(file), Mutex::new(system_debug), Mutex::new(stderr)],
            arena: SlotArena::new(capacity),
            stats: EmitterStats::default(),
        }
    }

    /// Install or remove the sink for `dest`, returning the old one.
    ///
    /// Waits for any write in progress on that sink.
    pub fn set_sink(
        &self,
        dest: Destination,
        sink: Option<Box<dyn LogSink>>,
    ) -> Option<Box<dyn LogSink>> {
        std::mem::replace(&mut *self.lock(dest), sink)
    }

    pub fn has_sink(&self, dest: Destination) -> bool {
        self.lock(dest).is_some()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Lines waiting on the ReadyList
    pub fn pending(&self) -> u32 {
        self.arena.ready_len()
    }

    fn lock(&self, dest: Destination) -> MutexGuard<'_, Option<Box<dyn LogSink>>> {
        self.sinks[dest.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit one finished line (header, message and newline) of `severity`.
    ///
    /// Never fails; sink errors are counted in the stats.
    pub fn emit(&self, settings: &Settings, severity: Severity, payload: &[u8]) {
        let routes = settings.routes(severity);
        if routes.is_none() {
            return;
        }

        if routes.count() == 1 && !self.arena.has_ready() {
            if let Some(dest) = routes.iter().next() {
                self.write_direct(settings, dest, severity, payload);
                self.stats.direct_writes.fetch_add(1, Ordering::Relaxed);
            }
            return;
        }

        let line = PendingLine {
            severity,
            routes,
            payload: payload.into(),
        };
        match self.arena.publish(line) {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                self.flush_ready(settings);
            }
            Err(line) => {
                self.write_direct(settings, Destination::Stderr, line.severity, &line.payload);
                self.stats.fallback_writes.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn write_direct(&self, settings: &Settings, dest: Destination, severity: Severity, payload: &[u8]) {
        let mut guard = self.lock(dest);
        let Some(sink) = guard.as_mut() else {
            return;
        };
        let mut timestamp = TimestampBuf::new();
        if settings.log_items().timestamp {
            render_timestamp(&mut timestamp);
        }
        let line = Line {
            severity,
            timestamp: timestamp.as_str(),
            payload,
        };
        if sink.write_line(&line).is_err() {
            self.stats.write_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drain the ReadyList under every sink lock and write each line to its
    /// routes. Returns the number of lines drained.
    pub fn flush_ready(&self, settings: &Settings) -> usize {
        let mut guards = Destination::ALL.map(|dest| self.lock(dest));

        let with_timestamp = settings.log_items().timestamp;
        let mut timestamp = TimestampBuf::new();
        let drained = self.arena.drain_ready(|pending| {
            timestamp.clear();
            if with_timestamp {
                render_timestamp(&mut timestamp);
            }
            let line = Line {
                severity: pending.severity,
                timestamp: timestamp.as_str(),
                payload: &pending.payload,
            };
            for dest in pending.routes.iter() {
                if let Some(sink) = guards[dest.index()].as_mut() {
                    if sink.write_line(&line).is_err() {
                        self.stats.write_errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });
        self.stats.drained.fetch_add(drained as u64, Ordering::Relaxed);
        drained
    }

    /// Drain queued lines, then flush every sink
    pub fn flush(&self, settings: &Settings) {
        self.flush_ready(settings);
        for dest in Destination::ALL {
            if let Some(sink) = self.lock(dest).as_mut() {
                sink.flush();
            }
        }
    }

    /// Publish a line without draining, for exercising the drain paths
    #[cfg(test)]
    pub(crate) fn publish_only(&self, severity: Severity, routes: DestinationMask, payload: &[u8]) -> bool {
        self.arena
            .publish(PendingLine {
                severity,
                routes,
                payload: payload.into(),
            })
            .is_ok()
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}
