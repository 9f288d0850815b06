// SPDX-License-Identifier: Apache-2.0 OR MIT
// Dedicated flushers that drain the ReadyList off the producer threads

use super::logger::Logger;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default time between drains
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(5);

/// Background flusher on a plain thread
///
/// `L` is anything that derefs to a [`Logger`]: `&'static Logger` for the
/// global instance or `Arc<Logger>` for a private one.
pub struct Flusher<L> {
    logger: L,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl<L> Flusher<L>
where
    L: Deref<Target = Logger> + Send + 'static,
{
    pub fn new(logger: L, interval: Duration) -> Self {
        Self {
            logger,
            interval,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get a handle to stop the flusher; store `false` to stop it
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run until stopped (blocks)
    pub fn run(self) {
        while self.running.load(Ordering::Relaxed) {
            if self.logger.emitter().pending() > 0 {
                self.logger.flush();
            } else {
                std::thread::sleep(self.interval);
            }
        }

        // Final flush
        self.logger.flush();
    }

    /// Run on a new thread named `log-flusher`
    pub fn spawn(self) -> std::io::Result<std::thread::JoinHandle<()>> {
        std::thread::Builder::new()
            .name("log-flusher".to_string())
            .spawn(move || self.run())
    }
}

/// Background flusher as a tokio task
pub struct AsyncFlusher<L> {
    logger: L,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl<L> AsyncFlusher<L>
where
    L: Deref<Target = Logger> + Send + Sync + 'static,
{
    pub fn new(logger: L, interval: Duration) -> Self {
        Self {
            logger,
            interval,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get a handle to stop the flusher; store `false` to stop it
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run the flusher task (returns once stopped)
    ///
    /// Draining takes the sink mutexes, so each pass runs on the blocking
    /// pool rather than on a runtime worker.
    pub async fn run(self) {
        let logger = Arc::new(self.logger);
        while self.running.load(Ordering::Relaxed) {
            if logger.emitter().pending() > 0 {
                let logger = Arc::clone(&logger);
                let _ = tokio::task::spawn_blocking(move || logger.flush()).await;
            } else {
                tokio::time::sleep(self.interval).await;
            }
        }

        // Final flush
        logger.flush();
    }
}
