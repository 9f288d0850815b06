// SPDX-License-Identifier: Apache-2.0 OR MIT
// Drive the logger from several threads, optionally from a config file
//
//   cargo run --example logging_demo -- --threads 4 --records 10 --dest all

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use linelog::logging::{self, AsyncFlusher, DestinationMask, Logger, LoggingSettings, Severity};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

#[derive(Parser, Debug)]
#[command(author, version, about = "linelog demo", long_about = None)]
struct Args {
    /// JSON5 logging config; overrides --dest and --min-level
    #[arg(long)]
    config: Option<PathBuf>,

    /// Producer threads
    #[arg(long, default_value_t = 3)]
    threads: usize,

    /// Records per thread
    #[arg(long, default_value_t = 5)]
    records: usize,

    #[arg(long, value_enum, default_value_t = Dest::Stderr)]
    dest: Dest,

    /// Minimum level (name, number or verboseN)
    #[arg(long, default_value = "info")]
    min_level: Severity,

    /// Finish with a failed check (exits with status 255)
    #[arg(long)]
    fatal: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum Dest {
    Stderr,
    Syslog,
    Default,
    All,
}

impl Dest {
    fn mask(self) -> DestinationMask {
        match self {
            Dest::Stderr => DestinationMask::STDERR,
            Dest::Syslog => DestinationMask::SYSTEM_DEBUG,
            Dest::Default => logging::LOG_DEFAULT,
            Dest::All => logging::LOG_TO_ALL,
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    match &args.config {
        Some(path) => logging::try_init_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => logging::try_init(&LoggingSettings {
            dest: args.dest.mask(),
            min_level: args.min_level,
            ..LoggingSettings::default()
        })?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let flusher = AsyncFlusher::new(Logger::global(), logging::DEFAULT_FLUSH_INTERVAL);
    let stop = flusher.stop_handle();
    let flusher = tokio::spawn(flusher.run());

    let producers: Vec<_> = (0..args.threads)
        .map(|t| {
            let records = args.records;
            std::thread::Builder::new()
                .name(format!("producer-{}", t))
                .spawn(move || {
                    for i in 0..records {
                        linelog::log!(INFO, "producer {} record {}", t, i);
                        linelog::vlog!(1, "producer {} detail {}", t, i);
                        linelog::log_if!(WARNING, i % 4 == 3, "producer {} every fourth: {}", t, i);
                    }
                })
        })
        .collect::<std::io::Result<_>>()?;
    for producer in producers {
        let _ = producer.join();
    }

    stop.store(false, Ordering::Relaxed);
    flusher.await?;

    let stats = Logger::global().stats();
    linelog::log!(
        INFO,
        "done: {} direct, {} queued, {} fallback, {} write errors",
        stats.direct_writes,
        stats.queued,
        stats.fallback_writes,
        stats.write_errors
    );

    let healthy = !args.fatal;
    linelog::check!(healthy, "--fatal requested");
    Ok(())
}
