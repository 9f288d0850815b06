// SPDX-License-Identifier: Apache-2.0 OR MIT
// Line atomicity and ordering under concurrent producers

use super::common::{
    assert_child_ok, child_program_name, is_timestamp, log_lines, run_as_child, spawn_child,
    spawn_child_with_env,
};
use linelog::logging::{self, platform, DestinationMask, LoggingSettings, Severity};
use std::collections::HashMap;

const THREADS: usize = 3;
const PER_THREAD: usize = 20;

/// Parsed form of `TS <info> PROG[PID]: [NAME(TID) - FILE(FUNC-LINE)] MSG`
struct ParsedLine {
    pid: u32,
    thread_name: String,
    tid: u32,
    message: String,
}

fn parse_full_line(line: &str, program: &str) -> Option<ParsedLine> {
    let ts = line.get(..33)?;
    let rest = line.get(33..)?;
    if !is_timestamp(ts) {
        return None;
    }
    let rest = rest.strip_prefix("<info> ")?;
    let rest = rest.strip_prefix(program)?;
    let rest = rest.strip_prefix('[')?;
    let (pid, rest) = rest.split_once("]: [")?;
    let (thread_name, rest) = rest.split_once('(')?;
    let (tid, rest) = rest.split_once(") - ")?;
    let (location, message) = rest.split_once(")] ")?;
    if location.contains('/') || !location.starts_with("concurrency.rs(") {
        return None;
    }
    Some(ParsedLine {
        pid: pid.parse().ok()?,
        thread_name: thread_name.to_string(),
        tid: tid.parse().ok()?,
        message: message.to_string(),
    })
}

#[test]
fn threads_with_full_header() {
    if run_as_child("concurrency::threads_with_full_header", || {
        let settings = LoggingSettings {
            dest: DestinationMask::STDERR,
            process_id: true,
            thread_id: true,
            timestamp: true,
            ..LoggingSettings::default()
        };
        assert!(logging::init(&settings));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                std::thread::Builder::new()
                    .name(format!("worker-{}", t))
                    .spawn(move || {
                        for i in 0..PER_THREAD {
                            platform::random_sleep();
                            linelog::log!(INFO, "t{} record {}", t, i);
                        }
                    })
                    .unwrap()
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }) {
        return;
    }

    let out = spawn_child("concurrency::threads_with_full_header");
    assert_child_ok(&out);

    let program = child_program_name();
    let lines = log_lines(&out, "<info> ");
    assert_eq!(lines.len(), THREADS * PER_THREAD);

    // All lines come from one child, so they share the first line's pid
    let child_pid = parse_full_line(&lines[0], &program).map(|p| p.pid);
    assert!(child_pid.is_some_and(|pid| pid != std::process::id()));

    let mut per_thread: HashMap<String, Vec<usize>> = HashMap::new();
    let mut tids: HashMap<String, u32> = HashMap::new();
    for line in &lines {
        let parsed = parse_full_line(line, &program).unwrap_or_else(|| panic!("bad line: {:?}", line));
        assert_eq!(Some(parsed.pid), child_pid);
        let (tag, seq) = parsed.message.split_once(" record ").expect("message shape");
        assert_eq!(parsed.thread_name, format!("worker-{}", &tag[1..]));
        assert_eq!(*tids.entry(tag.to_string()).or_insert(parsed.tid), parsed.tid);
        per_thread
            .entry(tag.to_string())
            .or_default()
            .push(seq.parse().unwrap());
    }

    assert_eq!(per_thread.len(), THREADS);
    for seqs in per_thread.values() {
        assert_eq!(*seqs, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn thousand_sequential_records() {
    if run_as_child("concurrency::thousand_sequential_records", || {
        let settings = LoggingSettings {
            dest: DestinationMask::STDERR,
            ..LoggingSettings::default()
        };
        assert!(logging::init(&settings));
        let start = std::time::Instant::now();
        for i in 0..1000 {
            linelog::log!(INFO, "seq {}", i);
        }
        // Generous bound: a few ms per record even on a loaded CI machine
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }) {
        return;
    }

    let out = spawn_child("concurrency::thousand_sequential_records");
    assert_child_ok(&out);
    let lines = log_lines(&out, "] seq ");
    assert_eq!(lines.len(), 1000);
    for (i, line) in lines.iter().enumerate() {
        assert!(line.ends_with(&format!("] seq {}", i)), "{}", line);
    }
}

#[test]
fn file_and_stderr_agree_on_order() {
    if run_as_child("concurrency::file_and_stderr_agree_on_order", || {
        let path = std::env::var("LINELOG_TEST_FILE").expect("file path");
        let settings = LoggingSettings {
            dest: DestinationMask::FILE | DestinationMask::STDERR,
            log_file_path: Some(path.into()),
            timestamp: false,
            ..LoggingSettings::default()
        };
        assert!(logging::init(&settings));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                std::thread::spawn(move || {
                    for i in 0..250 {
                        linelog::log!(INFO, "multi t{} n{}", t, i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = logging::Logger::global().stats();
        assert_eq!(stats.queued + stats.fallback_writes, 1000);
    }) {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multi.log");
    let out = spawn_child_with_env(
        "concurrency::file_and_stderr_agree_on_order",
        &[("LINELOG_TEST_FILE", path.as_os_str())],
    );
    assert_child_ok(&out);

    let from_stderr = log_lines(&out, "] multi ");
    let file = std::fs::read_to_string(&path).unwrap();
    let from_file: Vec<String> = file.lines().map(str::to_string).collect();

    assert_eq!(from_stderr.len(), 1000);
    assert_eq!(from_file, from_stderr);
    assert!(file.ends_with('\n'));
}

#[test]
fn severity_ordering_is_total() {
    // Sanity check on the levels the scenarios above rely on
    assert!(Severity::verbose(1) < Severity::DEBUG);
    assert!(Severity::INFO < Severity::WARNING);
    assert!(Severity::ERROR < Severity::FATAL);
}
