// SPDX-License-Identifier: Apache-2.0 OR MIT
// End-to-end scenarios observed through a child process's stderr

use super::common::{
    assert_child_ok, child_program_name, log_lines, run_as_child, spawn_child, stderr_text,
};
use linelog::logging::{self, DestinationMask, LogRecord, LoggingSettings, Severity, FATAL_BANNER};
use std::cell::Cell;

fn bare_stderr() -> LoggingSettings {
    LoggingSettings {
        min_level: Severity::INFO,
        dest: DestinationMask::STDERR,
        process_id: false,
        thread_id: false,
        timestamp: false,
        tickcount: false,
        prefix: None,
        ..LoggingSettings::default()
    }
}

#[test]
fn minimal_header_line() {
    if run_as_child("scenarios::minimal_header_line", || {
        assert!(logging::init(&bare_stderr()));
        let _ = LogRecord::new("a/b/c.cc", "f", 7, Severity::INFO) << "hi";
    }) {
        return;
    }

    let out = spawn_child("scenarios::minimal_header_line");
    assert_child_ok(&out);
    let lines = log_lines(&out, "c.cc(f-7)");
    assert_eq!(
        lines,
        vec![format!("<info> {}: [c.cc(f-7)] hi", child_program_name())]
    );
}

#[test]
fn suppressed_below_min_level() {
    if run_as_child("scenarios::suppressed_below_min_level", || {
        let settings = LoggingSettings {
            min_level: Severity::WARNING,
            ..bare_stderr()
        };
        assert!(logging::init(&settings));

        let evaluated = Cell::new(false);
        let expr = || {
            evaluated.set(true);
            "expr"
        };
        linelog::log!(INFO, "suppressed {}", expr());
        linelog::log_if!(WARNING, false, "never {}", expr());
        assert!(!evaluated.get());
        linelog::log!(WARNING, "visible");
    }) {
        return;
    }

    let out = spawn_child("scenarios::suppressed_below_min_level");
    assert_child_ok(&out);
    let text = stderr_text(&out);
    assert!(!text.contains("] suppressed"), "{}", text);
    assert!(!text.contains("] never"), "{}", text);
    assert_eq!(log_lines(&out, "] visible").len(), 1);
}

#[test]
fn always_print_without_destinations() {
    if run_as_child("scenarios::always_print_without_destinations", || {
        let settings = LoggingSettings {
            dest: DestinationMask::NONE,
            always_print_level: Severity::ERROR,
            ..bare_stderr()
        };
        assert!(logging::init(&settings));
        linelog::log!(WARNING, "quiet");
        linelog::log!(ERROR, "x");
    }) {
        return;
    }

    let out = spawn_child("scenarios::always_print_without_destinations");
    assert_child_ok(&out);
    let lines = log_lines(&out, "<");
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].starts_with("<error> "));
    assert!(lines[0].ends_with(" x"));
    assert!(stderr_text(&out).contains(" x\n"));
}

#[test]
fn verbose_levels() {
    if run_as_child("scenarios::verbose_levels", || {
        let settings = LoggingSettings {
            min_level: Severity::verbose(2),
            ..bare_stderr()
        };
        assert!(logging::init(&settings));
        linelog::vlog!(1, "v1");
        linelog::vlog!(2, "v2");
        linelog::vlog!(3, "v3");
    }) {
        return;
    }

    let out = spawn_child("scenarios::verbose_levels");
    assert_child_ok(&out);
    let lines = log_lines(&out, "<VERBOSE");
    assert_eq!(lines.len(), 2, "{:?}", lines);
    assert!(lines[0].starts_with("<VERBOSE1> ") && lines[0].ends_with("] v1"));
    assert!(lines[1].starts_with("<VERBOSE2> ") && lines[1].ends_with("] v2"));
}

#[test]
fn prefix_and_custom_names() {
    if run_as_child("scenarios::prefix_and_custom_names", || {
        let settings = LoggingSettings {
            prefix: Some("edge7".to_string()),
            severity_names: ["DBG", "INF", "WRN", "ERR", "FTL"].map(str::to_string),
            ..bare_stderr()
        };
        assert!(logging::init(&settings));
        linelog::log!(WARNING, "named");

        assert!(logging::set_log_prefix(Some("--")).is_err());
        assert!(logging::set_log_prefix(Some("node-2")).is_ok());
        linelog::log!(INFO, "renamed");
    }) {
        return;
    }

    let out = spawn_child("scenarios::prefix_and_custom_names");
    assert_child_ok(&out);
    let lines = log_lines(&out, "<");
    assert_eq!(lines.len(), 2, "{:?}", lines);
    assert!(lines[0].starts_with("edge7:<WRN> "), "{}", lines[0]);
    assert!(lines[1].starts_with("node2:<INF> "), "{}", lines[1]);
}

#[test]
fn check_failure_exits_255() {
    if run_as_child("scenarios::check_failure_exits_255", || {
        assert!(logging::init(&bare_stderr()));
        let mut record = LogRecord::check(file!(), "f", line!(), "x==1");
        record.append_fmt(format_args!("ctx"));
        drop(record);
        unreachable!("fatal record returned");
    }) {
        return;
    }

    let out = spawn_child("scenarios::check_failure_exits_255");
    assert_eq!(out.status.code(), Some(255), "{}", stderr_text(&out));

    let lines = log_lines(&out, "Check failed");
    // Once from the sink write, once right after the banner
    assert_eq!(lines.len(), 2, "{:?}", lines);
    assert!(!lines[0].starts_with(FATAL_BANNER), "{}", lines[0]);
    assert!(lines[1].starts_with(FATAL_BANNER), "{}", lines[1]);
    for line in &lines {
        let line = line.strip_prefix(FATAL_BANNER).unwrap_or(line);
        assert!(line.starts_with("<fatal> "), "{}", line);
        assert!(line.ends_with("] Check failed: x==1. ctx"), "{}", line);
    }
}

#[test]
fn check_macro_exits_255() {
    if run_as_child("scenarios::check_macro_exits_255", || {
        assert!(logging::init(&bare_stderr()));
        let x = 2;
        linelog::check!(x == 1, "ctx {}", x);
    }) {
        return;
    }

    let out = spawn_child("scenarios::check_macro_exits_255");
    assert_eq!(out.status.code(), Some(255));
    let text = stderr_text(&out);
    assert!(text.contains("Check failed: x == 1. ctx 2\n"), "{}", text);
    assert!(text.contains("(check_macro_exits_255-"), "{}", text);
}

#[test]
fn fatal_with_backtrace() {
    if run_as_child("scenarios::fatal_with_backtrace", || {
        let settings = LoggingSettings {
            fatal_backtrace: true,
            ..bare_stderr()
        };
        assert!(logging::init(&settings));
        linelog::log!(FATAL, "giving up");
    }) {
        return;
    }

    let out = spawn_child("scenarios::fatal_with_backtrace");
    assert_eq!(out.status.code(), Some(255));
    let text = stderr_text(&out);
    let banner = text.find("!!!Self-Abort!!!<fatal> ").expect("banner");
    let after = &text[banner..];
    assert!(after.contains("] giving up\nstack backtrace:\n"), "{}", after);
}

#[test]
fn errno_survives_logging() {
    if run_as_child("scenarios::errno_survives_logging", || {
        assert!(logging::init(&bare_stderr()));
        logging::platform::set_errno(libc::ENOSPC);
        for severity in [Severity::DEBUG, Severity::INFO, Severity::ERROR] {
            linelog::log_at!(severity, "errno check");
            assert_eq!(logging::platform::errno(), libc::ENOSPC);
        }
    }) {
        return;
    }

    let out = spawn_child("scenarios::errno_survives_logging");
    assert_child_ok(&out);
    assert_eq!(log_lines(&out, "errno check").len(), 2);
}

#[test]
fn settings_accessors() {
    if run_as_child("scenarios::settings_accessors", || {
        let defaults = logging::get_logging_settings();
        assert_eq!(defaults, LoggingSettings::default());

        assert!(logging::init(&bare_stderr()));
        logging::set_min_level(Severity::from_i32(10));
        assert_eq!(logging::get_min_level(), Severity::FATAL);
        logging::set_min_level(Severity::DEBUG);
        assert!(logging::should_create_log_message(Severity::DEBUG));

        logging::set_log_items(true, false, false, true);
        let snapshot = logging::get_logging_settings();
        assert!(snapshot.process_id && snapshot.tickcount);
        assert!(!snapshot.thread_id && !snapshot.timestamp);
    }) {
        return;
    }

    assert_child_ok(&spawn_child("scenarios::settings_accessors"));
}
