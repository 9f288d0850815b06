// SPDX-License-Identifier: Apache-2.0 OR MIT
// Loading a JSON5 config file and initializing the global logger from it

use super::common::{assert_child_ok, log_lines, run_as_child, spawn_child_with_env, stderr_text};
use linelog::logging;
use linelog::LoggingConfig;

#[test]
fn init_from_config_file() {
    if run_as_child("config_file::init_from_config_file", || {
        let path = std::env::var("LINELOG_TEST_CONFIG").expect("config path");
        let settings = LoggingConfig::load_from_file(path.as_ref())
            .and_then(LoggingConfig::into_settings)
            .expect("valid config");
        assert!(logging::init(&settings));

        linelog::log!(DEBUG, "dropped");
        linelog::log!(WARNING, "kept {}", 1);
        linelog::log!(ERROR, "kept {}", 2);
    }) {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("app.log");
    let config_path = dir.path().join("logging.json5");
    let config = format!(
        r#"{{
            // warnings and up, file only
            min_level: "warning",
            destinations: ["file"],
            log_file: "{}",
            process_id: false,
            thread_id: false,
            timestamp: false,
            prefix: "cfg",
        }}"#,
        log_path.display()
    );
    std::fs::write(&config_path, config).unwrap();

    let out = spawn_child_with_env(
        "config_file::init_from_config_file",
        &[("LINELOG_TEST_CONFIG", config_path.as_os_str())],
    );
    assert_child_ok(&out);

    let file = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = file.lines().collect();
    assert_eq!(lines.len(), 2, "{}", file);
    assert!(lines[0].starts_with("cfg:<warning> ") && lines[0].ends_with("] kept 1"));
    assert!(lines[1].starts_with("cfg:<error> ") && lines[1].ends_with("] kept 2"));

    // Only ERROR crosses to stderr (always-print with a file-only mask)
    let stderr = log_lines(&out, "] kept ");
    assert_eq!(stderr.len(), 1, "{}", stderr_text(&out));
    assert!(stderr[0].ends_with("] kept 2"));
}

#[test]
fn unopenable_log_file_reports_and_continues() {
    if run_as_child("config_file::unopenable_log_file_reports_and_continues", || {
        let path = std::env::var("LINELOG_TEST_CONFIG").expect("config path");
        let settings = LoggingConfig::load_from_file(path.as_ref())
            .and_then(LoggingConfig::into_settings)
            .expect("valid config");
        assert!(!logging::init(&settings));
        linelog::log!(ERROR, "still here");
    }) {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("logging.json5");
    let config = format!(
        r#"{{ destinations: ["file", "stderr"], log_file: "{}/missing/dir/app.log", timestamp: false }}"#,
        dir.path().display()
    );
    std::fs::write(&config_path, config).unwrap();

    let out = spawn_child_with_env(
        "config_file::unopenable_log_file_reports_and_continues",
        &[("LINELOG_TEST_CONFIG", config_path.as_os_str())],
    );
    assert_child_ok(&out);

    let text = stderr_text(&out);
    assert_eq!(log_lines(&out, "failed to open log file").len(), 1, "{}", text);
    assert_eq!(log_lines(&out, "] still here").len(), 1, "{}", text);
}
