// SPDX-License-Identifier: Apache-2.0 OR MIT
// Integration test utilities
//
// The global logger is process-wide and a FATAL record exits the process, so
// each scenario runs in a child copy of this test binary. The parent test
// re-executes itself filtered to the same test, with CHILD_ENV set; the child
// sees the marker, runs the scenario body and writes to its own stderr.

use std::ffi::OsStr;
use std::process::{Command, Output};

/// Environment marker naming the test the child should run
pub const CHILD_ENV: &str = "LINELOG_TEST_CHILD";

/// Run `body` instead of the parent logic when this process is the child for
/// `test_path`. Returns true if it ran.
///
/// ```rust,ignore
/// #[test]
/// fn scenario() {
///     if run_as_child("scenarios::scenario", || { /* log things */ }) {
///         return;
///     }
///     let out = spawn_child("scenarios::scenario");
/// }
/// ```
pub fn run_as_child(test_path: &str, body: impl FnOnce()) -> bool {
    match std::env::var(CHILD_ENV) {
        Ok(marker) if marker == test_path => {
            body();
            linelog::logging::flush();
            true
        }
        _ => false,
    }
}

/// Re-run this test binary filtered to exactly `test_path` and collect output
pub fn spawn_child(test_path: &str) -> Output {
    spawn_child_with_env(test_path, &[])
}

/// Like [`spawn_child`], with extra environment for the child
pub fn spawn_child_with_env(test_path: &str, env: &[(&str, &OsStr)]) -> Output {
    let exe = std::env::current_exe().expect("current_exe");
    Command::new(exe)
        .args(["--exact", test_path, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, test_path)
        .envs(env.iter().copied())
        .output()
        .expect("failed to spawn child test process")
}

/// Program name the child's logger prints
pub fn child_program_name() -> String {
    let exe = std::env::current_exe().expect("current_exe");
    exe.file_name()
        .expect("exe file name")
        .to_string_lossy()
        .into_owned()
}

/// Child stderr split into lines, keeping only lines the logger produced
/// (the harness may add its own chatter)
pub fn log_lines(output: &Output, marker: &str) -> Vec<String> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter(|line| line.contains(marker))
        .map(str::to_string)
        .collect()
}

/// Full child stderr as text
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert the child test passed, showing its output if not
pub fn assert_child_ok(output: &Output) {
    assert!(
        output.status.success(),
        "child failed with {:?}\nstdout:\n{}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Check the fixed shape of a timestamp prefix:
/// `YYYY-MM-DDThh:mm:ss.uuuuuu+HH:MM `
pub fn is_timestamp(ts: &str) -> bool {
    let b = ts.as_bytes();
    if b.len() != 33 {
        return false;
    }
    let digits = [0..4, 5..7, 8..10, 11..13, 14..16, 17..19, 20..26, 27..29, 30..32];
    digits
        .iter()
        .all(|range| b[range.clone()].iter().all(u8::is_ascii_digit))
        && b[4] == b'-'
        && b[7] == b'-'
        && b[10] == b'T'
        && b[13] == b':'
        && b[16] == b':'
        && b[19] == b'.'
        && (b[26] == b'+' || b[26] == b'-')
        && b[29] == b':'
        && b[32] == b' '
}
