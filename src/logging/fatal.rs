// SPDX-License-Identifier: Apache-2.0 OR MIT
// Process termination after a FATAL record

use super::platform::write_all_retry;
use std::backtrace::Backtrace;
use std::os::fd::BorrowedFd;

/// Banner written to stderr ahead of the fatal payload
pub const FATAL_BANNER: &str = "!!!Self-Abort!!!";

/// Exit status used for fatal records; observed by the parent as 255
pub const FATAL_EXIT_CODE: i32 = -1;

/// Build the text written after a fatal record: the banner immediately
/// followed by the payload. With `backtrace`, the trace is spliced in at `stack_start` (the
/// end of the message, before its newline).
pub fn fatal_message(payload: &[u8], stack_start: usize, backtrace: Option<&str>) -> Vec<u8> {
    let mut out = Vec::with_capacity(FATAL_BANNER.len() + payload.len() + 1);
    out.extend_from_slice(FATAL_BANNER.as_bytes());

    let split = stack_start.min(payload.len());
    match backtrace {
        Some(trace) => {
            out.extend_from_slice(&payload[..split]);
            out.extend_from_slice(b"\nstack backtrace:\n");
            out.extend_from_slice(trace.trim_end().as_bytes());
            out.extend_from_slice(&payload[split..]);
        }
        None => out.extend_from_slice(payload),
    }
    if out.last() != Some(&b'\n') {
        out.push(b'\n');
    }
    out
}

/// Write the banner and payload to stderr, then exit with status -1.
///
/// Exits instead of aborting so no core file is produced.
pub fn handle(payload: &[u8], stack_start: usize, with_backtrace: bool) -> ! {
    let trace = with_backtrace.then(|| Backtrace::force_capture().to_string());
    let message = fatal_message(payload, stack_start, trace.as_deref());

    // SAFETY: fd 2 stays open for the life of the process
    let stderr = unsafe { BorrowedFd::borrow_raw(libc::STDERR_FILENO) };
    let _ = write_all_retry(stderr, &message);

    std::process::exit(FATAL_EXIT_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_then_payload() {
        let payload = b"<fatal> prog: [x.rs(f-1)] gone\n";
        let out = fatal_message(payload, payload.len() - 1, None);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "!!!Self-Abort!!!<fatal> prog: [x.rs(f-1)] gone\n"
        );
    }

    #[test]
    fn test_backtrace_spliced_at_stack_start() {
        let payload = b"msg\n";
        let out = fatal_message(payload, 3, Some("0: frame\n1: frame\n"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "!!!Self-Abort!!!msg\nstack backtrace:\n0: frame\n1: frame\n"
        );
    }

    #[test]
    fn test_out_of_range_stack_start() {
        let out = fatal_message(b"abc", 99, Some("bt"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "!!!Self-Abort!!!abc\nstack backtrace:\nbt\n"
        );
    }
}
