// SPDX-License-Identifier: Apache-2.0 OR MIT
// OS facilities used by the logging core: ids, names, clocks, errno, writes

use nix::errno::Errno;
use std::cell::Cell;
use std::io;
use std::os::fd::BorrowedFd;
use std::sync::OnceLock;

/// Maximum thread name length including the NUL (Linux TASK_COMM_LEN)
pub const THREAD_NAME_LEN: usize = 16;

/// Monotonic microseconds since boot. Returns 0 if the clock is unavailable.
pub fn tick_count_us() -> u64 {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    const CLOCK: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    const CLOCK: libc::clockid_t = libc::CLOCK_MONOTONIC;

    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: ts is a valid, writable timespec
    let ret = unsafe { libc::clock_gettime(CLOCK, &mut ts) };
    if ret != 0 {
        return 0;
    }
    (ts.tv_sec as u64) * 1_000_000 + (ts.tv_nsec as u64) / 1_000
}

/// Process id, cached after the first call
pub fn process_id() -> u32 {
    static PID: OnceLock<u32> = OnceLock::new();
    *PID.get_or_init(std::process::id)
}

thread_local! {
    static THREAD_ID: Cell<u32> = const { Cell::new(0) };
}

/// Kernel thread id of the calling thread, cached per thread
pub fn thread_id() -> u32 {
    THREAD_ID.with(|cached| {
        let tid = cached.get();
        if tid != 0 {
            return tid;
        }
        let tid = raw_thread_id();
        cached.set(tid);
        tid
    })
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn raw_thread_id() -> u32 {
    nix::unistd::gettid().as_raw() as u32
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn raw_thread_id() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    // No kernel tid available: hand out process-unique ids instead
    static NEXT: AtomicU32 = AtomicU32::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Write the calling thread's name into `buf` and return it.
///
/// Bounded to 15 bytes like the kernel's comm field.
pub fn thread_name(buf: &mut [u8; THREAD_NAME_LEN]) -> &str {
    let len = fill_thread_name(buf);
    match std::str::from_utf8(&buf[..len]) {
        Ok(name) => name,
        // Truncation may split a multi-byte character
        Err(e) => std::str::from_utf8(&buf[..e.valid_up_to()]).unwrap_or(""),
    }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn fill_thread_name(buf: &mut [u8; THREAD_NAME_LEN]) -> usize {
    buf.fill(0);
    // SAFETY: buf is THREAD_NAME_LEN bytes and pthread_getname_np NUL-terminates
    let ret = unsafe {
        libc::pthread_getname_np(
            libc::pthread_self(),
            buf.as_mut_ptr() as *mut libc::c_char,
            buf.len(),
        )
    };
    if ret != 0 {
        return 0;
    }
    buf.iter().position(|b| *b == 0).unwrap_or(buf.len())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn fill_thread_name(buf: &mut [u8; THREAD_NAME_LEN]) -> usize {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("").as_bytes();
    let len = name.len().min(THREAD_NAME_LEN - 1);
    buf[..len].copy_from_slice(&name[..len]);
    len
}

/// Short program name (basename of argv[0])
pub fn program_name() -> &'static str {
    static NAME: OnceLock<String> = OnceLock::new();
    NAME.get_or_init(|| {
        std::env::args_os()
            .next()
            .and_then(|arg0| {
                std::path::Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "(unknown)".to_string())
    })
}

/// Bytes after the last '/' in a source path
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Current value of the calling thread's errno
pub fn errno() -> i32 {
    // SAFETY: the errno location is thread-local and always valid
    unsafe { *errno_location() }
}

/// Overwrite the calling thread's errno
pub fn set_errno(value: i32) {
    // SAFETY: the errno location is thread-local and always valid
    unsafe {
        *errno_location() = value;
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__errno_location()
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__error()
}

/// Saves and clears errno on creation, restores it on drop.
///
/// Keeps logging from perturbing the caller's error handling.
pub struct ErrnoGuard {
    saved: i32,
}

impl ErrnoGuard {
    pub fn save_and_clear() -> Self {
        let saved = errno();
        set_errno(0);
        Self { saved }
    }

    /// The errno value that will be restored
    pub fn saved(&self) -> i32 {
        self.saved
    }
}

impl Drop for ErrnoGuard {
    fn drop(&mut self) {
        set_errno(self.saved);
    }
}

/// Write all of `buf` to `fd`, retrying on EINTR.
///
/// Any other error aborts the write; bytes already written stay written.
pub fn write_all_retry(fd: BorrowedFd<'_>, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match nix::unistd::write(fd, buf) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => buf = &buf[n..],
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(io::Error::from_raw_os_error(errno as i32)),
        }
    }
    Ok(())
}

/// Sleep for a random 10-50ms, used to shake out interleavings in tests
pub fn random_sleep() {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(tick_count_us());
    let jitter = 10 + hasher.finish() % 41;
    std::thread::sleep(std::time::Duration::from_millis(jitter));
}
