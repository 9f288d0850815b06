// SPDX-License-Identifier: Apache-2.0 OR MIT
// Call-site macros. Every form checks the gate before evaluating its
// format arguments.

/// Short name of the enclosing function (closures resolve to the function
/// they are defined in)
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        let name = name.trim_end_matches("::{{closure}}");
        match name.rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }};
}

/// Log through a specific logger at a severity expression
///
/// # Examples
/// ```ignore
/// log_to!(&logger, Severity::WARNING, "queue at {}%", fill);
/// ```
#[macro_export]
macro_rules! log_to {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {{
        let logger: &$crate::logging::Logger = $logger;
        let severity: $crate::logging::Severity = $severity;
        if logger.should_create_log_message(severity) {
            $crate::logging::LogRecord::new_in(
                logger,
                ::std::file!(),
                $crate::function_name!(),
                ::std::line!(),
                severity,
            )
            .append_fmt(::std::format_args!($($arg)+));
        }
    }};
}

/// Log at a severity expression through the global logger
///
/// # Examples
/// ```ignore
/// log_at!(Severity::verbose(2), "detail {}", x);
/// ```
#[macro_export]
macro_rules! log_at {
    ($severity:expr, $($arg:tt)+) => {
        $crate::log_to!($crate::logging::Logger::global(), $severity, $($arg)+)
    };
}

/// Log at a named severity through the global logger
///
/// # Examples
/// ```ignore
/// log!(INFO, "listening on {}", addr);
/// ```
#[macro_export]
macro_rules! log {
    ($severity:ident, $($arg:tt)+) => {
        $crate::log_at!($crate::logging::Severity::$severity, $($arg)+)
    };
}

/// Log only when `cond` holds; `cond` is evaluated only if the gate passes
///
/// # Examples
/// ```ignore
/// log_if!(WARNING, retries > 3, "retrying {} again", name);
/// ```
#[macro_export]
macro_rules! log_if {
    ($severity:ident, $cond:expr, $($arg:tt)+) => {{
        let logger = $crate::logging::Logger::global();
        let severity = $crate::logging::Severity::$severity;
        if logger.should_create_log_message(severity) && ($cond) {
            $crate::log_to!(logger, severity, $($arg)+);
        }
    }};
}

/// Log at verbose level `n` (severity `-n`)
#[macro_export]
macro_rules! vlog {
    ($level:expr, $($arg:tt)+) => {
        $crate::log_at!($crate::logging::Severity::verbose($level), $($arg)+)
    };
}

/// Terminate the process with a FATAL record if `cond` is false
///
/// The record message starts with `Check failed: <cond>. `.
///
/// # Examples
/// ```ignore
/// check!(fd >= 0, "open returned {}", fd);
/// ```
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        if !($cond) {
            let _ = $crate::logging::LogRecord::check(
                ::std::file!(),
                $crate::function_name!(),
                ::std::line!(),
                ::std::stringify!($cond),
            );
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::logging::LogRecord::check(
                ::std::file!(),
                $crate::function_name!(),
                ::std::line!(),
                ::std::stringify!($cond),
            )
            .append_fmt(::std::format_args!($($arg)+));
        }
    };
}
