//! Assertion macros for test bodies.
//!
//! A failing assertion prints its diagnostic and the source location,
//! then exits the test process with the failure sentinel; the
//! orchestrator sees the sentinel and prints no extra line. The whole
//! diagnostic is written under one stderr lock so worker threads cannot
//! interleave their output.

use crate::exec::FAILURE_EXIT_CODE;
use crate::report::INDENT;
use crate::trace;
use std::fmt;
use std::io::{self, Write};
use std::process;

#[doc(hidden)]
pub fn fail_at(args: fmt::Arguments<'_>, file: &str, line: u32) -> ! {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    let _ = writeln!(out, "{INDENT}{args}.");
    let _ = writeln!(out, "{INDENT}in {file}:{line}");
    let _ = out.flush();
    process::exit(FAILURE_EXIT_CODE)
}

#[doc(hidden)]
pub fn fail_with_trace(args: fmt::Arguments<'_>, file: &str, line: u32) -> ! {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    let _ = writeln!(out, "{INDENT}{args}.");
    for frame in trace::frames() {
        let _ = writeln!(
            out,
            "{INDENT}at {}:{}: {}",
            frame.file, frame.line, frame.message
        );
    }
    let _ = writeln!(out, "{INDENT}in {file}:{line}");
    let _ = out.flush();
    process::exit(FAILURE_EXIT_CODE)
}

/// Fail the current test unconditionally with a formatted message.
#[macro_export]
macro_rules! fail {
    ($($arg:tt)*) => {
        $crate::asserts::fail_at(
            ::std::format_args!($($arg)*),
            ::std::file!(),
            ::std::line!(),
        )
    };
}

/// Fail the current test unless the condition holds.
#[macro_export]
macro_rules! require {
    ($cond:expr $(,)?) => {
        if !($cond) {
            $crate::asserts::fail_at(
                ::std::format_args!("Assertion failed: {}", ::std::stringify!($cond)),
                ::std::file!(),
                ::std::line!(),
            );
        }
    };
    ($cond:expr, $($explanation:tt)+) => {
        if !($cond) {
            $crate::asserts::fail_at(
                ::std::format_args!(
                    "Assertion failed: {}: {}",
                    ::std::stringify!($cond),
                    ::std::format_args!($($explanation)+),
                ),
                ::std::file!(),
                ::std::line!(),
            );
        }
    };
}

/// Fail the current test unless both expressions compare equal.
///
/// Arguments are bound through a `match` so temporaries they produce
/// stay alive for the whole comparison.
#[macro_export]
macro_rules! require_eq {
    ($a:expr, $b:expr $(,)?) => {
        match (&$a, &$b) {
            (left, right) => {
                if left != right {
                    $crate::asserts::fail_at(
                        ::std::format_args!(
                            "Expected {} to equal {} ({:?}), but got {:?}",
                            ::std::stringify!($a),
                            ::std::stringify!($b),
                            right,
                            left,
                        ),
                        ::std::file!(),
                        ::std::line!(),
                    );
                }
            }
        }
    };
    ($a:expr, $b:expr, $($explanation:tt)+) => {
        match (&$a, &$b) {
            (left, right) => {
                if left != right {
                    $crate::asserts::fail_at(
                        ::std::format_args!(
                            "Expected {} to equal {} ({:?}), but got {:?}: {}",
                            ::std::stringify!($a),
                            ::std::stringify!($b),
                            right,
                            left,
                            ::std::format_args!($($explanation)+),
                        ),
                        ::std::file!(),
                        ::std::line!(),
                    );
                }
            }
        }
    };
}

/// Fail the current test when both expressions compare equal.
#[macro_export]
macro_rules! require_ne {
    ($a:expr, $b:expr $(,)?) => {
        match (&$a, &$b) {
            (left, right) => {
                if left == right {
                    $crate::asserts::fail_at(
                        ::std::format_args!(
                            "Expected {} to not equal {} ({:?})",
                            ::std::stringify!($a),
                            ::std::stringify!($b),
                            left,
                        ),
                        ::std::file!(),
                        ::std::line!(),
                    );
                }
            }
        }
    };
    ($a:expr, $b:expr, $($explanation:tt)+) => {
        match (&$a, &$b) {
            (left, right) => {
                if left == right {
                    $crate::asserts::fail_at(
                        ::std::format_args!(
                            "Expected {} to not equal {} ({:?}): {}",
                            ::std::stringify!($a),
                            ::std::stringify!($b),
                            left,
                            ::std::format_args!($($explanation)+),
                        ),
                        ::std::file!(),
                        ::std::line!(),
                    );
                }
            }
        }
    };
}

/// Fail the current test when a code-carrying `Result` is an error,
/// printing the recorded error trace.
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {
        if ::std::result::Result::is_err(&($expr)) {
            $crate::asserts::fail_with_trace(
                ::std::format_args!(
                    "Expected success of {}, but got code {}",
                    ::std::stringify!($expr),
                    $crate::trace::code(),
                ),
                ::std::file!(),
                ::std::line!(),
            );
        }
    };
}
