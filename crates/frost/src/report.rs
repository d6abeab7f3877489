//! Run output: suite/unit banners, diagnostics, and the summary.
//!
//! Everything goes to stderr, the stream the worker threads inside a
//! test process also use for their failure diagnostics. Single lines
//! rely on the stream's per-call lock; multi-line diagnostics (see
//! `asserts`) hold the lock for their whole duration. Color is gated by
//! one global override resolved before the run starts.

use crate::registry::Registry;
use colored::Colorize;
use std::time::Duration;

pub(crate) const INDENT: &str = "    ";

/// Formats execution progress and results.
#[derive(Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Reporter
    }

    pub fn suite_begin(&self, name: &str) {
        eprintln!("\n{}:", format!("Testing suite {name}").bold());
    }

    pub fn suite_end(&self, name: &str, passed: u32, total: u32) {
        eprintln!(
            "{}",
            format!("Suite {name}: Passed {passed}/{total} tests.").bold()
        );
    }

    pub fn unit_begin(&self, name: &str) {
        eprintln!(
            "{}{}{}",
            "? ".magenta().bold(),
            "Testing: ".magenta(),
            name.yellow()
        );
    }

    /// Banner for a unit about to run under the debug-attach controller.
    pub fn unit_debug(&self, name: &str) {
        eprintln!(
            "{}{}{}",
            "> ".red().bold(),
            "Running: ".red(),
            name.yellow()
        );
    }

    pub fn unit_end(&self, name: &str, passed: bool, elapsed: Duration) {
        let line = if passed {
            format!(
                "{}{}{}",
                "✓ ".green().bold(),
                "Success: ".green(),
                name.yellow()
            )
        } else {
            format!(
                "{}{}{}",
                "✕ ".red().bold(),
                "Failure: ".red(),
                name.yellow()
            )
        };
        eprintln!("{line} {}", fmt_duration(elapsed));
    }

    pub fn summary(&self, passed: u32, total: u32, elapsed: Duration) {
        eprintln!(
            "\n{} {}",
            format!("Total: Passed {passed}/{total} tests.").bold(),
            fmt_duration(elapsed)
        );
    }

    /// Indented diagnostic line (timeouts, exit codes, wait errors...).
    pub fn note(&self, message: &str) {
        eprintln!("{INDENT}{message}");
    }

    /// `--list` output: per-suite test counts plus a total.
    pub fn list(&self, registry: &Registry) {
        eprintln!("\n{}", "Test suites:".bold());
        for suite in registry.suites() {
            eprintln!(
                "{} {} tests",
                format!("{}:", suite.name).yellow(),
                suite.tests.len()
            );
        }
        eprintln!(
            "\n{}",
            format!("Total: {} tests.", registry.total_tests()).bold()
        );
    }
}

/// Elapsed-time annotation; the unit is chosen by magnitude.
pub fn fmt_duration(elapsed: Duration) -> String {
    let msec = elapsed.as_secs_f64() * 1000.0;
    if msec < 1.0 {
        format!("({:.2}µs)", msec * 1000.0)
    } else if msec < 1000.0 {
        format!("({msec:.2}ms)")
    } else {
        format!("({:.2}s)", msec / 1000.0)
    }
}
