//! Argument parsing and the run loop.
//!
//! Mode precedence is fixed: `--help`, then `--version`, then `--list`,
//! then `--debug`, then a normal run. Option flags come in
//! enable/disable pairs (`--color`/`--no-color`) where the last
//! occurrence wins; positional arguments are `suite[:glob]` selection
//! patterns.

use crate::debug;
use crate::error::HarnessError;
use crate::exec::{self, Unit};
use crate::pattern::{self, Pattern};
use crate::registry::Registry;
use crate::report::Reporter;
use crate::VERSION;
use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::io::IsTerminal;
use std::time::Instant;

/// Run all tests matching the given patterns.
#[derive(Parser, Debug)]
#[command(name = "frost", disable_version_flag = true)]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long)]
    version: bool,

    /// Print a list of all available tests and exit
    #[arg(short = 'l', long)]
    list: bool,

    /// Run one test and wait for a debugger to attach to the test
    #[arg(long, value_name = "PATTERN")]
    debug: Option<String>,

    /// Print output in color [default: on when stderr is a terminal]
    #[arg(short = 'c', long, overrides_with = "no_color")]
    color: bool,

    /// Never print output in color
    #[arg(long, overrides_with = "color")]
    no_color: bool,

    /// Rerun failed tests and wait for a debugger to attach [default: off]
    #[arg(short = 'r', long, overrides_with = "no_rerun")]
    rerun: bool,

    /// Do not rerun failed tests
    #[arg(long, overrides_with = "rerun")]
    no_rerun: bool,

    /// Fail a test once its timeout elapses [default: on]
    #[arg(short = 't', long, overrides_with = "no_timeout")]
    timeout: bool,

    /// Let tests run without a time limit
    #[arg(long, overrides_with = "timeout")]
    no_timeout: bool,

    /// Test selection patterns, `suite` or `suite:glob`
    #[arg(value_name = "PATTERN")]
    patterns: Vec<String>,

    // Internal: re-invocation selector for the isolated test process.
    #[arg(long = "exec-unit", hide = true, value_name = "SELECTOR")]
    exec_unit: Option<String>,

    // Internal: make the test process stop itself before running.
    #[arg(long = "exec-stopped", hide = true, requires = "exec_unit")]
    exec_stopped: bool,
}

/// Effective run options after flag pairs and defaults are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub color: bool,
    pub rerun: bool,
    pub timeout: bool,
}

impl Options {
    fn resolve(cli: &Cli) -> Self {
        let color_default =
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();

        Self {
            color: flag(cli.color, cli.no_color, color_default),
            rerun: flag(cli.rerun, cli.no_rerun, false),
            timeout: flag(cli.timeout, cli.no_timeout, true),
        }
    }
}

// `overrides_with` guarantees at most one side of a pair is set.
fn flag(enable: bool, disable: bool, default: bool) -> bool {
    if disable {
        false
    } else if enable {
        true
    } else {
        default
    }
}

/// Parse arguments and drive the harness; returns the process exit code.
pub fn run(registry: &Registry, args: impl IntoIterator<Item = OsString>) -> i32 {
    let cli = Cli::parse_from(args);
    match drive(registry, &cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Fatal error: {err}.");
            1
        }
    }
}

fn drive(registry: &Registry, cli: &Cli) -> Result<i32> {
    // Child mode: this process IS the isolated test process.
    if let Some(selector) = &cli.exec_unit {
        let never = exec::run_unit_in_process(registry, selector, cli.exec_stopped)?;
        match never {}
    }

    if cli.version {
        println!("frost {VERSION}");
        return Ok(0);
    }

    let options = Options::resolve(cli);
    colored::control::set_override(options.color);

    let patterns = cli
        .patterns
        .iter()
        .map(|raw| Pattern::parse(raw).map_err(HarnessError::from))
        .collect::<Result<Vec<_>, _>>()?;

    let reporter = Reporter::new();

    if cli.list {
        reporter.list(registry);
        return Ok(0);
    }

    if let Some(raw) = &cli.debug {
        return run_debug(registry, raw, &reporter);
    }

    run_all(registry, &patterns, options, &reporter)
}

/// `--debug`: run the first matching test under the attach protocol,
/// over and over, until the user aborts the wait.
fn run_debug(registry: &Registry, raw: &str, reporter: &Reporter) -> Result<i32> {
    let pattern = Pattern::parse(raw).map_err(HarnessError::from)?;

    let (suite_index, suite, test) = registry
        .suites()
        .iter()
        .enumerate()
        .find_map(|(index, suite)| {
            if !pattern.matches_suite(suite.name) {
                return None;
            }
            suite
                .tests
                .iter()
                .find(|test| pattern.matches_test(test.name))
                .map(|test| (index, suite, test))
        })
        .ok_or_else(|| HarnessError::NoMatch(raw.to_string()))?;

    loop {
        reporter.unit_debug(test.name);
        let unit = Unit::new(suite_index, suite, test);
        if debug::attach(&unit, reporter)? {
            return Ok(0);
        }
    }
}

fn run_all(
    registry: &Registry,
    patterns: &[Pattern],
    options: Options,
    reporter: &Reporter,
) -> Result<i32> {
    let started = Instant::now();
    let mut total = 0u32;
    let mut passed = 0u32;

    for (suite_index, suite) in registry.suites().iter().enumerate() {
        if !pattern::suite_selected(patterns, suite.name) {
            continue;
        }

        reporter.suite_begin(suite.name);

        let mut suite_total = 0u32;
        let mut suite_passed = 0u32;
        for test in &suite.tests {
            if !pattern::unit_selected(patterns, suite.name, test.name) {
                continue;
            }

            reporter.unit_begin(test.name);
            let unit = Unit::new(suite_index, suite, test);
            let success = exec::execute(&unit, options.timeout, reporter)?.is_pass();

            if !success && options.rerun {
                loop {
                    reporter.unit_debug(test.name);
                    if debug::attach(&unit, reporter)? {
                        break;
                    }
                }
            }

            reporter.unit_end(test.name, success, unit.started.elapsed());

            suite_total += 1;
            suite_passed += u32::from(success);
        }

        reporter.suite_end(suite.name, suite_passed, suite_total);

        total += suite_total;
        passed += suite_passed;
    }

    reporter.summary(passed, total, started.elapsed());

    Ok(if passed == total { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("frost").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert!(!cli.version);
        assert!(!cli.list);
        assert!(cli.debug.is_none());
        assert!(cli.patterns.is_empty());

        let options = Options::resolve(&cli);
        assert!(!options.rerun);
        assert!(options.timeout);
    }

    #[test]
    fn test_short_flags() {
        let cli = parse(&["-v", "-l", "-c", "-r", "-t"]);
        assert!(cli.version);
        assert!(cli.list);

        let options = Options::resolve(&cli);
        assert_eq!(
            options,
            Options {
                color: true,
                rerun: true,
                timeout: true,
            }
        );
    }

    #[test]
    fn test_negated_flags() {
        let options = Options::resolve(&parse(&["--no-color", "--no-rerun", "--no-timeout"]));
        assert!(!options.color);
        assert!(!options.rerun);
        assert!(!options.timeout);
    }

    #[test]
    fn test_last_flag_occurrence_wins() {
        let options = Options::resolve(&parse(&["--color", "--no-color"]));
        assert!(!options.color);

        let options = Options::resolve(&parse(&["--no-timeout", "--timeout"]));
        assert!(options.timeout);

        let options = Options::resolve(&parse(&["-r", "--no-rerun", "-r"]));
        assert!(options.rerun);
    }

    #[test]
    fn test_patterns_are_positional() {
        let cli = parse(&["math", "text:render_*", "-l"]);
        assert_eq!(cli.patterns, vec!["math", "text:render_*"]);
        assert!(cli.list);
    }

    #[test]
    fn test_debug_takes_a_pattern() {
        let cli = parse(&["--debug", "math:add_*"]);
        assert_eq!(cli.debug.as_deref(), Some("math:add_*"));
    }

    #[test]
    fn test_exec_flags_are_accepted() {
        let cli = parse(&["--exec-unit", "0:3", "--exec-stopped"]);
        assert_eq!(cli.exec_unit.as_deref(), Some("0:3"));
        assert!(cli.exec_stopped);
    }

    #[test]
    fn test_exec_stopped_requires_selector() {
        let result = Cli::try_parse_from(["frost", "--exec-stopped"]);
        assert!(result.is_err());
    }
}
