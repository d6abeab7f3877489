//! Process-isolation executor.
//!
//! Every unit runs in a fresh child process, so a crash, runaway
//! allocation, or deadlock in one test can never corrupt the
//! orchestrator or another test. Since there is no portable `fork`, the
//! child is the harness binary itself, re-invoked with a hidden
//! `--exec-unit <suite>:<test>` selector that routes it into
//! [`run_unit_in_process`]. Results cross the process boundary only as
//! an exit status or termination signal.
//!
//! The parent never block-waits: it polls the child every
//! [`POLL_INTERVAL`] so it can check the wall clock against the test's
//! timeout between polls.

use crate::error::HarnessError;
use crate::registry::{Dispatch, Registry, Suite, TestDef};
use crate::report::{Reporter, INDENT};
use crate::sync::{self, Rendezvous};
use std::convert::Infallible;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::panic;
use std::process::{self, Child, Command, ExitStatus};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Exit status reserved to mean "an assertion failed inside the test
/// process". A test body that deliberately exits with this code is
/// indistinguishable from an assertion failure.
pub const FAILURE_EXIT_CODE: i32 = 255;

/// Interval between child status polls; the lower bound on both
/// timeout-detection and debug-abort latency.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub(crate) const EXEC_UNIT_FLAG: &str = "--exec-unit";
pub(crate) const EXEC_STOPPED_FLAG: &str = "--exec-stopped";

/// Terminal outcome of one unit execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Passed,
    Failed,
    TimedOut,
    /// Waiting on the child failed for a reason other than EINTR.
    WaitError,
}

impl UnitOutcome {
    pub fn is_pass(self) -> bool {
        matches!(self, UnitOutcome::Passed)
    }
}

/// One execution attempt of a specific test. Created per attempt,
/// discarded afterwards.
pub struct Unit<'a> {
    pub suite_index: usize,
    pub suite: &'a Suite,
    pub test: &'a TestDef,
    pub started: Instant,
}

impl<'a> Unit<'a> {
    pub fn new(suite_index: usize, suite: &'a Suite, test: &'a TestDef) -> Self {
        Self {
            suite_index,
            suite,
            test,
            started: Instant::now(),
        }
    }

    /// Selector the child uses to find this unit in its own registry.
    fn selector(&self) -> String {
        format!("{}:{}", self.suite_index, self.test.id)
    }
}

/// Spawn the isolated process for a unit; `stopped` makes the child
/// suspend itself before running anything (debug attach).
pub(crate) fn spawn_unit(unit: &Unit<'_>, stopped: bool) -> Result<Child, HarnessError> {
    let exe = std::env::current_exe().map_err(HarnessError::Spawn)?;
    let mut command = Command::new(exe);
    command.arg(EXEC_UNIT_FLAG).arg(unit.selector());
    if stopped {
        command.arg(EXEC_STOPPED_FLAG);
    }
    command.spawn().map_err(HarnessError::Spawn)
}

/// Run one unit to a terminal outcome.
pub fn execute(
    unit: &Unit<'_>,
    enforce_timeout: bool,
    reporter: &Reporter,
) -> Result<UnitOutcome, HarnessError> {
    let mut child = spawn_unit(unit, false)?;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(classify_exit(status, reporter)),
            Ok(None) => {
                if enforce_timeout && unit.started.elapsed() > unit.test.timeout {
                    kill_child(&mut child, reporter);
                    reporter.note(&format!(
                        "Process timed out after {:.0}s.",
                        unit.test.timeout.as_secs_f64()
                    ));
                    return Ok(UnitOutcome::TimedOut);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                reporter.note(&format!("Waiting for process failed ({err})."));
                return Ok(UnitOutcome::WaitError);
            }
        }
    }
}

/// Force-terminate and reap a child that may be stopped: resume it,
/// kill it, wait for it.
pub(crate) fn kill_child(child: &mut Child, reporter: &Reporter) {
    let pid = child.id() as libc::pid_t;
    if unsafe { libc::kill(pid, libc::SIGCONT) } == -1 {
        reporter.note(&format!(
            "Failed to continue process ({}).",
            io::Error::last_os_error()
        ));
        return;
    }

    if let Err(err) = child.kill() {
        reporter.note(&format!("Failed to kill process ({err})."));
        return;
    }

    if let Err(err) = child.wait() {
        reporter.note(&format!("Waiting for terminated process failed ({err})."));
    }
}

/// Map a child exit status to an outcome, printing the reason-specific
/// diagnostic line where one is owed.
///
/// Code 0 passes; the [`FAILURE_EXIT_CODE`] sentinel fails without an
/// extra line (the child already printed its diagnostic); any other
/// code or a termination signal fails with a line naming it.
pub(crate) fn classify_exit(status: ExitStatus, reporter: &Reporter) -> UnitOutcome {
    if let Some(code) = status.code() {
        if code == 0 {
            return UnitOutcome::Passed;
        }
        if code != FAILURE_EXIT_CODE {
            reporter.note(&format!("Process exited with code {code}."));
        }
        return UnitOutcome::Failed;
    }

    if let Some(signal) = status.signal() {
        reporter.note(&format!(
            "Process terminated by signal {signal} ({}).",
            signal_name(signal)
        ));
        return UnitOutcome::Failed;
    }

    reporter.note(&format!("Process ended abnormally ({status})."));
    UnitOutcome::Failed
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        libc::SIGHUP => "SIGHUP",
        libc::SIGINT => "SIGINT",
        libc::SIGQUIT => "SIGQUIT",
        libc::SIGILL => "SIGILL",
        libc::SIGTRAP => "SIGTRAP",
        libc::SIGABRT => "SIGABRT",
        libc::SIGBUS => "SIGBUS",
        libc::SIGFPE => "SIGFPE",
        libc::SIGKILL => "SIGKILL",
        libc::SIGUSR1 => "SIGUSR1",
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGUSR2 => "SIGUSR2",
        libc::SIGPIPE => "SIGPIPE",
        libc::SIGALRM => "SIGALRM",
        libc::SIGTERM => "SIGTERM",
        _ => "unknown",
    }
}

fn parse_selector(selector: &str) -> Option<(usize, u64)> {
    let (suite, test) = selector.split_once(':')?;
    Some((suite.parse().ok()?, test.parse().ok()?))
}

fn run_body(suite: &Suite, id: u64) {
    let body = panic::catch_unwind(panic::AssertUnwindSafe(|| suite.dispatch(Dispatch::Run(id))));
    if body.is_err() {
        // the panic hook already printed the diagnostic
        process::exit(FAILURE_EXIT_CODE);
    }
}

/// Child-process entry: run exactly one unit in this process and exit.
///
/// Runs the before-each hook, the body (directly, or on `threads`
/// workers sharing a fresh [`Rendezvous`]), then after-each, and exits
/// 0 unless something failed first.
pub(crate) fn run_unit_in_process(
    registry: &Registry,
    selector: &str,
    stopped: bool,
) -> Result<Infallible, HarnessError> {
    let (suite_index, test_id) =
        parse_selector(selector).ok_or_else(|| HarnessError::BadSelector(selector.to_string()))?;
    let suite = registry
        .suites()
        .get(suite_index)
        .ok_or_else(|| HarnessError::BadSelector(selector.to_string()))?;
    let test = suite
        .tests
        .iter()
        .find(|test| test.id == test_id)
        .ok_or_else(|| HarnessError::BadSelector(selector.to_string()))?;

    if stopped {
        // park until an external debugger (or the parent) resumes us
        unsafe { libc::raise(libc::SIGSTOP) };
    }

    suite.dispatch(Dispatch::BeforeEach);
    sync::install(Arc::new(Rendezvous::new(test.threads)));

    if test.threads == 1 {
        sync::set_thread_index(0);
        run_body(suite, test.id);
    } else {
        thread::scope(|scope| {
            for index in 0..test.threads {
                let spawned = thread::Builder::new()
                    .name(format!("worker-{index}"))
                    .spawn_scoped(scope, move || {
                        sync::set_thread_index(index);
                        run_body(suite, test.id);
                    });
                if let Err(err) = spawned {
                    eprintln!("{INDENT}Failed to create thread ({err}).");
                    process::exit(FAILURE_EXIT_CODE);
                }
            }
        });
    }

    suite.dispatch(Dispatch::AfterEach);
    process::exit(0)
}
