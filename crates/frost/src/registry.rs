//! Suite registration and test discovery.
//!
//! A suite is a name plus a dispatch callback. Invoked with
//! [`Dispatch::Discover`] the callback appends test descriptors to the
//! provided list without running any test body; invoked with
//! [`Dispatch::Run`] it executes exactly the test with that id. Ids must
//! stay stable between discovery and execution within one process: the
//! isolated child process rebuilds this registry from the same explicit
//! registration calls and addresses the test purely by id.

use crate::error::HarnessError;
use std::time::Duration;

/// Timeout applied to tests that don't declare their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Suite dispatch callback: the single entry point for discovery,
/// per-test hooks, and test execution.
pub type SuiteFn = fn(Dispatch<'_>);

/// What a suite callback is being asked to do.
pub enum Dispatch<'a> {
    /// Append test descriptors to the list. Must not run any test body.
    Discover(&'a mut Vec<TestDef>),
    /// Runs in the isolated process before the test body.
    BeforeEach,
    /// Runs in the isolated process after the test body.
    AfterEach,
    /// Execute exactly the test with this id, on the calling thread.
    Run(u64),
}

/// A registered test: dispatch id, thread count, and timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDef {
    /// Display name, matched by the test part of selection patterns.
    pub name: &'static str,
    /// Dispatch key, unique within the suite.
    pub id: u64,
    /// Number of worker threads the body runs on (>= 1).
    pub threads: u16,
    /// Wall-clock budget when timeout enforcement is on.
    pub timeout: Duration,
}

impl TestDef {
    /// Create a single-threaded test with the default timeout.
    pub fn new(id: u64, name: &'static str) -> Self {
        Self {
            name,
            id,
            threads: 1,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Run the body on `threads` worker threads instead of one.
    pub fn threads(mut self, threads: u16) -> Self {
        self.threads = threads;
        self
    }

    /// Override the default timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A named, ordered collection of tests plus their dispatch callback.
pub struct Suite {
    /// Suite name, matched exactly by the suite part of patterns.
    pub name: &'static str,
    /// Tests in discovery order.
    pub tests: Vec<TestDef>,
    dispatch: SuiteFn,
}

impl Suite {
    /// Invoke the suite's dispatch callback.
    pub fn dispatch(&self, dispatch: Dispatch<'_>) {
        (self.dispatch)(dispatch)
    }
}

/// Ordered, immutable-after-setup collection of suites.
///
/// Built once by explicit registration calls before the run loop
/// starts; registration order drives both run order and list order.
#[derive(Default)]
pub struct Registry {
    suites: Vec<Suite>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite, running discovery immediately.
    ///
    /// Rejects descriptors with duplicate ids or a zero thread count;
    /// either is a configuration error that aborts the whole run.
    pub fn register(&mut self, name: &'static str, dispatch: SuiteFn) -> Result<(), HarnessError> {
        let mut tests = Vec::new();
        dispatch(Dispatch::Discover(&mut tests));

        for (index, test) in tests.iter().enumerate() {
            if test.threads == 0 {
                return Err(HarnessError::ZeroThreads {
                    suite: name,
                    test: test.name,
                });
            }
            if tests[..index].iter().any(|other| other.id == test.id) {
                return Err(HarnessError::DuplicateTestId {
                    suite: name,
                    id: test.id,
                });
            }
        }

        self.suites.push(Suite {
            name,
            tests,
            dispatch,
        });
        Ok(())
    }

    /// Suites in registration order.
    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    /// Total number of registered tests across all suites.
    pub fn total_tests(&self) -> usize {
        self.suites.iter().map(|suite| suite.tests.len()).sum()
    }
}
