//! Process-isolating unit test harness.
//!
//! Suites register a dispatch callback; the harness discovers their
//! tests through it, then runs every selected test in its own child
//! process so crashes, hangs, and runaway tests stay contained. Tests
//! can run multi-threaded with a built-in rendezvous barrier, carry
//! per-test timeouts, and be re-run under a debugger on demand.
//!
//! The test binary is just a `main` that registers suites and hands
//! control to the harness:
//!
//! ```no_run
//! use frost::{Dispatch, Harness, TestDef};
//!
//! fn math(dispatch: Dispatch<'_>) {
//!     match dispatch {
//!         Dispatch::Discover(tests) => {
//!             tests.push(TestDef::new(1, "add_small"));
//!         }
//!         Dispatch::Run(1) => frost::require_eq!(2 + 2, 4),
//!         _ => {}
//!     }
//! }
//!
//! fn main() {
//!     Harness::new().suite("math", math).run();
//! }
//! ```

pub mod asserts;
pub mod cli;
pub mod debug;
pub mod error;
pub mod exec;
pub mod pattern;
pub mod registry;
pub mod report;
pub mod sync;
pub mod trace;

pub use cli::Options;
pub use error::HarnessError;
pub use exec::{UnitOutcome, FAILURE_EXIT_CODE, POLL_INTERVAL};
pub use pattern::{Pattern, PatternError};
pub use registry::{Dispatch, Registry, Suite, SuiteFn, TestDef, DEFAULT_TIMEOUT};
pub use sync::{synchronize, thread_index, Rendezvous};

/// Harness version, as printed by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builder-style entry point: register suites, then run.
///
/// Registration errors are deferred so every suite can be registered
/// with plain chained calls; `run` aborts on the first recorded error
/// before any test executes.
#[derive(Default)]
pub struct Harness {
    registry: Registry,
    errors: Vec<HarnessError>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite under `name`; discovery runs immediately.
    pub fn suite(mut self, name: &'static str, dispatch: SuiteFn) -> Self {
        if let Err(err) = self.registry.register(name, dispatch) {
            self.errors.push(err);
        }
        self
    }

    /// Hand control to the harness. Never returns; the process exits
    /// with 0 when every selected test passed and 1 otherwise.
    pub fn run(self) -> ! {
        if let Some(err) = self.errors.first() {
            eprintln!("Fatal error: {err}.");
            std::process::exit(1);
        }
        std::process::exit(cli::run(&self.registry, std::env::args_os()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(dispatch: Dispatch<'_>) {
        if let Dispatch::Discover(_) = dispatch {}
    }

    fn broken(dispatch: Dispatch<'_>) {
        if let Dispatch::Discover(tests) = dispatch {
            tests.push(TestDef::new(1, "a"));
            tests.push(TestDef::new(1, "b"));
        }
    }

    #[test]
    fn test_suite_registration_chains() {
        let harness = Harness::new().suite("alpha", empty).suite("beta", empty);
        assert_eq!(harness.registry.suites().len(), 2);
        assert!(harness.errors.is_empty());
    }

    #[test]
    fn test_registration_errors_are_deferred() {
        let harness = Harness::new().suite("bad", broken).suite("good", empty);
        assert_eq!(harness.errors.len(), 1);
        // the valid suite still registered
        assert_eq!(harness.registry.suites().len(), 1);
    }
}
