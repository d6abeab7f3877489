//! Harness error types.
//!
//! Everything here is a fatal configuration error: the run aborts with
//! a `Fatal error:` line before any test executes (or, for spawn
//! failures, before any further test executes). Per-unit failures are
//! not errors; they are outcomes.

use crate::pattern::PatternError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// A selection pattern failed to parse.
    #[error("failed to parse pattern: {source}")]
    Pattern {
        #[from]
        source: PatternError,
    },

    /// Two tests in one suite share a dispatch id.
    #[error("duplicate test id {id} in suite '{suite}'")]
    DuplicateTestId { suite: &'static str, id: u64 },

    /// A test declared zero worker threads.
    #[error("test '{test}' in suite '{suite}' declares zero threads")]
    ZeroThreads {
        suite: &'static str,
        test: &'static str,
    },

    /// `--debug` selected nothing.
    #[error("no test found for pattern: {0}")]
    NoMatch(String),

    /// The isolated test process could not be created.
    #[error("failed to spawn test process: {0}")]
    Spawn(#[source] io::Error),

    /// The child was re-invoked with a selector it cannot resolve.
    #[error("unknown unit selector '{0}'")]
    BadSelector(String),
}
