#![forbid(unsafe_code)]
//! Golden-output test harness for scripted programs
//!
//! The harness discovers fixtures in a flat directory, runs the program under
//! test once per fixture with a wall-clock deadline, and compares captured
//! stdout with a `.out` golden file.
//!
//! ## Pipeline
//!
//! - [`fixture`] - discovery and `.out` pairing
//! - [`runner`] - subprocess execution with timeout and stream capture
//! - [`compare`] - exact comparison, diff or raw rendering
//! - [`harness`] - two-phase orchestration and stop-on-failure
//! - [`report`] - console presentation of verdicts
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod compare;
pub mod errors;
pub mod fixture;
pub mod harness;
pub mod report;
pub mod runner;
pub mod version;

pub use compare::{DiffRenderer, DisplayMode, InlineDiff, OutputComparator};
pub use errors::{HarnessError, HarnessResult};
pub use fixture::{Fixture, FixtureKind, expected_path};
pub use harness::{Harness, HarnessConfig, Judgement, RunOutcome, Verdict};
pub use report::{ConsoleReporter, DisplayOptions, Reporter};
pub use runner::{ExecFailure, Execution, Invocation, RunError, SubprocessRunner};
