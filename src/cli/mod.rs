//! CLI module for the autograder
//!
//! ## Flags
//!
//! - `--main <FILE>` - Program under test for `*.stdin` fixtures
//! - `--targetDir <DIR>` - Directory searched for fixtures
//! - `--stopFail` - Stop at the first failing test
//! - `--raw` - Show expected/actual text instead of a diff
//! - `-v` - Show captured output for every test
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use crate::compare::{DiffRenderer, DisplayMode, InlineDiff, OutputComparator, UnifiedDiff};
use crate::errors::HarnessError;
use crate::harness::{self, Harness, HarnessConfig};
use crate::report::{ConsoleReporter, DisplayOptions};
use crate::runner::DEFAULT_INTERPRETER;
use crate::version::AUTOGRADER_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        // Debug formatting of a miette Report is the rich diagnostic rendering.
        CliError::failure(format!("{:?}", miette::Report::new(err)))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Runs golden-output tests against Python programs
#[derive(Parser, Debug)]
#[command(name = "autograder")]
#[command(version = AUTOGRADER_VERSION)]
#[command(about = "Runs golden-output tests against Python programs", long_about = None)]
pub struct Cli {
    /// The python file to run .stdin tests against
    #[arg(long = "main", value_name = "FILE")]
    pub main: Option<PathBuf>,

    /// The directory to search for test files in
    #[arg(long = "targetDir", value_name = "DIR", default_value = ".")]
    pub target_dir: PathBuf,

    /// Stop after the first failing test
    #[arg(long = "stopFail")]
    pub stop_fail: bool,

    /// Show the raw expected and actual output instead of a diff
    #[arg(long = "raw")]
    pub raw: bool,

    /// Show a line-based unified diff instead of an inline one
    #[arg(long = "unified", conflicts_with = "raw")]
    pub unified: bool,

    /// Print captured output for every test, not only failures
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not print partial output when a program fails or times out
    #[arg(long = "hideErrorOutput")]
    pub hide_error_output: bool,

    /// Per-test time limit in milliseconds
    #[arg(long = "timeout", value_name = "MS", default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Interpreter used to run scripts
    #[arg(long = "interpreter", value_name = "CMD", default_value = DEFAULT_INTERPRETER)]
    pub interpreter: String,

    /// Copy *.py files from this directory into the target directory first
    #[arg(long = "sourceDir", value_name = "DIR")]
    pub source_dir: Option<PathBuf>,
}

impl Cli {
    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            target_dir: self.target_dir.clone(),
            working_dir: PathBuf::from("."),
            main_program: self.main.clone(),
            interpreter: self.interpreter.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            stop_on_fail: self.stop_fail,
            source_dir: self.source_dir.clone(),
        }
    }

    pub fn display_options(&self, color: bool) -> DisplayOptions {
        DisplayOptions {
            verbose: self.verbose,
            show_output_on_error: !self.hide_error_output,
            color,
        }
    }

    pub fn comparator(&self, color: bool) -> OutputComparator {
        let mode = if self.raw { DisplayMode::Raw } else { DisplayMode::Diff };
        let renderer: Box<dyn DiffRenderer> = if self.unified {
            Box::new(UnifiedDiff)
        } else {
            Box::new(InlineDiff::new(color))
        };
        OutputComparator::new(mode, renderer)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute a parsed command line and return the exit code.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    if cli.target_dir == PathBuf::from(".") {
        tracing::warn!("No target directory specified, the program will look for tests in the current directory");
        tracing::warn!("If this is not what you intended, set a target directory with the --targetDir flag");
    }

    let color = std::io::stdout().is_terminal();
    let mut harness = Harness::new(
        cli.harness_config(),
        cli.comparator(color),
        ConsoleReporter::stdout(cli.display_options(color)),
    );

    let outcome = harness::run_blocking(&mut harness)?;

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already printed
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["autograder"]).unwrap();
        assert_eq!(cli.target_dir, PathBuf::from("."));
        assert!(cli.main.is_none());
        assert!(!cli.stop_fail);
        assert!(!cli.raw);
        assert_eq!(cli.timeout_ms, 1000);
        assert_eq!(cli.interpreter, "python3");

        let config = cli.harness_config();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn test_cli_parse_original_flags() {
        let cli = Cli::try_parse_from([
            "autograder",
            "--main",
            "main.py",
            "--targetDir",
            "tests",
            "--stopFail",
            "--raw",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.main.as_deref(), Some(std::path::Path::new("main.py")));
        assert_eq!(cli.target_dir, PathBuf::from("tests"));
        assert!(cli.stop_fail);
        assert!(cli.raw);
        assert!(cli.verbose);

        let config = cli.harness_config();
        assert!(config.stop_on_fail);
        assert_eq!(config.main_program, Some(PathBuf::from("main.py")));
        assert_eq!(cli.comparator(false).mode(), DisplayMode::Raw);
    }

    #[test]
    fn test_cli_parse_extended_flags() {
        let cli = Cli::try_parse_from([
            "autograder",
            "--timeout",
            "250",
            "--interpreter",
            "pypy3",
            "--sourceDir",
            "src",
            "--hideErrorOutput",
        ])
        .unwrap();
        let config = cli.harness_config();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.interpreter, "pypy3");
        assert_eq!(config.source_dir, Some(PathBuf::from("src")));
        assert!(!cli.display_options(false).show_output_on_error);
    }

    #[test]
    fn test_cli_raw_conflicts_with_unified() {
        assert!(Cli::try_parse_from(["autograder", "--raw", "--unified"]).is_err());
    }

    #[test]
    fn test_harness_error_becomes_failure() {
        let err: CliError = HarnessError::MissingMainProgram { count: 2 }.into();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("no main program was specified"));
    }
}
