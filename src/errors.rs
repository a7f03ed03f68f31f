//! Fatal harness errors
//!
//! Anything in here aborts the whole run. Per-fixture problems (a script that
//! writes to stderr, a missing `.out` next to a `.stdin` file) are verdicts,
//! not errors, and live in `harness` instead.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors that stop the run before every fixture has been processed.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("could not read fixture directory {}", path.display())]
    #[diagnostic(
        code(autograder::target_dir),
        help("check that --targetDir points at an existing, readable directory")
    )]
    TargetDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read expected output {} for {}", expected.display(), fixture.display())]
    #[diagnostic(
        code(autograder::missing_expected),
        help("every test-*.py needs a matching .out file with the same stem")
    )]
    MissingExpected {
        fixture: PathBuf,
        expected: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{count} .stdin fixture(s) found but no main program was specified")]
    #[diagnostic(code(autograder::missing_main), help("specify the program under test with the --main flag"))]
    MissingMainProgram { count: usize },

    #[error("could not copy source file {} into {}", from.display(), to.display())]
    #[diagnostic(code(autograder::copy_sources))]
    CopySource {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read source directory {}", path.display())]
    #[diagnostic(code(autograder::source_dir))]
    SourceDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start the async runtime")]
    Runtime(#[source] io::Error),

    #[error("failed to write report output")]
    Report(#[from] io::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
