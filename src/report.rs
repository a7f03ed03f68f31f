//! Verdict reporting
//!
//! The harness talks to a [`Reporter`] instead of printing directly, so the
//! console format can be swapped or captured in tests. [`ConsoleReporter`]
//! writes the classic layout:
//!
//! ```text
//! Running tests now
//! Running test [tests/test-add.py] ... PASSED
//! Running test [tests/test-sub.py] ... FAILED
//! [-4-]{+3+}
//! ```

use std::io::{self, Write};

use crate::fixture::{Fixture, FixtureKind};
use crate::harness::{Judgement, RunOutcome, Verdict};

const BLUE: &str = "\x1b[34m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// Receives harness events in order.
pub trait Reporter {
    /// Called before the first fixture of a phase.
    fn on_phase_start(&mut self, _kind: FixtureKind, _count: usize) -> io::Result<()> {
        Ok(())
    }

    /// Called right before a fixture is judged.
    fn on_fixture_start(&mut self, fixture: &Fixture) -> io::Result<()>;

    /// Called once per fixture with its verdict.
    fn on_judgement(&mut self, fixture: &Fixture, judgement: &Judgement) -> io::Result<()>;

    /// Called after the last fixture, unless a fatal error ended the run.
    fn on_run_complete(&mut self, outcome: &RunOutcome) -> io::Result<()>;
}

/// Controls how much the console reporter prints. Never affects verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Print captured output for every fixture, passing ones included.
    pub verbose: bool,
    /// Print partial stdout when an execution fails.
    pub show_output_on_error: bool,
    pub color: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            show_output_on_error: true,
            color: false,
        }
    }
}

pub struct ConsoleReporter<W: Write> {
    out: W,
    options: DisplayOptions,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(options: DisplayOptions) -> Self {
        Self::new(io::stdout(), options)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, options: DisplayOptions) -> Self {
        Self { out, options }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.options.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn write_block(&mut self, text: &str) -> io::Result<()> {
        if text.ends_with('\n') {
            write!(self.out, "{}", text)
        } else {
            writeln!(self.out, "{}", text)
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_phase_start(&mut self, kind: FixtureKind, count: usize) -> io::Result<()> {
        if count == 0 {
            return Ok(());
        }
        let banner = match kind {
            FixtureKind::SelfContained => "Running tests now",
            FixtureKind::ProgramInput => "Comparing output of program to testcases",
        };
        let banner = self.paint(BLUE, banner);
        writeln!(self.out, "{}", banner)
    }

    fn on_fixture_start(&mut self, fixture: &Fixture) -> io::Result<()> {
        let path = self.paint(GREEN, &fixture.path.display().to_string());
        match fixture.kind {
            FixtureKind::SelfContained => write!(self.out, "Running test [{}] ... ", path)?,
            FixtureKind::ProgramInput => write!(self.out, "Running program with input from [{}] ... ", path)?,
        }
        self.out.flush()
    }

    fn on_judgement(&mut self, _fixture: &Fixture, judgement: &Judgement) -> io::Result<()> {
        let status = match judgement.verdict {
            Verdict::Passed => self.paint(GREEN, "PASSED"),
            Verdict::Failed => self.paint(RED, "FAILED"),
            Verdict::Error => self.paint(RED, "ERROR"),
        };
        writeln!(self.out, "{}", status)?;

        if let Some(failure) = &judgement.failure {
            let failure = self.paint(RED, failure);
            self.write_block(&failure)?;
        }

        let show_output = self.options.verbose || (judgement.failure.is_some() && self.options.show_output_on_error);
        if show_output {
            if let Some(output) = judgement.output.as_deref().filter(|o| !o.is_empty()) {
                self.write_block(output)?;
            }
        }

        if let Some(detail) = &judgement.detail {
            self.write_block(detail)?;
        }
        Ok(())
    }

    fn on_run_complete(&mut self, outcome: &RunOutcome) -> io::Result<()> {
        let mut parts = Vec::new();
        if outcome.passed() > 0 {
            parts.push(format!("{} passed", outcome.passed()));
        }
        if outcome.failed() > 0 {
            parts.push(format!("{} failed", outcome.failed()));
        }
        if outcome.errored() > 0 {
            parts.push(format!("{} errors", outcome.errored()));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        let mut line = format!("====== {} in {:.2}s ======", parts.join(", "), outcome.duration.as_secs_f64());
        if outcome.stopped_early {
            line.push_str(" (stopped at first failure)");
        }
        let color = if outcome.is_success() { BOLD_GREEN } else { BOLD_RED };
        let line = self.paint(color, &line);
        writeln!(self.out)?;
        writeln!(self.out, "{}", line)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn render(options: DisplayOptions, fixture: &Fixture, judgement: &Judgement) -> String {
        let mut reporter = ConsoleReporter::new(Vec::new(), options);
        reporter.on_fixture_start(fixture).unwrap();
        reporter.on_judgement(fixture, judgement).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    fn script() -> Fixture {
        Fixture::new("t/test-sub.py", FixtureKind::SelfContained)
    }

    #[test]
    fn test_pass_line() {
        let judgement = Judgement {
            verdict: Verdict::Passed,
            failure: None,
            output: Some("5\n".into()),
            detail: None,
        };
        insta::assert_snapshot!(
            render(DisplayOptions::default(), &script(), &judgement),
            @"Running test [t/test-sub.py] ... PASSED"
        );
    }

    #[test]
    fn test_verbose_shows_output_on_pass() {
        let judgement = Judgement {
            verdict: Verdict::Passed,
            failure: None,
            output: Some("5\n".into()),
            detail: None,
        };
        let options = DisplayOptions {
            verbose: true,
            ..DisplayOptions::default()
        };
        assert_eq!(
            render(options, &script(), &judgement),
            "Running test [t/test-sub.py] ... PASSED\n5\n"
        );
    }

    #[test]
    fn test_failure_prints_error_then_output_then_detail() {
        let judgement = Judgement {
            verdict: Verdict::Failed,
            failure: Some("Traceback".into()),
            output: Some("partial".into()),
            detail: Some("[-4-]{+3+}\n".into()),
        };
        assert_eq!(
            render(DisplayOptions::default(), &script(), &judgement),
            "Running test [t/test-sub.py] ... FAILED\nTraceback\npartial\n[-4-]{+3+}\n"
        );
    }

    #[test]
    fn test_hidden_error_output() {
        let judgement = Judgement {
            verdict: Verdict::Failed,
            failure: Some("Traceback".into()),
            output: Some("partial".into()),
            detail: None,
        };
        let options = DisplayOptions {
            show_output_on_error: false,
            ..DisplayOptions::default()
        };
        assert_eq!(
            render(options, &script(), &judgement),
            "Running test [t/test-sub.py] ... FAILED\nTraceback\n"
        );
    }

    #[test]
    fn test_program_input_label() {
        let fixture = Fixture::new("t/input1.stdin", FixtureKind::ProgramInput);
        let judgement = Judgement {
            verdict: Verdict::Error,
            failure: Some("missing".into()),
            output: None,
            detail: None,
        };
        assert_eq!(
            render(DisplayOptions::default(), &fixture, &judgement),
            "Running program with input from [t/input1.stdin] ... ERROR\nmissing\n"
        );
    }

    #[test]
    fn test_summary_line() {
        let mut outcome = RunOutcome::default();
        outcome.record(script(), Verdict::Passed);
        outcome.record(script(), Verdict::Failed);
        outcome.record(script(), Verdict::Error);
        outcome.duration = Duration::from_millis(1500);

        let mut reporter = ConsoleReporter::new(Vec::new(), DisplayOptions::default());
        reporter.on_run_complete(&outcome).unwrap();
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(text, "\n====== 1 passed, 1 failed, 1 errors in 1.50s ======\n");
    }

    #[test]
    fn test_color_wraps_status() {
        let judgement = Judgement {
            verdict: Verdict::Passed,
            failure: None,
            output: None,
            detail: None,
        };
        let options = DisplayOptions {
            color: true,
            ..DisplayOptions::default()
        };
        let text = render(options, &script(), &judgement);
        assert!(text.ends_with("\x1b[32mPASSED\x1b[0m\n"));
    }
}
