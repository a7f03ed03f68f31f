//! Two-phase run controller
//!
//! ## Phases
//!
//! 1. Self-contained tests: every `test-*.py` in the target directory is run
//!    by the interpreter with an empty stdin and compared against its `.out`.
//!    A missing `.out` here is fatal.
//! 2. Program-input tests: every `*.stdin` is streamed into the main program.
//!    A missing `.out` is an ERROR verdict for that fixture only. If input
//!    fixtures exist but no main program is configured the run aborts.
//!
//! ## Verdicts
//!
//! A fixture passes only when the execution reported no failure (no stderr, no
//! timeout) and stdout equals the golden file byte for byte. An execution
//! failure still goes through the comparison so the diff is shown alongside
//! the error.
//!
//! With `stop_on_fail`, the first FAILED or ERROR verdict ends the run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::compare::OutputComparator;
use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::{self, Fixture, FixtureKind};
use crate::report::Reporter;
use crate::runner::{DEFAULT_INTERPRETER, DEFAULT_TIMEOUT, Execution, Invocation, RunError, SubprocessRunner};

/// Run-level settings. Display settings live in the reporter and comparator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Directory searched for fixtures, relative to `working_dir`.
    pub target_dir: PathBuf,
    /// Directory children run in and relative paths resolve against.
    pub working_dir: PathBuf,
    /// Program fed `*.stdin` fixtures.
    pub main_program: Option<PathBuf>,
    pub interpreter: String,
    pub timeout: Duration,
    pub stop_on_fail: bool,
    /// When set, `*.py` files here are copied into the target directory first.
    pub source_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from("."),
            working_dir: PathBuf::from("."),
            main_program: None,
            interpreter: DEFAULT_INTERPRETER.to_string(),
            timeout: DEFAULT_TIMEOUT,
            stop_on_fail: false,
            source_dir: None,
        }
    }
}

impl HarnessConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        self.working_dir.join(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    /// The fixture could not be judged (no golden file).
    Error,
}

/// Everything the reporter needs to present one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgement {
    pub verdict: Verdict,
    /// Execution failure or error message.
    pub failure: Option<String>,
    /// Captured stdout; `None` when nothing ran.
    pub output: Option<String>,
    /// Diff or raw dump on mismatch.
    pub detail: Option<String>,
}

impl Judgement {
    fn error(message: String) -> Self {
        Self {
            verdict: Verdict::Error,
            failure: Some(message),
            output: None,
            detail: None,
        }
    }
}

/// Aggregated verdicts, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub results: Vec<(Fixture, Verdict)>,
    pub stopped_early: bool,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn record(&mut self, fixture: Fixture, verdict: Verdict) {
        self.results.push((fixture, verdict));
    }

    fn count(&self, verdict: Verdict) -> usize {
        self.results.iter().filter(|(_, v)| *v == verdict).count()
    }

    pub fn passed(&self) -> usize {
        self.count(Verdict::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Verdict::Failed)
    }

    pub fn errored(&self) -> usize {
        self.count(Verdict::Error)
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True when nothing failed or errored.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.errored() == 0
    }
}

enum Flow {
    Continue,
    Stop,
}

pub struct Harness<R: Reporter> {
    config: HarnessConfig,
    runner: SubprocessRunner,
    comparator: OutputComparator,
    reporter: R,
}

impl<R: Reporter> Harness<R> {
    pub fn new(config: HarnessConfig, comparator: OutputComparator, reporter: R) -> Self {
        let runner = SubprocessRunner::new(config.timeout);
        Self {
            config,
            runner,
            comparator,
            reporter,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Run both phases. Fatal configuration errors end the run with `Err`;
    /// verdicts reported up to that point stand.
    pub async fn run(&mut self) -> HarnessResult<RunOutcome> {
        let start = Instant::now();
        let working_dir = self.config.working_dir.clone();
        let target_dir = self.config.target_dir.clone();

        if let Some(source_dir) = &self.config.source_dir {
            let copied = fixture::copy_sources(&self.config.resolve(source_dir), &self.config.resolve(&target_dir))?;
            tracing::info!(copied, "copied source files into target directory");
        }

        let mut outcome = RunOutcome::default();

        let scripts = fixture::discover(&working_dir, &target_dir, FixtureKind::SelfContained)?;
        let flow = self.run_phase(FixtureKind::SelfContained, &scripts, &mut outcome).await?;

        if let Flow::Continue = flow {
            let inputs = fixture::discover(&working_dir, &target_dir, FixtureKind::ProgramInput)?;
            if !inputs.is_empty() && self.config.main_program.is_none() {
                return Err(HarnessError::MissingMainProgram { count: inputs.len() });
            }
            self.run_phase(FixtureKind::ProgramInput, &inputs, &mut outcome).await?;
        }

        outcome.duration = start.elapsed();
        self.reporter.on_run_complete(&outcome)?;
        Ok(outcome)
    }

    #[tracing::instrument(skip_all, fields(?kind, count = fixtures.len()))]
    async fn run_phase(
        &mut self,
        kind: FixtureKind,
        fixtures: &[Fixture],
        outcome: &mut RunOutcome,
    ) -> HarnessResult<Flow> {
        self.reporter.on_phase_start(kind, fixtures.len())?;

        for fixture in fixtures {
            let judgement = match kind {
                FixtureKind::SelfContained => self.judge_script(fixture).await?,
                FixtureKind::ProgramInput => self.judge_input(fixture).await?,
            };
            self.reporter.on_judgement(fixture, &judgement)?;
            outcome.record(fixture.clone(), judgement.verdict);

            if self.config.stop_on_fail && judgement.verdict != Verdict::Passed {
                tracing::debug!(fixture = %fixture.path.display(), "stopping at first failure");
                outcome.stopped_early = true;
                return Ok(Flow::Stop);
            }
        }

        Ok(Flow::Continue)
    }

    async fn judge_script(&mut self, fixture: &Fixture) -> HarnessResult<Judgement> {
        let expected_path = fixture.expected_path();
        let expected = fs::read(self.config.resolve(&expected_path)).map_err(|source| HarnessError::MissingExpected {
            fixture: fixture.path.clone(),
            expected: expected_path.clone(),
            source,
        })?;

        self.reporter.on_fixture_start(fixture)?;
        let invocation = Invocation::new(&self.config.interpreter, &fixture.path, &self.config.working_dir);
        let execution = self.runner.run(&invocation).await;
        Ok(self.judge(&expected, execution))
    }

    async fn judge_input(&mut self, fixture: &Fixture) -> HarnessResult<Judgement> {
        self.reporter.on_fixture_start(fixture)?;

        let expected_path = fixture.expected_path();
        let expected = match fs::read(self.config.resolve(&expected_path)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Judgement::error(format!(
                    "Missing complementary .out for {}: should be named {}",
                    fixture.path.display(),
                    expected_path.display()
                )));
            }
            Err(source) => {
                return Err(HarnessError::MissingExpected {
                    fixture: fixture.path.clone(),
                    expected: expected_path,
                    source,
                });
            }
        };

        let Some(main_program) = &self.config.main_program else {
            return Err(HarnessError::MissingMainProgram { count: 1 });
        };
        let invocation =
            Invocation::new(&self.config.interpreter, main_program, &self.config.working_dir).with_stdin(&fixture.path);
        let execution = self.runner.run(&invocation).await;
        Ok(self.judge(&expected, execution))
    }

    /// Turn an execution into a verdict. Never fails: launch errors become
    /// FAILED verdicts with no captured output.
    fn judge(&self, expected: &[u8], execution: Result<Execution, RunError>) -> Judgement {
        let execution = match execution {
            Ok(execution) => execution,
            Err(e) => {
                return Judgement {
                    verdict: Verdict::Failed,
                    failure: Some(e.to_string()),
                    output: None,
                    detail: None,
                };
            }
        };

        let failure = execution.failure().map(|f| f.to_string());
        let comparison = self.comparator.compare(expected, &execution.stdout);
        let verdict = if failure.is_none() && comparison.passed {
            Verdict::Passed
        } else {
            Verdict::Failed
        };

        Judgement {
            verdict,
            failure,
            output: Some(execution.stdout_lossy()),
            detail: comparison.detail,
        }
    }
}

/// Build a current-thread runtime and drive `harness` to completion.
pub fn run_blocking<R: Reporter>(harness: &mut Harness<R>) -> HarnessResult<RunOutcome> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(HarnessError::Runtime)?;
    runtime.block_on(harness.run())
}
