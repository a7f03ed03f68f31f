//! Subprocess execution under a wall-clock deadline
//!
//! Each invocation spawns `interpreter script` with its own deadline. stdout and
//! stderr are drained concurrently into separate buffers. When the deadline
//! expires the child is killed and whatever was read so far is kept.
//!
//! The child is spawned with `kill_on_drop`, so it is torn down on every exit
//! path, including a panic or the caller dropping the future.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Default per-fixture deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
/// Default interpreter for scripts.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Errors raised before the child produced any output.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not open input file {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("lost contact with child process: {0}")]
    Wait(#[source] io::Error),
}

/// What to run.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub interpreter: String,
    pub script: PathBuf,
    /// File streamed to the child's stdin. `None` gives the child a null stdin.
    pub stdin: Option<PathBuf>,
    pub working_dir: PathBuf,
}

impl Invocation {
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            stdin: None,
            working_dir: working_dir.into(),
        }
    }

    pub fn with_stdin(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }
}

/// Why an otherwise completed execution counts as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecFailure {
    /// The child wrote to stderr. Carries the stderr text.
    Stderr(String),
    /// The deadline expired and the child was killed.
    TimedOut { limit: Duration, stderr: String },
}

impl fmt::Display for ExecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecFailure::Stderr(text) => write!(f, "{}", text.trim_end()),
            ExecFailure::TimedOut { limit, stderr } => {
                write!(f, "timed out after {}ms", limit.as_millis())?;
                if !stderr.is_empty() {
                    write!(f, "\n{}", stderr.trim_end())?;
                }
                Ok(())
            }
        }
    }
}

/// Captured result of one child process.
#[derive(Debug, Clone, Default)]
pub struct Execution {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit status, when the child exited on its own.
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
    pub limit: Duration,
}

impl Execution {
    /// `Some` when stderr is non-empty or the deadline expired.
    ///
    /// The exit status alone never decides failure.
    pub fn failure(&self) -> Option<ExecFailure> {
        let stderr = String::from_utf8_lossy(&self.stderr).into_owned();
        if self.timed_out {
            Some(ExecFailure::TimedOut {
                limit: self.limit,
                stderr,
            })
        } else if !stderr.is_empty() {
            Some(ExecFailure::Stderr(stderr))
        } else {
            None
        }
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Launches fixtures one at a time.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    timeout: Duration,
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SubprocessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `invocation` to completion or until the deadline.
    #[tracing::instrument(skip_all, fields(script = %invocation.script.display()))]
    pub async fn run(&self, invocation: &Invocation) -> Result<Execution, RunError> {
        let stdin = match &invocation.stdin {
            Some(path) => {
                let file = File::open(resolve(&invocation.working_dir, path)).map_err(|source| RunError::Input {
                    path: path.clone(),
                    source,
                })?;
                Stdio::from(file)
            }
            None => Stdio::null(),
        };

        let mut child = Command::new(&invocation.interpreter)
            .arg(&invocation.script)
            .current_dir(&invocation.working_dir)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: invocation.interpreter.clone(),
                source,
            })?;
        tracing::debug!(pid = ?child.id(), "spawned");

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut execution = Execution {
            limit: self.timeout,
            ..Execution::default()
        };

        let finished = {
            let out_buf = &mut execution.stdout;
            let err_buf = &mut execution.stderr;
            let child = &mut child;
            let drain = async move {
                let read_out = async {
                    if let Some(pipe) = stdout.as_mut() {
                        pipe.read_to_end(out_buf).await?;
                    }
                    Ok::<_, io::Error>(())
                };
                let read_err = async {
                    if let Some(pipe) = stderr.as_mut() {
                        pipe.read_to_end(err_buf).await?;
                    }
                    Ok::<_, io::Error>(())
                };
                let (out, err) = tokio::join!(read_out, read_err);
                // A read error just truncates the capture; the exit status still matters.
                if let Err(e) = out.and(err) {
                    tracing::debug!(error = %e, "stream read failed");
                }
                child.wait().await
            };
            tokio::time::timeout(self.timeout, drain).await
        };

        match finished {
            Ok(status) => {
                execution.status = Some(status.map_err(RunError::Wait)?);
            }
            Err(_elapsed) => {
                execution.timed_out = true;
                tracing::warn!(limit_ms = self.timeout.as_millis() as u64, "deadline expired, killing child");
                if let Err(e) = child.kill().await {
                    tracing::debug!(error = %e, "kill after timeout failed");
                }
            }
        }

        Ok(execution)
    }
}

fn resolve(working_dir: &Path, path: &Path) -> PathBuf {
    working_dir.join(path)
}
