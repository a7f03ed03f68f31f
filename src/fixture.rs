//! Fixture discovery and golden-file pairing
//!
//! ## Naming
//!
//! - `test-*.py` are self-contained tests: the script itself is the program.
//! - `*.stdin` are program-input tests: the file is fed to `--main` on stdin.
//!
//! Both pair with an expected-output file that has the same stem and the
//! `.out` extension. Pairing is purely by name, never searched.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{HarnessError, HarnessResult};

/// File name prefix of self-contained test scripts.
pub const SCRIPT_PREFIX: &str = "test-";
/// Extension of scripts run by the interpreter.
pub const SCRIPT_EXTENSION: &str = "py";
/// Extension of program-input fixtures.
pub const STDIN_EXTENSION: &str = "stdin";
/// Extension of golden files.
pub const EXPECTED_EXTENSION: &str = "out";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    /// The fixture is a script executed directly.
    SelfContained,
    /// The fixture is streamed as stdin into the main program.
    ProgramInput,
}

impl FixtureKind {
    fn matches(self, file_name: &str) -> bool {
        let path = Path::new(file_name);
        let ext = path.extension().and_then(|e| e.to_str());
        match self {
            FixtureKind::SelfContained => file_name.starts_with(SCRIPT_PREFIX) && ext == Some(SCRIPT_EXTENSION),
            FixtureKind::ProgramInput => ext == Some(STDIN_EXTENSION),
        }
    }
}

/// A discovered test input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub path: PathBuf,
    pub kind: FixtureKind,
}

impl Fixture {
    pub fn new(path: impl Into<PathBuf>, kind: FixtureKind) -> Self {
        Self { path: path.into(), kind }
    }

    /// Path of the golden file paired with this fixture.
    pub fn expected_path(&self) -> PathBuf {
        expected_path(&self.path)
    }
}

/// Replace the extension of `path` with `.out`.
///
/// A path without an extension simply gains `.out`; discovery never hands
/// such paths out.
pub fn expected_path(path: &Path) -> PathBuf {
    path.with_extension(EXPECTED_EXTENSION)
}

/// List fixtures of `kind` directly inside `dir` (no recursion), sorted by path.
///
/// `dir` is read relative to `working_dir`, and the returned fixture paths
/// stay relative to it (`dir/<name>`), the same way children see them.
pub fn discover(working_dir: &Path, dir: &Path, kind: FixtureKind) -> HarnessResult<Vec<Fixture>> {
    let resolved = working_dir.join(dir);
    let entries = fs::read_dir(&resolved).map_err(|source| HarnessError::TargetDir {
        path: resolved.clone(),
        source,
    })?;

    let mut fixtures = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| HarnessError::TargetDir {
            path: resolved.clone(),
            source,
        })?;
        if !entry.path().is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if kind.matches(name) {
            fixtures.push(Fixture::new(dir.join(name), kind));
        }
    }

    fixtures.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(dir = %dir.display(), ?kind, count = fixtures.len(), "discovered fixtures");
    Ok(fixtures)
}

/// Copy every `*.py` file in `source_dir` into `target_dir`.
///
/// Copied files are made executable on Unix. Returns how many files were
/// copied; copying a directory onto itself copies nothing.
pub fn copy_sources(source_dir: &Path, target_dir: &Path) -> HarnessResult<usize> {
    if same_dir(source_dir, target_dir) {
        return Ok(0);
    }

    let entries = fs::read_dir(source_dir).map_err(|source| HarnessError::SourceDir {
        path: source_dir.to_path_buf(),
        source,
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| HarnessError::SourceDir {
            path: source_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(SCRIPT_EXTENSION) {
            sources.push(path);
        }
    }
    sources.sort();

    for from in &sources {
        let Some(name) = from.file_name() else {
            continue;
        };
        let to = target_dir.join(name);
        fs::copy(from, &to).map_err(|source| HarnessError::CopySource {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        make_executable(&to).map_err(|source| HarnessError::CopySource {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        tracing::info!(from = %from.display(), to = %to.display(), "copied source file");
    }

    Ok(sources.len())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
