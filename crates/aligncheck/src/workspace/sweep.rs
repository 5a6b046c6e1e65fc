use crate::error::{HarnessError, HarnessResult};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Deletes files matching a wildcard pattern from one directory.
///
/// Tools under test drop log files next to their working directory; the
/// sweeper removes them so they never accumulate across scenarios.
#[derive(Clone, Debug)]
pub struct LogSweeper {
    dir: PathBuf,
    pattern: String,
    matcher: Regex,
}

impl LogSweeper {
    /// `pattern` supports `*` (any run of characters) and `?` (one character).
    pub fn new(dir: impl Into<PathBuf>, pattern: &str) -> HarnessResult<Self> {
        if pattern.is_empty() || pattern.contains('/') {
            return Err(HarnessError::invalid_suite(format!(
                "log sweep pattern `{pattern}` must be a non-empty file name pattern"
            )));
        }
        let matcher = Regex::new(&glob_to_regex(pattern)).map_err(|err| {
            HarnessError::invalid_suite(format!("log sweep pattern `{pattern}`: {err}"))
        })?;
        Ok(Self {
            dir: dir.into(),
            pattern: pattern.to_string(),
            matcher,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.matcher.is_match(file_name)
    }

    /// Remove matching regular files (non-recursive). A missing directory
    /// sweeps nothing.
    pub fn sweep(&self) -> HarnessResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(HarnessError::io(
                    format!("failed to list {}", self.dir.display()),
                    err,
                ))
            }
        };

        let mut removed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                HarnessError::io(format!("failed to list {}", self.dir.display()), err)
            })?;
            let is_file = entry.file_type().map(|kind| kind.is_file()).unwrap_or(false);
            let name = entry.file_name();
            if !is_file || !self.matches(&name.to_string_lossy()) {
                continue;
            }
            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::warn!(path = %path.display(), "swept stray log file");
                    removed.push(path);
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(HarnessError::io(
                        format!("failed to remove {}", path.display()),
                        err,
                    ))
                }
            }
        }
        removed.sort();
        Ok(removed)
    }

    /// Guard that sweeps when finished or dropped.
    #[must_use]
    pub fn guard(&self) -> SweepGuard<'_> {
        SweepGuard {
            sweeper: Some(self),
        }
    }
}

/// Runs a sweep at the end of a scope.
#[derive(Debug)]
pub struct SweepGuard<'a> {
    sweeper: Option<&'a LogSweeper>,
}

impl SweepGuard<'_> {
    /// Sweep now and disarm the guard.
    pub fn finish(mut self) -> HarnessResult<Vec<PathBuf>> {
        match self.sweeper.take() {
            Some(sweeper) => sweeper.sweep(),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            if let Err(err) = sweeper.sweep() {
                tracing::warn!(error = %err, "log sweep failed");
            }
        }
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}
