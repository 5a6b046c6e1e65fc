//! Byte-exact comparison of an observed output directory against its
//! expected fixture directory.

use crate::error::{HarnessError, HarnessResult};
use crate::model::{
    CompareMode, ComparisonOutcome, ComparisonStatus, GoldenReport, MismatchDetail,
};
use similar::TextDiff;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

const DIFF_CONTEXT_LINES: usize = 3;

/// Compare every file in `observed_dir` with the same-named file in
/// `expected_dir`.
///
/// Each file gets its own outcome; a missing fixture, a mismatch or an
/// unreadable file never stops the remaining files from being checked.
/// Outcomes are ordered by file name. A tool that never created
/// `observed_dir` produced nothing: observed-only mode has nothing to
/// compare, bidirectional mode reports every expected file as not produced.
pub fn compare(
    observed_dir: &Path,
    expected_dir: &Path,
    mode: CompareMode,
) -> HarnessResult<GoldenReport> {
    let observed = list_files(observed_dir)?;
    let mut names = observed.clone();
    if mode == CompareMode::Bidirectional {
        names.extend(list_files(expected_dir)?);
    }

    let outcomes = names
        .into_iter()
        .map(|name| {
            let observed_path = observed_dir.join(&name);
            let expected_path = expected_dir.join(&name);
            let file_name = name.to_string_lossy().into_owned();
            let status = if observed.contains(&name) {
                compare_file(&observed_path, &expected_path)
            } else {
                ComparisonStatus::MissingOutput
            };
            log_outcome(&file_name, &expected_path, &status);
            ComparisonOutcome {
                file_name,
                observed_path,
                expected_path,
                status,
            }
        })
        .collect();

    Ok(GoldenReport {
        observed_dir: observed_dir.to_path_buf(),
        expected_dir: expected_dir.to_path_buf(),
        mode,
        outcomes,
    })
}

fn log_outcome(file: &str, expected_path: &Path, status: &ComparisonStatus) {
    match status {
        ComparisonStatus::Matched => tracing::debug!(file, "matched"),
        ComparisonStatus::MissingFixture => {
            tracing::info!(file, expected = %expected_path.display(), "no fixture");
        }
        ComparisonStatus::MissingOutput => tracing::info!(file, "expected file was not produced"),
        ComparisonStatus::Mismatch(_) => tracing::info!(file, "mismatch"),
        ComparisonStatus::Unreadable { reason } => {
            tracing::warn!(file, reason = %reason, "unreadable");
        }
    }
}

fn compare_file(observed_path: &Path, expected_path: &Path) -> ComparisonStatus {
    let observed = match fs::read(observed_path) {
        Ok(bytes) => bytes,
        Err(err) => return unreadable(observed_path, &err),
    };
    let expected = match fs::read(expected_path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return ComparisonStatus::MissingFixture;
        }
        Err(err) => return unreadable(expected_path, &err),
    };
    if observed == expected {
        return ComparisonStatus::Matched;
    }
    ComparisonStatus::Mismatch(mismatch_detail(
        &observed,
        &expected,
        observed_path,
        expected_path,
    ))
}

fn unreadable(path: &Path, err: &io::Error) -> ComparisonStatus {
    ComparisonStatus::Unreadable {
        reason: format!("{}: {err}", path.display()),
    }
}

fn mismatch_detail(
    observed: &[u8],
    expected: &[u8],
    observed_path: &Path,
    expected_path: &Path,
) -> MismatchDetail {
    let observed_text = String::from_utf8_lossy(observed).into_owned();
    let expected_text = String::from_utf8_lossy(expected).into_owned();
    let diff = TextDiff::from_lines(&expected_text, &observed_text)
        .unified_diff()
        .context_radius(DIFF_CONTEXT_LINES)
        .header(
            &expected_path.display().to_string(),
            &observed_path.display().to_string(),
        )
        .to_string();
    MismatchDetail {
        observed_len: observed.len() as u64,
        expected_len: expected.len() as u64,
        first_difference: first_differing_line(observed, expected),
        observed: observed_text,
        expected: expected_text,
        diff,
    }
}

/// 1-based number of the first line that differs, counting a line that
/// exists on only one side as differing. `None` when the inputs are equal.
pub fn first_differing_line(observed: &[u8], expected: &[u8]) -> Option<usize> {
    let mut observed_lines = observed.split_inclusive(|byte| *byte == b'\n');
    let mut expected_lines = expected.split_inclusive(|byte| *byte == b'\n');
    let mut line = 0;
    loop {
        line += 1;
        match (observed_lines.next(), expected_lines.next()) {
            (None, None) => return None,
            (Some(a), Some(b)) if a == b => {}
            _ => return Some(line),
        }
    }
}

/// Non-hidden entries directly inside `dir` that are not directories,
/// sorted by raw name. A missing `dir` lists as empty.
fn list_files(dir: &Path) -> HarnessResult<BTreeSet<OsString>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "directory absent, nothing to list");
            return Ok(BTreeSet::new());
        }
        Err(err) => {
            return Err(HarnessError::io(
                format!("failed to list {}", dir.display()),
                err,
            ))
        }
    };
    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry
            .map_err(|err| HarnessError::io(format!("failed to list {}", dir.display()), err))?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            tracing::warn!(path = %path.display(), "skipping subdirectory in comparison");
            continue;
        }
        names.insert(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn first_difference_counts_lines_from_one() {
        assert_eq!(first_differing_line(b"a\nb\n", b"a\nb\n"), None);
        assert_eq!(first_differing_line(b"a\nb\n", b"a\nc\n"), Some(2));
        assert_eq!(first_differing_line(b"a\n", b"a\nb\n"), Some(2));
        assert_eq!(first_differing_line(b"a", b"a\n"), Some(1));
        assert_eq!(first_differing_line(b"", b"x"), Some(1));
    }

    #[test]
    fn mismatch_diff_is_unified_against_the_fixture() {
        let detail = mismatch_detail(
            b"#NEXUS\nbegin data;\nACGT\n",
            b"#NEXUS\nbegin data;\nACGA\n",
            Path::new("observed/uce-1.nexus"),
            Path::new("expected/uce-1.nexus"),
        );
        assert_eq!(detail.first_difference, Some(3));
        assert!(detail.diff.starts_with("--- expected/uce-1.nexus\n+++ observed/uce-1.nexus\n"));
        assert!(detail.diff.contains("-ACGA\n"));
        assert!(detail.diff.contains("+ACGT\n"));
        assert_eq!(detail.observed_len, 24);
    }
}
