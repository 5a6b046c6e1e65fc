use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

/// Which file names drive a golden comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Only files the tool produced are checked; expected files that were
    /// never produced go unnoticed.
    #[default]
    ObservedOnly,
    /// Additionally require every expected file to have been produced.
    Bidirectional,
}

/// Result of checking one file name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    /// Display form of the file name; lossy when the name is not UTF-8.
    pub file_name: String,
    pub observed_path: PathBuf,
    pub expected_path: PathBuf,
    #[serde(flatten)]
    pub status: ComparisonStatus,
}

impl ComparisonOutcome {
    #[must_use]
    pub fn matched(&self) -> bool {
        matches!(self.status, ComparisonStatus::Matched)
    }

    /// The failure as an error value; `None` when the file matched.
    #[must_use]
    pub fn to_error(&self) -> Option<HarnessError> {
        match &self.status {
            ComparisonStatus::Matched => None,
            ComparisonStatus::Mismatch(detail) => Some(HarnessError::MismatchError {
                file: self.file_name.clone(),
                first_difference: detail.first_difference,
                diff: detail.diff.clone(),
            }),
            ComparisonStatus::MissingFixture => Some(HarnessError::MissingFixture {
                file: self.file_name.clone(),
                expected_path: self.expected_path.clone(),
            }),
            ComparisonStatus::MissingOutput => Some(HarnessError::MissingOutput {
                file: self.file_name.clone(),
                expected_path: self.expected_path.clone(),
            }),
            ComparisonStatus::Unreadable { reason } => Some(HarnessError::io(
                format!("failed to compare `{}`", self.file_name),
                io::Error::other(reason.clone()),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonStatus {
    Matched,
    Mismatch(MismatchDetail),
    MissingFixture,
    MissingOutput,
    /// Either side could not be read, e.g. a dangling symlink.
    Unreadable { reason: String },
}

/// Both contents of a mismatching file plus a unified diff.
///
/// Contents are decoded lossily for display; equality was decided on bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchDetail {
    pub observed: String,
    pub expected: String,
    pub observed_len: u64,
    pub expected_len: u64,
    /// 1-based line number of the first differing line.
    pub first_difference: Option<usize>,
    pub diff: String,
}

/// Every outcome of one observed/expected directory comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenReport {
    pub observed_dir: PathBuf,
    pub expected_dir: PathBuf,
    pub mode: CompareMode,
    pub outcomes: Vec<ComparisonOutcome>,
}

impl GoldenReport {
    #[must_use]
    pub fn all_matched(&self) -> bool {
        self.outcomes.iter().all(ComparisonOutcome::matched)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ComparisonOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.matched())
    }

    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.matched()).count()
    }

    /// `Ok` when every outcome matched, otherwise the first failure.
    pub fn into_result(self) -> Result<Self, HarnessError> {
        let first_failure = self.failures().find_map(ComparisonOutcome::to_error);
        match first_failure {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
