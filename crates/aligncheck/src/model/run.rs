use crate::model::{ComparisonOutcome, ExitDescription, RunId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const REPORT_VERSION: u32 = 1;

/// Lifecycle states of one scenario, in the order they are entered.
///
/// `WorkspaceReleased` is always recorded last, whatever the outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhase {
    NotStarted,
    WorkspaceAcquired,
    ProcessLaunched,
    ProcessSucceeded,
    ProcessFailed,
    Comparing,
    AllMatched,
    MismatchFound,
    WorkspaceReleased,
}

impl ScenarioPhase {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        use ScenarioPhase::{
            AllMatched, Comparing, MismatchFound, NotStarted, ProcessFailed, ProcessLaunched,
            ProcessSucceeded, WorkspaceAcquired, WorkspaceReleased,
        };
        match (self, next) {
            (WorkspaceReleased, _) => false,
            (_, WorkspaceReleased) => true,
            (NotStarted, WorkspaceAcquired)
            | (WorkspaceAcquired, ProcessLaunched)
            | (ProcessLaunched, ProcessSucceeded | ProcessFailed)
            | (ProcessSucceeded, Comparing)
            | (Comparing, AllMatched | MismatchFound) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Tool succeeded and every compared file matched.
    Passed,
    /// Tool succeeded but at least one file mismatched or lacked a fixture.
    Failed,
    /// The scenario could not reach comparison (launch, exit status, workspace).
    Errored,
    /// Excluded on this platform.
    Skipped,
}

/// What the harness ran and how it ended. Kept in reports after the
/// transient invocation result has been consumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub command_line: String,
    pub exit: ExitDescription,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub phases: Vec<ScenarioPhase>,
    pub output_dir: PathBuf,
    pub expected_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation: Option<InvocationRecord>,
    #[serde(default)]
    pub outcomes: Vec<ComparisonOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub swept_logs: Vec<PathBuf>,
    pub duration_ms: u64,
}

impl ScenarioResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self.status, ScenarioStatus::Passed | ScenarioStatus::Skipped)
    }

    #[must_use]
    pub fn final_phase(&self) -> Option<ScenarioPhase> {
        self.phases.last().copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    Passed,
    Failed,
    /// The observed workspace could not be removed after the run.
    Errored,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResult {
    pub report_version: u32,
    pub run_id: RunId,
    pub suite: String,
    pub status: SuiteStatus,
    pub workspace: PathBuf,
    pub scenarios: Vec<ScenarioResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub duration_ms: u64,
}

impl SuiteResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == SuiteStatus::Passed
    }

    #[must_use]
    pub fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios
            .iter()
            .filter(|scenario| scenario.status == status)
            .count()
    }

    #[must_use]
    pub fn scenario(&self, name: &str) -> Option<&ScenarioResult> {
        self.scenarios.iter().find(|scenario| scenario.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}
