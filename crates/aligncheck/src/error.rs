//! Error taxonomy for the harness.
//!
//! Every failure carries a stable [`ErrorCode`] so reports and the CLI can
//! classify it without matching on message text. Errors are local to one
//! scenario (or one compared file); nothing here is retried.

use crate::model::{ErrorInfo, ExitDescription};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Stable, machine-readable error classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Output directory already exists.
    #[serde(rename = "E_WORKSPACE_CONFLICT")]
    WorkspaceConflict,
    /// Executable missing or not invocable.
    #[serde(rename = "E_PROCESS_LAUNCH")]
    ProcessLaunch,
    /// Tool exited with an unexpected status.
    #[serde(rename = "E_TOOL_EXECUTION")]
    ToolExecution,
    /// Expected reference file absent.
    #[serde(rename = "E_MISSING_FIXTURE")]
    MissingFixture,
    /// Expected file never produced (bidirectional comparison only).
    #[serde(rename = "E_MISSING_OUTPUT")]
    MissingOutput,
    /// Produced bytes differ from the reference.
    #[serde(rename = "E_MISMATCH")]
    Mismatch,
    /// Malformed suite or scenario definition.
    #[serde(rename = "E_INVALID_SUITE")]
    InvalidSuite,
    /// Any other filesystem failure.
    #[serde(rename = "E_IO")]
    Io,
}

impl ErrorCode {
    pub const ALL: [Self; 8] = [
        Self::WorkspaceConflict,
        Self::ProcessLaunch,
        Self::ToolExecution,
        Self::MissingFixture,
        Self::MissingOutput,
        Self::Mismatch,
        Self::InvalidSuite,
        Self::Io,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WorkspaceConflict => "E_WORKSPACE_CONFLICT",
            Self::ProcessLaunch => "E_PROCESS_LAUNCH",
            Self::ToolExecution => "E_TOOL_EXECUTION",
            Self::MissingFixture => "E_MISSING_FIXTURE",
            Self::MissingOutput => "E_MISSING_OUTPUT",
            Self::Mismatch => "E_MISMATCH",
            Self::InvalidSuite => "E_INVALID_SUITE",
            Self::Io => "E_IO",
        }
    }

    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == code)
    }

    /// Process exit code the CLI uses when this error ends a run.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ProcessLaunch
            | Self::ToolExecution
            | Self::MissingFixture
            | Self::MissingOutput
            | Self::Mismatch => 1,
            Self::InvalidSuite => 2,
            Self::WorkspaceConflict => 3,
            Self::Io => 4,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("workspace already exists: {}", .path.display())]
    #[diagnostic(
        code(aligncheck::workspace_conflict),
        help("a previous run probably left it behind; inspect and remove it before re-running")
    )]
    WorkspaceConflict { path: PathBuf },

    #[error("failed to launch `{command_line}`")]
    #[diagnostic(
        code(aligncheck::process_launch),
        help("check that the program path exists and is executable")
    )]
    ProcessLaunchFailure {
        command_line: String,
        #[source]
        source: io::Error,
    },

    #[error("tool failed with {exit}:\n{stderr}")]
    #[diagnostic(code(aligncheck::tool_execution))]
    ToolExecutionFailure {
        exit: ExitDescription,
        stderr: String,
    },

    #[error("no expected fixture for `{file}` at {}", .expected_path.display())]
    #[diagnostic(
        code(aligncheck::missing_fixture),
        help("either the tool produced a new file or the fixture set must be regenerated")
    )]
    MissingFixture { file: String, expected_path: PathBuf },

    #[error("expected `{file}` was not produced")]
    #[diagnostic(code(aligncheck::missing_output))]
    MissingOutput { file: String, expected_path: PathBuf },

    #[error("`{file}` differs from its fixture{}", .first_difference.map(|line| format!(" starting at line {line}")).unwrap_or_default())]
    #[diagnostic(code(aligncheck::mismatch))]
    MismatchError {
        file: String,
        first_difference: Option<usize>,
        diff: String,
    },

    #[error("invalid suite: {message}")]
    #[diagnostic(code(aligncheck::invalid_suite))]
    InvalidSuite { message: String },

    #[error("{context}")]
    #[diagnostic(code(aligncheck::io))]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_suite(message: impl Into<String>) -> Self {
        Self::InvalidSuite {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::WorkspaceConflict { .. } => ErrorCode::WorkspaceConflict,
            Self::ProcessLaunchFailure { .. } => ErrorCode::ProcessLaunch,
            Self::ToolExecutionFailure { .. } => ErrorCode::ToolExecution,
            Self::MissingFixture { .. } => ErrorCode::MissingFixture,
            Self::MissingOutput { .. } => ErrorCode::MissingOutput,
            Self::MismatchError { .. } => ErrorCode::Mismatch,
            Self::InvalidSuite { .. } => ErrorCode::InvalidSuite,
            Self::Io { .. } => ErrorCode::Io,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    /// Serializable form for reports.
    #[must_use]
    pub fn to_error_info(&self) -> ErrorInfo {
        let context = match self {
            Self::WorkspaceConflict { path } => Some(serde_json::json!({ "path": path })),
            Self::ProcessLaunchFailure {
                command_line,
                source,
            } => Some(serde_json::json!({
                "command_line": command_line,
                "source": source.to_string(),
            })),
            Self::ToolExecutionFailure { exit, stderr } => Some(serde_json::json!({
                "exit": exit,
                "stderr": stderr,
            })),
            Self::MissingFixture {
                file,
                expected_path,
            }
            | Self::MissingOutput {
                file,
                expected_path,
            } => Some(serde_json::json!({ "file": file, "expected_path": expected_path })),
            Self::MismatchError {
                file,
                first_difference,
                diff,
            } => Some(serde_json::json!({
                "file": file,
                "first_difference": first_difference,
                "diff": diff,
            })),
            Self::InvalidSuite { .. } => None,
            Self::Io { source, .. } => Some(serde_json::json!({ "source": source.to_string() })),
        };
        let message = match self {
            // stderr already lives in the context; keep the headline short
            Self::ToolExecutionFailure { exit, .. } => format!("tool failed with {exit}"),
            other => other.to_string(),
        };
        ErrorInfo {
            code: self.code().as_str().to_string(),
            message,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn codes_round_trip_through_their_names() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(ErrorCode::parse("E_NOPE"), None);
    }

    #[test]
    fn serde_names_match_display() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }

    #[test]
    fn exit_codes_separate_failures_from_setup_problems() {
        assert_eq!(ErrorCode::Mismatch.exit_code(), 1);
        assert_eq!(ErrorCode::ToolExecution.exit_code(), 1);
        assert_eq!(ErrorCode::InvalidSuite.exit_code(), 2);
        assert_eq!(ErrorCode::WorkspaceConflict.exit_code(), 3);
        assert_eq!(ErrorCode::Io.exit_code(), 4);
    }

    #[test]
    fn tool_failure_info_keeps_stderr_verbatim() {
        let err = HarnessError::ToolExecutionFailure {
            exit: ExitDescription::Code { code: 2 },
            stderr: "Traceback (most recent call last):\n  boom\n".to_string(),
        };
        let info = err.to_error_info();
        assert_eq!(info.code, "E_TOOL_EXECUTION");
        assert_eq!(info.message, "tool failed with exit status 2");
        let context = info.context.unwrap();
        assert_eq!(
            context["stderr"],
            "Traceback (most recent call last):\n  boom\n"
        );
    }

    #[test]
    fn mismatch_message_names_the_first_differing_line() {
        let err = HarnessError::MismatchError {
            file: "uce-1.nexus".to_string(),
            first_difference: Some(7),
            diff: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "`uce-1.nexus` differs from its fixture starting at line 7"
        );
    }

    #[test]
    fn signal_exit_is_described_with_its_name() {
        let exit = ExitDescription::Signal {
            signal: 9,
            name: Some("SIGKILL".to_string()),
        };
        assert_eq!(exit.to_string(), "killed by signal 9 (SIGKILL)");
    }
}
