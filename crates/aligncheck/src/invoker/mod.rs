//! Subprocess dispatch.
//!
//! The runner talks to tools only through [`ProcessInvoker`], so tests and
//! dry runs can substitute an invoker that never spawns anything.

use crate::error::{HarnessError, HarnessResult};
use crate::model::{ExitDescription, InvocationResult, InvocationSpec};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Runs one executable to completion and captures its output.
pub trait ProcessInvoker: Send + Sync {
    fn invoke(&self, spec: &InvocationSpec) -> HarnessResult<InvocationResult>;

    /// Whether a successful invocation leaves files to compare. Invokers
    /// that never run the tool return `false` and comparison is skipped.
    fn produces_output(&self) -> bool {
        true
    }
}

/// Spawns real processes. Arguments are passed as-is, never through a
/// shell; stdin is closed; there is no timeout.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemInvoker;

impl ProcessInvoker for SystemInvoker {
    fn invoke(&self, spec: &InvocationSpec) -> HarnessResult<InvocationResult> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        tracing::debug!(command = %spec.command_line(), cwd = ?spec.cwd, "launching tool");
        let started = Instant::now();
        let output = command
            .output()
            .map_err(|source| HarnessError::ProcessLaunchFailure {
                command_line: spec.command_line(),
                source,
            })?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let exit = describe_exit(output.status);
        tracing::debug!(%exit, duration_ms, "tool finished");
        Ok(InvocationResult {
            stdout: output.stdout,
            stderr: output.stderr,
            exit,
            duration_ms,
        })
    }
}

fn describe_exit(status: ExitStatus) -> ExitDescription {
    if let Some(code) = status.code() {
        return ExitDescription::Code { code };
    }
    signal_exit(status).unwrap_or(ExitDescription::Unknown)
}

#[cfg(unix)]
fn signal_exit(status: ExitStatus) -> Option<ExitDescription> {
    use nix::sys::signal::Signal;
    use std::os::unix::process::ExitStatusExt;

    let signal = status.signal()?;
    let name = Signal::try_from(signal)
        .ok()
        .map(|sig| sig.as_str().to_string());
    Some(ExitDescription::Signal { signal, name })
}

#[cfg(not(unix))]
fn signal_exit(_status: ExitStatus) -> Option<ExitDescription> {
    None
}

/// Records every invocation it is handed and reports a clean exit without
/// spawning anything.
#[derive(Debug, Default)]
pub struct DryRunInvoker {
    recorded: Mutex<Vec<InvocationSpec>>,
}

impl DryRunInvoker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Specs received so far, in call order.
    #[must_use]
    pub fn recorded(&self) -> Vec<InvocationSpec> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProcessInvoker for DryRunInvoker {
    fn invoke(&self, spec: &InvocationSpec) -> HarnessResult<InvocationResult> {
        tracing::info!(command = %spec.command_line(), "dry run");
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(spec.clone());
        Ok(InvocationResult::success())
    }

    fn produces_output(&self) -> bool {
        false
    }
}
