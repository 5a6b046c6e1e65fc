//! Scenario and suite execution.
//!
//! One scenario: reserve its output slot, launch the tool, check the exit
//! status, then compare the slot against the expected fixture directory.
//! A suite runs its scenarios one after another in a shared workspace; a
//! failing scenario never stops the next one from running.

mod progress;

pub use progress::{NoopProgress, ProgressCallback, ProgressEvent};

#[cfg(test)]
pub use progress::RecordingProgress;

use crate::artifacts::{ArtifactsWriter, ArtifactsWriterConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::{anchor, FixtureLayout};
use crate::golden;
use crate::invoker::ProcessInvoker;
use crate::model::{
    CompareMode, ComparisonOutcome, ErrorInfo, FlagValue, InvocationRecord, InvocationSpec, RunId,
    Scenario, ScenarioPhase, ScenarioResult, ScenarioStatus, Suite, SuiteResult, SuiteStatus,
    REPORT_VERSION,
};
use crate::scenario::validate_suite;
use crate::workspace::{LogSweeper, OutputSlot, Workspace};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Default)]
pub struct RunnerOptions {
    /// Overrides the suite's compare mode.
    pub compare_mode: Option<CompareMode>,
    /// Run only these scenarios (all when empty).
    pub scenario_filter: Vec<String>,
    /// Architecture used for skip decisions; the host's when unset.
    pub arch: Option<String>,
    pub artifacts: Option<ArtifactsWriterConfig>,
    pub progress: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for RunnerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerOptions")
            .field("compare_mode", &self.compare_mode)
            .field("scenario_filter", &self.scenario_filter)
            .field("arch", &self.arch)
            .field("artifacts", &self.artifacts)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Everything a scenario needs from its suite.
pub struct ScenarioContext<'a> {
    pub layout: &'a FixtureLayout,
    pub workspace: &'a Workspace,
    pub env: &'a BTreeMap<String, String>,
    pub compare_mode: CompareMode,
    pub sweeper: Option<&'a LogSweeper>,
}

/// Argument vector for one scenario: `--alignments`, `--output`, then the
/// scenario flags in declaration order.
pub fn build_invocation(
    layout: &FixtureLayout,
    scenario: &Scenario,
    output: &Path,
    env: &BTreeMap<String, String>,
) -> InvocationSpec {
    let mut spec = InvocationSpec::new(layout.program_path(&scenario.program))
        .arg("--alignments")
        .arg(layout.input_dir(&scenario.input))
        .arg("--output")
        .arg(output.as_os_str())
        .current_dir(layout.working_dir());
    for flag in &scenario.flags {
        let value = match &flag.value {
            FlagValue::Literal(value) => OsString::from(value),
            FlagValue::Fixture { fixture } => layout.fixture_file(fixture).into_os_string(),
        };
        spec = spec.arg(flag.name.clone()).arg(value);
    }
    spec.env.clone_from(env);
    spec
}

/// Skip result for a scenario excluded on `arch`. Never touches the workspace.
pub fn skipped_scenario(layout: &FixtureLayout, scenario: &Scenario, arch: &str) -> ScenarioResult {
    tracing::info!(scenario = %scenario.name, arch, "skipped on this architecture");
    ScenarioResult {
        name: scenario.name.clone(),
        status: ScenarioStatus::Skipped,
        phases: vec![ScenarioPhase::NotStarted],
        output_dir: layout.output_for(&scenario.name),
        expected_dir: layout.expected_for(&scenario.name),
        invocation: None,
        outcomes: Vec::new(),
        skip_reason: Some(format!("not supported on {arch}")),
        error: None,
        swept_logs: Vec::new(),
        duration_ms: 0,
    }
}

/// Run one scenario to completion. Failures are recorded in the result;
/// the output slot is released and stray logs swept on every path.
pub fn run_scenario(
    ctx: &ScenarioContext<'_>,
    scenario: &Scenario,
    invoker: &dyn ProcessInvoker,
) -> ScenarioResult {
    let started = Instant::now();
    let sweep_guard = ctx.sweeper.map(LogSweeper::guard);
    let mut phases = PhaseLog::default();

    let mut outcome = match ctx
        .workspace
        .reserve_slot(&scenario.name, scenario.precreate_output)
    {
        Ok(mut slot) => {
            phases.advance(ScenarioPhase::WorkspaceAcquired);
            let mut outcome = execute(ctx, scenario, invoker, &slot, &mut phases);
            if let Err(err) = slot.release() {
                outcome.fail_with(&err);
            }
            outcome
        }
        Err(err) => ScenarioOutcome::errored(&err),
    };
    phases.advance(ScenarioPhase::WorkspaceReleased);

    let swept_logs = match sweep_guard.map(|guard| guard.finish()).transpose() {
        Ok(swept) => swept.unwrap_or_default(),
        Err(err) => {
            outcome.fail_with(&err);
            Vec::new()
        }
    };

    let result = ScenarioResult {
        name: scenario.name.clone(),
        status: outcome.status,
        phases: phases.into_inner(),
        output_dir: ctx.layout.output_for(&scenario.name),
        expected_dir: ctx.layout.expected_for(&scenario.name),
        invocation: outcome.invocation,
        outcomes: outcome.outcomes,
        skip_reason: None,
        error: outcome.error,
        swept_logs,
        duration_ms: elapsed_ms(&started),
    };
    match result.status {
        ScenarioStatus::Passed => tracing::info!(scenario = %result.name, "passed"),
        _ => tracing::info!(
            scenario = %result.name,
            status = ?result.status,
            error = result.error.as_ref().map_or("", |err| err.message.as_str()),
            "did not pass"
        ),
    }
    result
}

struct ScenarioOutcome {
    status: ScenarioStatus,
    invocation: Option<InvocationRecord>,
    outcomes: Vec<ComparisonOutcome>,
    error: Option<ErrorInfo>,
}

impl ScenarioOutcome {
    fn errored(err: &HarnessError) -> Self {
        Self {
            status: ScenarioStatus::Errored,
            invocation: None,
            outcomes: Vec::new(),
            error: Some(err.to_error_info()),
        }
    }

    /// A cleanup failure turns a passing scenario into an errored one but
    /// never hides an earlier failure.
    fn fail_with(&mut self, err: &HarnessError) {
        tracing::warn!(error = %err, "scenario cleanup failed");
        if self.status == ScenarioStatus::Passed {
            self.status = ScenarioStatus::Errored;
        }
        if self.error.is_none() {
            self.error = Some(err.to_error_info());
        }
    }
}

fn execute(
    ctx: &ScenarioContext<'_>,
    scenario: &Scenario,
    invoker: &dyn ProcessInvoker,
    slot: &OutputSlot,
    phases: &mut PhaseLog,
) -> ScenarioOutcome {
    let spec = build_invocation(ctx.layout, scenario, slot.path(), ctx.env);
    phases.advance(ScenarioPhase::ProcessLaunched);
    let result = match invoker.invoke(&spec) {
        Ok(result) => result,
        Err(err) => return ScenarioOutcome::errored(&err),
    };
    let invocation = InvocationRecord {
        command_line: spec.command_line(),
        exit: result.exit.clone(),
        duration_ms: result.duration_ms,
        stdout: result.stdout_text(),
        stderr: result.stderr_text(),
    };

    if !result.exited_with(scenario.expected_exit_code) {
        phases.advance(ScenarioPhase::ProcessFailed);
        let err = HarnessError::ToolExecutionFailure {
            exit: result.exit,
            stderr: invocation.stderr.clone(),
        };
        return ScenarioOutcome {
            invocation: Some(invocation),
            ..ScenarioOutcome::errored(&err)
        };
    }
    phases.advance(ScenarioPhase::ProcessSucceeded);

    if !invoker.produces_output() {
        return ScenarioOutcome {
            status: ScenarioStatus::Passed,
            invocation: Some(invocation),
            outcomes: Vec::new(),
            error: None,
        };
    }

    phases.advance(ScenarioPhase::Comparing);
    let expected_dir = ctx.layout.expected_for(&scenario.name);
    match golden::compare(slot.path(), &expected_dir, ctx.compare_mode) {
        Ok(report) => {
            let error = report
                .failures()
                .find_map(ComparisonOutcome::to_error)
                .map(|err| err.to_error_info());
            let status = if error.is_none() {
                phases.advance(ScenarioPhase::AllMatched);
                ScenarioStatus::Passed
            } else {
                phases.advance(ScenarioPhase::MismatchFound);
                ScenarioStatus::Failed
            };
            ScenarioOutcome {
                status,
                invocation: Some(invocation),
                outcomes: report.outcomes,
                error,
            }
        }
        Err(err) => ScenarioOutcome {
            invocation: Some(invocation),
            ..ScenarioOutcome::errored(&err)
        },
    }
}

/// Run the selected scenarios of `suite` sequentially.
///
/// The observed workspace is created on first use and removed before this
/// returns. A conflicting workspace aborts the whole suite.
pub fn run_suite(
    suite: &Suite,
    invoker: &dyn ProcessInvoker,
    options: &RunnerOptions,
) -> HarnessResult<SuiteResult> {
    validate_suite(suite)?;
    let selected = select_scenarios(suite, &options.scenario_filter)?;
    let layout = FixtureLayout::for_suite(suite);
    let sweeper = suite
        .log_sweep
        .as_ref()
        .map(|config| LogSweeper::new(anchor(layout.root(), &config.dir), &config.pattern))
        .transpose()?;
    let compare_mode = options.compare_mode.unwrap_or(suite.compare_mode);
    let arch = options
        .arch
        .clone()
        .unwrap_or_else(|| std::env::consts::ARCH.to_string());
    let progress = options.progress.as_deref();

    let run_id = RunId::new();
    let started = Instant::now();
    let mut artifacts = options
        .artifacts
        .clone()
        .map(ArtifactsWriter::new)
        .transpose()?;
    if let Some(writer) = artifacts.as_mut() {
        writer.write_suite(suite)?;
    }

    tracing::info!(
        suite = %suite.name,
        %run_id,
        scenarios = selected.len(),
        ?compare_mode,
        "suite started"
    );
    emit(
        progress,
        &ProgressEvent::SuiteStarted {
            run_id,
            suite: suite.name.clone(),
            total: selected.len(),
        },
    );

    let mut workspace: Option<Workspace> = None;
    let mut results = Vec::with_capacity(selected.len());
    for (index, scenario) in selected.iter().enumerate() {
        emit(
            progress,
            &ProgressEvent::ScenarioStarted {
                index: index + 1,
                total: selected.len(),
                name: scenario.name.clone(),
            },
        );
        let result = if scenario.skipped_on(&arch) {
            skipped_scenario(&layout, scenario, &arch)
        } else {
            let shared = take_or_acquire(&mut workspace, &layout)?;
            let ctx = ScenarioContext {
                layout: &layout,
                workspace: &shared,
                env: &suite.env,
                compare_mode,
                sweeper: sweeper.as_ref(),
            };
            let result = run_scenario(&ctx, scenario, invoker);
            workspace = Some(shared);
            result
        };
        if let Some(writer) = artifacts.as_mut() {
            writer.write_scenario_result(&result)?;
        }
        emit(progress, &finished_event(index + 1, &result));
        results.push(result);
    }

    let suite_error = workspace.and_then(release_workspace);
    let suite_result = SuiteResult {
        report_version: REPORT_VERSION,
        run_id,
        suite: suite.name.clone(),
        status: suite_status(&results, suite_error.is_some()),
        workspace: layout.observed_root().to_path_buf(),
        scenarios: results,
        error: suite_error,
        duration_ms: elapsed_ms(&started),
    };
    if let Some(writer) = artifacts.as_mut() {
        writer.write_report(&suite_result)?;
    }
    tracing::info!(suite = %suite.name, status = ?suite_result.status, "suite finished");
    emit(
        progress,
        &ProgressEvent::SuiteFinished {
            run_id,
            status: suite_result.status,
            duration_ms: suite_result.duration_ms,
        },
    );
    Ok(suite_result)
}

fn take_or_acquire(
    workspace: &mut Option<Workspace>,
    layout: &FixtureLayout,
) -> HarnessResult<Workspace> {
    match workspace.take() {
        Some(existing) => Ok(existing),
        None => {
            let (parent, name) = layout.workspace_parts();
            Workspace::acquire(parent, &name)
        }
    }
}

fn release_workspace(mut workspace: Workspace) -> Option<ErrorInfo> {
    let err = workspace.release().err()?;
    tracing::warn!(error = %err, "workspace cleanup failed");
    Some(err.to_error_info())
}

fn suite_status(results: &[ScenarioResult], cleanup_failed: bool) -> SuiteStatus {
    if cleanup_failed {
        SuiteStatus::Errored
    } else if results.iter().all(ScenarioResult::passed) {
        SuiteStatus::Passed
    } else {
        SuiteStatus::Failed
    }
}

/// Scenarios named in `filter`, in suite order; every scenario when empty.
pub fn select_scenarios<'a>(suite: &'a Suite, filter: &[String]) -> HarnessResult<Vec<&'a Scenario>> {
    if let Some(unknown) = filter.iter().find(|name| suite.scenario(name).is_none()) {
        return Err(HarnessError::invalid_suite(format!(
            "suite `{}` has no scenario named `{unknown}`",
            suite.name
        )));
    }
    Ok(suite
        .scenarios
        .iter()
        .filter(|scenario| filter.is_empty() || filter.contains(&scenario.name))
        .collect())
}

fn finished_event(index: usize, result: &ScenarioResult) -> ProgressEvent {
    let matched = result.outcomes.iter().filter(|o| o.matched()).count();
    ProgressEvent::ScenarioFinished {
        index,
        name: result.name.clone(),
        status: result.status,
        duration_ms: result.duration_ms,
        matched,
        failed: result.outcomes.len() - matched,
        message: result
            .error
            .as_ref()
            .map(|err| err.message.clone())
            .or_else(|| result.skip_reason.clone()),
    }
}

fn emit(progress: Option<&dyn ProgressCallback>, event: &ProgressEvent) {
    if let Some(callback) = progress {
        callback.on_progress(event);
    }
}

/// Phases entered so far, starting at `NotStarted`.
struct PhaseLog(Vec<ScenarioPhase>);

impl Default for PhaseLog {
    fn default() -> Self {
        Self(vec![ScenarioPhase::NotStarted])
    }
}

impl PhaseLog {
    fn advance(&mut self, next: ScenarioPhase) {
        if let Some(current) = self.0.last() {
            debug_assert!(current.can_advance_to(next), "{current:?} -> {next:?}");
        }
        tracing::debug!(phase = ?next, "scenario phase");
        self.0.push(next);
    }

    fn into_inner(self) -> Vec<ScenarioPhase> {
        self.0
    }
}

fn elapsed_ms(started: &Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
