//! aligncheck CLI: golden-file regression runs for alignment tools.
//!
//! Command-line interface for running suites, listing their scenarios and
//! comparing two directories the way a scenario would.

// CLI-specific lint allowances (CLI binary, not library)
#![allow(missing_docs)]
#![allow(clippy::print_stdout)] // CLI must print to stdout
#![allow(clippy::print_stderr)] // CLI must print to stderr
#![allow(clippy::exit)] // CLI uses exit codes
#![allow(clippy::fn_params_excessive_bools)] // CLI flags are naturally bools

use aligncheck::artifacts::ArtifactsWriterConfig;
use aligncheck::golden;
use aligncheck::invoker::DryRunInvoker;
use aligncheck::runner::{self, ProgressCallback, RunnerOptions};
use aligncheck::scenario::{builtin_suite, load_suite_file, BUILTIN_SUITES};
use aligncheck::{
    CompareMode, ComparisonStatus, ErrorCode, GoldenReport, HarnessError, HarnessResult,
    ScenarioResult, ScenarioStatus, Suite, SuiteResult, SuiteStatus,
};
use clap::builder::PossibleValuesParser;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use miette::{IntoDiagnostic, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod progress;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "ALIGNCHECK_LOG";

/// Color output mode
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and `NO_COLOR` env
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Debug, Parser)]
#[command(
    name = "aligncheck",
    version,
    about = "Golden-file regression harness for alignment tools"
)]
struct Cli {
    /// Control color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a suite and compare every produced file against its fixture
    Run(RunArgs),
    /// List the scenarios of a suite
    List {
        #[command(flatten)]
        source: SuiteSource,
        #[arg(long)]
        json: bool,
    },
    /// Compare an observed directory against an expected one
    Compare {
        #[arg(long, help = "Directory holding the produced files")]
        observed: PathBuf,
        #[arg(long, help = "Directory holding the reference files")]
        expected: PathBuf,
        #[arg(long, help = "Also fail on expected files that were not produced")]
        strict: bool,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct SuiteSource {
    #[arg(
        long,
        conflicts_with = "builtin",
        required_unless_present = "builtin",
        help = "Suite file (.yaml, .yml or .json)"
    )]
    suite: Option<PathBuf>,
    #[arg(long, value_parser = PossibleValuesParser::new(BUILTIN_SUITES), help = "Use a built-in suite")]
    builtin: Option<String>,
    #[arg(
        long,
        help = "Repository root holding the tools and fixtures (default: current directory)"
    )]
    root: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    source: SuiteSource,
    #[arg(long = "scenario", value_name = "NAME", help = "Run only this scenario (repeatable)")]
    scenarios: Vec<String>,
    #[arg(long, help = "Also fail on expected files that were not produced")]
    strict: bool,
    #[arg(long, help = "Print the command lines without running anything")]
    dry_run: bool,
    #[arg(long)]
    json: bool,
    #[arg(long, help = "Write reports, diffs and captured stderr to this directory")]
    artifacts: Option<PathBuf>,
    #[arg(long, requires = "artifacts", help = "Overwrite existing artifacts directory")]
    overwrite: bool,
    #[arg(long, short = 'v', help = "Show per-scenario progress and debug logs on stderr")]
    verbose: bool,
}

/// Configure color output based on CLI flag and environment
fn configure_colors(mode: ColorMode) -> bool {
    let use_color = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable
            if std::env::var("NO_COLOR").is_ok() {
                false
            } else {
                // Check if stderr supports color (where we output diagnostics)
                supports_color::on(supports_color::Stream::Stderr).is_some()
            }
        }
    };

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .color(use_color)
                .unicode(use_color)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set
    use_color
}

/// Log to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool, ansi: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .ok();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ansi = configure_colors(cli.color);
    let verbose = matches!(&cli.command, Commands::Run(args) if args.verbose);
    init_tracing(verbose, ansi);
    match cli.command {
        Commands::Run(args) => cmd_run(args, ansi),
        Commands::List { source, json } => cmd_list(&source, json),
        Commands::Compare {
            observed,
            expected,
            strict,
            json,
        } => cmd_compare(&observed, &expected, strict, json),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

/// Handle the run command.
fn cmd_run(args: RunArgs, color: bool) -> Result<()> {
    let json = args.json;
    let suite = match load_source(&args.source) {
        Ok(suite) => suite,
        Err(err) => return emit_error(json, err),
    };
    tracing::debug!(
        suite = %suite.name,
        root = %suite.root.display(),
        dry_run = args.dry_run,
        "suite loaded"
    );
    let progress = if args.verbose && !json {
        Some(Arc::new(progress::VerboseProgress::new(color)) as Arc<dyn ProgressCallback>)
    } else {
        None
    };
    let options = RunnerOptions {
        compare_mode: args.strict.then_some(CompareMode::Bidirectional),
        scenario_filter: args.scenarios,
        arch: None,
        artifacts: args.artifacts.map(|dir| ArtifactsWriterConfig {
            dir,
            overwrite: args.overwrite,
        }),
        progress,
    };
    let result = if args.dry_run {
        runner::run_suite(&suite, &DryRunInvoker::new(), &options)
    } else {
        aligncheck::run::run_suite_with_options(&suite, &options)
    };
    emit_suite_result(json, args.dry_run, result)
}

/// Handle the list command.
fn cmd_list(source: &SuiteSource, json: bool) -> Result<()> {
    let suite = match load_source(source) {
        Ok(suite) => suite,
        Err(err) => return emit_error(json, err),
    };
    if json {
        let payload = serde_json::to_string(&suite.scenarios).into_diagnostic()?;
        println!("{payload}");
        return Ok(());
    }
    let width = suite
        .scenarios
        .iter()
        .map(|scenario| scenario.name.len())
        .max()
        .unwrap_or(0);
    for scenario in &suite.scenarios {
        let mut line = format!("{:<width$}  {}", scenario.name, scenario.input);
        if let Some(description) = &scenario.description {
            line.push_str(&format!("  {description}"));
        }
        if !scenario.skip_on_arch.is_empty() {
            line.push_str(&format!(" [skipped on {}]", scenario.skip_on_arch.join(", ")));
        }
        println!("{line}");
    }
    Ok(())
}

/// Handle the compare command.
fn cmd_compare(observed: &Path, expected: &Path, strict: bool, json: bool) -> Result<()> {
    let mode = if strict {
        CompareMode::Bidirectional
    } else {
        CompareMode::ObservedOnly
    };
    // unlike a scenario's output slot, directories named on the command line must exist
    for dir in [observed, expected] {
        if let Err(err) = std::fs::metadata(dir) {
            let err = HarnessError::io(format!("cannot compare {}", dir.display()), err);
            return emit_error(json, err);
        }
    }
    let report = match golden::compare(observed, expected, mode) {
        Ok(report) => report,
        Err(err) => return emit_error(json, err),
    };
    if json {
        let payload = serde_json::to_string(&report).into_diagnostic()?;
        println!("{payload}");
    } else {
        print_report(&report);
    }
    if !report.all_matched() {
        std::process::exit(ErrorCode::Mismatch.exit_code());
    }
    Ok(())
}

fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "aligncheck", &mut io::stdout());
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn load_source(source: &SuiteSource) -> HarnessResult<Suite> {
    let root = source.root.as_deref().map(absolute).transpose()?;
    if let Some(path) = &source.suite {
        let mut suite = load_suite_file(path)?;
        if let Some(root) = root {
            suite.root = root;
        }
        return Ok(suite);
    }
    let name = source.builtin.as_deref().unwrap_or_default();
    let root = match root {
        Some(root) => root,
        None => current_dir()?,
    };
    builtin_suite(name, root)
        .ok_or_else(|| HarnessError::invalid_suite(format!("unknown built-in suite `{name}`")))
}

fn absolute(path: &Path) -> HarnessResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(current_dir()?.join(path))
    }
}

fn current_dir() -> HarnessResult<PathBuf> {
    std::env::current_dir().map_err(|err| HarnessError::io("failed to read current directory", err))
}

fn emit_suite_result(json: bool, dry_run: bool, result: HarnessResult<SuiteResult>) -> Result<()> {
    match result {
        Ok(suite_result) => {
            if json {
                let payload = serde_json::to_string(&suite_result).into_diagnostic()?;
                println!("{payload}");
            } else {
                print_summary(&suite_result, dry_run);
            }
            let code = exit_code_for_suite(&suite_result);
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => emit_error(json, err),
    }
}

fn emit_error(json: bool, err: HarnessError) -> Result<()> {
    let code = err.exit_code();
    if json {
        let payload = serde_json::to_string(&err.to_error_info()).into_diagnostic()?;
        println!("{payload}");
    } else {
        eprintln!("{:?}", miette::Report::new(err));
    }
    std::process::exit(code);
}

/// 0 when every scenario passed or was skipped, otherwise the exit code of
/// the most specific error on record.
fn exit_code_for_suite(result: &SuiteResult) -> i32 {
    match result.status {
        SuiteStatus::Passed => 0,
        SuiteStatus::Failed => ErrorCode::Mismatch.exit_code(),
        SuiteStatus::Errored => result
            .error
            .iter()
            .chain(result.scenarios.iter().filter_map(|s| s.error.as_ref()))
            .find_map(|info| ErrorCode::parse(&info.code))
            .map_or(1, ErrorCode::exit_code),
    }
}

fn print_summary(result: &SuiteResult, dry_run: bool) {
    for scenario in &result.scenarios {
        eprint!("{}", scenario_report(scenario, dry_run));
    }
    eprintln!(
        "suite {}: {:?} ({} passed, {} failed, {} errored, {} skipped) in {}ms",
        result.suite,
        result.status,
        result.count(ScenarioStatus::Passed),
        result.count(ScenarioStatus::Failed),
        result.count(ScenarioStatus::Errored),
        result.count(ScenarioStatus::Skipped),
        result.duration_ms,
    );
    if let Some(err) = &result.error {
        eprintln!("error: {} ({})", err.message, err.code);
    }
}

/// Status line of one scenario followed by the detail needed to act on it:
/// the tool's stderr when it failed, a diff per mismatching file.
fn scenario_report(scenario: &ScenarioResult, dry_run: bool) -> String {
    let mut out = scenario_line(scenario);
    out.push('\n');
    if let Some(invocation) = &scenario.invocation {
        if dry_run {
            out.push_str(&format!("    $ {}\n", invocation.command_line));
        }
        if scenario.status == ScenarioStatus::Errored && !invocation.stderr.is_empty() {
            out.push_str("    stderr:\n");
            out.push_str(&indent(&invocation.stderr, "    | "));
        }
    }
    for outcome in scenario.outcomes.iter().filter(|o| !o.matched()) {
        out.push_str(&format!(
            "    {}\n",
            outcome_line(&outcome.file_name, &outcome.status)
        ));
        if let ComparisonStatus::Mismatch(detail) = &outcome.status {
            out.push_str(&indent(&detail.diff, "      "));
        }
    }
    out
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines().map(|line| format!("{prefix}{line}\n")).collect()
}

fn scenario_line(scenario: &ScenarioResult) -> String {
    let label = match scenario.status {
        ScenarioStatus::Passed => "PASS",
        ScenarioStatus::Failed => "FAIL",
        ScenarioStatus::Errored => "ERROR",
        ScenarioStatus::Skipped => "SKIP",
    };
    let mut line = format!("{label:<5} {} ({}ms)", scenario.name, scenario.duration_ms);
    if let Some(reason) = &scenario.skip_reason {
        line.push_str(&format!(": {reason}"));
    }
    if let Some(err) = &scenario.error {
        line.push_str(&format!(": {}", err.message));
    }
    line
}

fn outcome_line(file: &str, status: &ComparisonStatus) -> String {
    match status {
        ComparisonStatus::Matched => format!("ok {file}"),
        ComparisonStatus::Mismatch(detail) => match detail.first_difference {
            Some(line) => format!("mismatch {file} (first difference at line {line})"),
            None => format!("mismatch {file}"),
        },
        ComparisonStatus::MissingFixture => format!("missing fixture {file}"),
        ComparisonStatus::MissingOutput => format!("not produced {file}"),
        ComparisonStatus::Unreadable { reason } => format!("unreadable {file}: {reason}"),
    }
}

fn print_report(report: &GoldenReport) {
    for outcome in &report.outcomes {
        println!("{}", outcome_line(&outcome.file_name, &outcome.status));
        if let ComparisonStatus::Mismatch(detail) = &outcome.status {
            print!("{}", detail.diff);
        }
    }
    println!(
        "{} of {} files matched",
        report.matched_count(),
        report.outcomes.len()
    );
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

    use super::*;
    use aligncheck::{ErrorInfo, RunId, REPORT_VERSION};

    fn suite_result(status: SuiteStatus, error: Option<ErrorInfo>) -> SuiteResult {
        SuiteResult {
            report_version: REPORT_VERSION,
            run_id: RunId::new(),
            suite: "unit".to_string(),
            status,
            workspace: PathBuf::from("/srv/phyluce/phyluce/tests/test-observed"),
            scenarios: Vec::new(),
            error,
            duration_ms: 0,
        }
    }

    #[test]
    fn exit_code_maps_suite_status() {
        assert_eq!(exit_code_for_suite(&suite_result(SuiteStatus::Passed, None)), 0);
        assert_eq!(exit_code_for_suite(&suite_result(SuiteStatus::Failed, None)), 1);
        assert_eq!(exit_code_for_suite(&suite_result(SuiteStatus::Errored, None)), 1);
    }

    #[test]
    fn exit_code_follows_recorded_error() {
        let err = HarnessError::io("cleanup", io::Error::from(io::ErrorKind::PermissionDenied));
        let result = suite_result(SuiteStatus::Errored, Some(err.to_error_info()));
        assert_eq!(exit_code_for_suite(&result), 4);
    }

    #[test]
    fn cli_parses_builtin_run() {
        let cli = Cli::try_parse_from([
            "aligncheck",
            "run",
            "--builtin",
            "phyluce-align",
            "--root",
            "/srv/phyluce",
            "--scenario",
            "mafft-trimal",
            "--scenario",
            "mafft-fasta-to-nexus",
            "--strict",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.scenarios, ["mafft-trimal", "mafft-fasta-to-nexus"]);
        assert!(args.strict);
        assert_eq!(args.source.builtin.as_deref(), Some("phyluce-align"));
    }

    #[test]
    fn cli_requires_exactly_one_suite_source() {
        assert!(Cli::try_parse_from(["aligncheck", "list"]).is_err());
        assert!(Cli::try_parse_from([
            "aligncheck",
            "list",
            "--suite",
            "s.yaml",
            "--builtin",
            "phyluce-align"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["aligncheck", "list", "--builtin", "nope"]).is_err());
    }

    #[test]
    fn overwrite_requires_artifacts() {
        assert!(Cli::try_parse_from([
            "aligncheck",
            "run",
            "--builtin",
            "phyluce-align",
            "--overwrite"
        ])
        .is_err());
    }

    #[test]
    fn outcome_lines_name_the_file() {
        assert_eq!(
            outcome_line("uce-1.nexus", &ComparisonStatus::MissingFixture),
            "missing fixture uce-1.nexus"
        );
        assert_eq!(
            outcome_line("uce-2.nexus", &ComparisonStatus::MissingOutput),
            "not produced uce-2.nexus"
        );
    }
}
