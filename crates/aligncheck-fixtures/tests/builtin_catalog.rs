// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! The built-in phyluce catalog, run end to end against the stand-in tools.

use std::fs;
use std::path::Path;

use aligncheck::invoker::SystemInvoker;
use aligncheck::runner::{run_suite, RunnerOptions};
use aligncheck::scenario::load_suite_file;
use aligncheck::{
    CompareMode, ComparisonStatus, ErrorCode, ScenarioPhase, ScenarioStatus, SuiteStatus,
};
use aligncheck_fixtures::{write_suite, PhyluceTree};

const CONVERT: &str = env!("CARGO_BIN_EXE_aligncheck-fake-convert");
const FAIL: &str = env!("CARGO_BIN_EXE_aligncheck-fake-fail");

fn catalog_tree(prefix: &str) -> PhyluceTree {
    PhyluceTree::for_builtin_catalog(prefix, Path::new(CONVERT))
}

fn options(arch: &str) -> RunnerOptions {
    RunnerOptions {
        arch: Some(arch.to_string()),
        ..RunnerOptions::default()
    }
}

fn log_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".log"))
        .collect()
}

#[test]
fn every_catalog_scenario_matches_its_fixtures() {
    let tree = catalog_tree("catalog-pass");
    let before = tree.snapshot_expected();

    let result = run_suite(&tree.builtin_suite(), &SystemInvoker, &options("x86_64")).unwrap();

    assert_eq!(result.status, SuiteStatus::Passed, "{:#?}", result);
    assert_eq!(result.scenarios.len(), 8);
    for scenario in &result.scenarios {
        assert_eq!(scenario.status, ScenarioStatus::Passed, "{}", scenario.name);
        assert!(!scenario.outcomes.is_empty(), "{}", scenario.name);
        assert_eq!(scenario.final_phase(), Some(ScenarioPhase::WorkspaceReleased));
        assert!(!scenario.output_dir.exists());
    }

    let phylip = result.scenario("mafft-fasta-to-phylip-relaxed").unwrap();
    let names: Vec<&str> = phylip.outcomes.iter().map(|o| o.file_name.as_str()).collect();
    assert_eq!(names, ["uce-1.phylip-relaxed", "uce-2.phylip-relaxed"]);

    assert!(!tree.layout().observed_root().exists());
    assert!(log_files(&tree.log_dir()).is_empty());
    assert_eq!(tree.snapshot_expected(), before);
}

#[test]
fn tool_logs_are_swept_after_each_scenario() {
    let tree = catalog_tree("catalog-logs");
    let result = run_suite(&tree.builtin_suite(), &SystemInvoker, &options("x86_64")).unwrap();

    let trimal = result.scenario("mafft-trimal").unwrap();
    assert_eq!(trimal.swept_logs.len(), 1);
    assert!(trimal.swept_logs[0]
        .to_string_lossy()
        .ends_with("phyluce_align_get_trimal_trimmed_alignments_from_untrimmed.log"));
}

#[test]
fn gblocks_is_skipped_on_arm64() {
    let tree = catalog_tree("catalog-arm");
    let result = run_suite(&tree.builtin_suite(), &SystemInvoker, &options("aarch64")).unwrap();

    assert_eq!(result.status, SuiteStatus::Passed);
    let gblocks = result.scenario("mafft-gblocks").unwrap();
    assert_eq!(gblocks.status, ScenarioStatus::Skipped);
    assert!(gblocks.invocation.is_none());
    assert_eq!(result.count(ScenarioStatus::Passed), 7);
}

#[test]
fn a_failing_tool_only_fails_its_own_scenario() {
    let tree = catalog_tree("catalog-fail");
    let suite = tree.builtin_suite();
    let trimal = suite.scenario("mafft-trimal").unwrap();
    tree.install_tool(&trimal.program, Path::new(FAIL));

    let result = run_suite(&suite, &SystemInvoker, &options("x86_64")).unwrap();

    assert_eq!(result.status, SuiteStatus::Failed);
    let failed = result.scenario("mafft-trimal").unwrap();
    assert_eq!(failed.status, ScenarioStatus::Errored);
    assert_eq!(
        failed.error.as_ref().unwrap().code,
        ErrorCode::ToolExecution.as_str()
    );
    assert!(failed.phases.contains(&ScenarioPhase::ProcessFailed));
    assert!(!failed.phases.contains(&ScenarioPhase::Comparing));
    assert!(failed
        .invocation
        .as_ref()
        .unwrap()
        .stderr
        .contains("ValueError: simulated alignment failure"));
    assert_eq!(result.count(ScenarioStatus::Passed), 7);
    // the partial output of the failed tool is gone with the workspace
    assert!(!tree.layout().observed_root().exists());
}

#[test]
fn removed_fixture_is_reported_per_file() {
    let tree = catalog_tree("catalog-missing");
    fs::remove_file(tree.layout().expected_for("mafft-edge-trim").join("uce-2.nexus")).unwrap();

    let result = run_suite(&tree.builtin_suite(), &SystemInvoker, &options("x86_64")).unwrap();

    let edge = result.scenario("mafft-edge-trim").unwrap();
    assert_eq!(edge.status, ScenarioStatus::Failed);
    assert_eq!(edge.outcomes[0].status, ComparisonStatus::Matched);
    assert_eq!(edge.outcomes[1].status, ComparisonStatus::MissingFixture);
    assert_eq!(edge.final_phase(), Some(ScenarioPhase::WorkspaceReleased));
    assert!(edge.phases.contains(&ScenarioPhase::MismatchFound));
}

#[test]
fn strict_mode_catches_expected_files_never_produced() {
    let tree = catalog_tree("catalog-strict");
    tree.add_expected("mafft-trimal", &[("uce-9.nexus", "#NEXUS\n")]);
    let suite = tree.builtin_suite();

    let lenient = run_suite(&suite, &SystemInvoker, &options("x86_64")).unwrap();
    assert_eq!(lenient.status, SuiteStatus::Passed);

    let strict = RunnerOptions {
        compare_mode: Some(CompareMode::Bidirectional),
        ..options("x86_64")
    };
    let result = run_suite(&suite, &SystemInvoker, &strict).unwrap();
    let trimal = result.scenario("mafft-trimal").unwrap();
    assert_eq!(trimal.status, ScenarioStatus::Failed);
    let missing: Vec<&str> = trimal
        .outcomes
        .iter()
        .filter(|o| o.status == ComparisonStatus::MissingOutput)
        .map(|o| o.file_name.as_str())
        .collect();
    assert_eq!(missing, ["uce-9.nexus"]);
}

#[test]
fn suite_file_with_relative_root_runs_like_the_builtin() {
    let tree = catalog_tree("catalog-file");
    let mut suite = tree.builtin_suite();
    suite.root = ".".into();
    let path = tree.root().join("aligncheck.yaml");
    write_suite(&path, &suite);

    let loaded = load_suite_file(&path).unwrap();
    assert_eq!(loaded.root, tree.root().join("."));
    let result = run_suite(&loaded, &SystemInvoker, &options("x86_64")).unwrap();
    assert_eq!(result.status, SuiteStatus::Passed);
}

#[test]
fn leftover_workspace_aborts_the_suite() {
    let tree = catalog_tree("catalog-conflict");
    fs::create_dir_all(tree.layout().observed_root()).unwrap();

    let err = run_suite(&tree.builtin_suite(), &SystemInvoker, &options("x86_64")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::WorkspaceConflict);
    // the pre-existing directory is not ours to remove
    assert!(tree.layout().observed_root().exists());
}
