// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! `aligncheck compare` on hand-built directories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn compare(observed: &Path, expected: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_aligncheck"))
        .env("NO_COLOR", "1")
        .arg("compare")
        .arg("--observed")
        .arg(observed)
        .arg("--expected")
        .arg(expected)
        .args(extra)
        .output()
        .expect("failed to execute")
}

fn dirs(observed: &[(&str, &str)], expected: &[(&str, &str)]) -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    for (dir, files) in [("observed", observed), ("expected", expected)] {
        fs::create_dir_all(root.path().join(dir)).unwrap();
        for (name, contents) in files {
            fs::write(root.path().join(dir).join(name), contents).unwrap();
        }
    }
    root
}

const NEXUS: &str = "#NEXUS\nbegin data;\nACGT\nend;\n";

#[test]
fn identical_directories_exit_0() {
    let root = dirs(
        &[("uce-1.nexus", NEXUS), ("uce-2.nexus", NEXUS)],
        &[("uce-1.nexus", NEXUS), ("uce-2.nexus", NEXUS)],
    );
    let output = compare(&root.path().join("observed"), &root.path().join("expected"), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok uce-1.nexus"));
    assert!(stdout.contains("2 of 2 files matched"));
}

#[test]
fn mismatch_exits_1_and_prints_a_unified_diff() {
    let root = dirs(
        &[("uce-1.nexus", "#NEXUS\nbegin data;\nACGA\nend;\n")],
        &[("uce-1.nexus", NEXUS)],
    );
    let output = compare(&root.path().join("observed"), &root.path().join("expected"), &[]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mismatch uce-1.nexus (first difference at line 3)"));
    assert!(stdout.contains("-ACGT"), "{stdout}");
    assert!(stdout.contains("+ACGA"), "{stdout}");
    assert!(stdout.contains("0 of 1 files matched"));
}

#[test]
fn json_report_tags_each_outcome() {
    let root = dirs(
        &[("uce-1.nexus", NEXUS), ("uce-3.nexus", NEXUS)],
        &[("uce-1.nexus", NEXUS), ("uce-2.nexus", NEXUS)],
    );
    let output = compare(
        &root.path().join("observed"),
        &root.path().join("expected"),
        &["--strict", "--json"],
    );

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["mode"], "bidirectional");
    let statuses: Vec<(&str, &str)> = report["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| (o["file_name"].as_str().unwrap(), o["status"].as_str().unwrap()))
        .collect();
    assert_eq!(
        statuses,
        [
            ("uce-1.nexus", "matched"),
            ("uce-2.nexus", "missing_output"),
            ("uce-3.nexus", "missing_fixture"),
        ]
    );
}

#[test]
fn observed_only_ignores_unproduced_expectations() {
    let root = dirs(
        &[("uce-1.nexus", NEXUS)],
        &[("uce-1.nexus", NEXUS), ("uce-2.nexus", NEXUS)],
    );
    let output = compare(&root.path().join("observed"), &root.path().join("expected"), &[]);

    assert!(output.status.success());
}

#[test]
fn missing_observed_dir_exits_4() {
    let root = dirs(&[], &[("uce-1.nexus", NEXUS)]);
    let output = compare(
        &root.path().join("nowhere"),
        &root.path().join("expected"),
        &["--json"],
    );

    assert_eq!(output.status.code(), Some(4));
    let error: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(error["code"], "E_IO");
}
