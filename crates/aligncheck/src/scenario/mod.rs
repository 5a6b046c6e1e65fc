//! Loading and validating suite definitions.

mod catalog;

pub use catalog::{builtin_suite, phyluce_align_suite, BUILTIN_SUITES, PHYLUCE_ALIGN};

use crate::error::{HarnessError, HarnessResult};
use crate::model::{FlagValue, Suite, SUITE_VERSION};
use crate::workspace::LogSweeper;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path};

/// Flags the runner always supplies itself.
pub const RESERVED_FLAGS: [&str; 2] = ["--alignments", "--output"];

/// Read a suite from YAML (`.yaml`/`.yml`) or JSON and validate it.
///
/// A relative `root` is taken relative to the directory holding the file.
pub fn load_suite_file(path: &Path) -> HarnessResult<Suite> {
    let data = fs::read_to_string(path).map_err(|err| {
        HarnessError::io(format!("failed to read suite file {}", path.display()), err)
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    let mut suite = if is_yaml {
        parse_suite_yaml(&data)?
    } else {
        parse_suite_json(&data)?
    };
    if suite.root.is_relative() {
        if let Some(parent) = path.parent() {
            suite.root = parent.join(&suite.root);
        }
    }
    validate_suite(&suite)?;
    tracing::debug!(
        suite = %suite.name,
        scenarios = suite.scenarios.len(),
        root = %suite.root.display(),
        "loaded suite"
    );
    Ok(suite)
}

pub fn parse_suite_yaml(data: &str) -> HarnessResult<Suite> {
    serde_yml::from_str(data)
        .map_err(|err| HarnessError::invalid_suite(format!("failed to parse yaml: {err}")))
}

pub fn parse_suite_json(data: &str) -> HarnessResult<Suite> {
    serde_json::from_str(data)
        .map_err(|err| HarnessError::invalid_suite(format!("failed to parse json: {err}")))
}

/// Structural checks that do not touch the filesystem.
pub fn validate_suite(suite: &Suite) -> HarnessResult<()> {
    if suite.suite_version != SUITE_VERSION {
        return Err(HarnessError::invalid_suite(format!(
            "unsupported suite_version {} (expected {SUITE_VERSION})",
            suite.suite_version
        )));
    }
    if suite.name.trim().is_empty() {
        return Err(HarnessError::invalid_suite("suite name must not be empty"));
    }
    if suite.scenarios.is_empty() {
        return Err(HarnessError::invalid_suite(format!(
            "suite `{}` has no scenarios",
            suite.name
        )));
    }
    if let Some(sweep) = &suite.log_sweep {
        LogSweeper::new(&sweep.dir, &sweep.pattern)?;
    }

    let mut seen = BTreeSet::new();
    for scenario in &suite.scenarios {
        let name = &scenario.name;
        if !is_plain_name(name) {
            return Err(HarnessError::invalid_suite(format!(
                "scenario name `{name}` must be a single directory name"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(HarnessError::invalid_suite(format!(
                "duplicate scenario name `{name}`"
            )));
        }
        if scenario.program.as_os_str().is_empty() {
            return Err(HarnessError::invalid_suite(format!(
                "scenario `{name}` has no program"
            )));
        }
        if !is_contained(&scenario.input) {
            return Err(HarnessError::invalid_suite(format!(
                "scenario `{name}`: input `{}` must be a relative path inside the fixture root",
                scenario.input
            )));
        }
        for flag in &scenario.flags {
            if !flag.name.starts_with('-') {
                return Err(HarnessError::invalid_suite(format!(
                    "scenario `{name}`: flag `{}` must start with '-'",
                    flag.name
                )));
            }
            if RESERVED_FLAGS.contains(&flag.name.as_str()) {
                return Err(HarnessError::invalid_suite(format!(
                    "scenario `{name}`: `{}` is supplied by the harness",
                    flag.name
                )));
            }
            if let FlagValue::Fixture { fixture } = &flag.value {
                if !is_contained(fixture) {
                    return Err(HarnessError::invalid_suite(format!(
                        "scenario `{name}`: fixture `{fixture}` must be a relative path inside the fixture root"
                    )));
                }
            }
        }
    }
    Ok(())
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn is_contained(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
