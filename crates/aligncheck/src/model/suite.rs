use crate::model::{CompareMode, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Current suite file format version.
pub const SUITE_VERSION: u32 = 1;

/// Expected fixture tree, relative to the suite root.
pub const DEFAULT_EXPECTED_DIR: &str = "phyluce/tests/test-expected";
/// Observed (workspace) directory, relative to the suite root.
pub const DEFAULT_OBSERVED_DIR: &str = "phyluce/tests/test-observed";

/// A named set of scenarios sharing one fixture layout and one workspace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    pub suite_version: u32,
    pub name: String,
    /// Base directory for program paths and the fixture layout.
    pub root: PathBuf,
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Process-invocation root; the suite root when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_sweep: Option<LogSweepConfig>,
    #[serde(default)]
    pub compare_mode: CompareMode,
    /// Extra environment for every tool invocation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            suite_version: SUITE_VERSION,
            name: name.into(),
            root: root.into(),
            layout: LayoutConfig::default(),
            working_dir: None,
            log_sweep: None,
            compare_mode: CompareMode::default(),
            env: BTreeMap::new(),
            scenarios: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_log_sweep(mut self, sweep: LogSweepConfig) -> Self {
        self.log_sweep = Some(sweep);
        self
    }

    #[must_use]
    pub fn with_compare_mode(mut self, mode: CompareMode) -> Self {
        self.compare_mode = mode;
        self
    }

    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    #[must_use]
    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub expected_dir: PathBuf,
    pub observed_dir: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            expected_dir: PathBuf::from(DEFAULT_EXPECTED_DIR),
            observed_dir: PathBuf::from(DEFAULT_OBSERVED_DIR),
        }
    }
}

/// Stray log files removed after every scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSweepConfig {
    /// Directory to sweep, relative to the suite root unless absolute.
    pub dir: PathBuf,
    /// File-name pattern with `*` and `?` wildcards.
    pub pattern: String,
}

impl LogSweepConfig {
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
        }
    }
}
