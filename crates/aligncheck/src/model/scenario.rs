use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One configured exercise of a single tool against one input fixture set.
///
/// The scenario name doubles as the output slot name and as the name of the
/// expected-output subdirectory in the fixture set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Executable, relative to the suite root unless absolute.
    pub program: PathBuf,
    /// Input alignment directory, relative to the expected fixture root.
    pub input: String,
    /// Tool flags in invocation order, after `--alignments` and `--output`.
    #[serde(default)]
    pub flags: Vec<Flag>,
    #[serde(default)]
    pub expected_exit_code: i32,
    /// `std::env::consts::ARCH` values on which the scenario is skipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_on_arch: Vec<String>,
    /// Create the output directory before launching the tool.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub precreate_output: bool,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<PathBuf>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            program: program.into(),
            input: input.into(),
            flags: Vec::new(),
            expected_exit_code: 0,
            skip_on_arch: Vec::new(),
            precreate_output: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a flag with a literal value.
    #[must_use]
    pub fn flag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.flags.push(Flag {
            name: name.into(),
            value: FlagValue::Literal(value.into()),
        });
        self
    }

    /// Append a flag whose value is a file in the expected fixture root.
    #[must_use]
    pub fn fixture_flag(mut self, name: impl Into<String>, fixture: impl Into<String>) -> Self {
        self.flags.push(Flag {
            name: name.into(),
            value: FlagValue::Fixture {
                fixture: fixture.into(),
            },
        });
        self
    }

    #[must_use]
    pub fn skip_on_arch(mut self, arch: impl Into<String>) -> Self {
        self.skip_on_arch.push(arch.into());
        self
    }

    #[must_use]
    pub fn with_precreated_output(mut self) -> Self {
        self.precreate_output = true;
        self
    }

    /// Whether the scenario is excluded on the given architecture.
    #[must_use]
    pub fn skipped_on(&self, arch: &str) -> bool {
        self.skip_on_arch.iter().any(|candidate| candidate == arch)
    }
}

/// A flag/value pair, written as a two-element sequence in suite files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, FlagValue)", into = "(String, FlagValue)")]
pub struct Flag {
    pub name: String,
    pub value: FlagValue,
}

impl From<(String, FlagValue)> for Flag {
    fn from((name, value): (String, FlagValue)) -> Self {
        Self { name, value }
    }
}

impl From<Flag> for (String, FlagValue) {
    fn from(flag: Flag) -> Self {
        (flag.name, flag.value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Literal(String),
    /// Resolved against the expected fixture root at invocation time.
    Fixture { fixture: String },
}
