//! Path construction for fixture and output trees.
//!
//! Nothing here touches the filesystem. Relative paths in a suite are
//! anchored at the suite root; absolute paths are kept as given.

use crate::model::{LayoutConfig, Suite};
use std::path::{Path, PathBuf};

/// Resolved locations for one suite run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixtureLayout {
    root: PathBuf,
    expected_root: PathBuf,
    observed_root: PathBuf,
    working_dir: PathBuf,
}

impl FixtureLayout {
    pub fn new(root: impl Into<PathBuf>, layout: &LayoutConfig) -> Self {
        let root = root.into();
        Self {
            expected_root: anchor(&root, &layout.expected_dir),
            observed_root: anchor(&root, &layout.observed_dir),
            working_dir: root.clone(),
            root,
        }
    }

    pub fn for_suite(suite: &Suite) -> Self {
        let mut layout = Self::new(&suite.root, &suite.layout);
        if let Some(dir) = &suite.working_dir {
            layout.working_dir = anchor(&layout.root, dir);
        }
        layout
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read-only expected tree.
    #[must_use]
    pub fn expected_root(&self) -> &Path {
        &self.expected_root
    }

    /// Workspace directory shared by the suite's scenarios.
    #[must_use]
    pub fn observed_root(&self) -> &Path {
        &self.observed_root
    }

    /// Directory the tools are launched from.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Expected outputs for one scenario.
    #[must_use]
    pub fn expected_for(&self, scenario: &str) -> PathBuf {
        self.expected_root.join(scenario)
    }

    /// Input alignment directory passed as `--alignments`.
    #[must_use]
    pub fn input_dir(&self, input: &str) -> PathBuf {
        self.expected_root.join(input)
    }

    /// Auxiliary file (config, taxon list) stored beside the inputs.
    #[must_use]
    pub fn fixture_file(&self, name: &str) -> PathBuf {
        self.expected_root.join(name)
    }

    /// Output slot for one scenario.
    #[must_use]
    pub fn output_for(&self, scenario: &str) -> PathBuf {
        self.observed_root.join(scenario)
    }

    #[must_use]
    pub fn program_path(&self, program: &Path) -> PathBuf {
        anchor(&self.root, program)
    }

    /// Split the observed root into its parent and final component, the
    /// shape `Workspace::acquire` takes.
    #[must_use]
    pub fn workspace_parts(&self) -> (PathBuf, String) {
        let parent = self
            .observed_root
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let name = self
            .observed_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        (parent, name)
    }
}

pub(crate) fn anchor(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
