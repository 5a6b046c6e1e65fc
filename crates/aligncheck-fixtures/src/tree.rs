//! A phyluce-shaped repository on disk: tools under `bin/align`, inputs and
//! expected outputs under `phyluce/tests/test-expected`.

use std::fs;
use std::path::{Path, PathBuf};

use aligncheck::fixtures::FixtureLayout;
use aligncheck::scenario::phyluce_align_suite;
use aligncheck::{FlagValue, LayoutConfig, Suite};

use crate::helpers::temp_dir;

/// Binary name of the copying stand-in tool.
pub const CONVERT_BIN: &str = "aligncheck-fake-convert";
/// Binary name of the failing stand-in tool.
pub const FAIL_BIN: &str = "aligncheck-fake-fail";

const FASTA_1: &str = ">taxon-a\nACGT-ACGT\n>taxon-b\nACGTTACGT\n>taxon-c\nACG--ACGT\n";
const FASTA_2: &str = ">taxon-a\nTTGACC\n>taxon-b\nTTGAC-\n>taxon-c\nTTGACC\n";

/// Builder for a throwaway repository root. Panics on filesystem errors; it
/// only runs inside tests.
pub struct PhyluceTree {
    root: PathBuf,
    layout: FixtureLayout,
}

impl PhyluceTree {
    /// Empty tree under a fresh temp directory.
    ///
    /// # Panics
    ///
    /// Panics if the directories cannot be created.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let root = temp_dir(prefix);
        let layout = FixtureLayout::new(&root, &LayoutConfig::default());
        #[allow(clippy::expect_used)]
        fs::create_dir_all(layout.expected_root()).expect("failed to create expected root");
        Self { root, layout }
    }

    /// Tree holding every input, auxiliary file and expected output the
    /// built-in catalog needs, with `tool` installed at each catalog program
    /// path. The expected outputs are what `aligncheck-fake-convert` writes.
    ///
    /// As in phyluce, the `mafft-fasta-to-nexus` expectations double as the
    /// `mafft-nexus-to-fasta` inputs.
    #[must_use]
    pub fn for_builtin_catalog(prefix: &str, tool: &Path) -> Self {
        let tree = Self::new(prefix);
        let fasta = [("uce-1.fasta", FASTA_1), ("uce-2.fasta", FASTA_2)];
        tree.add_input("mafft", &fasta);
        tree.add_input("mafft-for-edge-trim", &fasta);
        tree.add_input(
            "mafft-degen-bases",
            &[("uce-1.fasta", ">taxon-a\nACRT-ACGT\n>taxon-b\nACGTTAYGT\n>taxon-c\nACG--ACGN\n")],
        );
        tree.add_fixture_file(
            "taxon-set.incomplete.conf",
            "[all]\ntaxon-a\ntaxon-b\ntaxon-c\n",
        );
        tree.add_fixture_file("taxon-set.incomplete", "[all]\nuce-1\nuce-2\n");

        let suite = tree.builtin_suite();
        for scenario in &suite.scenarios {
            tree.install_tool(&scenario.program, tool);
        }
        tree.add_expected_from_inputs(&suite);
        tree
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn layout(&self) -> &FixtureLayout {
        &self.layout
    }

    /// `phyluce/tests`, where the tools' log files land.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.root.join("phyluce/tests")
    }

    /// The built-in catalog rooted at this tree.
    #[must_use]
    pub fn builtin_suite(&self) -> Suite {
        phyluce_align_suite(&self.root)
    }

    /// Write an input alignment directory.
    pub fn add_input(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.layout.input_dir(name);
        write_files(&dir, files);
        dir
    }

    /// Write an auxiliary file beside the inputs.
    pub fn add_fixture_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.layout.fixture_file(name);
        write_files(self.layout.expected_root(), &[(name, contents)]);
        path
    }

    /// Write the expected outputs of one scenario.
    pub fn add_expected(&self, scenario: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.layout.expected_for(scenario);
        write_files(&dir, files);
        dir
    }

    /// Expected outputs for every scenario of `suite`, derived the way
    /// `aligncheck-fake-convert` derives its outputs: each input copied under
    /// the `--output-format` extension. Scenarios are handled in suite order,
    /// so one scenario's expectations may serve as a later one's input.
    ///
    /// # Panics
    ///
    /// Panics if an input directory cannot be read or written.
    pub fn add_expected_from_inputs(&self, suite: &Suite) {
        for scenario in &suite.scenarios {
            let format = scenario.flags.iter().find_map(|flag| match &flag.value {
                FlagValue::Literal(value) if flag.name == "--output-format" => Some(value.clone()),
                _ => None,
            });
            let target = self.layout.expected_for(&scenario.name);
            #[allow(clippy::expect_used)]
            fs::create_dir_all(&target).expect("failed to create expected dir");
            #[allow(clippy::expect_used)]
            let entries = fs::read_dir(self.layout.input_dir(&scenario.input))
                .expect("failed to read input dir");
            for entry in entries.filter_map(Result::ok) {
                if !entry.path().is_file() {
                    continue;
                }
                let mut name = PathBuf::from(entry.file_name());
                if let Some(format) = &format {
                    name.set_extension(format);
                }
                #[allow(clippy::expect_used)]
                fs::copy(entry.path(), target.join(name)).expect("failed to copy expected file");
            }
        }
    }

    /// Link `program` (relative to the root) to `binary`, replacing any tool
    /// already installed there. The tool sees the link path as its name.
    ///
    /// # Panics
    ///
    /// Panics if the link cannot be created.
    pub fn install_tool(&self, program: &Path, binary: &Path) -> PathBuf {
        let path = self.layout.program_path(program);
        if let Some(parent) = path.parent() {
            #[allow(clippy::expect_used)]
            fs::create_dir_all(parent).expect("failed to create tool dir");
        }
        let _ = fs::remove_file(&path);
        #[allow(clippy::expect_used)]
        std::os::unix::fs::symlink(binary, &path).expect("failed to install tool");
        path
    }

    /// Relative paths and contents of every file under the expected root.
    #[must_use]
    pub fn snapshot_expected(&self) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files = Vec::new();
        collect(self.layout.expected_root(), self.layout.expected_root(), &mut files);
        files.sort();
        files
    }
}

impl Drop for PhyluceTree {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn write_files(dir: &Path, files: &[(&str, &str)]) {
    #[allow(clippy::expect_used)]
    fs::create_dir_all(dir).expect("failed to create fixture dir");
    for (name, contents) in files {
        #[allow(clippy::expect_used)]
        fs::write(dir.join(name), contents).expect("failed to write fixture file");
    }
}

fn collect(base: &Path, dir: &Path, files: &mut Vec<(PathBuf, Vec<u8>)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if path.is_dir() {
            collect(base, &path, files);
        } else if let (Ok(relative), Ok(data)) = (path.strip_prefix(base), fs::read(&path)) {
            files.push((relative.to_path_buf(), data));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn expected_outputs_take_the_output_format_extension() {
        let tree = PhyluceTree::new("tree-ext");
        tree.add_input("mafft", &[("uce-1.fasta", FASTA_1)]);
        let suite = Suite::new("s", tree.root()).with_scenario(
            aligncheck::Scenario::new("mafft-fasta-to-phylip-relaxed", "bin/align/x", "mafft")
                .flag("--output-format", "phylip-relaxed"),
        );
        tree.add_expected_from_inputs(&suite);

        let expected = tree
            .layout()
            .expected_for("mafft-fasta-to-phylip-relaxed")
            .join("uce-1.phylip-relaxed");
        assert_eq!(fs::read_to_string(expected).unwrap(), FASTA_1);
    }

    #[test]
    fn snapshot_lists_nested_files_in_order() {
        let tree = PhyluceTree::new("tree-snapshot");
        tree.add_input("mafft", &[("uce-2.fasta", FASTA_2), ("uce-1.fasta", FASTA_1)]);
        tree.add_fixture_file("taxon-set.incomplete", "[all]\n");

        let names: Vec<PathBuf> = tree.snapshot_expected().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            names,
            [
                PathBuf::from("mafft/uce-1.fasta"),
                PathBuf::from("mafft/uce-2.fasta"),
                PathBuf::from("taxon-set.incomplete"),
            ]
        );
    }

    #[test]
    fn dropping_the_tree_removes_it() {
        let root = {
            let tree = PhyluceTree::new("tree-drop");
            tree.root().to_path_buf()
        };
        assert!(!root.exists());
    }
}
