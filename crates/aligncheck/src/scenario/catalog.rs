use crate::model::{LogSweepConfig, Scenario, Suite};
use std::path::PathBuf;

/// Name of the built-in phyluce alignment suite.
pub const PHYLUCE_ALIGN: &str = "phyluce-align";

pub const BUILTIN_SUITES: [&str; 1] = [PHYLUCE_ALIGN];

const LOG_DIR: &str = "phyluce/tests";

const CONVERT: &str = "bin/align/phyluce_align_convert_one_align_to_another";

/// Look up a built-in suite by name, rooted at `root`.
pub fn builtin_suite(name: &str, root: impl Into<PathBuf>) -> Option<Suite> {
    match name {
        PHYLUCE_ALIGN => Some(phyluce_align_suite(root)),
        _ => None,
    }
}

/// The phyluce `bin/align` regression scenarios against the repository's
/// `test-expected` fixture set.
pub fn phyluce_align_suite(root: impl Into<PathBuf>) -> Suite {
    // the tools log into their working directory; run them where the sweep looks
    Suite::new(PHYLUCE_ALIGN, root)
        .with_working_dir(LOG_DIR)
        .with_log_sweep(LogSweepConfig::new(LOG_DIR, "*.log"))
        .with_scenario(
            nexus_from_fasta(Scenario::new(
                "mafft-gblocks",
                "bin/align/phyluce_align_get_gblocks_trimmed_alignments_from_untrimmed",
                "mafft",
            ))
            .with_description("Gblocks-trim untrimmed MAFFT alignments")
            // Gblocks binaries are not published for arm64
            .skip_on_arch("aarch64"),
        )
        .with_scenario(
            nexus_from_fasta(Scenario::new(
                "mafft-trimal",
                "bin/align/phyluce_align_get_trimal_trimmed_alignments_from_untrimmed",
                "mafft",
            ))
            .with_description("trimAl-trim untrimmed MAFFT alignments"),
        )
        .with_scenario(
            // inputs have an odd taxon count so per-column base ties cannot occur
            nexus_from_fasta(Scenario::new(
                "mafft-edge-trim",
                "bin/align/phyluce_align_get_trimmed_alignments_from_untrimmed",
                "mafft-for-edge-trim",
            ))
            .with_description("edge-trim untrimmed MAFFT alignments"),
        )
        .with_scenario(
            Scenario::new(
                "mafft-missing-data-designators",
                "bin/align/phyluce_align_add_missing_data_designators",
                "mafft",
            )
            .with_description("pad incomplete-matrix alignments with missing-data designators")
            .flag("--input-format", "fasta")
            .flag("--output-format", "nexus")
            .fixture_flag("--match-count-output", "taxon-set.incomplete.conf")
            .fixture_flag("--incomplete-matrix", "taxon-set.incomplete")
            .flag("--cores", "1"),
        )
        .with_scenario(
            nexus_from_fasta(Scenario::new(
                "mafft-degen-bases-converted",
                "bin/align/phyluce_align_convert_degen_bases",
                "mafft-degen-bases",
            ))
            .with_description("replace degenerate base codes"),
        )
        .with_scenario(
            nexus_from_fasta(Scenario::new("mafft-fasta-to-nexus", CONVERT, "mafft"))
                .with_description("convert FASTA alignments to NEXUS"),
        )
        .with_scenario(
            Scenario::new("mafft-fasta-to-phylip-relaxed", CONVERT, "mafft")
                .with_description("convert FASTA alignments to relaxed PHYLIP")
                .flag("--input-format", "fasta")
                .flag("--output-format", "phylip-relaxed")
                .flag("--cores", "1"),
        )
        .with_scenario(
            Scenario::new("mafft-nexus-to-fasta", CONVERT, "mafft-fasta-to-nexus")
                .with_description("convert NEXUS alignments back to FASTA")
                .flag("--input-format", "nexus")
                .flag("--output-format", "fasta")
                .flag("--cores", "1"),
        )
}

fn nexus_from_fasta(scenario: Scenario) -> Scenario {
    scenario
        .flag("--input-format", "fasta")
        .flag("--output-format", "nexus")
        .flag("--cores", "1")
}
