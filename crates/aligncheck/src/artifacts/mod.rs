use crate::error::{HarnessError, HarnessResult};
use crate::model::{ComparisonStatus, ScenarioResult, Suite, SuiteResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct ArtifactsWriterConfig {
    pub dir: PathBuf,
    pub overwrite: bool,
}

/// Writes a suite run to disk for later inspection:
///
/// - `suite.json`: the suite as run
/// - `report.json`: the final [`SuiteResult`]
/// - `scenarios/<name>/result.json`, `stderr.txt`, and one `<file>.diff` per
///   mismatching file
/// - `checksums.json`: FNV-1a checksum of every file above
pub struct ArtifactsWriter {
    dir: PathBuf,
    checksums: BTreeMap<String, String>,
}

impl ArtifactsWriter {
    pub fn new(config: ArtifactsWriterConfig) -> HarnessResult<Self> {
        if config.dir.exists() {
            if !config.overwrite {
                return Err(HarnessError::WorkspaceConflict { path: config.dir });
            }
        } else {
            fs::create_dir_all(&config.dir)
                .map_err(|err| HarnessError::io("failed to create artifacts dir", err))?;
        }
        Ok(Self {
            dir: config.dir,
            checksums: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_suite(&mut self, suite: &Suite) -> HarnessResult<()> {
        self.write_json("suite.json", suite)
    }

    pub fn write_report(&mut self, result: &SuiteResult) -> HarnessResult<()> {
        self.write_json("report.json", result)
    }

    pub fn write_scenario_result(&mut self, result: &ScenarioResult) -> HarnessResult<()> {
        let base = format!("scenarios/{}", result.name);
        self.write_json(&format!("{base}/result.json"), result)?;
        if let Some(invocation) = &result.invocation {
            if !invocation.stderr.is_empty() {
                self.write_text(&format!("{base}/stderr.txt"), &invocation.stderr)?;
            }
        }
        for outcome in &result.outcomes {
            if let ComparisonStatus::Mismatch(detail) = &outcome.status {
                self.write_text(&format!("{base}/{}.diff", outcome.file_name), &detail.diff)?;
            }
        }
        Ok(())
    }

    fn write_json<T: Serialize>(&mut self, name: &str, value: &T) -> HarnessResult<()> {
        let data = serde_json::to_vec_pretty(value).map_err(|err| {
            HarnessError::io(format!("failed to serialize {name}"), err.into())
        })?;
        self.write_bytes(name, &data)
    }

    fn write_text(&mut self, name: &str, text: &str) -> HarnessResult<()> {
        self.write_bytes(name, text.as_bytes())
    }

    fn write_bytes(&mut self, name: &str, data: &[u8]) -> HarnessResult<()> {
        let path = self.dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| HarnessError::io("failed to create artifacts dir", err))?;
        }
        fs::write(&path, data)
            .map_err(|err| HarnessError::io(format!("failed to write artifact {name}"), err))?;
        self.checksums
            .insert(name.to_string(), format!("{:016x}", fnv1a_hash(data)));
        self.write_checksums()
    }

    fn write_checksums(&self) -> HarnessResult<()> {
        let data = serde_json::to_vec_pretty(&self.checksums).map_err(|err| {
            HarnessError::io("failed to serialize checksums", err.into())
        })?;
        fs::write(self.dir.join("checksums.json"), data)
            .map_err(|err| HarnessError::io("failed to write checksums", err))
    }
}

fn fnv1a_hash(data: &[u8]) -> u64 {
    // FNV-1a constants (64-bit)
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    let mut hash: u64 = FNV_OFFSET_BASIS;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a_hash(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_hash(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn existing_dir_requires_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArtifactsWriterConfig {
            dir: dir.path().to_path_buf(),
            overwrite: false,
        };
        let err = ArtifactsWriter::new(config.clone()).err().unwrap();
        assert_eq!(err.code(), ErrorCode::WorkspaceConflict);

        let config = ArtifactsWriterConfig {
            overwrite: true,
            ..config
        };
        assert!(ArtifactsWriter::new(config).is_ok());
    }

    #[test]
    fn every_written_file_is_checksummed() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactsWriter::new(ArtifactsWriterConfig {
            dir: dir.path().join("artifacts"),
            overwrite: false,
        })
        .unwrap();
        writer
            .write_suite(&Suite::new("unit", "/srv/phyluce"))
            .unwrap();
        writer.write_text("scenarios/a/stderr.txt", "boom\n").unwrap();

        let raw = fs::read_to_string(writer.dir().join("checksums.json")).unwrap();
        let checksums: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            checksums.keys().collect::<Vec<_>>(),
            ["scenarios/a/stderr.txt", "suite.json"]
        );
        assert_eq!(
            checksums["scenarios/a/stderr.txt"],
            format!("{:016x}", fnv1a_hash(b"boom\n"))
        );
    }
}
