//! Common test helper functions.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use aligncheck::Suite;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Create a unique temporary directory for a test.
///
/// The name carries a timestamp, the process id and a per-process counter so
/// parallel tests never share a directory. The directory is created
/// immediately.
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[must_use]
pub fn temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    dir.push(format!(
        "aligncheck-{prefix}-{stamp}-{}-{seq}",
        std::process::id()
    ));

    #[allow(clippy::expect_used)]
    fs::create_dir_all(&dir).expect("failed to create temp directory");

    dir
}

/// Write a suite file, as YAML when `path` ends in `.yaml`/`.yml` and as
/// JSON otherwise.
///
/// # Panics
///
/// Panics if serialization or file writing fails.
pub fn write_suite(path: &Path, suite: &Suite) {
    let yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    #[allow(clippy::expect_used)]
    let data = if yaml {
        serde_yml::to_string(suite).expect("failed to serialize suite")
    } else {
        serde_json::to_string_pretty(suite).expect("failed to serialize suite")
    };

    #[allow(clippy::expect_used)]
    fs::write(path, data).expect("failed to write suite file");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use aligncheck::scenario::load_suite_file;
    use aligncheck::scenario::phyluce_align_suite;

    #[test]
    fn temp_dir_creates_unique_directories() {
        let dir1 = temp_dir("test");
        let dir2 = temp_dir("test");

        assert!(dir1.exists());
        assert!(dir2.exists());
        assert_ne!(dir1, dir2);
        assert!(dir1
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("aligncheck-test-"));

        let _ = fs::remove_dir_all(&dir1);
        let _ = fs::remove_dir_all(&dir2);
    }

    #[test]
    fn written_suites_load_back() {
        let dir = temp_dir("write-suite");
        let suite = phyluce_align_suite(&dir);
        for name in ["suite.yaml", "suite.json"] {
            let path = dir.join(name);
            write_suite(&path, &suite);
            assert_eq!(load_suite_file(&path).unwrap(), suite);
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
