//! Scoped output directories.
//!
//! A [`Workspace`] owns the observed tree for one suite run and an
//! [`OutputSlot`] owns one scenario's output directory inside it. Both must
//! not exist when created and are removed when released or dropped, so every
//! exit path, including unwinding, tears them down.

mod sweep;

pub use sweep::{LogSweeper, SweepGuard};

use crate::error::{HarnessError, HarnessResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory removed exactly once, on release or drop.
#[derive(Debug)]
struct ScopedDir {
    path: PathBuf,
    released: bool,
}

impl ScopedDir {
    fn reserve(path: PathBuf, create: bool) -> HarnessResult<Self> {
        if fs::symlink_metadata(&path).is_ok() {
            return Err(HarnessError::WorkspaceConflict { path });
        }
        if create {
            fs::create_dir(&path).map_err(|err| match err.kind() {
                io::ErrorKind::AlreadyExists => HarnessError::WorkspaceConflict { path: path.clone() },
                _ => HarnessError::io(format!("failed to create {}", path.display()), err),
            })?;
            tracing::debug!(path = %path.display(), "created directory");
        }
        Ok(Self {
            path,
            released: false,
        })
    }

    fn release(&mut self) -> HarnessResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "removed directory");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(HarnessError::io(
                format!("failed to remove {}", self.path.display()),
                err,
            )),
        }
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "directory cleanup failed");
        }
    }
}

/// Suite-level observed directory.
#[derive(Debug)]
pub struct Workspace {
    dir: ScopedDir,
}

impl Workspace {
    /// Create `root/name`. The parent must already exist.
    pub fn acquire(root: impl AsRef<Path>, name: &str) -> HarnessResult<Self> {
        check_component(name)?;
        let dir = ScopedDir::reserve(root.as_ref().join(name), true)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir.path
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.dir.released
    }

    /// Claim `<workspace>/<name>` for one scenario. With `precreate` the
    /// directory is created now; otherwise the tool is expected to create it.
    pub fn reserve_slot(&self, name: &str, precreate: bool) -> HarnessResult<OutputSlot> {
        check_component(name)?;
        if self.dir.released {
            return Err(HarnessError::io(
                format!("workspace {} was already released", self.path().display()),
                io::Error::from(io::ErrorKind::NotFound),
            ));
        }
        let dir = ScopedDir::reserve(self.path().join(name), precreate)?;
        Ok(OutputSlot { dir })
    }

    /// Remove the workspace and everything in it. Calling it again is a no-op.
    pub fn release(&mut self) -> HarnessResult<()> {
        self.dir.release()
    }
}

/// One scenario's output directory.
#[derive(Debug)]
pub struct OutputSlot {
    dir: ScopedDir,
}

impl OutputSlot {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir.path
    }

    pub fn release(&mut self) -> HarnessResult<()> {
        self.dir.release()
    }
}

fn check_component(name: &str) -> HarnessResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Ok(()),
        _ => Err(HarnessError::invalid_suite(format!(
            "`{name}` is not a single directory name"
        ))),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn acquire_creates_and_release_removes() {
        let root = tempfile::tempdir().unwrap();
        let mut workspace = Workspace::acquire(root.path(), "test-observed").unwrap();
        let path = workspace.path().to_path_buf();
        assert!(path.is_dir());
        fs::write(path.join("stray.txt"), b"x").unwrap();

        workspace.release().unwrap();
        assert!(!path.exists());
        assert!(workspace.is_released());
    }

    #[test]
    fn acquire_refuses_an_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("test-observed")).unwrap();
        let err = Workspace::acquire(root.path(), "test-observed").unwrap_err();
        assert_eq!(err.code(), ErrorCode::WorkspaceConflict);
        assert!(root.path().join("test-observed").is_dir());
    }

    #[test]
    fn double_release_leaves_a_recreated_sibling_alone() {
        let root = tempfile::tempdir().unwrap();
        let mut first = Workspace::acquire(root.path(), "a").unwrap();
        first.release().unwrap();
        let second = Workspace::acquire(root.path(), "a").unwrap();

        first.release().unwrap();
        drop(first);
        assert!(second.path().is_dir());
    }

    #[test]
    fn drop_removes_workspace_with_live_slot_contents() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let workspace = Workspace::acquire(root.path(), "ws").unwrap();
            let slot = workspace.reserve_slot("mafft-trimal", true).unwrap();
            fs::write(slot.path().join("uce-1.nexus"), b"#NEXUS\n").unwrap();
            drop(slot);
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn slot_is_left_for_the_tool_unless_precreated() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::acquire(root.path(), "ws").unwrap();
        let lazy = workspace.reserve_slot("lazy", false).unwrap();
        assert!(!lazy.path().exists());
        let eager = workspace.reserve_slot("eager", true).unwrap();
        assert!(eager.path().is_dir());
    }

    #[test]
    fn slot_conflict_and_release() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::acquire(root.path(), "ws").unwrap();
        fs::create_dir(workspace.path().join("taken")).unwrap();
        let err = workspace.reserve_slot("taken", false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::WorkspaceConflict);

        let mut slot = workspace.reserve_slot("fresh", false).unwrap();
        fs::create_dir(slot.path()).unwrap();
        slot.release().unwrap();
        slot.release().unwrap();
        assert!(!workspace.path().join("fresh").exists());
    }

    #[test]
    fn slot_names_must_be_single_components() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::acquire(root.path(), "ws").unwrap();
        for name in ["../escape", "a/b", "", ".."] {
            let err = workspace.reserve_slot(name, false).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidSuite, "{name}");
        }
    }
}
