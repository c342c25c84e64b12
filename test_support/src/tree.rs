//! Temporary directory trees.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// A temporary directory populated file by file.
///
/// The directory is removed when the tree is dropped.
#[derive(Debug)]
pub struct ProjectTree {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl ProjectTree {
    /// Create an empty tree.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created or its path is not
    /// valid UTF-8.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).expect("utf-8 temp dir");
        // Resolve symlinked temp roots (e.g. /tmp -> /private/tmp) so paths
        // compare equal to what the planner reports.
        let root = root.canonicalize_utf8().expect("canonical temp dir");
        Self { _dir: dir, root }
    }

    /// Absolute path of the tree root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of `rel` inside the tree.
    #[must_use]
    pub fn path(&self, rel: &str) -> Utf8PathBuf {
        self.root.join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        self
    }

    /// Read `rel` back as a string.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read file")
    }

    /// Whether `rel` exists.
    #[must_use]
    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new()
    }
}
