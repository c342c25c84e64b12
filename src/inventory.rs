//! Source and header discovery.
//!
//! Files are found by walking declared root directories and keeping those
//! whose extension matches one of the recognised suffixes. Each file is keyed
//! by its path relative to the root it was found under, written with `/`
//! separators; that key is the name other files use to include it.
//!
//! Results are sorted by key so that every later stage iterates files in a
//! stable order.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use itertools::{Itertools, iproduct};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Mapping from a root-relative logical key to an absolute file path.
pub type FileSet = IndexMap<String, Utf8PathBuf>;

/// Errors raised while discovering files.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Two distinct files claim the same logical key.
    #[error("`{key}` is provided by both {first} and {second}")]
    Collision {
        /// The contested key.
        key: String,
        /// Path registered first.
        first: Utf8PathBuf,
        /// Path that tried to register the same key.
        second: Utf8PathBuf,
    },
    /// Traversing a root failed.
    #[error("failed to walk {root}")]
    Walk {
        /// Root being traversed.
        root: Utf8PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },
    /// A discovered path is not valid UTF-8.
    #[error("{} under {root} is not valid UTF-8", path.display())]
    NonUtf8 {
        /// Root being traversed.
        root: Utf8PathBuf,
        /// Offending path.
        path: PathBuf,
    },
}

/// Recursively discover files under `roots` whose extension is in `suffixes`.
///
/// Missing roots contribute nothing. The same file reached through two
/// root/suffix combinations is recorded once; two different files yielding
/// one key are rejected.
///
/// # Errors
///
/// Returns [`InventoryError::Collision`] for ambiguous keys and
/// [`InventoryError::Walk`] or [`InventoryError::NonUtf8`] when traversal
/// fails.
pub fn scan_files(roots: &[&Utf8Path], suffixes: &[&str]) -> Result<FileSet, InventoryError> {
    let mut files = FileSet::new();
    for (root, suffix) in iproduct!(roots, suffixes) {
        for (key, path) in walk_suffix(root, suffix)? {
            match files.get(&key) {
                Some(existing) if *existing != path => {
                    return Err(InventoryError::Collision {
                        key,
                        first: existing.clone(),
                        second: path,
                    });
                }
                Some(_) => {}
                None => {
                    files.insert(key, path);
                }
            }
        }
    }
    files.sort_keys();
    Ok(files)
}

/// Merge `from` into `into`, rejecting any key already present.
///
/// # Errors
///
/// Returns [`InventoryError::Collision`] naming the first shared key.
pub fn merge_disjoint(into: &mut FileSet, from: &FileSet) -> Result<(), InventoryError> {
    for (key, path) in from {
        if let Some(existing) = into.get(key) {
            return Err(InventoryError::Collision {
                key: key.clone(),
                first: existing.clone(),
                second: path.clone(),
            });
        }
        into.insert(key.clone(), path.clone());
    }
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn walk_suffix(
    root: &Utf8Path,
    suffix: &str,
) -> Result<Vec<(String, Utf8PathBuf)>, InventoryError> {
    if !root.is_dir() {
        debug!(%root, "skipping missing root");
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));
    for entry in walker {
        let dir_entry = entry.map_err(|source| InventoryError::Walk {
            root: root.to_owned(),
            source,
        })?;
        if !dir_entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(dir_entry.into_path()).map_err(|path| {
            InventoryError::NonUtf8 {
                root: root.to_owned(),
                path,
            }
        })?;
        if path.extension() != Some(suffix) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let key = relative.components().map(|c| c.as_str()).join("/");
        found.push((key, path));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn tree() -> (TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
        for rel in ["src/a.c", "src/nested/b.c", "src/notes.txt", "src/.hidden/c.c"] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(&path, "").expect("write");
        }
        (dir, root)
    }

    #[rstest]
    fn scan_files_keys_by_relative_path(tree: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = tree;
        let src = root.join("src");
        let files = scan_files(&[src.as_path()], &["c"]).expect("scan");
        let keys: Vec<_> = files.keys().cloned().collect();
        assert_eq!(keys, vec!["a.c".to_owned(), "nested/b.c".to_owned()]);
        assert_eq!(files.get("nested/b.c"), Some(&src.join("nested/b.c")));
    }

    #[rstest]
    fn scan_files_ignores_missing_root(tree: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = tree;
        let missing = root.join("include");
        let files = scan_files(&[missing.as_path()], &["h"]).expect("scan");
        assert!(files.is_empty());
    }

    #[rstest]
    fn scan_files_rejects_ambiguous_keys(tree: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = tree;
        fs::create_dir_all(root.join("alt")).expect("mkdir");
        fs::write(root.join("alt/a.c"), "").expect("write");
        let src = root.join("src");
        let alt = root.join("alt");
        let err = scan_files(&[src.as_path(), alt.as_path()], &["c"]).expect_err("collision");
        assert!(matches!(err, InventoryError::Collision { ref key, .. } if key == "a.c"));
    }

    #[rstest]
    fn scan_files_tolerates_same_file_twice(tree: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = tree;
        let src = root.join("src");
        let files = scan_files(&[src.as_path(), src.as_path()], &["c"]).expect("scan");
        assert_eq!(files.len(), 2);
    }

    #[rstest]
    fn merge_disjoint_rejects_shared_keys() {
        let mut into = FileSet::new();
        into.insert("x.h".into(), Utf8PathBuf::from("/a/include/x.h"));
        let mut from = FileSet::new();
        from.insert("x.h".into(), Utf8PathBuf::from("/a/src/include/x.h"));
        let err = merge_disjoint(&mut into, &from).expect_err("collision");
        assert!(matches!(err, InventoryError::Collision { .. }));
    }
}
