//! File creation helpers for the runner.
//!
//! Scripts are written through a temporary file in the destination directory
//! and renamed into place, so an interrupted run never leaves a truncated
//! Makefile behind.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::{self, Write};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::make_gen::Script;

/// Return `true` when `path` is the CLI sentinel indicating "write to stdout".
#[must_use]
pub fn is_stdout_path(path: &Utf8Path) -> bool {
    path.as_str() == "-"
}

/// Atomically replace `path` with `contents`, creating parent directories.
///
/// A file that already holds `contents` is left untouched.
///
/// # Errors
///
/// Returns an error if a directory, the temporary file or the final rename
/// fails.
pub fn write_file_atomic(path: &Utf8Path, contents: &str) -> Result<()> {
    if fs::read(path).is_ok_and(|existing| existing == contents.as_bytes()) {
        debug!(path = %path, "script unchanged");
        return Ok(());
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {parent}"))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create a temporary file in {parent}"))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write temporary file for {path}"))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to sync temporary file for {path}"))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to replace {path}"))?;
    Ok(())
}

/// Persist every script.
///
/// # Errors
///
/// Returns the first write failure.
pub fn write_scripts(scripts: &[Script]) -> Result<()> {
    for script in scripts {
        write_file_atomic(&script.path, &script.contents)?;
        info!(path = %script.path, "wrote script");
    }
    Ok(())
}

fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Write `text` to stdout, treating a closed pipe as success.
///
/// # Errors
///
/// Returns an error for any other write failure.
pub fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    ignore_broken_pipe(stdout.write_all(text.as_bytes())).context("failed to write to stdout")?;
    ignore_broken_pipe(stdout.flush()).context("failed to flush stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use camino::Utf8PathBuf;
    use rstest::rstest;

    #[rstest]
    #[case("-", true)]
    #[case("plan.json", false)]
    #[case("./-", false)]
    fn is_stdout_path_detects_dash(#[case] candidate: &str, #[case] expected: bool) {
        assert_eq!(is_stdout_path(Utf8Path::new(candidate)), expected);
    }

    #[test]
    fn write_file_atomic_creates_parent_directories() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_owned())
            .map_err(|p| anyhow::anyhow!("non UTF-8 temp dir {}", p.display()))?;
        let nested = root.join("proj/target/Makefile");

        write_file_atomic(&nested, "all :\n")?;
        let written = fs::read_to_string(&nested).context("read nested file")?;
        ensure!(written == "all :\n", "unexpected contents {written:?}");

        write_file_atomic(&nested, "all : x\n")?;
        let rewritten = fs::read_to_string(&nested).context("re-read nested file")?;
        ensure!(rewritten == "all : x\n", "unexpected contents {rewritten:?}");

        let leftovers = fs::read_dir(root.join("proj/target"))
            .context("list target dir")?
            .count();
        ensure!(leftovers == 1, "temporary files left behind");
        Ok(())
    }
}
