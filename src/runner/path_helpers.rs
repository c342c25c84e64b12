//! Path resolution helpers for the runner module.
//!
//! Centralises manifest and output path logic so the main runner module stays
//! focused on command dispatch.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;
use std::env;

use super::RunnerError;
use crate::cli::Cli;
use crate::ir::normalize;

/// Absolute working directory, honouring `-C/--directory`.
///
/// # Errors
/// Returns an error when the process working directory cannot be read or is
/// not valid UTF-8.
pub(super) fn working_dir(cli: &Cli) -> Result<Utf8PathBuf> {
    let process_dir = env::current_dir().context("failed to read the working directory")?;
    let cwd = Utf8PathBuf::from_path_buf(process_dir)
        .map_err(|path| RunnerError::NonUtf8Path { path })?;
    Ok(match &cli.directory {
        Some(dir) => normalize(&cwd.join(dir)),
        None => cwd,
    })
}

/// Absolute manifest path for `cli`.
pub(super) fn resolve_manifest_path(working_dir: &Utf8Path, cli: &Cli) -> Utf8PathBuf {
    normalize(&working_dir.join(&cli.file))
}

/// Fail with [`RunnerError::ManifestNotFound`] unless the manifest exists.
pub(super) fn ensure_manifest_exists(manifest_path: &Utf8Path) -> Result<(), RunnerError> {
    if manifest_path.is_file() {
        return Ok(());
    }
    Err(RunnerError::ManifestNotFound {
        manifest_name: manifest_path.file_name().unwrap_or_default().to_owned(),
        directory: manifest_path
            .parent()
            .map_or_else(|| manifest_path.to_owned(), Utf8Path::to_owned),
    })
}

/// Resolve an output path relative to the CLI working directory.
///
/// The `-C/--directory` option behaves like a working directory change for any
/// filesystem path supplied on the command line.
#[must_use]
pub(super) fn resolve_output_path<'a>(
    working_dir: &Utf8Path,
    path: &'a Utf8Path,
) -> Cow<'a, Utf8Path> {
    if path.is_relative() {
        Cow::Owned(working_dir.join(path))
    } else {
        Cow::Borrowed(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    #[rstest]
    #[case("plan.json", "/w/plan.json")]
    #[case("/tmp/plan.json", "/tmp/plan.json")]
    fn output_paths_follow_working_dir(#[case] path: &str, #[case] expected: &str) {
        let resolved = resolve_output_path(Utf8Path::new("/w"), Utf8Path::new(path));
        assert_eq!(resolved.as_str(), expected);
    }

    #[rstest]
    fn manifest_path_is_normalised() {
        let cli = Cli::parse_from(["mkplan", "--file", "sub/../Mkplanfile"]);
        assert_eq!(
            resolve_manifest_path(Utf8Path::new("/w"), &cli),
            Utf8PathBuf::from("/w/Mkplanfile")
        );
    }

    #[rstest]
    fn missing_manifest_names_directory() {
        let err = ensure_manifest_exists(Utf8Path::new("/nonexistent/dir/Mkplanfile"))
            .expect_err("manifest should be missing");
        assert_eq!(err.to_string(), "Mkplanfile not found in /nonexistent/dir");
    }
}
