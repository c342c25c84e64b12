//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint
//! suppressions narrowly.

#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The manifest file does not exist at the expected path.
    #[error("{manifest_name} not found in {directory}")]
    #[diagnostic(
        code(mkplan::runner::manifest_not_found),
        help("create a manifest or point to one with `--file`")
    )]
    ManifestNotFound {
        /// Name of the expected manifest file (e.g. `Mkplanfile`).
        manifest_name: String,
        /// Directory that was searched.
        directory: Utf8PathBuf,
    },

    /// A path handed to the runner is not valid UTF-8.
    #[error("path {} is not valid UTF-8", path.display())]
    #[diagnostic(code(mkplan::runner::non_utf8_path))]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },
}
