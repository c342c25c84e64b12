//! Translates manifest failures into actionable diagnostics.
//!
//! [`ManifestSource`] retains the YAML content and [`ManifestName`] labels its
//! origin. [`map_yaml_error`] and [`map_data_error`] convert parser and
//! deserialisation failures into [`miette`] diagnostics with spans, hints and
//! stable codes; [`ManifestError`] covers the checks made while lowering.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use semver::Version;
use thiserror::Error;

mod yaml;

pub use yaml::map_yaml_error;

/// YAML source content for a manifest.
///
/// # Examples
/// ```rust
/// use mkplan::manifest::ManifestSource;
/// let source = ManifestSource::from("projects: {}");
/// assert_eq!(source.as_str(), "projects: {}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestSource(String);

impl ManifestSource {
    /// Wrap a source buffer.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    /// View the source as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ManifestSource {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Display name for a manifest used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestName(String);

impl ManifestName {
    /// Label a manifest.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Access the label.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ManifestName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ManifestName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Error raised when a manifest cannot be loaded or lowered.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}")]
    #[diagnostic(code(mkplan::manifest::read))]
    Read {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Parsing failed and produced the supplied diagnostic.
    #[error("{name}: manifest parse failed")]
    #[diagnostic(code(mkplan::manifest::parse))]
    Parse {
        /// Manifest label.
        name: ManifestName,
        /// Underlying diagnostic reported by the parser.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },

    /// The manifest declares a format this build does not read.
    #[error("unsupported mkplan_version {version}; expected 1.x")]
    #[diagnostic(code(mkplan::manifest::unsupported_version))]
    UnsupportedVersion {
        /// Declared version.
        version: Version,
    },

    /// A project name is empty or contains whitespace.
    #[error("invalid project name '{name}'")]
    #[diagnostic(
        code(mkplan::manifest::invalid_project_name),
        help("use only ASCII letters, digits and `_ - . +` in project names")
    )]
    InvalidProjectName {
        /// Offending name.
        name: String,
    },

    /// A project's aggregate target is already defined by another one.
    #[error("project '{project}' would define target '{target}', which is already taken")]
    #[diagnostic(
        code(mkplan::manifest::aggregate_target_clash),
        help("rename the project; `default`, `all-all`, `clean-all` and `rebuild-all` are reserved")
    )]
    AggregateTargetClash {
        /// Project name.
        project: String,
        /// Contested target.
        target: String,
    },

    /// A library or grammar project has no `output`.
    #[error("project '{project}' must declare an output")]
    #[diagnostic(code(mkplan::manifest::missing_output))]
    MissingOutput {
        /// Project name.
        project: String,
    },

    /// A test project declares an `output`.
    #[error("test project '{project}' always builds `test` and may not declare an output")]
    #[diagnostic(code(mkplan::manifest::unexpected_output))]
    UnexpectedOutput {
        /// Project name.
        project: String,
    },

    /// A test project has no `test_command`.
    #[error("test project '{project}' must declare test_command")]
    #[diagnostic(code(mkplan::manifest::missing_test_command))]
    MissingTestCommand {
        /// Project name.
        project: String,
    },

    /// A test-only field appears on another kind of project.
    #[error("`{field}` is only allowed on test projects, found on '{project}'")]
    #[diagnostic(code(mkplan::manifest::test_only_field))]
    TestOnlyField {
        /// Project name.
        project: String,
        /// Field name.
        field: &'static str,
    },
}

#[derive(Debug, Error, Diagnostic)]
#[error("{name}: invalid manifest structure: {source}")]
#[diagnostic(code(mkplan::manifest::structure))]
struct DataDiagnostic {
    #[source]
    source: serde_json::Error,
    name: ManifestName,
}

/// Map a [`serde_json`] structural error into a diagnostic without a source
/// span. `serde_json` does not report byte offsets for data validation
/// failures, so the diagnostic only carries the manifest name and message.
#[must_use]
pub fn map_data_error(
    err: serde_json::Error,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    Box::new(DataDiagnostic {
        source: err,
        name: name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use serde_json::Value;

    #[test]
    fn map_data_error_formats_message_and_code() -> Result<()> {
        let name = ManifestName::new("test.json");
        let err = serde_json::from_str::<Value>("{\"key\":}")
            .expect_err("expected serde_json parse error");
        let diag = map_data_error(err, &name);
        let message = diag.to_string();
        ensure!(
            message.starts_with("test.json: invalid manifest structure"),
            "unexpected message: {message}"
        );
        let code = diag
            .code()
            .map(|c| c.to_string())
            .context("structure diagnostic should expose a code")?;
        ensure!(
            code == "mkplan::manifest::structure",
            "unexpected diagnostic code {code}"
        );
        Ok(())
    }
}
