//! Resolved project configuration.
//!
//! [`ProjectConfig`] values are produced by lowering a manifest (see
//! [`crate::manifest`]) and carry the immutable identity of a project: its
//! name, root, build kind, output artefact and declared dependencies.
//! Overrides that apply to every project at once, such as forcing a debug
//! build, travel as an explicit [`BuildOverlay`] value.
//!
//! # Examples
//!
//! ```
//! use mkplan::config::{OutputKind, OutputSpec, ProjectConfig};
//! use mkplan::ir::BuildKind;
//!
//! let config = ProjectConfig::new(
//!     "generic",
//!     "/work/generic",
//!     BuildKind::Library,
//!     OutputSpec::new("libgeneric.a", OutputKind::Static),
//! )
//! .with_depends(["base"]);
//! assert_eq!(config.depends, vec!["base".to_owned()]);
//! ```

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::ir::{BuildKind, TestHarness};

/// File name of the binary produced by test projects.
pub const TEST_OUTPUT_NAME: &str = "test";

/// Kind of artefact produced by a project's final step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// An executable linked with `$(LD)`.
    Binary,
    /// A static archive assembled with `$(AR)`.
    Static,
    /// A shared object linked with `$(LD) -shared`.
    Shared,
}

/// Name and kind of a project's artefact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// File name written under the project's build root, e.g. `libfoo.a`.
    pub name: String,
    /// Artefact kind.
    #[serde(rename = "type")]
    pub kind: OutputKind,
}

impl OutputSpec {
    /// Describe an artefact.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: OutputKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Compiler, archiver and linker settings threaded into the emitted prelude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// C compiler, `$(CC)`.
    pub cc: String,
    /// Archiver used for static outputs, `$(AR)`.
    pub ar: String,
    /// Linker used for binaries and shared objects, `$(LD)`.
    pub ld: String,
    /// Language standard passed as `-std=...`.
    pub std: Option<String>,
    /// Build without optimisation and with debug symbols.
    pub debug: bool,
    /// Keep test hooks compiled in; otherwise `-DNTEST` is defined.
    pub test: bool,
    /// Extra include directories, searched after every project directory.
    pub include_dirs: Vec<Utf8PathBuf>,
    /// Extra library search directories.
    pub lib_dirs: Vec<Utf8PathBuf>,
    /// Extra libraries, linked after every dependency library.
    pub libs: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            cc: "gcc".to_owned(),
            ar: "ar".to_owned(),
            ld: "gcc".to_owned(),
            std: None,
            debug: false,
            test: false,
            include_dirs: Vec::new(),
            lib_dirs: Vec::new(),
            libs: Vec::new(),
        }
    }
}

/// Settings forced onto every project of a run.
///
/// `None` keeps the value each project declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOverlay {
    /// Force debug builds on or off.
    pub debug: Option<bool>,
    /// Force test hooks on or off.
    pub test: Option<bool>,
}

impl BuildOverlay {
    /// Apply the overlay to a toolchain.
    pub fn apply(&self, toolchain: &mut Toolchain) {
        if let Some(debug) = self.debug {
            toolchain.debug = debug;
        }
        if let Some(test) = self.test {
            toolchain.test = test;
        }
    }
}

/// Immutable identity and options of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Unique project name.
    pub name: String,
    /// Absolute project root.
    pub root: Utf8PathBuf,
    /// Project specialisation.
    pub kind: BuildKind,
    /// Artefact produced by the project.
    pub output: OutputSpec,
    /// Names of projects this one depends on, in declaration order.
    pub depends: Vec<String>,
    /// Toolchain options.
    pub toolchain: Toolchain,
}

impl ProjectConfig {
    /// Declare a project with no dependencies and the default toolchain.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        root: impl Into<Utf8PathBuf>,
        kind: BuildKind,
        output: OutputSpec,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            kind,
            output,
            depends: Vec::new(),
            toolchain: Toolchain::default(),
        }
    }

    /// Declare a test project; it always links a binary named `test`.
    #[must_use]
    pub fn test_harness(
        name: impl Into<String>,
        root: impl Into<Utf8PathBuf>,
        harness: TestHarness,
    ) -> Self {
        Self::new(
            name,
            root,
            BuildKind::TestHarness(harness),
            OutputSpec::new(TEST_OUTPUT_NAME, OutputKind::Binary),
        )
    }

    /// Replace the dependency list.
    #[must_use]
    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the toolchain.
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BuildOverlay::default(), false, false)]
    #[case(BuildOverlay { debug: Some(true), test: None }, true, false)]
    #[case(BuildOverlay { debug: None, test: Some(true) }, false, true)]
    fn overlay_overrides_only_set_fields(
        #[case] overlay: BuildOverlay,
        #[case] debug: bool,
        #[case] test: bool,
    ) {
        let mut toolchain = Toolchain::default();
        overlay.apply(&mut toolchain);
        assert_eq!(toolchain.debug, debug);
        assert_eq!(toolchain.test, test);
    }

    #[rstest]
    fn overlay_can_switch_settings_off() {
        let mut toolchain = Toolchain {
            debug: true,
            ..Toolchain::default()
        };
        BuildOverlay {
            debug: Some(false),
            test: None,
        }
        .apply(&mut toolchain);
        assert!(!toolchain.debug);
    }

    #[rstest]
    fn test_harness_builds_test_binary() {
        let config = ProjectConfig::test_harness("t", "/w/t", TestHarness::new("run {0}"));
        assert_eq!(config.output, OutputSpec::new("test", OutputKind::Binary));
    }
}
