//! Mkplan manifest Abstract Syntax Tree structures.
//!
//! This module defines the data structures used to represent a parsed
//! `Mkplanfile`. They mirror the YAML schema one to one and carry no
//! validation beyond what `serde` enforces; [`crate::manifest`] lowers them
//! into [`crate::config::ProjectConfig`] values.
//!
//! ```rust
//! use mkplan::ast::MkplanManifest;
//!
//! let yaml = concat!(
//!     "mkplan_version: \"1.0.0\"\n",
//!     "projects:\n",
//!     "  core:\n    root: core\n    output: { name: libcore.a, type: static }\n",
//! );
//! let manifest: MkplanManifest = serde_saphyr::from_str(yaml).expect("parse");
//! assert!(manifest.projects.contains_key("core"));
//! ```

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::config::OutputSpec;

/// Top-level manifest structure parsed from a `Mkplanfile`.
///
/// ```yaml
/// mkplan_version: "1.0.0"
/// toolchain:
///   std: gnu99
/// projects:
///   core:
///     root: core
///     output: { name: libcore.a, type: static }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MkplanManifest {
    /// Semantic version of the manifest format.
    pub mkplan_version: Version,

    /// Toolchain defaults shared by every project.
    #[serde(default)]
    pub toolchain: ToolchainDecl,

    /// Projects keyed by name. Declaration order breaks ties when ordering.
    #[serde(default)]
    pub projects: IndexMap<String, ProjectDecl>,
}

/// Project kind as written in the manifest.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKindDecl {
    /// Plain C project.
    #[default]
    C,
    /// C project with flex and bison grammars.
    Grammar,
    /// Test binary.
    Test,
}

/// A project entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectDecl {
    /// Project kind.
    #[serde(default)]
    pub kind: ProjectKindDecl,

    /// Root directory, relative to the manifest directory unless absolute.
    pub root: Utf8PathBuf,

    /// Artefact; required unless the project is a test project.
    #[serde(default)]
    pub output: Option<OutputSpec>,

    /// Projects this one depends on.
    #[serde(default)]
    pub depends: Vec<String>,

    /// Dependencies whose private headers are visible. Test projects only.
    #[serde(default)]
    pub private_depends: Vec<String>,

    /// Command run by the `test` action. Test projects only.
    #[serde(default)]
    pub test_command: Option<String>,

    /// Inputs substituted into `test_command`. Test projects only.
    #[serde(default)]
    pub test_files: Vec<Utf8PathBuf>,

    /// Toolchain overrides for this project.
    #[serde(default)]
    pub toolchain: ToolchainDecl,
}

/// Toolchain options; unset fields inherit the next level.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolchainDecl {
    /// C compiler.
    #[serde(default)]
    pub cc: Option<String>,
    /// Archiver.
    #[serde(default)]
    pub ar: Option<String>,
    /// Linker.
    #[serde(default)]
    pub ld: Option<String>,
    /// Language standard.
    #[serde(default)]
    pub std: Option<String>,
    /// Debug build.
    #[serde(default)]
    pub debug: Option<bool>,
    /// Keep test hooks compiled in.
    #[serde(default)]
    pub test: Option<bool>,
    /// Extra include directories.
    #[serde(default)]
    pub include_dirs: Option<Vec<Utf8PathBuf>>,
    /// Extra library directories.
    #[serde(default)]
    pub lib_dirs: Option<Vec<Utf8PathBuf>>,
    /// Extra libraries.
    #[serde(default)]
    pub libs: Option<Vec<String>>,
    /// Lexer generator.
    #[serde(default)]
    pub lex: Option<String>,
    /// Lexer generator flags.
    #[serde(default)]
    pub lex_flags: Option<String>,
    /// Parser generator.
    #[serde(default)]
    pub yacc: Option<String>,
    /// Parser generator flags.
    #[serde(default)]
    pub yacc_flags: Option<String>,
}

impl ToolchainDecl {
    /// Fill unset fields from `defaults`.
    #[must_use]
    pub fn or(self, defaults: &Self) -> Self {
        Self {
            cc: self.cc.or_else(|| defaults.cc.clone()),
            ar: self.ar.or_else(|| defaults.ar.clone()),
            ld: self.ld.or_else(|| defaults.ld.clone()),
            std: self.std.or_else(|| defaults.std.clone()),
            debug: self.debug.or(defaults.debug),
            test: self.test.or(defaults.test),
            include_dirs: self.include_dirs.or_else(|| defaults.include_dirs.clone()),
            lib_dirs: self.lib_dirs.or_else(|| defaults.lib_dirs.clone()),
            libs: self.libs.or_else(|| defaults.libs.clone()),
            lex: self.lex.or_else(|| defaults.lex.clone()),
            lex_flags: self.lex_flags.or_else(|| defaults.lex_flags.clone()),
            yacc: self.yacc.or_else(|| defaults.yacc.clone()),
            yacc_flags: self.yacc_flags.or_else(|| defaults.yacc_flags.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn project_fields_override_defaults() {
        let defaults = ToolchainDecl {
            cc: Some("clang".into()),
            std: Some("c11".into()),
            ..ToolchainDecl::default()
        };
        let project = ToolchainDecl {
            std: Some("gnu99".into()),
            ..ToolchainDecl::default()
        };
        let merged = project.or(&defaults);
        assert_eq!(merged.cc.as_deref(), Some("clang"));
        assert_eq!(merged.std.as_deref(), Some("gnu99"));
        assert_eq!(merged.ld, None);
    }

    #[rstest]
    fn kind_defaults_to_c() {
        let yaml = "root: core\noutput: { name: libcore.a, type: static }\n";
        let project: ProjectDecl = serde_saphyr::from_str(yaml).expect("parse");
        assert_eq!(project.kind, ProjectKindDecl::C);
        assert!(project.depends.is_empty());
    }
}
