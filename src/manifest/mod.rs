//! Manifest loading helpers.
//!
//! A `Mkplanfile` is parsed in two steps, as YAML into a
//! [`serde_json::Value`] and then into the typed [`MkplanManifest`], so YAML
//! syntax errors keep their source spans while structural errors name the
//! offending field. [`MkplanManifest::into_configs`] then validates the
//! manifest and produces the [`ProjectConfig`] values planning works from.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use std::fs;

use crate::ast::{MkplanManifest, ProjectDecl, ProjectKindDecl, ToolchainDecl};
use crate::config::{BuildOverlay, ProjectConfig, Toolchain};
use crate::ir::{BuildKind, GrammarToolchain, TestHarness, normalize};
use crate::make_gen::LIFECYCLE_TARGETS;
use crate::make_gen::aggregate::WORKSPACE_TARGETS;

mod diagnostics;

pub use diagnostics::{ManifestError, ManifestName, ManifestSource, map_data_error, map_yaml_error};

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "Mkplanfile";

/// Manifest format major version understood by this build.
const SUPPORTED_MAJOR: u64 = 1;

fn from_str_named(yaml: &str, name: &ManifestName) -> Result<MkplanManifest, ManifestError> {
    let doc: serde_json::Value =
        serde_saphyr::from_str(yaml).map_err(|e| ManifestError::Parse {
            name: name.clone(),
            source: map_yaml_error(e, &ManifestSource::from(yaml), name),
        })?;
    serde_json::from_value(doc).map_err(|e| ManifestError::Parse {
        name: name.clone(),
        source: map_data_error(e, name),
    })
}

/// Parse a manifest string.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] if the YAML is malformed or does not match
/// the manifest schema.
pub fn from_str(yaml: &str) -> Result<MkplanManifest, ManifestError> {
    from_str_named(yaml, &ManifestName::new(DEFAULT_MANIFEST))
}

/// Load a [`MkplanManifest`] from the given file path.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] if the file cannot be read and
/// [`ManifestError::Parse`] if it does not parse.
pub fn from_path(path: &Utf8Path) -> Result<MkplanManifest, ManifestError> {
    let data = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    from_str_named(&data, &ManifestName::new(path.as_str()))
}

impl MkplanManifest {
    /// Validate the manifest and lower it into project configurations.
    ///
    /// Relative project roots and toolchain directories are resolved against
    /// `base_dir`, which should be absolute. `overlay` is applied to every
    /// project after its own settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] describing the first invalid project.
    pub fn into_configs(
        self,
        base_dir: &Utf8Path,
        overlay: BuildOverlay,
    ) -> Result<Vec<ProjectConfig>, ManifestError> {
        if self.mkplan_version.major != SUPPORTED_MAJOR {
            return Err(ManifestError::UnsupportedVersion {
                version: self.mkplan_version,
            });
        }
        check_aggregate_targets(self.projects.keys().map(String::as_str))?;
        let defaults = self.toolchain;
        self.projects
            .into_iter()
            .map(|(name, decl)| lower_project(name, decl, &defaults, base_dir, overlay))
            .collect()
    }
}

/// Names appear as make targets and in recipes, so they stay within a
/// conservative alphabet.
fn is_project_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
}

/// Reject names whose aggregate targets would collide with another target of
/// `Projects.mk`.
fn check_aggregate_targets<'a, I>(names: I) -> Result<(), ManifestError>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let mut taken: IndexSet<String> = WORKSPACE_TARGETS.into_iter().map(str::to_owned).collect();
    let clash = |project: &str, target: String| ManifestError::AggregateTargetClash {
        project: project.to_owned(),
        target,
    };
    for name in names.clone() {
        if !taken.insert(name.to_owned()) {
            return Err(clash(name, name.to_owned()));
        }
    }
    for name in names {
        for word in LIFECYCLE_TARGETS {
            let target = format!("{word}-{name}");
            if !taken.insert(target.clone()) {
                return Err(clash(name, target));
            }
        }
    }
    Ok(())
}

fn resolve(base_dir: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    normalize(&base_dir.join(path))
}

fn lower_project(
    name: String,
    decl: ProjectDecl,
    defaults: &ToolchainDecl,
    base_dir: &Utf8Path,
    overlay: BuildOverlay,
) -> Result<ProjectConfig, ManifestError> {
    if !is_project_name(&name) {
        return Err(ManifestError::InvalidProjectName { name });
    }
    if decl.kind != ProjectKindDecl::Test {
        reject_test_fields(&name, &decl)?;
    }
    let decl_toolchain = decl.toolchain.or(defaults);
    let root = resolve(base_dir, &decl.root);

    let config = match decl.kind {
        ProjectKindDecl::Test => {
            if decl.output.is_some() {
                return Err(ManifestError::UnexpectedOutput { project: name });
            }
            let Some(command) = decl.test_command else {
                return Err(ManifestError::MissingTestCommand { project: name });
            };
            let harness = TestHarness::new(command)
                .with_files(decl.test_files)
                .with_private_depends(decl.private_depends);
            ProjectConfig::test_harness(name, root, harness)
        }
        ProjectKindDecl::C | ProjectKindDecl::Grammar => {
            let Some(output) = decl.output else {
                return Err(ManifestError::MissingOutput { project: name });
            };
            let kind = if decl.kind == ProjectKindDecl::Grammar {
                BuildKind::Grammar(grammar_toolchain(&decl_toolchain))
            } else {
                BuildKind::Library
            };
            ProjectConfig::new(name, root, kind, output)
        }
    };

    let mut toolchain = lower_toolchain(decl_toolchain, base_dir);
    overlay.apply(&mut toolchain);
    Ok(config.with_depends(decl.depends).with_toolchain(toolchain))
}

fn reject_test_fields(project: &str, decl: &ProjectDecl) -> Result<(), ManifestError> {
    let field = if !decl.private_depends.is_empty() {
        Some("private_depends")
    } else if decl.test_command.is_some() {
        Some("test_command")
    } else if !decl.test_files.is_empty() {
        Some("test_files")
    } else {
        None
    };
    field.map_or(Ok(()), |field| {
        Err(ManifestError::TestOnlyField {
            project: project.to_owned(),
            field,
        })
    })
}

fn grammar_toolchain(decl: &ToolchainDecl) -> GrammarToolchain {
    let builtin = GrammarToolchain::default();
    GrammarToolchain {
        lex: decl.lex.clone().unwrap_or(builtin.lex),
        lex_flags: decl.lex_flags.clone().unwrap_or(builtin.lex_flags),
        yacc: decl.yacc.clone().unwrap_or(builtin.yacc),
        yacc_flags: decl.yacc_flags.clone().unwrap_or(builtin.yacc_flags),
    }
}

fn lower_toolchain(decl: ToolchainDecl, base_dir: &Utf8Path) -> Toolchain {
    let builtin = Toolchain::default();
    let dirs = |list: Option<Vec<Utf8PathBuf>>| -> Vec<Utf8PathBuf> {
        list.unwrap_or_default()
            .iter()
            .map(|dir| resolve(base_dir, dir))
            .collect()
    };
    Toolchain {
        cc: decl.cc.unwrap_or(builtin.cc),
        ar: decl.ar.unwrap_or(builtin.ar),
        ld: decl.ld.unwrap_or(builtin.ld),
        std: decl.std,
        debug: decl.debug.unwrap_or(builtin.debug),
        test: decl.test.unwrap_or(builtin.test),
        include_dirs: dirs(decl.include_dirs),
        lib_dirs: dirs(decl.lib_dirs),
        libs: decl.libs.unwrap_or_default(),
    }
}
