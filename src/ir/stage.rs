//! Staged project records.
//!
//! A project moves through three typed stages:
//!
//! 1. [`DiscoveredProject`]: files found on disk.
//! 2. [`LinkedProject`]: dependencies' exported headers, include directories
//!    and link inputs injected. Linking reads dependencies only as
//!    [`ClosedProject`] values, so it cannot observe a dependency that is not
//!    finished.
//! 3. [`ClosedProject`]: includes scanned against the linked universe and
//!    expanded to their transitive closure. Ready for emission.
//!
//! Name collisions between local and inherited keys are settled by "first
//! writer wins": local keys are written first, then each dependency in
//! `depends` order, then private opt-ins.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use tracing::debug;

use super::{
    BuildKind, PlanError, ProjectFiles, ProjectLayout, is_make_word, render_test_command,
};
use crate::closure::{DependencyMap, expand_all};
use crate::config::ProjectConfig;
use crate::inventory::FileSet;
use crate::scanner::scan_file;

/// A project whose files have been discovered.
#[derive(Debug, Clone)]
pub struct DiscoveredProject {
    /// Project configuration.
    pub config: ProjectConfig,
    /// Directory layout of the project root.
    pub layout: ProjectLayout,
    /// Files found under the root.
    pub files: ProjectFiles,
}

impl DiscoveredProject {
    /// Walk the project root and classify its files.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::IdentityCollision`] when role sets overlap and
    /// [`PlanError::Discovery`] when the root cannot be walked.
    pub fn discover(config: ProjectConfig) -> Result<Self, PlanError> {
        let layout = ProjectLayout::new(&config.root);
        let files = config.kind.discover_sources(&config.name, &layout)?;
        Ok(Self {
            config,
            layout,
            files,
        })
    }

    /// Project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// Inputs the project receives from its dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkInputs {
    /// Include search path in precedence order.
    pub include_dirs: Vec<Utf8PathBuf>,
    /// Dependency artefacts, in `depends` order.
    pub artifacts: Vec<Utf8PathBuf>,
    /// Library names passed as `-l`, dependencies first.
    pub libraries: Vec<String>,
    /// Library search directories passed as `-L`.
    pub library_dirs: Vec<Utf8PathBuf>,
}

/// A project with its dependencies' interfaces injected.
#[derive(Debug, Clone)]
pub struct LinkedProject {
    /// Discovery output.
    pub discovered: DiscoveredProject,
    /// Local keys followed by inherited ones.
    pub universe: FileSet,
    /// Closed dependency lists of inherited keys.
    pub inherited: DependencyMap,
    /// Include and link inputs.
    pub link: LinkInputs,
}

impl LinkedProject {
    /// Inject the interfaces of `discovered`'s dependencies.
    ///
    /// `finished` holds every project already closed; all of `discovered`'s
    /// dependencies must be among them.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPrivateDependency`] when a private opt-in
    /// is not also a dependency and [`PlanError::UnknownDependency`] when a
    /// dependency is not finished.
    pub fn link(
        discovered: DiscoveredProject,
        finished: &IndexMap<String, ClosedProject>,
    ) -> Result<Self, PlanError> {
        let config = &discovered.config;
        check_private_depends(config)?;
        let private = config.kind.private_depends();
        let lookup = |name: &String| {
            finished
                .get(name)
                .ok_or_else(|| PlanError::UnknownDependency {
                    project: config.name.clone(),
                    dependency: name.clone(),
                })
        };

        let mut universe = discovered.files.universe.clone();
        let mut inherited = DependencyMap::new();
        let mut link = LinkInputs {
            include_dirs: config.kind.include_dirs(&discovered.layout),
            artifacts: Vec::new(),
            libraries: Vec::new(),
            library_dirs: config.toolchain.lib_dirs.clone(),
        };

        for name in &config.depends {
            let dep = lookup(name)?;
            link.include_dirs.push(dep.layout.export.clone());
            let added = inherit(&mut universe, &mut inherited, &dep.files.exports, dep);
            debug!(project = %config.name, dependency = %name, added, "inherited exported headers");

            let artifact = dep.artifact();
            link.libraries
                .push(library_name(&dep.config.output.name).to_owned());
            link.library_dirs.push(dep.layout.build_root.clone());
            link.artifacts.push(artifact);
        }
        for name in private {
            let dep = lookup(name)?;
            link.include_dirs.push(dep.layout.internal.clone());
            let added = inherit(&mut universe, &mut inherited, &dep.files.private_headers, dep);
            debug!(project = %config.name, dependency = %name, added, "inherited private headers");
        }
        link.include_dirs
            .extend(config.toolchain.include_dirs.iter().cloned());
        link.libraries.extend(config.toolchain.libs.iter().cloned());

        Ok(Self {
            discovered,
            universe,
            inherited,
            link,
        })
    }
}

/// Require every private opt-in of `config` to be one of its dependencies.
///
/// # Errors
///
/// Returns [`PlanError::InvalidPrivateDependency`] naming the first stray
/// opt-in.
pub(super) fn check_private_depends(config: &ProjectConfig) -> Result<(), PlanError> {
    let stray = config
        .kind
        .private_depends()
        .iter()
        .find(|name| !config.depends.contains(*name));
    stray.map_or(Ok(()), |name| {
        Err(PlanError::InvalidPrivateDependency {
            project: config.name.clone(),
            dependency: name.clone(),
        })
    })
}

/// Merge `offered` keys absent from `universe`, carrying their closed lists.
fn inherit(
    universe: &mut FileSet,
    inherited: &mut DependencyMap,
    offered: &FileSet,
    dep: &ClosedProject,
) -> usize {
    let mut added = 0;
    for (key, path) in offered {
        if universe.contains_key(key) {
            continue;
        }
        universe.insert(key.clone(), path.clone());
        if let Some(list) = dep.deps.get(key) {
            inherited.insert(key.clone(), list.clone());
        }
        added += 1;
    }
    added
}

/// Derive a linker library name from an artefact file name.
///
/// `libfoo.a`, `libfoo.so` and `libfoo.so.1` all yield `foo`; names that do
/// not follow the pattern are returned unchanged.
///
/// # Examples
///
/// ```
/// use mkplan::ir::library_name;
///
/// assert_eq!(library_name("libgeneric.a"), "generic");
/// assert_eq!(library_name("app"), "app");
/// ```
#[must_use]
pub fn library_name(file: &str) -> &str {
    let Some(rest) = file.strip_prefix("lib") else {
        return file;
    };
    rest.strip_suffix(".a")
        .or_else(|| rest.strip_suffix(".so"))
        .or_else(|| rest.find(".so.").and_then(|end| rest.get(..end)))
        .filter(|name| !name.is_empty())
        .unwrap_or(file)
}

/// Rendered `test` action of a test project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPlan {
    /// Test inputs as written in the script.
    pub files: Vec<String>,
    /// Rendered command.
    pub command: String,
}

/// A fully resolved project, ready for emission.
#[derive(Debug, Clone)]
pub struct ClosedProject {
    /// Project configuration.
    pub config: ProjectConfig,
    /// Directory layout.
    pub layout: ProjectLayout,
    /// Discovered files.
    pub files: ProjectFiles,
    /// Include and link inputs.
    pub link: LinkInputs,
    /// Every key resolvable from this project.
    pub universe: FileSet,
    /// Transitive dependency list of every known key.
    pub deps: DependencyMap,
    /// Test action, for test projects.
    pub test: Option<TestPlan>,
}

impl ClosedProject {
    /// Scan includes over the linked universe and expand them.
    ///
    /// Locally scanned lists replace inherited ones for the same key.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Io`] when a source cannot be read,
    /// [`PlanError::InvalidTestFile`] when a test file cannot be written as a
    /// prerequisite and [`PlanError::InvalidTestCommand`] when a test command
    /// cannot be rendered.
    pub fn close(linked: LinkedProject) -> Result<Self, PlanError> {
        let LinkedProject {
            discovered,
            universe,
            inherited,
            link,
        } = linked;
        let DiscoveredProject {
            config,
            layout,
            files,
        } = discovered;

        let mut deps = inherited;
        for (key, path) in &files.scannable {
            let direct = scan_file(path, &universe).map_err(|source| PlanError::Io {
                path: path.clone(),
                source,
            })?;
            deps.insert(key.clone(), direct);
        }
        expand_all(&mut deps, files.scannable.keys().map(String::as_str));
        debug!(project = %config.name, keys = deps.len(), "closed include graph");

        let test = match &config.kind {
            BuildKind::TestHarness(harness) => {
                let shown: Vec<String> = harness
                    .files
                    .iter()
                    .map(|file| layout.relative(&layout.root.join(file)))
                    .collect();
                if let Some(bad) = shown.iter().find(|file| !is_make_word(file)) {
                    return Err(PlanError::InvalidTestFile {
                        project: config.name.clone(),
                        file: bad.clone(),
                    });
                }
                let command = render_test_command(&harness.command, &shown).map_err(|err| {
                    PlanError::InvalidTestCommand {
                        project: config.name.clone(),
                        command: harness.command.clone(),
                        reason: err.to_string(),
                    }
                })?;
                Some(TestPlan {
                    files: shown,
                    command,
                })
            }
            BuildKind::Library | BuildKind::Grammar(_) => None,
        };

        Ok(Self {
            config,
            layout,
            files,
            link,
            universe,
            deps,
            test,
        })
    }

    /// Project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Absolute path of the project's artefact.
    #[must_use]
    pub fn artifact(&self) -> Utf8PathBuf {
        self.layout.build_root.join(&self.config.output.name)
    }

    /// Paths of everything `key` transitively includes, in closure order.
    ///
    /// Keys outside this project's universe are skipped.
    #[must_use]
    pub fn prerequisites(&self, key: &str) -> Vec<&Utf8Path> {
        let Some(list) = self.deps.get(key) else {
            return Vec::new();
        };
        list.iter()
            .filter_map(|dep| {
                let resolved = self.universe.get(dep).map(Utf8PathBuf::as_path);
                if resolved.is_none() {
                    debug!(
                        project = %self.config.name,
                        %key,
                        %dep,
                        "skipping unresolvable prerequisite"
                    );
                }
                resolved
            })
            .collect()
    }
}
