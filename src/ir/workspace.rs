//! Whole-workspace resolution.
//!
//! [`Workspace::resolve`] runs every stage in a fixed sequence: names, roots
//! and private opt-ins are validated, the project graph is ordered, then each
//! project is discovered, and finally each project is linked and closed in
//! topological order. The result is read-only; nothing is written to disk
//! here.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use super::layout::{AGGREGATE_NAME, BUILD_DIR, common_ancestor, normalize};
use super::stage::check_private_depends;
use super::{
    ClosedProject, DiscoveredProject, LinkedProject, PlanError, ProjectGraph, topological_order,
};
use crate::config::ProjectConfig;

/// A resolved set of projects.
#[derive(Debug, Clone)]
pub struct Workspace {
    projects: IndexMap<String, ClosedProject>,
}

impl Workspace {
    /// Resolve `configs` into closed projects.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlanError`] met; no partial workspace is produced.
    pub fn resolve(configs: Vec<ProjectConfig>) -> Result<Self, PlanError> {
        let mut declared: IndexMap<String, ProjectConfig> = IndexMap::new();
        let mut roots: IndexMap<Utf8PathBuf, String> = IndexMap::new();
        for config in configs {
            if declared.contains_key(&config.name) {
                return Err(PlanError::DuplicateProject {
                    project: config.name,
                });
            }
            let root = normalize(&config.root);
            if let Some(first) = roots.get(&root) {
                return Err(PlanError::SharedRoot {
                    root,
                    first: first.clone(),
                    second: config.name,
                });
            }
            check_private_depends(&config)?;
            roots.insert(root, config.name.clone());
            declared.insert(config.name.clone(), config);
        }

        let graph: ProjectGraph = declared
            .iter()
            .map(|(name, config)| (name.clone(), config.depends.clone()))
            .collect();
        let order = topological_order(&graph)?;
        info!(order = ?order, "ordered projects");

        let mut discovered = Vec::with_capacity(order.len());
        for name in &order {
            if let Some(config) = declared.swap_remove(name) {
                discovered.push(DiscoveredProject::discover(config)?);
            }
        }

        let mut finished = IndexMap::with_capacity(discovered.len());
        for project in discovered {
            let name = project.name().to_owned();
            let closed = ClosedProject::close(LinkedProject::link(project, &finished)?)?;
            info!(project = %name, "resolved project");
            finished.insert(name, closed);
        }
        Ok(Self { projects: finished })
    }

    /// Project names in topological order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    /// Resolved projects in topological order.
    pub fn projects(&self) -> impl Iterator<Item = &ClosedProject> {
        self.projects.values()
    }

    /// Look up a resolved project.
    #[must_use]
    pub fn project(&self, name: &str) -> Option<&ClosedProject> {
        self.projects.get(name)
    }

    /// Build directory shared by all projects: `target/` under their common
    /// ancestor.
    #[must_use]
    pub fn target_root(&self) -> Option<Utf8PathBuf> {
        common_ancestor(self.projects.values().map(|p| p.layout.root.as_path()))
            .map(|dir| dir.join(BUILD_DIR))
    }

    /// Location of the aggregate script.
    #[must_use]
    pub fn aggregate_path(&self) -> Option<Utf8PathBuf> {
        self.target_root().map(|dir| dir.join(AGGREGATE_NAME))
    }

    /// Serializable overview of the resolved plan.
    #[must_use]
    pub fn summary(&self) -> PlanSummary<'_> {
        PlanSummary {
            order: self.order().collect(),
            projects: self.projects().map(ProjectSummary::from).collect(),
        }
    }
}

/// Overview of a resolved workspace.
#[derive(Debug, Serialize)]
pub struct PlanSummary<'a> {
    /// Topological order.
    pub order: Vec<&'a str>,
    /// Per-project details, in order.
    pub projects: Vec<ProjectSummary<'a>>,
}

/// Overview of one resolved project.
#[derive(Debug, Serialize)]
pub struct ProjectSummary<'a> {
    /// Project name.
    pub name: &'a str,
    /// Build kind label.
    pub kind: &'static str,
    /// Project root.
    pub root: &'a Utf8Path,
    /// Artefact path.
    pub artifact: Utf8PathBuf,
    /// Declared dependencies.
    pub depends: &'a [String],
    /// Include search path.
    pub include_dirs: &'a [Utf8PathBuf],
    /// Link libraries.
    pub libraries: &'a [String],
    /// Each translation unit with its resolved prerequisites.
    pub units: IndexMap<&'a str, Vec<&'a Utf8Path>>,
}

impl<'a> From<&'a ClosedProject> for ProjectSummary<'a> {
    fn from(project: &'a ClosedProject) -> Self {
        Self {
            name: project.name(),
            kind: project.config.kind.label(),
            root: &project.layout.root,
            artifact: project.artifact(),
            depends: &project.config.depends,
            include_dirs: &project.link.include_dirs,
            libraries: &project.link.libraries,
            units: project
                .files
                .units
                .keys()
                .map(|key| (key.as_str(), project.prerequisites(key)))
                .collect(),
        }
    }
}
