//! Workspace-level script.
//!
//! The aggregate script runs each project's own Makefile through
//! `$(MAKE) -C`. Project targets depend on their dependencies' targets, so
//! `make -f Projects.mk` builds in topological order, and each lifecycle target
//! a project declares is reachable as `<action>-<project>`.

use std::fmt::{self, Display, Formatter};

use itertools::Itertools;

use super::phony_targets;
use crate::ir::ClosedProject;

/// Targets the aggregate script defines besides the per-project ones.
pub const WORKSPACE_TARGETS: [&str; 4] = ["default", "all-all", "clean-all", "rebuild-all"];

/// Generate the aggregate script for `projects`, given in topological order.
///
/// # Examples
///
/// ```
/// let script = mkplan::make_gen::aggregate::generate(&[]);
/// assert_eq!(
///     script,
///     "default : all-all\nall-all :\nclean-all :\nrebuild-all : clean-all all-all\n\
///      .PHONY : default all-all clean-all rebuild-all\n"
/// );
/// ```
#[must_use]
pub fn generate(projects: &[&ClosedProject]) -> String {
    Aggregate { projects }.to_string()
}

/// Wrapper struct to display the aggregate script.
struct Aggregate<'a> {
    projects: &'a [&'a ClosedProject],
}

impl Display for Aggregate<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut phonies: Vec<String> = WORKSPACE_TARGETS.into_iter().map(str::to_owned).collect();
        writeln!(f, "default : all-all")?;

        for project in self.projects {
            let name = project.name();
            let root = &project.layout.root;
            let makefile = &project.layout.makefile;
            writeln!(f, "############ Project {name} ############")?;
            super::write_edge(f, name, &project.config.depends)?;
            writeln!(f, "\t@echo Project {name}")?;
            writeln!(f, "\t$(MAKE) -C {root} -f {makefile}\n")?;
            phonies.push(name.to_owned());

            for word in phony_targets(project) {
                let target = format!("{word}-{name}");
                writeln!(f, "{target} :")?;
                writeln!(f, "\t@echo Project {name} {word}")?;
                writeln!(f, "\t$(MAKE) -C {root} -f {makefile} {word}\n")?;
                phonies.push(target);
            }
        }

        let names = || self.projects.iter().map(|p| p.name());
        super::write_edge(f, "all-all", names())?;
        super::write_edge(f, "clean-all", names().map(|name| format!("clean-{name}")))?;
        writeln!(f, "rebuild-all : clean-all all-all")?;
        writeln!(f, ".PHONY : {}", phonies.iter().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputKind, OutputSpec, ProjectConfig};
    use crate::ir::{BuildKind, LinkInputs, ProjectFiles, ProjectLayout};
    use rstest::rstest;

    fn closed(name: &str, depends: &[&str]) -> ClosedProject {
        let config = ProjectConfig::new(
            name,
            format!("/w/{name}"),
            BuildKind::Library,
            OutputSpec::new(format!("lib{name}.a"), OutputKind::Static),
        )
        .with_depends(depends.iter().copied());
        ClosedProject {
            layout: ProjectLayout::new(&config.root),
            config,
            files: ProjectFiles::default(),
            link: LinkInputs::default(),
            universe: Default::default(),
            deps: Default::default(),
            test: None,
        }
    }

    #[rstest]
    fn aggregate_runs_projects_in_order() {
        let a = closed("a", &[]);
        let b = closed("b", &["a"]);
        let script = generate(&[&a, &b]);

        assert!(script.starts_with(concat!(
            "default : all-all\n",
            "############ Project a ############\n",
            "a :\n",
            "\t@echo Project a\n",
            "\t$(MAKE) -C /w/a -f /w/a/target/Makefile\n",
            "\n",
            "default-a :\n",
            "\t@echo Project a default\n",
            "\t$(MAKE) -C /w/a -f /w/a/target/Makefile default\n",
            "\n",
        )));
        assert!(script.contains(concat!(
            "############ Project b ############\n",
            "b : a\n",
            "\t@echo Project b\n",
        )));
        assert!(script.ends_with(concat!(
            "all-all : a b\n",
            "clean-all : clean-a clean-b\n",
            "rebuild-all : clean-all all-all\n",
            ".PHONY : default all-all clean-all rebuild-all ",
            "a default-a all-a headers-a clean-a rebuild-a ",
            "b default-b all-b headers-b clean-b rebuild-b\n",
        )));
    }
}
