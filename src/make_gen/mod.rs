//! Makefile generator.
//!
//! This module converts a [`ClosedProject`] into the Makefile consumed by
//! `make`. Generation is a single pass over already resolved state: every
//! ordering decision has been made by [`crate::ir`], so the same project
//! always yields the same bytes.
//!
//! A project script has four blocks, each introduced by a banner: variable
//! assignments, pattern rules, one prerequisite line per object, and the final
//! artefact with its lifecycle targets. [`aggregate`] produces the workspace
//! level script that drives every project.

pub mod aggregate;

use std::fmt::{self, Display, Formatter};

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;

use crate::config::OutputKind;
use crate::ir::{BuildKind, ClosedProject, GrammarToolchain, Workspace};

const C_RULE: &str = "\t@echo CC $<\n\tmkdir -p $(dir $@)\n\t$(CC) -c $(CFLAGS) -o $@ $<\n";
const HEADER_RULE: &str = "\t@echo Copy $@\n\tmkdir -p $(dir $@)\n\tcp $< $@\n";
const LEX_RULE: &str = "\t@echo LEX $<\n\tmkdir -p $(dir $@)\n\t$(LEX) $(LEXFLAGS) -o $@ $<\n";
const ARCHIVE_RECIPE: &str = "\t@echo AR $@\n\tmkdir -p $(dir $@)\n\t$(AR) $(ARFLAGS) -rcs $@ $^\n";
const LINK_RECIPE: &str =
    "\t@echo LD $@\n\tmkdir -p $(dir $@)\n\t$(LD) $(LDFLAGS) -o $@ $^ $(LDLIBS)\n";

/// A generated project script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Makefile {
    /// Script text.
    pub text: String,
    /// Phony targets declared by the script, in declaration order.
    pub phonies: Vec<&'static str>,
}

/// A script paired with the path it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Destination file.
    pub path: Utf8PathBuf,
    /// File contents.
    pub contents: String,
}

/// Lifecycle targets any project script may declare, `test` last.
pub const LIFECYCLE_TARGETS: [&str; 6] = ["default", "all", "headers", "clean", "rebuild", "test"];

/// Lifecycle targets a project declares.
///
/// Every project has `default`, `all`, `headers`, `clean` and `rebuild`;
/// test projects add `test`.
#[must_use]
pub fn phony_targets(project: &ClosedProject) -> Vec<&'static str> {
    LIFECYCLE_TARGETS
        .into_iter()
        .filter(|word| *word != "test" || project.test.is_some())
        .collect()
}

/// Generate the Makefile of a single project.
#[must_use]
pub fn generate(project: &ClosedProject) -> Makefile {
    let phonies = phony_targets(project);
    let text = ProjectScript {
        project,
        phonies: &phonies,
    }
    .to_string();
    Makefile { text, phonies }
}

/// Render every script of `workspace`: one per project in topological order,
/// followed by the aggregate script. An empty workspace yields no scripts.
#[must_use]
pub fn render(workspace: &Workspace) -> Vec<Script> {
    let projects: Vec<&ClosedProject> = workspace.projects().collect();
    let mut scripts: Vec<Script> = projects
        .iter()
        .map(|project| Script {
            path: project.layout.makefile.clone(),
            contents: generate(project).text,
        })
        .collect();
    if let Some(path) = workspace.aggregate_path() {
        scripts.push(Script {
            path,
            contents: aggregate::generate(&projects),
        });
    }
    scripts
}

/// Compiler flags in emission order.
#[must_use]
pub fn compile_flags(project: &ClosedProject) -> Vec<String> {
    let toolchain = &project.config.toolchain;
    let mut flags = vec!["-Wall".to_owned()];
    if toolchain.debug {
        flags.extend(["-g".to_owned(), "-O0".to_owned()]);
    } else {
        flags.extend(["-O2".to_owned(), "-DNDEBUG".to_owned()]);
    }
    if !toolchain.test {
        flags.push("-DNTEST".to_owned());
    }
    if project.config.output.kind == OutputKind::Shared {
        flags.extend(["-fPIC".to_owned(), "-fvisibility=hidden".to_owned()]);
    }
    if let Some(std) = &toolchain.std {
        flags.push(format!("-std={std}"));
    }
    flags.extend(
        project
            .link
            .include_dirs
            .iter()
            .map(|dir| format!("-I{}", project.layout.relative(dir))),
    );
    flags
}

/// Write `target :` followed by each prerequisite, without trailing blanks.
fn write_edge<I>(f: &mut Formatter<'_>, target: &str, prerequisites: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: Display,
{
    write!(f, "{target} :")?;
    for prerequisite in prerequisites {
        write!(f, " {prerequisite}")?;
    }
    writeln!(f)
}

fn object_path(dir: &Utf8Path, key: &str) -> Utf8PathBuf {
    dir.join(key).with_extension("o")
}

/// Wrapper struct to display a project's Makefile.
struct ProjectScript<'a> {
    project: &'a ClosedProject,
    phonies: &'a [&'static str],
}

impl ProjectScript<'_> {
    fn rel(&self, path: &Utf8Path) -> String {
        self.project.layout.relative(path)
    }

    fn write_prelude(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let config = &self.project.config;
        let link = &self.project.link;
        writeln!(f, "CC={}", config.toolchain.cc)?;
        writeln!(f, "CFLAGS={}", compile_flags(self.project).join(" "))?;
        writeln!(f)?;
        if config.output.kind == OutputKind::Static {
            writeln!(f, "AR={}", config.toolchain.ar)?;
            writeln!(f, "ARFLAGS=")?;
        } else {
            let shared = (config.output.kind == OutputKind::Shared).then_some("-shared".to_owned());
            let ld_flags = shared
                .into_iter()
                .chain(link.library_dirs.iter().map(|dir| format!("-L{dir}")))
                .join(" ");
            writeln!(f, "LD={}", config.toolchain.ld)?;
            writeln!(f, "LDFLAGS={ld_flags}")?;
            writeln!(
                f,
                "LDLIBS={}",
                link.libraries.iter().map(|lib| format!("-l{lib}")).join(" ")
            )?;
        }
        writeln!(f)?;
        if let BuildKind::Grammar(tools) = &config.kind {
            write_grammar_prelude(f, tools)?;
        }
        Ok(())
    }

    fn write_pattern(
        &self,
        f: &mut Formatter<'_>,
        target: &Utf8Path,
        source: &Utf8Path,
        recipe: &str,
    ) -> fmt::Result {
        writeln!(f, "{} : {}", self.rel(target), self.rel(source))?;
        writeln!(f, "{recipe}")
    }

    fn write_rules(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let layout = &self.project.layout;
        self.write_pattern(f, &layout.obj.join("%.o"), &layout.source.join("%.c"), C_RULE)?;
        self.write_pattern(
            f,
            &layout.export.join("%.h"),
            &layout.include.join("%.h"),
            HEADER_RULE,
        )?;
        if !matches!(self.project.config.kind, BuildKind::Grammar(_)) {
            return Ok(());
        }

        self.write_pattern(
            f,
            &layout.generated.join("%.yy.c"),
            &layout.grammar.join("%.l"),
            LEX_RULE,
        )?;
        for (key, grammar) in &self.project.files.grammar.yacc {
            let stem = key.strip_suffix(".y").unwrap_or(key);
            let source = self.rel(&layout.generated.join(format!("{stem}.tab.c")));
            let header = self.rel(&layout.generated.join(format!("{stem}.tab.h")));
            writeln!(f, "{source} {header} &: {}", self.rel(grammar))?;
            writeln!(f, "\t@echo YACC $<\n\tmkdir -p $(dir $@)")?;
            writeln!(f, "\t$(YACC) $(YACCFLAGS) --defines={header} -o {source} $<\n")?;
        }
        self.write_pattern(
            f,
            &layout.generated_obj.join("%.o"),
            &layout.generated.join("%.c"),
            C_RULE,
        )
    }

    /// Write one prerequisite line per object and return the objects.
    fn write_deps(&self, f: &mut Formatter<'_>) -> Result<Vec<String>, fmt::Error> {
        let project = self.project;
        let layout = &project.layout;
        let mut objects = Vec::new();

        for (key, source) in &project.files.units {
            let object = self.rel(&object_path(&layout.obj, key));
            let prerequisites = project.prerequisites(key).into_iter().map(|p| self.rel(p));
            write_edge(
                f,
                &object,
                std::iter::once(self.rel(source)).chain(prerequisites),
            )?;
            objects.push(object);
        }
        for (generated, grammar) in &project.files.grammar.generated {
            let object = self.rel(&object_path(&layout.generated_obj, generated));
            let source = self.rel(&layout.generated.join(generated));
            let prerequisites = project
                .prerequisites(grammar)
                .into_iter()
                .map(|p| self.rel(p));
            write_edge(f, &object, std::iter::once(source).chain(prerequisites))?;
            objects.push(object);
        }
        Ok(objects)
    }

    fn write_targets(&self, f: &mut Formatter<'_>, objects: &[String]) -> fmt::Result {
        let project = self.project;
        let layout = &project.layout;
        let artifact_path = project.artifact();
        let artifact = self.rel(&artifact_path);

        if project.config.output.kind == OutputKind::Static {
            write_edge(f, &artifact, objects)?;
            f.write_str(ARCHIVE_RECIPE)?;
        } else {
            let dependencies = project.link.artifacts.iter().map(|a| self.rel(a));
            write_edge(
                f,
                &artifact,
                objects.iter().cloned().chain(dependencies),
            )?;
            f.write_str(LINK_RECIPE)?;
        }

        writeln!(f)?;
        write_edge(
            f,
            "headers",
            project.files.exports.values().map(|p| self.rel(p)),
        )?;
        writeln!(f)?;
        let clean = project
            .config
            .kind
            .clean_targets(layout, &artifact_path)
            .iter()
            .map(|p| self.rel(p))
            .join(" ");
        writeln!(f, "clean :\n\trm -fr {clean}\n")?;
        writeln!(f, "all : {artifact} headers")?;
        writeln!(f, "rebuild : clean all")?;

        if let Some(test) = &project.test {
            writeln!(f)?;
            let inputs = test.files.iter().map(String::as_str);
            write_edge(f, "test", std::iter::once("all").chain(inputs))?;
            writeln!(f, "\t@echo RUN test")?;
            writeln!(f, "\trm -fr {}", self.rel(&layout.tests))?;
            writeln!(f, "\t{}", test.command)?;
        }
        Ok(())
    }
}

fn write_grammar_prelude(f: &mut Formatter<'_>, tools: &GrammarToolchain) -> fmt::Result {
    writeln!(f, "LEX={}", tools.lex)?;
    writeln!(f, "LEXFLAGS={}", tools.lex_flags)?;
    writeln!(f)?;
    writeln!(f, "YACC={}", tools.yacc)?;
    writeln!(f, "YACCFLAGS={}", tools.yacc_flags)?;
    writeln!(f)
}

impl Display for ProjectScript<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("\n############# Prelude ############\n")?;
        self.write_prelude(f)?;
        f.write_str("\ndefault : all\n")?;

        f.write_str("\n############## Rules #############\n")?;
        self.write_rules(f)?;

        f.write_str("\n############## Deps ##############\n")?;
        let objects = self.write_deps(f)?;

        f.write_str("\n############# Targets ############\n")?;
        self.write_targets(f, &objects)?;
        writeln!(f, "\n.PHONY : {}", self.phonies.join(" "))
    }
}
