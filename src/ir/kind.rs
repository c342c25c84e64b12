//! Project specialisations.
//!
//! A [`BuildKind`] selects which hooks extend the shared C project
//! behaviour. Every kind discovers the base C inventory; grammar projects add
//! flex and bison sources on top of it, and test projects add a private view of
//! selected dependencies and a `test` action.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

use super::{PlanError, ProjectLayout};
use crate::inventory::{FileSet, InventoryError, merge_disjoint, scan_files};

/// Suffix of translation units.
pub const SOURCE_SUFFIX: &str = "c";
/// Suffix of headers.
pub const HEADER_SUFFIX: &str = "h";
/// Suffix of lex grammars.
pub const LEX_SUFFIX: &str = "l";
/// Suffix of yacc grammars.
pub const YACC_SUFFIX: &str = "y";

/// Parser-generator tools used by grammar projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarToolchain {
    /// Lexer generator, `$(LEX)`.
    pub lex: String,
    /// Flags for the lexer generator, `$(LEXFLAGS)`.
    pub lex_flags: String,
    /// Parser generator, `$(YACC)`.
    pub yacc: String,
    /// Flags for the parser generator, `$(YACCFLAGS)`.
    pub yacc_flags: String,
}

impl Default for GrammarToolchain {
    fn default() -> Self {
        Self {
            lex: "flex".to_owned(),
            lex_flags: String::new(),
            yacc: "bison".to_owned(),
            yacc_flags: "-v".to_owned(),
        }
    }
}

/// Settings of a test project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestHarness {
    /// Command template; `{N}` expands to the N-th test file.
    pub command: String,
    /// Test inputs relative to the project root.
    pub files: Vec<Utf8PathBuf>,
    /// Dependencies whose private headers are visible to the tests.
    pub private_depends: Vec<String>,
}

impl TestHarness {
    /// Create a harness running `command` with no inputs.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            files: Vec::new(),
            private_depends: Vec::new(),
        }
    }

    /// Set the test inputs.
    #[must_use]
    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set the dependencies opted into private header exposure.
    #[must_use]
    pub fn with_private_depends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.private_depends = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Specialisation of a project.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuildKind {
    /// Plain C library or program.
    #[default]
    Library,
    /// C project with flex and bison grammars under `src/yy`.
    Grammar(GrammarToolchain),
    /// Test binary with a `test` action.
    TestHarness(TestHarness),
}

/// Files produced from grammar sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarFiles {
    /// Lex grammars keyed relative to `src/yy`.
    pub lex: FileSet,
    /// Yacc grammars keyed relative to `src/yy`.
    pub yacc: FileSet,
    /// Generated unit key mapped to the grammar key it comes from.
    pub generated: IndexMap<String, String>,
}

/// Discovered files of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFiles {
    /// Translation units under `src`.
    pub units: FileSet,
    /// Public headers under `include`.
    pub public_headers: FileSet,
    /// Private headers under `src/include`.
    pub private_headers: FileSet,
    /// Public header key mapped to its copy in the export directory.
    pub exports: FileSet,
    /// Local files whose includes are scanned.
    pub scannable: FileSet,
    /// Keys resolvable from this project before injection.
    pub universe: FileSet,
    /// Grammar inputs and outputs; empty unless the project is a grammar one.
    pub grammar: GrammarFiles,
}

impl BuildKind {
    /// Short label used in logs and plan dumps.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Library => "c",
            Self::Grammar(_) => "grammar",
            Self::TestHarness(_) => "test",
        }
    }

    /// Discover the project's files.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::IdentityCollision`] when role sets overlap and
    /// [`PlanError::Discovery`] when a root cannot be walked.
    pub fn discover_sources(
        &self,
        project: &str,
        layout: &ProjectLayout,
    ) -> Result<ProjectFiles, PlanError> {
        let mut files =
            discover_c_sources(layout).map_err(|err| PlanError::from_inventory(project, err))?;
        if matches!(self, Self::Grammar(_)) {
            discover_grammar(layout, &mut files)
                .map_err(|err| PlanError::from_inventory(project, err))?;
        }
        Ok(files)
    }

    /// Project-owned include directories, in search order.
    #[must_use]
    pub fn include_dirs(&self, layout: &ProjectLayout) -> Vec<Utf8PathBuf> {
        let mut dirs = vec![layout.include.clone(), layout.internal.clone()];
        if matches!(self, Self::Grammar(_)) {
            dirs.push(layout.generated.clone());
        }
        dirs
    }

    /// Dependencies whose private headers this project may see.
    #[must_use]
    pub fn private_depends(&self) -> &[String] {
        match self {
            Self::TestHarness(harness) => &harness.private_depends,
            Self::Library | Self::Grammar(_) => &[],
        }
    }

    /// Paths removed by the `clean` action.
    #[must_use]
    pub fn clean_targets(&self, layout: &ProjectLayout, artifact: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut targets = vec![
            layout.obj.clone(),
            layout.export.clone(),
            artifact.to_owned(),
        ];
        if matches!(self, Self::Grammar(_)) {
            targets.push(layout.generated.clone());
        }
        targets
    }
}

fn discover_c_sources(layout: &ProjectLayout) -> Result<ProjectFiles, InventoryError> {
    let units = scan_files(&[layout.source.as_path()], &[SOURCE_SUFFIX])?;
    let public_headers = scan_files(&[layout.include.as_path()], &[HEADER_SUFFIX])?;
    let private_headers = scan_files(&[layout.internal.as_path()], &[HEADER_SUFFIX])?;
    let exports = public_headers
        .keys()
        .map(|key| (key.clone(), layout.export.join(key)))
        .collect();

    let mut scannable = units.clone();
    merge_disjoint(&mut scannable, &public_headers)?;
    merge_disjoint(&mut scannable, &private_headers)?;
    let universe = scannable.clone();

    tracing::info!(
        root = %layout.root,
        units = units.len(),
        headers = public_headers.len(),
        internal = private_headers.len(),
        "discovered sources"
    );
    Ok(ProjectFiles {
        units,
        public_headers,
        private_headers,
        exports,
        scannable,
        universe,
        grammar: GrammarFiles::default(),
    })
}

fn with_suffix(key: &str, from: &str, to: &str) -> String {
    key.strip_suffix(from)
        .map_or_else(|| format!("{key}{to}"), |stem| format!("{stem}{to}"))
}

fn discover_grammar(
    layout: &ProjectLayout,
    files: &mut ProjectFiles,
) -> Result<(), InventoryError> {
    let lex = scan_files(&[layout.grammar.as_path()], &[LEX_SUFFIX])?;
    let yacc = scan_files(&[layout.grammar.as_path()], &[YACC_SUFFIX])?;

    let mut origins = IndexMap::new();
    for key in lex.keys() {
        origins.insert(with_suffix(key, ".l", ".yy.c"), key.clone());
    }
    let mut headers = FileSet::new();
    for key in yacc.keys() {
        origins.insert(with_suffix(key, ".y", ".tab.c"), key.clone());
        let header = with_suffix(key, ".y", ".tab.h");
        headers.insert(header.clone(), layout.generated.join(&header));
    }

    // Generated headers are includable; the grammars themselves are only scanned.
    merge_disjoint(&mut files.universe, &headers)?;
    merge_disjoint(&mut files.scannable, &lex)?;
    merge_disjoint(&mut files.scannable, &yacc)?;

    tracing::info!(
        root = %layout.root,
        lex = lex.len(),
        yacc = yacc.len(),
        "discovered grammars"
    );
    files.grammar = GrammarFiles {
        lex,
        yacc,
        generated: origins,
    };
    Ok(())
}
