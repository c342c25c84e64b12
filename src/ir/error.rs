//! Errors raised while planning a workspace.
//!
//! Every variant is fatal: planning stops at the point of detection and no
//! script is written.

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::inventory::InventoryError;

/// Errors produced by [`crate::ir::Workspace::resolve`].
#[derive(Debug, Error, Diagnostic)]
pub enum PlanError {
    /// The project dependency graph contains a cycle.
    #[error("Dependency cycle detected at project '{project}': {}", cycle.join(" -> "))]
    #[diagnostic(code(mkplan::plan::cycle))]
    CircularDependency {
        /// Project at which the cycle was detected.
        project: String,
        /// Cycle path, starting and ending at its smallest project name.
        cycle: Vec<String>,
    },

    /// Two projects share a name.
    #[error("Project '{project}' is declared more than once")]
    #[diagnostic(code(mkplan::plan::duplicate_project))]
    DuplicateProject {
        /// Repeated name.
        project: String,
    },

    /// Two projects share a root, and with it their build directory.
    #[error("Projects '{first}' and '{second}' share the root {root}")]
    #[diagnostic(
        code(mkplan::plan::shared_root),
        help("give each project its own directory; both would write {root}/target/Makefile")
    )]
    SharedRoot {
        /// Normalised root.
        root: Utf8PathBuf,
        /// Project declared first.
        first: String,
        /// Project declared second.
        second: String,
    },

    /// A project lists a dependency that is not declared.
    #[error("Unknown project dependency '{dependency}' required by '{project}'")]
    #[diagnostic(
        code(mkplan::plan::unknown_dependency),
        help("declare '{dependency}' under `projects` or remove it from `depends`")
    )]
    UnknownDependency {
        /// Dependent project.
        project: String,
        /// Missing dependency name.
        dependency: String,
    },

    /// Two files expected to be disjoint share a logical key.
    #[error("Project '{project}': '{key}' is provided by both {first} and {second}")]
    #[diagnostic(code(mkplan::plan::identity_collision))]
    IdentityCollision {
        /// Project being discovered.
        project: String,
        /// Contested key.
        key: String,
        /// Path registered first.
        first: Utf8PathBuf,
        /// Conflicting path.
        second: Utf8PathBuf,
    },

    /// A private dependency opt-in names a project outside `depends`.
    #[error("Project '{project}': private dependency '{dependency}' is not in depends")]
    #[diagnostic(
        code(mkplan::plan::invalid_private_dependency),
        help("list '{dependency}' under depends as well")
    )]
    InvalidPrivateDependency {
        /// Test project declaring the opt-in.
        project: String,
        /// Offending dependency name.
        dependency: String,
    },

    /// The test command template cannot be rendered into a shell command.
    #[error("Project '{project}': invalid test command `{command}`: {reason}")]
    #[diagnostic(code(mkplan::plan::invalid_test_command))]
    InvalidTestCommand {
        /// Test project.
        project: String,
        /// Template or rendered command.
        command: String,
        /// Why the command was rejected.
        reason: String,
    },

    /// A test file cannot be written as a make prerequisite.
    #[error("Project '{project}': test file `{file}` cannot appear in a Makefile")]
    #[diagnostic(
        code(mkplan::plan::invalid_test_file),
        help("rename the file so it has no whitespace or any of `:#$%;=\\*?[]`")
    )]
    InvalidTestFile {
        /// Test project.
        project: String,
        /// File as written in the script.
        file: String,
    },

    /// Walking a project root failed.
    #[error("Project '{project}': source discovery failed")]
    #[diagnostic(code(mkplan::plan::discovery))]
    Discovery {
        /// Project being discovered.
        project: String,
        /// Underlying traversal error.
        #[source]
        source: InventoryError,
    },

    /// Reading a source file failed.
    #[error("failed to read {path}")]
    #[diagnostic(code(mkplan::plan::io))]
    Io {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl PlanError {
    /// Attribute an inventory failure to `project`.
    #[must_use]
    pub fn from_inventory(project: &str, err: InventoryError) -> Self {
        match err {
            InventoryError::Collision { key, first, second } => Self::IdentityCollision {
                project: project.to_owned(),
                key,
                first,
                second,
            },
            other => Self::Discovery {
                project: project.to_owned(),
                source: other,
            },
        }
    }
}
