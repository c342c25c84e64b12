//! Intermediate representation of a planned workspace.
//!
//! Projects are resolved in stages. Each stage is its own type, so a stage can
//! only consume the output of the one before it:
//!
//! [`DiscoveredProject`] → [`LinkedProject`] → [`ClosedProject`]
//!
//! [`Workspace::resolve`] drives every project through the stages in
//! dependency order. The result carries no Make syntax; see
//! [`crate::make_gen`] for emission.
//!
//! # Examples
//!
//! ```
//! use mkplan::ir::{ProjectGraph, topological_order};
//!
//! let mut graph = ProjectGraph::new();
//! graph.insert("app".into(), vec!["core".into()]);
//! graph.insert("core".into(), vec![]);
//! assert_eq!(topological_order(&graph).unwrap(), ["core", "app"]);
//! ```

mod error;
mod kind;
mod layout;
mod order;
mod stage;
mod test_command;
mod workspace;

pub use error::PlanError;
pub use kind::{
    BuildKind, GrammarFiles, GrammarToolchain, HEADER_SUFFIX, LEX_SUFFIX, ProjectFiles,
    SOURCE_SUFFIX, TestHarness, YACC_SUFFIX,
};
pub use layout::{
    AGGREGATE_NAME, BUILD_DIR, MAKEFILE_NAME, ProjectLayout, common_ancestor, is_make_word,
    normalize,
};
pub use order::{ProjectGraph, topological_order};
pub use stage::{
    ClosedProject, DiscoveredProject, LinkInputs, LinkedProject, TestPlan, library_name,
};
pub use test_command::{TestCommandError, render_test_command};
pub use workspace::{PlanSummary, ProjectSummary, Workspace};
