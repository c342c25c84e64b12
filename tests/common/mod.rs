//! Shared helpers for integration tests.
//!
//! Integration tests under `tests/` compile as independent crates. This module
//! is included via `mod common;` in individual test files to share fixtures and
//! helpers while keeping test modules small and avoiding duplication.

#![allow(
    clippy::allow_attributes,
    dead_code,
    reason = "each test crate uses a different subset of helpers"
)]

use mkplan::config::{OutputKind, OutputSpec, ProjectConfig};
use mkplan::ir::{BuildKind, ClosedProject, Workspace};
use mkplan::make_gen;
use rstest::fixture;
use test_support::ProjectTree;

/// Fixture: an empty temporary tree.
#[fixture]
pub fn tree() -> ProjectTree {
    ProjectTree::new()
}

/// Static library `lib<name>.a` rooted at `<tree>/<name>`.
pub fn library(tree: &ProjectTree, name: &str, depends: &[&str]) -> ProjectConfig {
    ProjectConfig::new(
        name,
        tree.path(name),
        BuildKind::Library,
        OutputSpec::new(format!("lib{name}.a"), OutputKind::Static),
    )
    .with_depends(depends.iter().copied())
}

/// Binary `<name>` rooted at `<tree>/<name>`.
pub fn binary(tree: &ProjectTree, name: &str, depends: &[&str]) -> ProjectConfig {
    ProjectConfig::new(
        name,
        tree.path(name),
        BuildKind::Library,
        OutputSpec::new(name, OutputKind::Binary),
    )
    .with_depends(depends.iter().copied())
}

/// Resolve `configs`, failing the test on error.
pub fn resolve(configs: Vec<ProjectConfig>) -> Workspace {
    Workspace::resolve(configs).expect("workspace should resolve")
}

/// Look up a resolved project.
pub fn project<'a>(workspace: &'a Workspace, name: &str) -> &'a ClosedProject {
    workspace
        .project(name)
        .unwrap_or_else(|| panic!("project {name} should be resolved"))
}

/// Generated Makefile text of `name`.
pub fn script(workspace: &Workspace, name: &str) -> String {
    make_gen::generate(project(workspace, name)).text
}

/// The first line of `text` starting with `prefix`.
pub fn line_starting<'a>(text: &'a str, prefix: &str) -> &'a str {
    text.lines()
        .find(|line| line.starts_with(prefix))
        .unwrap_or_else(|| panic!("no line starting with {prefix:?} in:\n{text}"))
}
