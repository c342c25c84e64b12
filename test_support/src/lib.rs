//! Test utilities for building project trees on disk.
//!
//! Integration tests describe a workspace as a handful of files under a
//! temporary directory and hand the absolute paths to the planner.

pub mod manifest;
pub mod tree;

pub use manifest::manifest_yaml;
pub use tree::ProjectTree;
