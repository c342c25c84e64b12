//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads the manifest, resolves the workspace and then performs the requested
//! command. Nothing is written until the whole workspace has resolved.

mod error;
mod file_io;
mod path_helpers;

pub use error::RunnerError;
pub use file_io::{is_stdout_path, write_file_atomic, write_scripts, write_stdout};

use anyhow::{Context, Result};
use camino::Utf8Path;
use tracing::info;

use crate::cli::{Cli, Commands, PlanArgs};
use crate::ir::Workspace;
use crate::{make_gen, manifest};

use path_helpers::{ensure_manifest_exists, resolve_manifest_path, resolve_output_path, working_dir};

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the workspace does not
/// resolve or an output cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let cwd = working_dir(cli)?;
    let workspace = load_workspace(&cwd, cli)?;
    match cli.command.clone().unwrap_or(Commands::Generate) {
        Commands::Generate => {
            let scripts = make_gen::render(&workspace);
            write_scripts(&scripts)?;
            info!(scripts = scripts.len(), "generation complete");
            Ok(())
        }
        Commands::Order => {
            let mut listing = String::new();
            for name in workspace.order() {
                listing.push_str(name);
                listing.push('\n');
            }
            write_stdout(&listing)
        }
        Commands::Plan(args) => write_plan(&cwd, &workspace, &args),
        Commands::Check => {
            info!(
                projects = workspace.order().count(),
                "workspace resolved"
            );
            Ok(())
        }
    }
}

/// Load the manifest named by `cli` and resolve its workspace.
///
/// # Errors
///
/// Returns an error if the manifest is missing or invalid, or if planning
/// fails.
pub fn load_workspace(cwd: &Utf8Path, cli: &Cli) -> Result<Workspace> {
    let manifest_path = resolve_manifest_path(cwd, cli);
    ensure_manifest_exists(&manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or(cwd);
    let configs = manifest::from_path(&manifest_path)?.into_configs(base_dir, cli.overlay())?;
    info!(manifest = %manifest_path, projects = configs.len(), "loaded manifest");
    Workspace::resolve(configs).with_context(|| format!("failed to plan {manifest_path}"))
}

fn write_plan(cwd: &Utf8Path, workspace: &Workspace, args: &PlanArgs) -> Result<()> {
    let mut json = serde_json::to_string_pretty(&workspace.summary())
        .context("failed to serialise the plan")?;
    json.push('\n');
    if is_stdout_path(&args.output) {
        write_stdout(&json)
    } else {
        let path = resolve_output_path(cwd, &args.output);
        write_file_atomic(&path, &json)?;
        info!(path = %path, "wrote plan");
        Ok(())
    }
}
