//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Running
//! without a subcommand behaves like `generate`.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::config::BuildOverlay;
use crate::manifest::DEFAULT_MANIFEST;

/// Plan C projects and generate Makefiles for them.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the manifest, relative to the working directory.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
    pub file: Utf8PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<Utf8PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Force debug builds for every project.
    #[arg(long, overrides_with = "no_debug")]
    pub debug: bool,

    /// Force optimised builds for every project.
    #[arg(long, overrides_with = "debug")]
    pub no_debug: bool,

    /// Keep test hooks compiled into every project.
    #[arg(long, overrides_with = "no_test")]
    pub test: bool,

    /// Define `NTEST` for every project.
    #[arg(long, overrides_with = "test")]
    pub no_test: bool,

    /// Optional subcommand to execute; defaults to `generate` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse command-line arguments, providing `generate` as the default
    /// command.
    #[must_use]
    pub fn parse_with_default() -> Self {
        Self::parse().with_default_command()
    }

    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Generate);
        }
        self
    }

    /// Settings forced onto every project by the command line.
    #[must_use]
    pub const fn overlay(&self) -> BuildOverlay {
        BuildOverlay {
            debug: switch(self.debug, self.no_debug),
            test: switch(self.test, self.no_test),
        }
    }
}

const fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Arguments accepted by the `plan` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct PlanArgs {
    /// Write the JSON plan to this path; `-` writes to stdout.
    #[arg(value_name = "FILE", default_value = "-")]
    pub output: Utf8PathBuf,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Resolve the workspace and write every Makefile (default).
    Generate,

    /// Print project names in build order, one per line.
    Order,

    /// Print the resolved plan as JSON.
    Plan(PlanArgs),

    /// Resolve the workspace without writing anything.
    Check,
}
