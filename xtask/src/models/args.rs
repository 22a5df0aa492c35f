//! # CLI Argument Definitions
//!
//! This module defines the command-line interface (CLI) structure using the `clap` crate.
//! It specifies the available subcommands, arguments, and flags for the application.

use crate::models::component::Component;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "cargo xtask")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "AUTD3 Server build script")]
pub struct Cli {
    /// Workspace root (defaults to the parent of the xtask crate)
    #[arg(long, global = true, env = "XTASK_ROOT")]
    pub root: Option<PathBuf>,

    /// Print the steps that would run without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// The main subcommand to execute.
    #[command(subcommand)]
    pub command: AppCommands,
}

/// Enumeration of available application subcommands.
#[derive(Debug, Subcommand)]
pub enum AppCommands {
    /// Build the selected components (see `build -h`)
    Build {
        #[command(flatten)]
        selection: Selection,
    },
    /// Run clippy on the selected components (see `lint -h`)
    Lint {
        #[command(flatten)]
        selection: Selection,
    },
    /// Remove caches and generated artifacts
    Clear {},
    /// Release utilities (see `util -h`)
    Util {
        #[command(subcommand)]
        action: UtilAction,
    },
    /// Regenerate the third-party notice and fail if it changed
    CheckLicense {
        /// Notice file to regenerate (defaults to the configured `notice.path`)
        #[arg(long)]
        notice: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum UtilAction {
    /// Update the version of every manifest and notice file
    Upver {
        /// New version (e.g. 29.0.0 or 29.0.0-rc.1)
        version: String,
    },
}

/// Component selection shared by `build` and `lint`.
#[derive(Debug, Default, Clone, Copy, Args)]
pub struct Selection {
    /// Simulator (with and without Unity support)
    #[arg(long)]
    pub simulator: bool,
    /// SOEM server
    #[arg(long)]
    pub soem: bool,
    /// TwinCAT server
    #[arg(long)]
    pub twincat: bool,
    /// Main app
    #[arg(long)]
    pub main: bool,
    /// Every component
    #[arg(long)]
    pub all: bool,
}

impl Selection {
    /// Returns the selected components in execution order.
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        Component::ALL
            .into_iter()
            .filter(|component| {
                self.all
                    || match component {
                        Component::Simulator => self.simulator,
                        Component::Soem => self.soem,
                        Component::TwinCat => self.twincat,
                        Component::Main => self.main,
                    }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn selection_keeps_execution_order() {
        let selection = Selection { main: true, simulator: true, ..Selection::default() };
        assert_eq!(selection.components(), vec![Component::Simulator, Component::Main]);
    }

    #[test]
    fn selection_all_selects_everything() {
        let selection = Selection { all: true, ..Selection::default() };
        assert_eq!(selection.components(), Component::ALL.to_vec());
        assert!(Selection::default().components().is_empty());
    }

    #[test]
    fn parses_nested_upver() {
        let cli = Cli::try_parse_from(["xtask", "--dry-run", "util", "upver", "29.0.0"])
            .expect("valid command line");
        assert!(cli.dry_run);
        assert!(matches!(
            cli.command,
            AppCommands::Util { action: UtilAction::Upver { ref version } } if version == "29.0.0"
        ));
    }

    #[test]
    fn parses_check_license() {
        let cli = Cli::try_parse_from(["xtask", "check-license", "--notice", "NOTICE"])
            .expect("valid command line");
        assert!(matches!(
            cli.command,
            AppCommands::CheckLicense { notice: Some(ref path) } if path == &PathBuf::from("NOTICE")
        ));
    }
}
