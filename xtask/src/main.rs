#![warn(rust_2018_idioms, unused_lifetimes)]

pub mod handlers;
pub mod models;
pub mod services;

use crate::handlers::{build, clear, license, lint, upver};
use crate::models::args::{AppCommands, Cli, UtilAction};
use crate::models::settings::LogSettings;
use crate::models::workspace::Workspace;
use crate::services::executor::{DryRunExecutor, Executor, SystemExecutor};
use crate::services::host::Host;
use crate::services::utils::{get_project_root, load_settings};

use anyhow::Result;
use autd_server_logger::Logger;
use clap::Parser;
use std::path::Path;
use tracing::debug;

fn init_logger(cli: &Cli, root: &Path, log: &LogSettings) -> Result<Logger> {
    let mut builder = Logger::builder("xtask").verbosity(cli.verbose, cli.quiet);
    if let Some(filter) = &log.filter {
        builder = builder.env_filter(filter.as_str());
    }

    let logger = match &log.dir {
        Some(dir) => builder.file(root.join(dir)).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => get_project_root()?,
    };
    let settings = load_settings(&root)?;
    let _logger = init_logger(&cli, &root, &settings.log)?;

    let host = Host::detect()?;
    let workspace = Workspace::new(root, settings);
    debug!(root = %workspace.root.display(), dry_run = cli.dry_run, "Workspace");

    let mut executor: Box<dyn Executor> = if cli.dry_run {
        Box::new(DryRunExecutor::new())
    } else {
        Box::new(SystemExecutor::new(&workspace.root))
    };
    let executor = executor.as_mut();

    match cli.command {
        AppCommands::Build { selection } => build::run_build(&workspace, &host, selection, executor)?,
        AppCommands::Lint { selection } => lint::run_lint(&workspace, selection, executor)?,
        AppCommands::Clear {} => clear::run_clear(&workspace, &host, executor)?,
        AppCommands::Util { action } => match action {
            UtilAction::Upver { version } => upver::run_upver(&workspace, &host, &version, executor)?,
        },
        AppCommands::CheckLicense { notice } => {
            license::check_license(&workspace, notice.as_deref(), executor)?;
        },
    }

    Ok(())
}
