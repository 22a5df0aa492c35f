use crate::models::component::Component;
use crate::models::plan::{Action, Plan, Step};
use crate::models::workspace::Workspace;
use crate::services::executor::Executor;
use crate::services::fs::read_text;
use crate::services::host::Host;
use crate::services::utils::find_nested_files;
use crate::services::version::{self, VersionRule, VersionRules};
use anyhow::Context;
use std::path::Path;
use tracing::{debug, info};

/// Notice files kept next to each component.
const COMPONENT_NOTICE: &str = "ThirdPartyNotice.txt";

/// Order in which lock files are refreshed after the bump.
const UPDATE_ORDER: [Component; 4] = [Component::Soem, Component::TwinCat, Component::Simulator, Component::Main];

/// Plans the rewrite of every versioned file, followed by the lock file refresh.
///
/// Files are read while planning; only the ones whose content changes get a write.
///
/// # Errors
/// Returns an error if `version` is not a semantic version, a rule does not compile,
/// a file cannot be read, or `package.json` / `tauri.conf.json` are missing.
pub fn plan_upver(workspace: &Workspace, host: &Host, version: &str) -> anyhow::Result<Plan> {
    version::validate(version)?;
    let settings = &workspace.settings;
    let rules = VersionRules::new(&settings.app)?;
    let mut plan = Plan::new();

    for manifest in find_nested_files(&workspace.root, "Cargo.toml")? {
        rewrite_file(workspace, &manifest, &rules.cargo_toml, version, &mut plan)?;
    }
    for notice in find_nested_files(&workspace.root, COMPONENT_NOTICE)? {
        rewrite_file(workspace, &notice, &rules.notice, version, &mut plan)?;
    }
    rewrite_file(workspace, &settings.app.package_json, &rules.package_json, version, &mut plan)?;
    rewrite_file(workspace, &settings.app.tauri_config, &rules.tauri_config, version, &mut plan)?;

    for component in UPDATE_ORDER {
        plan.run(Step::new("cargo", settings.components.dir(component)).arg("update"));
    }
    plan.run(Step::new(host.npm(), ".").arg("i"));
    Ok(plan)
}

fn rewrite_file(
    workspace: &Workspace,
    relative: &Path,
    rules: &[VersionRule],
    version: &str,
    plan: &mut Plan,
) -> anyhow::Result<()> {
    let content = read_text(&workspace.path(relative))?;
    match version::rewrite(&content, rules, version) {
        Some(contents) => {
            plan.push(Action::Write { path: relative.to_path_buf(), contents });
        },
        None => debug!("{} is already at {version}", relative.display()),
    }
    Ok(())
}

/// Sets the release version across the workspace and refreshes lock files.
///
/// # Errors
/// Returns an error for an invalid version, unreadable files, or a failing update command.
pub fn run_upver(
    workspace: &Workspace,
    host: &Host,
    version: &str,
    executor: &mut dyn Executor,
) -> anyhow::Result<()> {
    info!("🏷️ Updating version to {version}...");
    let plan = plan_upver(workspace, host, version)?;
    let files = plan.actions().iter().filter(|a| matches!(a, Action::Write { .. })).count();
    info!("{files} file(s) to update");

    executor.execute_plan(&plan).with_context(|| format!("Updating version to {version} failed"))?;
    info!("✅ Version set to {version}");
    Ok(())
}
