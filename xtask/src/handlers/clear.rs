use crate::models::plan::{Action, Plan, Step};
use crate::models::settings::Settings;
use crate::models::workspace::Workspace;
use crate::services::executor::Executor;
use crate::services::host::Host;
use anyhow::Context;
use tracing::info;

/// Files the bundler copies next to the main app crate.
const BUNDLED_PATTERNS: [&str; 4] = ["LICENSE*", "simulator*", "SOEMAUTDServer*", "TwinCATAUTDServerLightweight*"];

/// Plans the removal of caches, installed packages and generated artifacts.
#[must_use]
pub fn plan_clear(settings: &Settings, host: &Host) -> Plan {
    let main = &settings.components.main;
    let mut plan = Plan::new();

    plan.run(Step::new(host.npm(), ".").args(["cache", "clean", "--force"]))
        .push(Action::RemoveDir(settings.notice.node_modules.clone()))
        .push(Action::RemoveDir("dist".into()))
        .push(Action::RemoveDir(main.join("assets")))
        .push(Action::RemoveFile(main.join("NOTICE")));
    plan.extend(
        BUNDLED_PATTERNS
            .into_iter()
            .map(|pattern| Action::RemoveGlob { dir: main.clone(), pattern: pattern.to_owned() }),
    );
    plan.run(Step::new("cargo", ".").arg("clean"));
    plan
}

/// Removes caches and generated artifacts. Missing files are not an error.
///
/// # Errors
/// Returns an error if a cleaning command fails or a file cannot be removed.
pub fn run_clear(workspace: &Workspace, host: &Host, executor: &mut dyn Executor) -> anyhow::Result<()> {
    info!("🧹 Clearing build artifacts...");
    executor.execute_plan(&plan_clear(&workspace.settings, host)).context("Clear failed")?;
    info!("✅ Workspace cleared");
    Ok(())
}
