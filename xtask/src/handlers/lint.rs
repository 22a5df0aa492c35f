use crate::handlers::build::join;
use crate::models::args::Selection;
use crate::models::component::Component;
use crate::models::plan::{Plan, Step};
use crate::models::settings::Settings;
use crate::models::workspace::Workspace;
use crate::services::executor::Executor;
use anyhow::Context;
use tracing::{info, warn};

/// Plans `cargo clippy --tests -- -D warnings` in the directory of each component.
#[must_use]
pub fn plan_lint(settings: &Settings, components: &[Component]) -> Plan {
    let mut plan = Plan::new();
    for &component in components {
        plan.run(
            Step::new("cargo", settings.components.dir(component))
                .args(["clippy", "--tests", "--", "-D", "warnings"]),
        );
    }
    plan
}

/// Lints the selected components; any warning fails the run.
///
/// # Errors
/// Returns an error at the first component that does not pass clippy.
pub fn run_lint(workspace: &Workspace, selection: Selection, executor: &mut dyn Executor) -> anyhow::Result<()> {
    let components = selection.components();
    if components.is_empty() {
        warn!("Nothing to lint: pass --simulator, --soem, --twincat, --main or --all");
        return Ok(());
    }

    info!("🔍 Linting {}...", join(&components));
    executor.execute_plan(&plan_lint(&workspace.settings, &components)).context("Lint failed")?;
    info!("✅ No lint warnings");
    Ok(())
}
