use crate::models::args::Selection;
use crate::models::component::Component;
use crate::models::plan::{Action, Plan, Step};
use crate::models::settings::Settings;
use crate::models::workspace::Workspace;
use crate::services::executor::Executor;
use crate::services::host::Host;
use anyhow::Context;
use std::path::Path;
use tracing::{info, warn};

fn cargo_release(dir: &Path) -> Step {
    Step::new("cargo", dir).args(["build", "--release"])
}

/// Plans the build of `components`, in the given order.
///
/// The simulator is built twice: first with Unity support, whose binary is kept as
/// `simulator-unity`, then as the standalone simulator. The main app gets placeholder
/// sidecar binaries so the bundler finds them even if a server was not built.
#[must_use]
pub fn plan_build(settings: &Settings, host: &Host, components: &[Component]) -> Plan {
    let dirs = &settings.components;
    let release = dirs.release_dir();
    let mut plan = Plan::new();

    for &component in components {
        match component {
            Component::Simulator => {
                plan.run(cargo_release(&dirs.simulator).args(["--features", "unity"]))
                    .push(Action::Copy {
                        from: release.join(host.exe("simulator")),
                        to: release.join(host.exe("simulator-unity")),
                    })
                    .run(cargo_release(&dirs.simulator));
            },
            Component::Soem | Component::TwinCat => {
                plan.run(cargo_release(dirs.dir(component)));
            },
            Component::Main => {
                plan.run(Step::new(host.npm(), ".").arg("install"));
                plan.extend(
                    Component::sidecars()
                        .into_iter()
                        .map(|name| Action::Touch(release.join(host.exe(name)))),
                );
                plan.run(Step::new(host.npm(), ".").args(["run", "tauri", "build"]));
            },
        }
    }
    plan
}

/// Builds the selected components.
///
/// # Result
/// Returns `Ok(())` once every step succeeded, or immediately if nothing was selected.
///
/// # Errors
/// Returns an error at the first failing step; later steps are not run.
pub fn run_build(
    workspace: &Workspace,
    host: &Host,
    selection: Selection,
    executor: &mut dyn Executor,
) -> anyhow::Result<()> {
    let components = selection.components();
    if components.is_empty() {
        warn!("Nothing to build: pass --simulator, --soem, --twincat, --main or --all");
        return Ok(());
    }
    if components.contains(&Component::Simulator) && !host.shaderc {
        warn!(
            "shaderc was not found (set SHADERC_LIB_DIR or VULKAN_SDK, or install git, cmake, python3 and ninja); the simulator build may fail"
        );
    }

    info!("🔨 Building {}...", join(&components));
    let plan = plan_build(&workspace.settings, host, &components);
    executor.execute_plan(&plan).context("Build failed")?;
    info!("✅ Build finished");
    Ok(())
}

pub(crate) fn join(components: &[Component]) -> String {
    components.iter().copied().map(Component::key).collect::<Vec<_>>().join(", ")
}
