//! Third-party notice check.

use crate::models::plan::Action;
use crate::models::workspace::Workspace;
use crate::services::error::XtaskErrorExt;
use crate::services::executor::Executor;
use crate::services::fs::read_text_if_exists;
use crate::services::notice::cargo::collect_rs_deps;
use crate::services::notice::diff::show_diff;
use crate::services::notice::npm::collect_npm_deps;
use crate::services::notice::{license_text_from_dir, render_notice};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of comparing a regenerated notice with the one on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStatus {
    Unchanged,
    Changed,
    Created,
}

/// Compares `generated` with the current notice, logging the changed lines.
///
/// Line endings are not significant.
#[must_use]
pub fn compare_notice(current: Option<&str>, generated: &str) -> NoticeStatus {
    match current {
        None => NoticeStatus::Created,
        Some(current) if show_diff(current, generated) => NoticeStatus::Changed,
        Some(_) => NoticeStatus::Unchanged,
    }
}

/// Collects every runtime dependency and renders the notice text.
///
/// # Errors
/// Returns an error if dependencies cannot be collected or a license text is missing.
pub fn generate_notice(workspace: &Workspace) -> anyhow::Result<String> {
    let settings = &workspace.settings;

    let mut deps = collect_npm_deps(
        &workspace.path(&settings.notice.node_modules),
        &workspace.path(&settings.notice.package_lock),
    )
    .context("collecting npm packages")?;
    let npm = deps.len();

    deps.extend(
        collect_rs_deps(&workspace.path(&settings.components.main), &settings.app.crate_prefix)
            .context("collecting crates")?,
    );
    info!("Found {npm} npm package(s) and {} crate(s)", deps.len() - npm);

    let licenses_dir = workspace.path(&settings.notice.licenses_dir);
    Ok(render_notice(&deps, |id| license_text_from_dir(&licenses_dir, id))?)
}

/// Regenerates the third-party notice and fails if its content changed.
///
/// `notice` overrides the configured notice path; relative paths are resolved against
/// the workspace root.
///
/// # Errors
/// Returns an error if generation fails, or if the notice was created or changed and
/// therefore needs a manual review.
pub fn check_license(
    workspace: &Workspace,
    notice: Option<&Path>,
    executor: &mut dyn Executor,
) -> anyhow::Result<()> {
    let path: PathBuf = notice.map_or_else(|| workspace.settings.notice.path.clone(), Path::to_path_buf);
    info!("📜 Checking third-party notice {}...", path.display());

    let generated = generate_notice(workspace)?;
    update_notice(workspace, &path, generated, executor)
}

/// Compares `generated` with the notice at `path` and writes it if it differs.
///
/// # Errors
/// Returns an error if the current notice exists but cannot be read, the write fails,
/// or the notice was created or changed.
pub fn update_notice(
    workspace: &Workspace,
    path: &Path,
    generated: String,
    executor: &mut dyn Executor,
) -> anyhow::Result<()> {
    let current = read_text_if_exists(&workspace.path(path))?;
    let status = compare_notice(current.as_deref(), &generated);

    if status == NoticeStatus::Unchanged {
        info!("✅ Third-party notice is up to date");
        return Ok(());
    }

    executor.execute(&Action::Write { path: path.to_path_buf(), contents: generated })?;
    if status == NoticeStatus::Created {
        warn!("{} did not exist and has been created", path.display());
    }
    anyhow::bail!("Third-party notice {} has been updated; manual check is required", path.display())
}
