use crate::models::settings::Settings;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Optional settings file at the workspace root.
pub const SETTINGS_FILE: &str = "xtask.toml";

/// Directories never searched for manifests.
const SKIPPED_DIRS: [&str; 3] = ["target", "node_modules", "dist"];

/// Returns the root directory of the project.
///
/// # Errors
/// Returns an error if the manifest directory does not have a parent.
pub fn get_project_root() -> Result<PathBuf> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(Path::to_path_buf)
        .context("Could not find project root from xtask manifest")
}

/// Loads settings from `<root>/xtask.toml`, overlaid with `XTASK__*` environment variables.
///
/// Nested keys use double underscores: `XTASK__NOTICE__PATH` maps to `notice.path`.
/// A missing file yields the defaults.
///
/// # Errors
/// Returns an error if the file is malformed or a value has the wrong type.
pub fn load_settings(root: &Path) -> Result<Settings> {
    let path = root.join(SETTINGS_FILE);

    Config::builder()
        .add_source(File::from(path.as_path()).required(false))
        .add_source(Environment::with_prefix("XTASK").prefix_separator("__").separator("__"))
        .build()
        .with_context(|| format!("Failed to read settings from {}", path.display()))?
        .try_deserialize::<Settings>()
        .with_context(|| format!("Invalid settings in {}", path.display()))
}

/// Finds files named `file_name` at least one directory below `root`.
///
/// Build output, dependency caches and hidden directories are skipped.
/// Paths are returned relative to `root`, sorted.
///
/// # Errors
/// Returns an error if a directory cannot be read.
pub fn find_nested_files(root: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped(e)) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if entry.depth() >= 2 && entry.file_type().is_file() && entry.file_name() == file_name {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            found.push(relative.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| {
            name.starts_with('.') || SKIPPED_DIRS.contains(&name)
        })
}
