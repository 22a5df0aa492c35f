//! Workspace layout and tooling settings.
//!
//! Every field has a default matching the repository layout, so `xtask.toml` is optional.

use crate::models::component::Component;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub components: ComponentDirs,
    pub app: AppSettings,
    pub notice: NoticeSettings,
    pub log: LogSettings,
}

/// Directories of each component, relative to the workspace root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComponentDirs {
    pub simulator: PathBuf,
    pub soem: PathBuf,
    pub twincat: PathBuf,
    pub main: PathBuf,
    /// Cargo target directory shared by all components.
    pub target_dir: PathBuf,
}

impl Default for ComponentDirs {
    fn default() -> Self {
        Self {
            simulator: "simulator".into(),
            soem: "SOEMAUTDServer".into(),
            twincat: "TwinCATAUTDServerLightweight".into(),
            main: "src-tauri".into(),
            target_dir: "target".into(),
        }
    }
}

impl ComponentDirs {
    #[must_use]
    pub fn dir(&self, component: Component) -> &Path {
        match component {
            Component::Simulator => &self.simulator,
            Component::Soem => &self.soem,
            Component::TwinCat => &self.twincat,
            Component::Main => &self.main,
        }
    }

    #[must_use]
    pub fn release_dir(&self) -> PathBuf {
        self.target_dir.join("release")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Window title prefix in `tauri.conf.json`; the version follows ` v`.
    pub title: String,
    /// Crates and notice entries starting with this prefix follow the app version.
    pub crate_prefix: String,
    pub package_json: PathBuf,
    pub tauri_config: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: "AUTD3 Server".to_owned(),
            crate_prefix: "autd3".to_owned(),
            package_json: "package.json".into(),
            tauri_config: "src-tauri/tauri.conf.json".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoticeSettings {
    pub path: PathBuf,
    /// One plain-text file per SPDX identifier.
    pub licenses_dir: PathBuf,
    pub package_lock: PathBuf,
    pub node_modules: PathBuf,
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self {
            path: "NOTICE".into(),
            licenses_dir: "tools/license-checker/licenses".into(),
            package_lock: "package-lock.json".into(),
            node_modules: "node_modules".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Also write logs to rolling files in this directory.
    pub dir: Option<PathBuf>,
    /// Env-filter directive used instead of the verbosity flags (e.g. `autd_server_xtask=trace`).
    pub filter: Option<String>,
}
