use crate::models::settings::Settings;
use std::path::{Path, PathBuf};

/// The checkout the tasks operate on.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub settings: Settings,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self { root: root.into(), settings }
    }

    /// Resolves a workspace-relative path; absolute paths are returned unchanged.
    #[must_use]
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}
