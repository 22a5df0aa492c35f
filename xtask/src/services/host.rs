//! Host platform detection.

use crate::services::error::XtaskError;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tools that together allow shaderc to be built from source.
const SHADERC_BUILD_TOOLS: [&str; 4] = ["git", "cmake", "python3", "ninja"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    MacOs,
    Linux,
}

impl Os {
    /// Maps a `std::env::consts::OS` value.
    ///
    /// # Errors
    /// Returns [`XtaskError::UnsupportedPlatform`] for anything but Windows, macOS and Linux.
    pub fn from_name(name: &str) -> Result<Self, XtaskError> {
        match name {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(XtaskError::UnsupportedPlatform(other.to_owned())),
        }
    }

    #[must_use]
    pub const fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

/// The machine the tasks run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host {
    pub os: Os,
    /// Whether the simulator's shader compiler dependency can be satisfied.
    pub shaderc: bool,
}

impl Host {
    /// Detects the current platform and looks for shaderc.
    ///
    /// # Errors
    /// Returns [`XtaskError::UnsupportedPlatform`] on unsupported operating systems.
    pub fn detect() -> Result<Self, XtaskError> {
        let os = Os::from_name(env::consts::OS)?;
        let shaderc = shaderc_available(os, &SystemEnv);
        debug!(?os, shaderc, "Detected host");
        Ok(Self { os, shaderc })
    }

    #[must_use]
    pub const fn exe_suffix(&self) -> &'static str {
        if self.os.is_windows() { ".exe" } else { "" }
    }

    /// Appends the platform executable suffix to a binary name.
    #[must_use]
    pub fn exe(&self, name: &str) -> String {
        format!("{name}{}", self.exe_suffix())
    }

    /// npm is a batch script on Windows and cannot be spawned without its extension.
    #[must_use]
    pub const fn npm(&self) -> &'static str {
        if self.os.is_windows() { "npm.cmd" } else { "npm" }
    }
}

/// Environment lookups used by the shaderc check.
pub trait HostEnv {
    fn var(&self, key: &str) -> Option<OsString>;
    fn is_file(&self, path: &Path) -> bool;
    fn has_program(&self, program: &str) -> bool;
}

#[derive(Debug)]
pub struct SystemEnv;

impl HostEnv for SystemEnv {
    fn var(&self, key: &str) -> Option<OsString> {
        env::var_os(key)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn has_program(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

#[must_use]
pub const fn shaderc_lib_name(os: Os) -> &'static str {
    if os.is_windows() { "shaderc_combined.lib" } else { "libshaderc_combined.a" }
}

/// Looks for a prebuilt shaderc library, or for the tools needed to build one.
pub fn shaderc_available(os: Os, env: &impl HostEnv) -> bool {
    let lib = shaderc_lib_name(os);
    let non_empty = |key: &str| env.var(key).filter(|value| !value.is_empty()).map(PathBuf::from);

    if let Some(dir) = non_empty("SHADERC_LIB_DIR") {
        if env.is_file(&dir.join(lib)) {
            return true;
        }
    }
    if let Some(sdk) = non_empty("VULKAN_SDK") {
        if env.is_file(&sdk.join("lib").join(lib)) {
            return true;
        }
    }
    if !os.is_windows() && env.is_file(&Path::new("/usr/local/lib").join(lib)) {
        return true;
    }
    SHADERC_BUILD_TOOLS.iter().all(|tool| env.has_program(tool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct FakeEnv {
        vars: HashMap<&'static str, &'static str>,
        files: HashSet<PathBuf>,
        programs: HashSet<&'static str>,
    }

    impl HostEnv for FakeEnv {
        fn var(&self, key: &str) -> Option<OsString> {
            self.vars.get(key).map(|value| OsString::from(*value))
        }

        fn is_file(&self, path: &Path) -> bool {
            self.files.contains(path)
        }

        fn has_program(&self, program: &str) -> bool {
            self.programs.contains(program)
        }
    }

    #[test]
    fn os_names() {
        assert_eq!(Os::from_name("linux").unwrap(), Os::Linux);
        assert_eq!(Os::from_name("macos").unwrap(), Os::MacOs);
        assert_eq!(Os::from_name("windows").unwrap(), Os::Windows);
        let err = Os::from_name("freebsd").unwrap_err();
        assert_eq!(err.to_string(), "Platform \"freebsd\" is not supported");
    }

    #[test]
    fn executable_naming() {
        let windows = Host { os: Os::Windows, shaderc: false };
        let linux = Host { os: Os::Linux, shaderc: false };
        assert_eq!(windows.exe("simulator"), "simulator.exe");
        assert_eq!(linux.exe("simulator"), "simulator");
        assert_eq!(windows.npm(), "npm.cmd");
        assert_eq!(linux.npm(), "npm");
    }

    #[test]
    fn shaderc_from_lib_dir() {
        let mut env = FakeEnv::default();
        env.vars.insert("SHADERC_LIB_DIR", "/opt/shaderc");
        env.files.insert(PathBuf::from("/opt/shaderc/libshaderc_combined.a"));
        assert!(shaderc_available(Os::Linux, &env));
        assert!(!shaderc_available(Os::Windows, &env));
    }

    #[test]
    fn shaderc_from_vulkan_sdk() {
        let mut env = FakeEnv::default();
        env.vars.insert("VULKAN_SDK", "C:/VulkanSDK");
        env.files.insert(PathBuf::from("C:/VulkanSDK/lib/shaderc_combined.lib"));
        assert!(shaderc_available(Os::Windows, &env));
    }

    #[test]
    fn empty_variables_are_ignored() {
        let mut env = FakeEnv::default();
        env.vars.insert("SHADERC_LIB_DIR", "");
        env.files.insert(PathBuf::from("libshaderc_combined.a"));
        assert!(!shaderc_available(Os::Linux, &env));
    }

    #[test]
    fn shaderc_from_usr_local_except_on_windows() {
        let mut env = FakeEnv::default();
        env.files.insert(PathBuf::from("/usr/local/lib/libshaderc_combined.a"));
        env.files.insert(PathBuf::from("/usr/local/lib/shaderc_combined.lib"));
        assert!(shaderc_available(Os::MacOs, &env));
        assert!(!shaderc_available(Os::Windows, &env));
    }

    #[test]
    fn shaderc_buildable_only_with_every_tool() {
        let mut env = FakeEnv::default();
        env.programs.extend(["git", "cmake", "python3"]);
        assert!(!shaderc_available(Os::Linux, &env));
        env.programs.insert("ninja");
        assert!(shaderc_available(Os::Linux, &env));
    }
}
