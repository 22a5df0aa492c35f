//! Forgiving filesystem helpers.
//!
//! Removal never fails because the target is already gone, and read-only entries are
//! made writable before retrying (git object files and npm caches are often read-only).

use crate::services::error::XtaskError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Removes a file, ignoring a missing one.
///
/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn remove_file_force(path: &Path) -> Result<(), XtaskError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied && make_writable(path) => {
            fs::remove_file(path)
                .map_err(|e| XtaskError::io(e, format!("removing {}", path.display())))
        },
        Err(e) => Err(XtaskError::io(e, format!("removing {}", path.display()))),
    }
}

/// Removes a directory tree, ignoring a missing one.
///
/// # Errors
/// Returns an error if the tree exists but cannot be removed even after clearing
/// read-only flags.
pub fn remove_dir_force(path: &Path) -> Result<(), XtaskError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(first) => {
            debug!(path = %path.display(), error = %first, "Retrying removal after clearing read-only flags");
            let mut any_changed = false;
            for entry in WalkDir::new(path).into_iter().flatten() {
                any_changed |= make_writable(entry.path());
            }
            if !any_changed {
                return Err(XtaskError::io(first, format!("removing {}", path.display())));
            }
            fs::remove_dir_all(path)
                .map_err(|e| XtaskError::io(e, format!("removing {}", path.display())))
        },
    }
}

/// Files directly inside `dir` whose names match `pattern` (e.g. `LICENSE*`).
///
/// # Errors
/// Returns [`XtaskError::Pattern`] for an invalid glob pattern.
pub fn glob_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, XtaskError> {
    let pattern = glob::Pattern::new(pattern).map_err(|e| XtaskError::Pattern {
        message: e.to_string().into(),
        context: Some(pattern.to_owned().into()),
    })?;

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(XtaskError::io(e, format!("listing {}", dir.display()))),
    };

    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| !t.is_dir()))
        .filter(|entry| entry.file_name().to_str().is_some_and(|name| pattern.matches(name)))
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    Ok(matches)
}

/// Removes every file in `dir` matching `pattern`.
///
/// # Errors
/// Returns an error for invalid patterns or files that cannot be removed.
pub fn remove_glob_force(dir: &Path, pattern: &str) -> Result<(), XtaskError> {
    for file in glob_files(dir, pattern)? {
        remove_file_force(&file)?;
    }
    Ok(())
}

/// Creates an empty file (and parent directories) unless it already exists.
///
/// # Errors
/// Returns an error if the directories or the file cannot be created.
pub fn touch(path: &Path) -> Result<(), XtaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| XtaskError::io(e, format!("creating {}", parent.display())))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(drop)
        .map_err(|e| XtaskError::io(e, format!("touching {}", path.display())))
}

/// Copies a file, creating the destination directory when needed.
///
/// # Errors
/// Returns an error if the source is missing or the destination is not writable.
pub fn copy(from: &Path, to: &Path) -> Result<(), XtaskError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| XtaskError::io(e, format!("creating {}", parent.display())))?;
    }
    fs::copy(from, to)
        .map(drop)
        .map_err(|e| XtaskError::io(e, format!("copying {} to {}", from.display(), to.display())))
}

/// Reads a UTF-8 text file, naming the file in the error.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_text(path: &Path) -> Result<String, XtaskError> {
    fs::read_to_string(path).map_err(|e| XtaskError::io(e, format!("reading {}", path.display())))
}

/// Like [`read_text`], but a missing file is `Ok(None)`.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or is not UTF-8.
pub fn read_text_if_exists(path: &Path) -> Result<Option<String>, XtaskError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(XtaskError::io(e, format!("reading {}", path.display()))),
    }
}

/// Writes a text file in place.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_text(path: &Path, contents: &str) -> Result<(), XtaskError> {
    fs::write(path, contents).map_err(|e| XtaskError::io(e, format!("writing {}", path.display())))
}

/// Returns `true` if the permissions were changed.
fn make_writable(path: &Path) -> bool {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return false;
    };
    let mut permissions = metadata.permissions();
    if !permissions.readonly() {
        return false;
    }
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn removing_missing_paths_is_fine() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        remove_file_force(&tmp.path().join("NOTICE"))?;
        remove_dir_force(&tmp.path().join("node_modules"))?;
        remove_glob_force(&tmp.path().join("missing"), "LICENSE*")?;
        Ok(())
    }

    #[test]
    fn removes_read_only_files() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let dir = tmp.path().join("assets");
        fs::create_dir_all(&dir)?;
        let file = dir.join("locked.bin");
        fs::write(&file, b"data")?;
        let mut permissions = fs::metadata(&file)?.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&file, permissions)?;

        remove_dir_force(&dir)?;
        assert!(!dir.exists());
        Ok(())
    }

    #[test]
    fn glob_matches_only_file_names_in_dir() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        for name in ["LICENSE", "LICENSE.txt", "LICENSE.rtf", "NOTICE", "simulator-x86_64"] {
            fs::write(tmp.path().join(name), "")?;
        }
        fs::create_dir(tmp.path().join("LICENSES"))?;

        let found = glob_files(tmp.path(), "LICENSE*")?;
        let names: Vec<_> =
            found.iter().filter_map(|p| p.file_name()?.to_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["LICENSE", "LICENSE.rtf", "LICENSE.txt"]);

        remove_glob_force(tmp.path(), "simulator*")?;
        assert!(!tmp.path().join("simulator-x86_64").exists());
        assert!(tmp.path().join("NOTICE").exists());
        assert!(tmp.path().join("LICENSES").is_dir());
        Ok(())
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = glob_files(Path::new("."), "[").unwrap_err();
        assert!(matches!(err, XtaskError::Pattern { .. }));
    }

    #[test]
    fn touch_creates_parents_and_keeps_content() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let file = tmp.path().join("target/release/SOEMAUTDServer");
        touch(&file)?;
        assert!(file.is_file());

        fs::write(&file, "binary")?;
        touch(&file)?;
        assert_eq!(fs::read_to_string(&file)?, "binary");
        Ok(())
    }

    #[test]
    fn copy_overwrites_destination() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let from = tmp.path().join("simulator");
        let to = tmp.path().join("release/simulator-unity");
        fs::write(&from, "new")?;
        copy(&from, &to)?;
        fs::write(&from, "newer")?;
        copy(&from, &to)?;
        assert_eq!(fs::read_to_string(&to)?, "newer");
        Ok(())
    }

    #[test]
    fn optional_read_only_forgives_missing_files() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let path = tmp.path().join("NOTICE");
        assert_eq!(read_text_if_exists(&path)?, None);

        fs::write(&path, "notice")?;
        assert_eq!(read_text_if_exists(&path)?.as_deref(), Some("notice"));

        fs::write(&path, [0xff, 0xfe, 0x00])?;
        let err = read_text_if_exists(&path).expect_err("invalid UTF-8");
        assert!(err.to_string().contains("reading"), "got: {err}");
        Ok(())
    }
}
