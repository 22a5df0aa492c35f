//! Crates linked into the desktop shell.

use crate::services::error::XtaskError;
use crate::services::notice::{Dependency, find_license_text};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
    #[serde(default)]
    workspace_members: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Package {
    id: String,
    name: String,
    version: String,
    license: Option<String>,
    license_file: Option<PathBuf>,
    repository: Option<String>,
    manifest_path: PathBuf,
}

/// Runs `cargo` in `dir` and returns its standard output.
fn cargo_output(dir: &Path, args: &[&str]) -> Result<String, XtaskError> {
    let output = Command::new("cargo")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| XtaskError::Spawn {
            program: "cargo".to_owned(),
            source,
            context: Some(format!("cargo {}", args.join(" ")).into()),
        })?;

    if !output.status.success() {
        return Err(XtaskError::notice(format!(
            "cargo {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parses `cargo tree --prefix none` output into `(name, version)` pairs.
///
/// # Errors
/// Returns [`XtaskError::Notice`] for lines that do not start with a name and a version.
pub fn parse_tree(output: &str) -> Result<HashSet<(String, String)>, XtaskError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next().and_then(|v| v.strip_prefix('v'))) {
                (Some(name), Some(version)) => Ok((name.to_owned(), version.to_owned())),
                _ => Err(XtaskError::notice(format!("unexpected cargo tree line: {line}"))),
            }
        })
        .collect()
}

/// Selects the linked third-party crates from `cargo metadata` output.
///
/// Workspace members and crates whose name starts with `skip_prefix` are left out.
///
/// # Errors
/// Returns [`XtaskError::Notice`] if the metadata cannot be parsed.
pub fn select_crates(
    metadata: &str,
    linked: &HashSet<(String, String)>,
    skip_prefix: &str,
) -> Result<Vec<Dependency>, XtaskError> {
    let metadata: Metadata = serde_json::from_str(metadata)
        .map_err(|e| XtaskError::notice(format!("invalid cargo metadata: {e}")))?;
    let members: HashSet<&str> = metadata.workspace_members.iter().map(String::as_str).collect();

    let mut deps = BTreeMap::new();
    for package in metadata.packages {
        if members.contains(package.id.as_str())
            || package.name.starts_with(skip_prefix)
            || !linked.contains(&(package.name.clone(), package.version.clone()))
        {
            continue;
        }

        let package_dir = package.manifest_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let license_text = package
            .license_file
            .as_ref()
            .and_then(|file| std::fs::read_to_string(package_dir.join(file)).ok())
            .or_else(|| find_license_text(&package_dir));

        deps.entry((package.name.clone(), package.version.clone())).or_insert(Dependency {
            name: package.name,
            version: package.version,
            repository: package.repository,
            license: package.license,
            license_text,
        });
    }

    Ok(deps.into_values().collect())
}

/// Collects the non-build, non-dev dependencies of the crate in `crate_dir`.
///
/// # Errors
/// Returns an error if `cargo metadata` or `cargo tree` fail or print unexpected output.
pub fn collect_rs_deps(crate_dir: &Path, skip_prefix: &str) -> Result<Vec<Dependency>, XtaskError> {
    let metadata = cargo_output(crate_dir, &["metadata", "--format-version", "1", "--locked"])?;
    let tree = cargo_output(crate_dir, &["tree", "--prefix", "none", "-e", "no-build", "-e", "no-dev"])?;
    select_crates(&metadata, &parse_tree(&tree)?, skip_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_tree_lines() -> Result<(), XtaskError> {
        let output = "\
autd3-server v28.1.0 (/work/src-tauri)
serde v1.0.210
serde_derive v1.0.210 (proc-macro)
tokio v1.40.0 (*)

";
        let linked = parse_tree(output)?;
        assert_eq!(linked.len(), 4);
        assert!(linked.contains(&("serde".to_owned(), "1.0.210".to_owned())));
        assert!(linked.contains(&("tokio".to_owned(), "1.40.0".to_owned())));
        Ok(())
    }

    #[test]
    fn rejects_garbage_tree_lines() {
        assert!(parse_tree("warning: something odd").is_err());
    }

    #[test]
    fn selects_linked_third_party_crates() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let serde_dir = tmp.path().join("serde-1.0.210");
        let ring_dir = tmp.path().join("ring-0.17.8");
        fs::create_dir_all(&serde_dir)?;
        fs::create_dir_all(&ring_dir)?;
        fs::write(ring_dir.join("LICENSE"), "Copyright 2015-2016 Brian Smith.")?;

        let metadata = json!({
            "workspace_members": ["path+file:///work/src-tauri#autd3-server@28.1.0"],
            "packages": [
                {
                    "id": "path+file:///work/src-tauri#autd3-server@28.1.0",
                    "name": "autd3-server", "version": "28.1.0",
                    "license": "MIT", "license_file": null, "repository": null,
                    "manifest_path": "/work/src-tauri/Cargo.toml"
                },
                {
                    "id": "registry+https://github.com/rust-lang/crates.io-index#autd3@28.1.0",
                    "name": "autd3", "version": "28.1.0",
                    "license": "MIT", "license_file": null, "repository": null,
                    "manifest_path": "/registry/autd3-28.1.0/Cargo.toml"
                },
                {
                    "id": "registry+https://github.com/rust-lang/crates.io-index#serde@1.0.210",
                    "name": "serde", "version": "1.0.210",
                    "license": "MIT OR Apache-2.0", "license_file": null,
                    "repository": "https://github.com/serde-rs/serde",
                    "manifest_path": serde_dir.join("Cargo.toml")
                },
                {
                    "id": "registry+https://github.com/rust-lang/crates.io-index#ring@0.17.8",
                    "name": "ring", "version": "0.17.8",
                    "license": null, "license_file": "LICENSE",
                    "repository": "https://github.com/briansmith/ring",
                    "manifest_path": ring_dir.join("Cargo.toml")
                },
                {
                    "id": "registry+https://github.com/rust-lang/crates.io-index#cc@1.1.0",
                    "name": "cc", "version": "1.1.0",
                    "license": "MIT OR Apache-2.0", "license_file": null, "repository": null,
                    "manifest_path": "/registry/cc-1.1.0/Cargo.toml"
                }
            ]
        })
        .to_string();

        let linked: HashSet<(String, String)> = [
            ("autd3-server", "28.1.0"),
            ("autd3", "28.1.0"),
            ("serde", "1.0.210"),
            ("ring", "0.17.8"),
        ]
        .into_iter()
        .map(|(n, v)| (n.to_owned(), v.to_owned()))
        .collect();

        let deps = select_crates(&metadata, &linked, "autd3")?;
        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ring", "serde"]);
        assert_eq!(deps[0].license_text.as_deref(), Some("Copyright 2015-2016 Brian Smith."));
        assert!(deps[0].license.is_none());
        assert_eq!(deps[1].repository.as_deref(), Some("https://github.com/serde-rs/serde"));
        assert!(deps[1].license_text.is_none());
        Ok(())
    }
}
