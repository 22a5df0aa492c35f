//! Runtime npm packages, read from `node_modules`.

use crate::services::error::XtaskError;
use crate::services::fs::read_text;
use crate::services::notice::Dependency;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct PackageLock {
    #[serde(default)]
    packages: HashMap<String, LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    #[serde(default)]
    dev: bool,
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    name: String,
    version: String,
    #[serde(default)]
    repository: Option<Value>,
    #[serde(default)]
    license: Option<Value>,
}

/// Install paths (relative to `node_modules`) of packages only needed for development,
/// according to `package-lock.json`.
///
/// `node_modules/foo/node_modules/bar` is recorded as `foo/node_modules/bar`, so a nested
/// dev copy never hides a runtime package of the same name.
/// An unreadable lock structure is treated as "no dev packages".
#[must_use]
pub fn dev_packages(package_lock: &str) -> HashSet<String> {
    match serde_json::from_str::<PackageLock>(package_lock) {
        Ok(lock) => lock
            .packages
            .into_iter()
            .filter(|(_, package)| package.dev)
            .filter_map(|(key, _)| key.strip_prefix("node_modules/").map(str::to_owned))
            .collect(),
        Err(e) => {
            warn!("package-lock.json could not be parsed, keeping every package: {e}");
            HashSet::new()
        },
    }
}

/// `/`-separated path of `dir` below `node_modules`.
fn install_path(node_modules: &Path, dir: &Path) -> String {
    dir.strip_prefix(node_modules)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// True if `install_path` is a dev package or lies inside one.
fn is_dev(dev: &HashSet<String>, install_path: &str) -> bool {
    install_path
        .match_indices('/')
        .map(|(i, _)| &install_path[..i])
        .chain(std::iter::once(install_path))
        .any(|prefix| dev.contains(prefix))
}

/// Converts one `package.json` into a dependency.
///
/// `Ok(None)` if it is not a package manifest or declares no license; packages ship
/// nested `package.json` files (`esm/`, `dist/`) that only set the module type.
///
/// # Errors
/// Returns [`XtaskError::Notice`] for a `repository` field of an unexpected shape.
pub fn parse_package_json(content: &str) -> Result<Option<Dependency>, XtaskError> {
    let Ok(package) = serde_json::from_str::<PackageJson>(content) else {
        return Ok(None);
    };

    let repository = match package.repository {
        None | Some(Value::Null) => None,
        Some(Value::String(url)) => Some(url),
        Some(Value::Object(map)) => match map.get("url") {
            Some(Value::String(url)) => Some(url.trim_start_matches("git+").to_owned()),
            _ => {
                return Err(XtaskError::notice(format!(
                    "invalid repository field in {} {}",
                    package.name, package.version
                )));
            },
        },
        Some(_) => {
            return Err(XtaskError::notice(format!(
                "invalid repository field in {} {}",
                package.name, package.version
            )));
        },
    };

    let license = match package.license {
        Some(Value::String(license)) => license,
        Some(Value::Object(map)) => match map.get("type").and_then(Value::as_str) {
            Some(license) => license.to_owned(),
            None => return Ok(None),
        },
        _ => return Ok(None),
    };

    Ok(Some(Dependency {
        name: package.name,
        version: package.version,
        repository,
        license: Some(license),
        license_text: None,
    }))
}

/// Collects every non-dev package installed under `node_modules`, sorted and deduplicated.
///
/// Dev packages are matched by install path, so everything inside a dev package's
/// directory is skipped with it.
///
/// # Errors
/// Returns an error if `package-lock.json` cannot be read, the directory cannot be
/// searched, or a manifest has a malformed repository field.
pub fn collect_npm_deps(node_modules: &Path, package_lock: &Path) -> Result<Vec<Dependency>, XtaskError> {
    let dev = dev_packages(&read_text(package_lock)?);

    let pattern = format!("{}/**/package.json", glob::Pattern::escape(&node_modules.to_string_lossy()));
    let entries = glob::glob(&pattern).map_err(|e| XtaskError::Pattern {
        message: e.to_string().into(),
        context: Some(pattern.clone().into()),
    })?;

    let mut deps = BTreeMap::new();
    for entry in entries {
        let path = entry.map_err(|e| XtaskError::io(std::io::Error::from(e), "searching node_modules"))?;
        let dir = install_path(node_modules, path.parent().unwrap_or(node_modules));
        if is_dev(&dev, &dir) {
            continue;
        }
        let Some(dep) = parse_package_json(&read_text(&path)?)? else {
            debug!("Skipping {}: no name, version or license", path.display());
            continue;
        };
        deps.entry((dep.name.clone(), dep.version.clone())).or_insert(dep);
    }

    Ok(deps.into_values().collect())
}
