//! # Third-party notice
//!
//! Collects the runtime dependencies of the front end (npm) and of the desktop shell
//! (cargo) and renders them into a single notice file, followed by the full text of every
//! license they use.

pub mod cargo;
pub mod diff;
pub mod npm;

use crate::services::error::{XtaskError, XtaskErrorExt};
use spdx::{Expression, LicenseItem, ParseMode};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const SEPARATOR: &str = "---------------------------------------------------------";

const HEADER: &str = "THIRD-PARTY SOFTWARE NOTICES AND INFORMATION

This software includes the following third-party components.
The license terms for each of these components are provided later in this notice.
";

/// License files shipped inside a package that are copied into the notice verbatim.
const LICENSE_FILE_NAMES: [&str; 5] = ["LICENSE", "LICENSE.md", "LICENSE.txt", "LICENCE", "COPYING"];

/// Licenses that need no reproduction in the terms section.
const TERMS_EXEMPT: [&str; 1] = ["Unlicense"];

/// A third-party component listed in the notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub repository: Option<String>,
    /// SPDX license expression.
    pub license: Option<String>,
    /// Package-specific license text (usually carries the copyright line).
    pub license_text: Option<String>,
}

/// Rewrites expressions that offer a copyleft option next to permissive ones.
#[must_use]
pub fn normalize_license(expression: &str) -> String {
    match expression.trim() {
        "Apache-2.0 OR LGPL-2.1-or-later OR MIT" => "Apache-2.0 OR MIT".to_owned(),
        other => other.to_owned(),
    }
}

/// License and exception identifiers referenced by an SPDX expression.
///
/// Lowercase operators, `/` as `OR` and a trailing `+` are accepted.
///
/// ```text
/// "(MIT OR Apache-2.0) AND Unicode-3.0" -> {"Apache-2.0", "MIT", "Unicode-3.0"}
/// ```
///
/// # Errors
/// Returns [`XtaskError::Notice`] if the expression cannot be parsed.
pub fn license_ids(expression: &str) -> Result<BTreeSet<String>, XtaskError> {
    let parsed = Expression::parse_mode(expression, ParseMode::LAX).map_err(|e| {
        XtaskError::notice(format!("invalid license expression \"{expression}\": {}", e.reason))
    })?;

    let mut ids = BTreeSet::new();
    for requirement in parsed.requirements() {
        let req = &requirement.req;
        match &req.license {
            LicenseItem::Spdx { id, .. } => ids.insert(id.name.to_owned()),
            LicenseItem::Other { lic_ref, .. } => ids.insert(format!("LicenseRef-{lic_ref}")),
        };
        if let Some(exception) = &req.exception {
            ids.insert(exception.name.to_owned());
        }
    }
    Ok(ids)
}

/// Reads the first license file found in a package directory.
#[must_use]
pub fn find_license_text(package_dir: &Path) -> Option<String> {
    LICENSE_FILE_NAMES
        .iter()
        .map(|name| package_dir.join(name))
        .find(|path| path.is_file())
        .and_then(|path| fs::read_to_string(path).ok())
}

/// Renders the complete notice.
///
/// `license_terms` is called once per distinct license identifier, in sorted order,
/// and must return its full text.
///
/// # Errors
/// Returns [`XtaskError::Notice`] if a dependency carries no license information or
/// the text for a license identifier is unavailable.
pub fn render_notice<F>(dependencies: &[Dependency], mut license_terms: F) -> Result<String, XtaskError>
where
    F: FnMut(&str) -> Result<String, XtaskError>,
{
    let mut out = String::from(HEADER);
    let mut ids = BTreeSet::new();

    for dep in dependencies {
        if dep.license.is_none() && dep.license_text.is_none() {
            return Err(XtaskError::notice(format!(
                "No license information found for {} {}",
                dep.name, dep.version
            )));
        }

        out.push_str(&format!("\n{SEPARATOR}\n\n{} {}", dep.name, dep.version));
        if let Some(license) = &dep.license {
            let license = normalize_license(license);
            ids.extend(license_ids(&license).context(format!("{} {}", dep.name, dep.version))?);
            out.push_str(&format!(" ({license})"));
        }
        out.push('\n');
        if let Some(repository) = &dep.repository {
            out.push_str(repository);
            out.push('\n');
        }
        if let Some(text) = &dep.license_text {
            out.push_str(&format!("\n---\n{}\n", text.trim_end()));
        }
    }

    out.push_str(&format!("\n{SEPARATOR}\n\nLICENSE TERMS\n"));

    for id in ids.iter().filter(|id| !TERMS_EXEMPT.contains(&id.as_str())) {
        let text = license_terms(id)?;
        out.push_str(&format!("\n{SEPARATOR}\n{id}\n---\n\n{}\n", text.trim_end()));
    }

    out.push_str(&format!("\n{SEPARATOR}\n"));
    Ok(out)
}

/// Reads license texts from a directory holding one file per SPDX identifier.
///
/// # Errors
/// Returns [`XtaskError::Notice`] if the file for `id` does not exist.
pub fn license_text_from_dir(dir: &Path, id: &str) -> Result<String, XtaskError> {
    fs::read_to_string(dir.join(id)).map_err(|_| XtaskError::Notice {
        message: format!("License file not found for {id}").into(),
        context: Some(dir.display().to_string().into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dep(name: &str, license: Option<&str>) -> Dependency {
        Dependency {
            name: name.to_owned(),
            version: "1.0.0".to_owned(),
            repository: Some(format!("https://github.com/example/{name}")),
            license: license.map(str::to_owned),
            license_text: None,
        }
    }

    fn ids(expression: &str) -> Vec<String> {
        license_ids(expression).expect("valid expression").into_iter().collect()
    }

    #[test]
    fn splits_spdx_expressions() {
        assert_eq!(ids("MIT"), vec!["MIT"]);
        assert_eq!(ids("(MIT OR Apache-2.0) AND Unicode-3.0"), vec!["Apache-2.0", "MIT", "Unicode-3.0"]);
        assert_eq!(ids("Apache-2.0 WITH LLVM-exception"), vec!["Apache-2.0", "LLVM-exception"]);
    }

    #[test]
    fn lax_expressions_are_accepted() {
        assert_eq!(ids("(MIT or Apache-2.0)"), vec!["Apache-2.0", "MIT"]);
        assert_eq!(ids("MIT/Apache-2.0"), vec!["Apache-2.0", "MIT"]);
        assert_eq!(ids("Apache-2.0+ OR MIT"), vec!["Apache-2.0", "MIT"]);
    }

    #[test]
    fn malformed_expression_is_a_notice_error() {
        let err = license_ids("MIT OR").expect_err("dangling operator");
        assert!(matches!(err, XtaskError::Notice { .. }));
        assert!(err.to_string().contains("\"MIT OR\""), "got: {err}");
    }

    #[test]
    fn drops_lgpl_alternative() {
        assert_eq!(normalize_license("Apache-2.0 OR LGPL-2.1-or-later OR MIT"), "Apache-2.0 OR MIT");
        assert_eq!(normalize_license("MIT"), "MIT");
    }

    #[test]
    fn renders_dependencies_and_terms() -> Result<(), XtaskError> {
        let mut with_text = dep("ring", Some("ISC"));
        with_text.license_text = Some("Copyright 2015 Brian Smith.\n\n".to_owned());
        let deps = [dep("serde", Some("MIT OR Apache-2.0")), with_text, dep("unlicensed", Some("Unlicense"))];

        let mut requested = Vec::new();
        let notice = render_notice(&deps, |id| {
            requested.push(id.to_owned());
            Ok(format!("{id} license text"))
        })?;

        assert_eq!(requested, vec!["Apache-2.0", "ISC", "MIT"]);
        assert!(notice.starts_with("THIRD-PARTY SOFTWARE NOTICES AND INFORMATION\n"));
        assert!(notice.contains("\nserde 1.0.0 (MIT OR Apache-2.0)\nhttps://github.com/example/serde\n"));
        assert!(notice.contains("\nring 1.0.0 (ISC)\nhttps://github.com/example/ring\n\n---\nCopyright 2015 Brian Smith.\n"));
        assert!(notice.contains(&format!("\n{SEPARATOR}\nMIT\n---\n\nMIT license text\n")));
        assert!(!notice.contains("Unlicense license text"));
        assert!(notice.ends_with(&format!("\n{SEPARATOR}\n")));
        Ok(())
    }

    #[test]
    fn lowercase_operators_are_rendered_with_their_ids() -> Result<(), XtaskError> {
        let deps = [dep("tslib", Some("(0BSD or MIT)"))];
        let mut requested = Vec::new();
        render_notice(&deps, |id| {
            requested.push(id.to_owned());
            Ok(String::new())
        })?;
        assert_eq!(requested, vec!["0BSD", "MIT"]);
        Ok(())
    }

    #[test]
    fn malformed_license_names_the_dependency() {
        let deps = [dep("broken", Some("MIT AND"))];
        let err = render_notice(&deps, |_| Ok(String::new())).unwrap_err();
        assert!(err.to_string().contains("(broken 1.0.0)"), "got: {err}");
    }

    #[test]
    fn dependency_without_license_fails() {
        let deps = [dep("mystery", None)];
        let err = render_notice(&deps, |_| Ok(String::new())).unwrap_err();
        assert!(err.to_string().contains("No license information found for mystery 1.0.0"));
    }

    #[test]
    fn missing_license_text_fails() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        fs::write(tmp.path().join("MIT"), "MIT text")?;
        let deps = [dep("a", Some("MIT")), dep("b", Some("BSD-3-Clause"))];

        let err = render_notice(&deps, |id| license_text_from_dir(tmp.path(), id)).unwrap_err();
        assert!(err.to_string().contains("License file not found for BSD-3-Clause"));
        Ok(())
    }

    #[test]
    fn picks_up_package_license_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        assert!(find_license_text(tmp.path()).is_none());
        fs::write(tmp.path().join("LICENSE.md"), "Copyright (c) Someone")?;
        assert_eq!(find_license_text(tmp.path()).as_deref(), Some("Copyright (c) Someone"));
        Ok(())
    }
}
