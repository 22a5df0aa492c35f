//! Version string rewriting across manifests and notices.

use crate::models::settings::AppSettings;
use crate::services::error::XtaskError;
use regex::Regex;
use std::borrow::Cow;

/// Checks that `version` is a semantic version.
///
/// # Errors
/// Returns [`XtaskError::InvalidVersion`] otherwise.
pub fn validate(version: &str) -> Result<(), XtaskError> {
    semver::Version::parse(version)
        .map(drop)
        .map_err(|source| XtaskError::InvalidVersion { version: version.to_owned(), source })
}

/// A multi-line regex and its replacement.
///
/// The replacement is a `regex` template: `${1}` refers to capture groups and
/// `{version}` is substituted with the new version beforehand.
#[derive(Debug, Clone)]
pub struct VersionRule {
    pattern: Regex,
    template: String,
}

impl VersionRule {
    /// # Errors
    /// Returns [`XtaskError::Pattern`] if `pattern` does not compile.
    pub fn new(pattern: &str, template: impl Into<String>) -> Result<Self, XtaskError> {
        let pattern = Regex::new(&format!("(?mR){pattern}")).map_err(|e| XtaskError::Pattern {
            message: e.to_string().into(),
            context: Some(pattern.to_owned().into()),
        })?;
        Ok(Self { pattern, template: template.into() })
    }

    pub fn apply<'a>(&self, content: &'a str, version: &str) -> Cow<'a, str> {
        let replacement = self.template.replace("{version}", &version.replace('$', "$$"));
        self.pattern.replace_all(content, replacement.as_str())
    }
}

/// The rule families used when bumping a release.
#[derive(Debug, Clone)]
pub struct VersionRules {
    pub cargo_toml: Vec<VersionRule>,
    pub notice: Vec<VersionRule>,
    pub package_json: Vec<VersionRule>,
    pub tauri_config: Vec<VersionRule>,
}

impl VersionRules {
    /// Builds the rules for the configured app title and crate prefix.
    ///
    /// # Errors
    /// Returns [`XtaskError::Pattern`] if the settings produce an invalid pattern.
    pub fn new(app: &AppSettings) -> Result<Self, XtaskError> {
        let prefix = regex::escape(&app.crate_prefix);
        let title = regex::escape(&app.title);
        let json_version = || VersionRule::new(r#""version": "(.*)""#, r#""version": "{version}""#);

        Ok(Self {
            cargo_toml: vec![
                VersionRule::new(r#"^version = "(.*?)""#, r#"version = "{version}""#)?,
                VersionRule::new(
                    &format!(r#"^{prefix}(.*)version = "(.*?)""#),
                    format!(r#"{}${{1}}version = "{{version}}""#, app.crate_prefix),
                )?,
            ],
            notice: vec![
                VersionRule::new(
                    &format!(r"^{prefix}(.*) (.*) \((.*)\)"),
                    format!("{}${{1}} {{version}} (MIT)", app.crate_prefix),
                )?,
                VersionRule::new(
                    &format!(r"^{prefix}-link-soem (.*)"),
                    format!("{}-link-soem {{version}}", app.crate_prefix),
                )?,
                VersionRule::new(
                    &format!(r"^{prefix}-link-twincat (.*)"),
                    format!("{}-link-twincat {{version}}", app.crate_prefix),
                )?,
                VersionRule::new(r"^SOEMAUTDServer (.*) \(MIT\)", "SOEMAUTDServer {version} (MIT)")?,
                VersionRule::new(r"^simulator (.*) \(MIT\)", "simulator {version} (MIT)")?,
            ],
            package_json: vec![json_version()?],
            tauri_config: vec![
                json_version()?,
                VersionRule::new(
                    &format!(r#""title": "{title} v(.*)""#),
                    format!(r#""title": "{} v{{version}}""#, app.title),
                )?,
            ],
        })
    }
}

/// Applies `rules` in order; returns `None` when nothing changed.
#[must_use]
pub fn rewrite(content: &str, rules: &[VersionRule], version: &str) -> Option<String> {
    let rewritten = rules
        .iter()
        .fold(content.to_owned(), |text, rule| rule.apply(&text, version).into_owned());
    (rewritten != content).then_some(rewritten)
}
