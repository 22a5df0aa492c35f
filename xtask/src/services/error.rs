use std::borrow::Cow;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors raised while planning or executing workspace tasks.
#[derive(Debug, thiserror::Error)]
pub enum XtaskError {
    /// An external tool exited with a non-zero status.
    #[error("`{command}` failed in {}: {status}", .cwd.display())]
    CommandFailed { command: String, cwd: PathBuf, status: ExitStatus },

    /// An external tool could not be started at all.
    #[error("Failed to start `{program}`{}: {source}", format_context(.context))]
    Spawn { program: String, source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Platform \"{0}\" is not supported")]
    UnsupportedPlatform(String),

    #[error("Invalid version \"{version}\": {source}")]
    InvalidVersion { version: String, source: semver::Error },

    #[error("Invalid pattern{}: {message}", format_context(.context))]
    Pattern { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Third-party notice error{}: {message}", format_context(.context))]
    Notice { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl XtaskError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(source: std::io::Error, context: impl Into<Cow<'static, str>>) -> Self {
        Self::Io { source, context: Some(context.into()) }
    }

    pub fn notice(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Notice { message: message.into(), context: None }
    }
}

impl From<std::io::Error> for XtaskError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, context: None }
    }
}

pub trait XtaskErrorExt<T> {
    /// Attaches `context` to errors that do not carry one yet.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, XtaskError>;
}

impl<T> XtaskErrorExt<T> for Result<T, XtaskError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                XtaskError::Spawn { context: c, .. }
                | XtaskError::Io { context: c, .. }
                | XtaskError::Pattern { context: c, .. }
                | XtaskError::Notice { context: c, .. } => {
                    c.get_or_insert_with(|| context.into());
                },
                _ => {},
            }
            e
        })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
