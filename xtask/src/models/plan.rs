//! Steps a handler wants performed, in order.
//!
//! Handlers only build a [`Plan`]; an [`Executor`](crate::services::executor::Executor)
//! decides whether the actions are performed or just reported.

use std::fmt;
use std::path::PathBuf;

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Step {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: cwd.into() }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command line as typed in a shell, without the working directory.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(Step),
    Copy { from: PathBuf, to: PathBuf },
    /// Creates the file (and its parents) if missing; existing files are left as they are.
    Touch(PathBuf),
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
    /// Removes files in `dir` whose names match `pattern`.
    RemoveGlob { dir: PathBuf, pattern: String },
    Write { path: PathBuf, contents: String },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(step) => write!(f, "{} (in {})", step.command_line(), step.cwd.display()),
            Self::Copy { from, to } => write!(f, "copy {} -> {}", from.display(), to.display()),
            Self::Touch(path) => write!(f, "touch {}", path.display()),
            Self::RemoveFile(path) => write!(f, "rm -f {}", path.display()),
            Self::RemoveDir(path) => write!(f, "rm -rf {}", path.display()),
            Self::RemoveGlob { dir, pattern } => {
                write!(f, "rm -f {}", dir.join(pattern).display())
            },
            Self::Write { path, contents } => {
                write!(f, "write {} ({} bytes)", path.display(), contents.len())
            },
        }
    }
}

/// Ordered list of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    #[must_use]
    pub const fn new() -> Self {
        Self { actions: Vec::new() }
    }

    pub fn push(&mut self, action: Action) -> &mut Self {
        self.actions.push(action);
        self
    }

    pub fn run(&mut self, step: Step) -> &mut Self {
        self.push(Action::Run(step))
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Command lines of the `Run` actions, in order.
    #[must_use]
    pub fn command_lines(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                Action::Run(step) => Some(step.command_line()),
                _ => None,
            })
            .collect()
    }
}

impl Extend<Action> for Plan {
    fn extend<T: IntoIterator<Item = Action>>(&mut self, iter: T) {
        self.actions.extend(iter);
    }
}
