//! Plan execution.
//!
//! Actions run strictly in order and the first failure aborts the rest of the plan.

use crate::models::plan::{Action, Plan, Step};
use crate::services::error::XtaskError;
use crate::services::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

pub trait Executor {
    /// Performs a single action.
    ///
    /// # Errors
    /// Returns an error if the action fails; the caller stops at the first error.
    fn execute(&mut self, action: &Action) -> Result<(), XtaskError>;

    /// Performs every action of `plan` in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the error of the first failing action.
    fn execute_plan(&mut self, plan: &Plan) -> Result<(), XtaskError> {
        plan.actions().iter().try_for_each(|action| self.execute(action))
    }
}

/// Runs programs and touches the filesystem for real.
///
/// Relative paths in actions are resolved against the workspace root.
#[derive(Debug)]
pub struct SystemExecutor {
    root: PathBuf,
}

impl SystemExecutor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn run(&self, step: &Step) -> Result<(), XtaskError> {
        let cwd = self.resolve(&step.cwd);
        info!("{} (in {})", step.command_line(), cwd.display());

        let status = Command::new(&step.program)
            .args(&step.args)
            .current_dir(&cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| XtaskError::Spawn {
                program: step.program.clone(),
                source,
                context: Some(format!("is `{}` installed and in your PATH?", step.program).into()),
            })?;

        if !status.success() {
            return Err(XtaskError::CommandFailed { command: step.command_line(), cwd, status });
        }
        Ok(())
    }
}

impl Executor for SystemExecutor {
    fn execute(&mut self, action: &Action) -> Result<(), XtaskError> {
        match action {
            Action::Run(step) => return self.run(step),
            Action::Copy { from, to } => fs::copy(&self.resolve(from), &self.resolve(to))?,
            Action::Touch(path) => fs::touch(&self.resolve(path))?,
            Action::RemoveFile(path) => fs::remove_file_force(&self.resolve(path))?,
            Action::RemoveDir(path) => fs::remove_dir_force(&self.resolve(path))?,
            Action::RemoveGlob { dir, pattern } => {
                fs::remove_glob_force(&self.resolve(dir), pattern)?;
            },
            Action::Write { path, contents } => fs::write_text(&self.resolve(path), contents)?,
        }
        debug!("{action}");
        Ok(())
    }
}

/// Logs each action instead of performing it.
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    performed: Vec<Action>,
}

impl DryRunExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions seen so far, in order.
    #[must_use]
    pub fn performed(&self) -> &[Action] {
        &self.performed
    }
}

impl Executor for DryRunExecutor {
    fn execute(&mut self, action: &Action) -> Result<(), XtaskError> {
        info!("[dry-run] {action}");
        self.performed.push(action.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn shell(script: &str) -> Step {
        if cfg!(windows) {
            Step::new("cmd", ".").args(["/C", script])
        } else {
            Step::new("sh", ".").args(["-c", script])
        }
    }

    #[test]
    fn stops_at_first_failing_command() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let mut plan = Plan::new();
        plan.push(Action::Touch("first".into()))
            .run(shell("exit 3"))
            .push(Action::Touch("second".into()));

        let err = SystemExecutor::new(tmp.path()).execute_plan(&plan).unwrap_err();

        assert!(matches!(err, XtaskError::CommandFailed { .. }), "got: {err}");
        assert!(tmp.path().join("first").exists());
        assert!(!tmp.path().join("second").exists(), "steps after a failure must not run");
        Ok(())
    }

    #[test]
    fn missing_program_is_a_spawn_error() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let action = Action::Run(Step::new("definitely-not-a-real-tool-xyz", "."));
        let err = SystemExecutor::new(tmp.path()).execute(&action).unwrap_err();
        assert!(matches!(err, XtaskError::Spawn { .. }));
        assert!(err.to_string().contains("definitely-not-a-real-tool-xyz"));
        Ok(())
    }

    #[test]
    fn commands_run_in_their_directory() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        std::fs::create_dir(tmp.path().join("simulator"))?;
        let mut step = shell("echo ok > marker");
        step.cwd = "simulator".into();

        SystemExecutor::new(tmp.path()).execute(&Action::Run(step))?;
        assert!(tmp.path().join("simulator/marker").exists());
        Ok(())
    }

    #[test]
    fn file_actions_resolve_against_root() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let mut plan = Plan::new();
        plan.push(Action::Write { path: "package.json".into(), contents: "{}".to_owned() })
            .push(Action::Copy { from: "package.json".into(), to: "dist/package.json".into() })
            .push(Action::RemoveFile("package.json".into()));

        SystemExecutor::new(tmp.path()).execute_plan(&plan)?;

        assert!(!tmp.path().join("package.json").exists());
        assert_eq!(std::fs::read_to_string(tmp.path().join("dist/package.json"))?, "{}");
        Ok(())
    }

    #[test]
    fn dry_run_records_without_side_effects() -> Result<(), Box<dyn std::error::Error>> {
        let mut plan = Plan::new();
        plan.run(Step::new("cargo", ".").args(["clean"]))
            .push(Action::RemoveDir("node_modules".into()));

        let mut executor = DryRunExecutor::new();
        executor.execute_plan(&plan)?;
        assert_eq!(executor.performed(), plan.actions());
        Ok(())
    }
}
