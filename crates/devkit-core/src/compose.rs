//! Container runtime driver over the compose CLI.

use crate::config::RuntimeConfig;
use crate::error::{DevkitError, Result};
use crate::runner::{CommandRunner, CommandSpec};
use std::path::{Path, PathBuf};

/// Operations devkit needs from a container runtime.
pub trait ContainerDriver {
    /// Version/health query. Fails with `RuntimeUnavailable` when the runtime does not answer.
    fn version(&self) -> Result<()>;
    fn build(&self) -> Result<()>;
    /// Start every service detached.
    fn up(&self) -> Result<()>;
    /// Stop and remove services, optionally with their volumes.
    fn down(&self, volumes: bool) -> Result<()>;
    fn restart(&self) -> Result<()>;
    fn logs(&self, service: Option<&str>, follow: bool) -> Result<()>;
    fn ps(&self) -> Result<()>;
    /// Run `args` inside the running `service`.
    fn exec(&self, service: &str, user: Option<&str>, args: &[String], interactive: bool)
        -> Result<()>;
    /// Run `args` in a throwaway container for `service`.
    fn run_once(&self, service: &str, args: &[String]) -> Result<()>;
    /// Quiet exec reporting only whether `args` exited zero.
    fn exec_succeeds(&self, service: &str, user: Option<&str>, args: &[String]) -> Result<bool>;
}

/// [`ContainerDriver`] that shells out to `docker compose` (or whatever argv
/// prefix `runtime.compose` names).
pub struct ComposeDriver<R: CommandRunner> {
    runner: R,
    compose: Vec<String>,
    compose_file: Option<PathBuf>,
    root: PathBuf,
}

impl<R: CommandRunner> ComposeDriver<R> {
    pub fn new(runner: R, runtime: &RuntimeConfig, root: &Path) -> Result<Self> {
        if runtime.compose.is_empty() {
            return Err(DevkitError::InvalidConfig(
                "runtime.compose must not be empty".to_string(),
            ));
        }
        Ok(Self {
            runner,
            compose: runtime.compose.clone(),
            compose_file: runtime.compose_file.as_ref().map(|f| root.join(f)),
            root: root.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    fn command(&self) -> CommandSpec {
        let mut spec = CommandSpec::new(self.compose[0].clone())
            .args(self.compose[1..].iter().cloned())
            .current_dir(&self.root);
        if let Some(file) = &self.compose_file {
            spec = spec.arg("-f").arg(file.display().to_string());
        }
        spec
    }

    fn exec_command(
        &self,
        service: &str,
        user: Option<&str>,
        args: &[String],
        interactive: bool,
    ) -> CommandSpec {
        let mut spec = self.command().arg("exec");
        if !interactive {
            spec = spec.arg("-T");
        }
        if let Some(user) = user {
            spec = spec.arg("-u").arg(user);
        }
        spec.arg(service)
            .args(args.iter().cloned())
            .interactive(interactive)
    }
}

impl<R: CommandRunner> ContainerDriver for ComposeDriver<R> {
    fn version(&self) -> Result<()> {
        let spec = self.command().arg("version");
        match self.runner.succeeds(&spec) {
            Ok(true) => Ok(()),
            Ok(false) => Err(DevkitError::RuntimeUnavailable(format!(
                "`{spec}` exited non-zero; is the daemon running?"
            ))),
            Err(e) => Err(DevkitError::RuntimeUnavailable(e.to_string())),
        }
    }

    fn build(&self) -> Result<()> {
        self.runner.run(&self.command().arg("build"))
    }

    fn up(&self) -> Result<()> {
        self.runner.run(&self.command().args(["up", "-d"]))
    }

    fn down(&self, volumes: bool) -> Result<()> {
        let mut spec = self.command().arg("down");
        if volumes {
            spec = spec.args(["--volumes", "--remove-orphans"]);
        }
        self.runner.run(&spec)
    }

    fn restart(&self) -> Result<()> {
        self.runner.run(&self.command().arg("restart"))
    }

    fn logs(&self, service: Option<&str>, follow: bool) -> Result<()> {
        let mut spec = self.command().arg("logs");
        if follow {
            spec = spec.arg("-f");
        }
        if let Some(service) = service {
            spec = spec.arg(service);
        }
        self.runner.run(&spec)
    }

    fn ps(&self) -> Result<()> {
        self.runner.run(&self.command().arg("ps"))
    }

    fn exec(
        &self,
        service: &str,
        user: Option<&str>,
        args: &[String],
        interactive: bool,
    ) -> Result<()> {
        self.runner
            .run(&self.exec_command(service, user, args, interactive))
    }

    fn run_once(&self, service: &str, args: &[String]) -> Result<()> {
        let spec = self
            .command()
            .args(["run", "--rm", "-T"])
            .arg(service)
            .args(args.iter().cloned());
        self.runner.run(&spec)
    }

    fn exec_succeeds(&self, service: &str, user: Option<&str>, args: &[String]) -> Result<bool> {
        self.runner
            .succeeds(&self.exec_command(service, user, args, false))
    }
}
