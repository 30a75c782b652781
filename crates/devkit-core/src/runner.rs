//! Subprocess invocation for step executors.
//!
//! Every external tool devkit drives (the compose CLI, git, hook scripts) is
//! described as a [`CommandSpec`] and handed to a [`CommandRunner`]. The
//! production runner spawns real processes; tests swap in recording fakes.
//!
//! # Modes
//! - `run`:       stdio inherited so tool output streams to the terminal.
//!                Non-zero exit is an error.
//! - `succeeds`:  stdout/stderr discarded. Exit status is the answer, so a
//!                non-zero exit is `Ok(false)` rather than an error.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{DevkitError, Result};

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Attach stdin to the terminal (shells, interactive exec).
    pub interactive: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            interactive: false,
        }
    }

    /// Build from an argv vector; the first element is the program.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CommandRunner
// ---------------------------------------------------------------------------

pub trait CommandRunner {
    /// Run to completion with inherited stdio. Non-zero exit → `CommandFailed`.
    fn run(&self, spec: &CommandSpec) -> Result<()>;

    /// Run quietly and report whether the command exited zero.
    fn succeeds(&self, spec: &CommandSpec) -> Result<bool>;
}

/// Spawns real processes with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        tracing::debug!(command = %spec, "running");
        let mut cmd = spec.to_command();
        if spec.interactive {
            cmd.stdin(Stdio::inherit());
        } else {
            cmd.stdin(Stdio::null());
        }
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());

        let status = cmd.status().map_err(|e| DevkitError::SpawnFailed {
            command: spec.to_string(),
            reason: e.to_string(),
        })?;

        if !status.success() {
            return Err(DevkitError::CommandFailed {
                command: spec.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }

    fn succeeds(&self, spec: &CommandSpec) -> Result<bool> {
        tracing::debug!(command = %spec, "checking");
        let status = spec
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| DevkitError::SpawnFailed {
                command: spec.to_string(),
                reason: e.to_string(),
            })?;
        Ok(status.success())
    }
}
