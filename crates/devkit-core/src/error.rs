use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevkitError {
    #[error("missing prerequisite: '{tool}' was not found on PATH")]
    MissingPrerequisite { tool: String },

    #[error("container runtime is not responding: {0}")]
    RuntimeUnavailable(String),

    #[error("environment is not set up: run 'devkit setup' first")]
    NotConfigured,

    #[error("step '{step}' failed")]
    StepFailed {
        step: String,
        #[source]
        source: Box<DevkitError>,
    },

    #[error("confirmation declined: nothing was removed")]
    ConfirmationDeclined,

    #[error("command `{command}` exited with {}", exit_label(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("failed to spawn `{command}`: {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("service did not become ready after {attempts} attempts")]
    ProbeExhausted { attempts: u32 },

    #[error("another setup is already running (lock file: {})", .path.display())]
    SetupLocked { path: PathBuf },

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("invalid role name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidRole(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("template not found: {}", .0.display())]
    MissingTemplate(PathBuf),

    #[error("check '{check}' failed")]
    CheckFailed {
        check: String,
        #[source]
        source: Box<DevkitError>,
    },

    #[error("hook test failed: {0}")]
    HookTest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl DevkitError {
    pub fn step_failed(step: impl Into<String>, source: DevkitError) -> Self {
        Self::StepFailed {
            step: step.into(),
            source: Box::new(source),
        }
    }

    pub fn check_failed(check: impl Into<String>, source: DevkitError) -> Self {
        Self::CheckFailed {
            check: check.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, DevkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_message_includes_status() {
        let err = DevkitError::CommandFailed {
            command: "docker compose build".to_string(),
            code: Some(2),
        };
        assert_eq!(
            err.to_string(),
            "command `docker compose build` exited with status 2"
        );
    }

    #[test]
    fn step_failed_keeps_source_chain() {
        let err = DevkitError::step_failed("migrate", DevkitError::NotConfigured);
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("devkit setup"));
    }
}
