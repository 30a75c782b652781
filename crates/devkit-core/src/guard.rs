//! Guards in front of environment-dependent commands, and the destructive reset.

use crate::compose::ContainerDriver;
use crate::config::Config;
use crate::error::{DevkitError, Result};
use crate::state::{SetupRecord, SetupState, Transition};
use std::io::{BufRead, Write};
use std::path::Path;

/// Literal the operator must type to confirm `clean`.
pub const CLEAN_CONFIRMATION: &str = "yes";

/// Verify every host prerequisite is on PATH, then that the container runtime answers.
pub fn check_prerequisites(config: &Config, driver: &dyn ContainerDriver) -> Result<()> {
    for tool in &config.runtime.prerequisites {
        which::which(tool).map_err(|_| DevkitError::MissingPrerequisite { tool: tool.clone() })?;
        tracing::debug!(tool = %tool, "prerequisite found");
    }
    driver.version()
}

/// The setup record, or `NotConfigured` when setup has not completed.
pub fn check_configured(root: &Path) -> Result<SetupRecord> {
    match SetupState::load(root)? {
        SetupState::Configured(record) => Ok(record),
        SetupState::NotConfigured => Err(DevkitError::NotConfigured),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Dependency directories that existed and were deleted.
    pub removed: Vec<String>,
}

/// Tear the environment down to its pre-setup state after typed confirmation.
///
/// Prompts on `out`, reads one line from `input`, and proceeds only when that
/// line is exactly [`CLEAN_CONFIRMATION`]. Anything else (including EOF)
/// returns `ConfirmationDeclined` with nothing touched.
pub fn clean(
    root: &Path,
    config: &Config,
    driver: &dyn ContainerDriver,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<CleanReport> {
    writeln!(
        out,
        "This stops all containers, deletes their volumes (including the database),"
    )?;
    writeln!(out, "removes installed dependencies, and resets setup state.")?;
    write!(out, "Type '{CLEAN_CONFIRMATION}' to continue: ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    if answer.trim_end_matches(['\r', '\n']) != CLEAN_CONFIRMATION {
        return Err(DevkitError::ConfirmationDeclined);
    }

    driver.down(true)?;

    let mut report = CleanReport::default();
    for role in config.roles.values() {
        let Some(dir) = &role.dependency_dir else {
            continue;
        };
        if crate::io::remove_dir_if_exists(&root.join(dir))? {
            tracing::info!(dir = %dir, "removed dependency directory");
            report.removed.push(dir.clone());
        }
    }

    SetupState::transition(
        root,
        Transition::Reset {
            reason: "clean confirmed by operator".to_string(),
        },
    )?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::tests::FakeDriver;
    use crate::paths;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn configured_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("backend/vendor/laravel")).unwrap();
        std::fs::create_dir_all(dir.path().join("frontend/node_modules/next")).unwrap();
        SetupState::transition(dir.path(), Transition::Complete { steps: vec![] }).unwrap();
        dir
    }

    #[test]
    fn check_configured_requires_marker() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            check_configured(dir.path()),
            Err(DevkitError::NotConfigured)
        ));
        SetupState::transition(dir.path(), Transition::Complete { steps: vec![] }).unwrap();
        check_configured(dir.path()).unwrap();
    }

    #[test]
    fn missing_prerequisite_named_and_runtime_untouched() {
        let mut config = Config::default();
        config.runtime.prerequisites = vec!["devkit-no-such-tool".to_string()];
        let driver = FakeDriver::default();

        match check_prerequisites(&config, &driver) {
            Err(DevkitError::MissingPrerequisite { tool }) => {
                assert_eq!(tool, "devkit-no-such-tool")
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn prerequisites_query_runtime_version() {
        let mut config = Config::default();
        config.runtime.prerequisites = Vec::new();
        let driver = FakeDriver::default();
        check_prerequisites(&config, &driver).unwrap();
        assert_eq!(driver.calls(), vec!["version"]);
    }

    #[test]
    fn clean_declined_touches_nothing() {
        for answer in ["no\n", "YES\n", "yes please\n", " yes\n", ""] {
            let dir = configured_project();
            let driver = FakeDriver::default();
            let mut out = Vec::new();

            let err = clean(
                dir.path(),
                &Config::default(),
                &driver,
                &mut Cursor::new(answer),
                &mut out,
            )
            .unwrap_err();

            assert!(matches!(err, DevkitError::ConfirmationDeclined), "{answer:?}");
            assert!(driver.calls().is_empty());
            assert!(dir.path().join("backend/vendor").exists());
            assert!(paths::marker_path(dir.path()).exists());
        }
    }

    #[test]
    fn clean_confirmed_resets_everything() {
        let dir = configured_project();
        let driver = FakeDriver::default();
        let mut out = Vec::new();

        let report = clean(
            dir.path(),
            &Config::default(),
            &driver,
            &mut Cursor::new("yes\n"),
            &mut out,
        )
        .unwrap();

        assert_eq!(driver.calls(), vec!["down -v"]);
        assert_eq!(
            report.removed,
            vec!["backend/vendor".to_string(), "frontend/node_modules".to_string()]
        );
        assert!(!dir.path().join("backend/vendor").exists());
        assert!(!paths::marker_path(dir.path()).exists());
        assert!(String::from_utf8(out).unwrap().contains("Type 'yes'"));
    }
}
