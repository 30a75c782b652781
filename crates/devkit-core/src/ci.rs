//! Local CI simulation: wipe installed dependencies, reinstall, lint, analyse.

use crate::bootstrap::Reporter;
use crate::compose::ContainerDriver;
use crate::config::Config;
use crate::error::{DevkitError, Result};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiReport {
    pub wiped: Vec<String>,
    pub passed: Vec<String>,
}

/// Run every configured check in order inside its role's service.
///
/// Dependency directories are wiped first, but only for roles that have at
/// least one check, so nothing is left uninstalled. Each check gets its own
/// started/finished (or failed) report. The first failing check stops the run
/// with `CheckFailed`.
pub fn run_ci(
    root: &Path,
    config: &Config,
    driver: &dyn ContainerDriver,
    reporter: &dyn Reporter,
) -> Result<CiReport> {
    let mut report = CiReport::default();

    if config.ci.wipe {
        for (name, role) in &config.roles {
            let Some(dir) = &role.dependency_dir else {
                continue;
            };
            // Only wipe what a check will reinstall.
            if !config.ci.checks.iter().any(|c| &c.role == name) {
                tracing::debug!(role = %name, dir = %dir, "no check for role; keeping dependencies");
                continue;
            }
            if crate::io::remove_dir_if_exists(&root.join(dir))? {
                tracing::info!(dir = %dir, "wiped dependency directory");
                reporter.dependency_wiped(dir);
                report.wiped.push(dir.clone());
            }
        }
    }

    let total = config.ci.checks.len();
    for (index, check) in config.ci.checks.iter().enumerate() {
        let service = &config.role(&check.role)?.service;
        let description = format!("{} ({})", check.command.join(" "), check.role);
        reporter.step_started(index + 1, total, &check.name, &description);

        if let Err(e) = driver.run_once(service, &check.command) {
            reporter.step_failed(&check.name, &e.to_string());
            return Err(DevkitError::check_failed(&check.name, e));
        }
        reporter.step_finished(&check.name);
        report.passed.push(check.name.clone());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::tests::FakeDriver;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct LineReporter {
        lines: RefCell<Vec<String>>,
    }

    impl Reporter for LineReporter {
        fn step_started(&self, index: usize, total: usize, name: &str, _: &str) {
            self.lines.borrow_mut().push(format!("[{index}/{total}] {name}"));
        }
        fn step_skipped(&self, name: &str, _: &str) {
            self.lines.borrow_mut().push(format!("skip {name}"));
        }
        fn step_finished(&self, name: &str) {
            self.lines.borrow_mut().push(format!("pass {name}"));
        }
        fn step_failed(&self, name: &str, _: &str) {
            self.lines.borrow_mut().push(format!("fail {name}"));
        }
        fn probe_retry(&self, _: u32) {}
        fn dependency_wiped(&self, dir: &str) {
            self.lines.borrow_mut().push(format!("wiped {dir}"));
        }
    }

    fn installed_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        for installed in ["backend/vendor/laravel", "frontend/node_modules/next", "node_modules/husky"] {
            std::fs::create_dir_all(dir.path().join(installed)).unwrap();
        }
        dir
    }

    #[test]
    fn every_check_reports_pass() {
        let dir = installed_project();
        let config = Config::default();
        let driver = FakeDriver::default();
        let reporter = LineReporter::default();

        let report = run_ci(dir.path(), &config, &driver, &reporter).unwrap();

        assert_eq!(report.passed.len(), config.ci.checks.len());
        assert!(!dir.path().join("backend/vendor").exists());
        let passes = reporter
            .lines
            .borrow()
            .iter()
            .filter(|l| l.starts_with("pass "))
            .count();
        assert_eq!(passes, config.ci.checks.len());
    }

    #[test]
    fn every_wiped_directory_is_reinstalled() {
        let dir = installed_project();
        let config = Config::default();
        let driver = FakeDriver::default();

        let report = run_ci(dir.path(), &config, &driver, &LineReporter::default()).unwrap();

        assert_eq!(
            report.wiped,
            vec!["backend/vendor", "frontend/node_modules", "node_modules"]
        );
        for wiped in &report.wiped {
            let service = &config
                .roles
                .values()
                .find(|r| r.dependency_dir.as_deref() == Some(wiped.as_str()))
                .unwrap()
                .service;
            assert!(
                driver.calls().iter().any(|c| c.starts_with(&format!("run {service} "))),
                "{wiped} was wiped but nothing ran in {service}"
            );
        }
    }

    #[test]
    fn roles_without_checks_keep_their_dependencies() {
        let dir = installed_project();
        let mut config = Config::default();
        config.ci.checks.retain(|c| c.role != "tools");

        let report = run_ci(
            dir.path(),
            &config,
            &FakeDriver::default(),
            &LineReporter::default(),
        )
        .unwrap();

        assert!(!report.wiped.contains(&"node_modules".to_string()));
        assert!(dir.path().join("node_modules/husky").is_dir());
    }

    #[test]
    fn wipes_are_reported_before_checks_run() {
        let dir = installed_project();
        let reporter = LineReporter::default();

        run_ci(dir.path(), &Config::default(), &FakeDriver::default(), &reporter).unwrap();

        let lines = reporter.lines.borrow();
        assert_eq!(
            lines[..4],
            [
                "wiped backend/vendor",
                "wiped frontend/node_modules",
                "wiped node_modules",
                "[1/7] tools-install",
            ]
        );
    }

    #[test]
    fn stops_at_first_failing_check() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let driver = FakeDriver {
            fail_on: Some("phpstan".to_string()),
            ..FakeDriver::default()
        };
        let reporter = LineReporter::default();

        let err = run_ci(dir.path(), &config, &driver, &reporter).unwrap_err();

        assert!(matches!(&err, DevkitError::CheckFailed { check, .. } if check == "phpstan"));
        assert_eq!(
            *reporter.lines.borrow(),
            vec![
                "[1/7] tools-install",
                "pass tools-install",
                "[2/7] composer-install",
                "pass composer-install",
                "[3/7] pint",
                "pass pint",
                "[4/7] phpstan",
                "fail phpstan",
            ]
        );
        assert!(!driver.calls().iter().any(|c| c.contains("run frontend")));
    }

    #[test]
    fn wipe_can_be_disabled() {
        let dir = installed_project();
        let mut config = Config::default();
        config.ci.wipe = false;

        let report = run_ci(dir.path(), &config, &FakeDriver::default(), &LineReporter::default())
            .unwrap();
        assert!(report.wiped.is_empty());
        assert!(dir.path().join("frontend/node_modules").exists());
    }
}
