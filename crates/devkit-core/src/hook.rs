//! Live check that the pre-commit hook auto-fixes formatting.
//!
//! The test appends a badly formatted snippet to a tracked file, stages it,
//! runs the hook, and expects the snippet to come back rewritten. The file
//! is restored to its original bytes (and unstaged) whichever way the test ends.
//!
//! Unstaging resets the file's index entry, so the test refuses to start
//! when the file already has staged changes.

use crate::config::Config;
use crate::error::{DevkitError, Result};
use crate::runner::{CommandRunner, CommandSpec};
use std::path::{Path, PathBuf};

/// Puts a file back the way it was when the guard was created.
///
/// `restore` is the checked path; `Drop` is the fallback for early returns
/// and unwinding and can only log failures.
pub struct RestoreGuard<'a> {
    root: &'a Path,
    relative: String,
    original: Vec<u8>,
    runner: &'a dyn CommandRunner,
    restored: bool,
}

impl<'a> RestoreGuard<'a> {
    pub fn new(root: &'a Path, relative: &str, runner: &'a dyn CommandRunner) -> Result<Self> {
        let path = root.join(relative);
        let original = std::fs::read(&path).map_err(|e| {
            DevkitError::HookTest(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self {
            root,
            relative: relative.to_string(),
            original,
            runner,
            restored: false,
        })
    }

    fn path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    fn unstage(&self) -> CommandSpec {
        CommandSpec::new("git")
            .args(["reset", "-q", "--"])
            .arg(&self.relative)
            .current_dir(self.root)
    }

    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        std::fs::write(self.path(), &self.original)?;
        self.runner.run(&self.unstage())
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = std::fs::write(self.path(), &self.original) {
            tracing::error!(file = %self.relative, error = %e, "failed to restore file after hook test");
            return;
        }
        if let Err(e) = self.runner.run(&self.unstage()) {
            tracing::warn!(file = %self.relative, error = %e, "failed to unstage file after hook test");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub file: String,
}

pub fn run_hook_test(
    root: &Path,
    config: &Config,
    runner: &dyn CommandRunner,
) -> Result<HookReport> {
    let hook_cfg = &config.hook_test;
    let hook = CommandSpec::from_argv(&hook_cfg.hook)
        .ok_or_else(|| DevkitError::HookTest("hook_test.hook is empty".to_string()))?
        .current_dir(root);

    let staged = CommandSpec::new("git")
        .args(["diff", "--cached", "--quiet", "--"])
        .arg(&hook_cfg.file)
        .current_dir(root);
    if !runner.succeeds(&staged)? {
        return Err(DevkitError::HookTest(format!(
            "{} has staged changes; commit or unstage them first",
            hook_cfg.file
        )));
    }

    let guard = RestoreGuard::new(root, &hook_cfg.file, runner)?;
    let path = guard.path();

    let mut broken = guard.original.clone();
    broken.extend_from_slice(hook_cfg.inject.as_bytes());
    std::fs::write(&path, &broken)?;

    runner.run(
        &CommandSpec::new("git")
            .args(["add", "--"])
            .arg(&hook_cfg.file)
            .current_dir(root),
    )?;

    runner
        .run(&hook)
        .map_err(|e| DevkitError::HookTest(format!("hook `{hook}` failed: {e}")))?;

    let after = std::fs::read_to_string(&path)?;
    if after.contains(hook_cfg.inject.as_str()) {
        return Err(DevkitError::HookTest(format!(
            "hook `{hook}` left the unformatted snippet in {}",
            hook_cfg.file
        )));
    }
    tracing::info!(file = %hook_cfg.file, "hook rewrote the injected snippet");

    guard.restore()?;
    Ok(HookReport {
        file: hook_cfg.file.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    const ORIGINAL: &str = "export default function Page() {\n  return null;\n}\n";

    /// Records commands; running the hook applies `fix` to the target file.
    struct FakeGit<'a> {
        target: PathBuf,
        fix: Option<&'a dyn Fn(&str) -> String>,
        hook_fails: bool,
        add_fails: bool,
        staged: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeGit<'_> {
        fn new(target: PathBuf) -> Self {
            Self {
                target,
                fix: None,
                hook_fails: false,
                add_fails: false,
                staged: false,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    fn failed(spec: &CommandSpec) -> DevkitError {
        DevkitError::CommandFailed {
            command: spec.to_string(),
            code: Some(1),
        }
    }

    impl CommandRunner for FakeGit<'_> {
        fn run(&self, spec: &CommandSpec) -> Result<()> {
            self.calls.borrow_mut().push(spec.to_string());
            if spec.program == "git" {
                if self.add_fails && spec.args.first().is_some_and(|a| a == "add") {
                    return Err(failed(spec));
                }
                return Ok(());
            }
            if self.hook_fails {
                return Err(failed(spec));
            }
            if let Some(fix) = self.fix {
                let content = std::fs::read_to_string(&self.target).unwrap();
                std::fs::write(&self.target, fix(&content)).unwrap();
            }
            Ok(())
        }

        fn succeeds(&self, spec: &CommandSpec) -> Result<bool> {
            self.calls.borrow_mut().push(spec.to_string());
            // `git diff --cached --quiet` exits non-zero when something is staged.
            Ok(!self.staged)
        }
    }

    fn setup() -> (TempDir, Config, PathBuf) {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let file = dir.path().join(&config.hook_test.file);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, ORIGINAL).unwrap();
        (dir, config, file)
    }

    fn prettier(content: &str) -> String {
        content.replace(
            "const   devkitHookProbe   =   {a:1,b:2}",
            "const devkitHookProbe = { a: 1, b: 2 };",
        )
    }

    #[test]
    fn passes_and_restores_when_hook_fixes_file() {
        let (dir, config, target) = setup();
        let runner = FakeGit {
            fix: Some(&prettier),
            ..FakeGit::new(target.clone())
        };

        let report = run_hook_test(dir.path(), &config, &runner).unwrap();

        assert_eq!(report.file, config.hook_test.file);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), ORIGINAL);
        assert_eq!(
            runner.calls(),
            vec![
                "git diff --cached --quiet -- frontend/src/app/page.tsx",
                "git add -- frontend/src/app/page.tsx",
                "sh .husky/pre-commit",
                "git reset -q -- frontend/src/app/page.tsx",
            ]
        );
    }

    #[test]
    fn unfixed_snippet_fails_and_restores() {
        let (dir, config, target) = setup();
        let runner = FakeGit::new(target.clone());

        let err = run_hook_test(dir.path(), &config, &runner).unwrap_err();

        assert!(matches!(err, DevkitError::HookTest(msg) if msg.contains("unformatted")));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), ORIGINAL);
        assert!(runner.calls().last().unwrap().starts_with("git reset"));
    }

    #[test]
    fn failing_hook_restores_file() {
        let (dir, config, target) = setup();
        let runner = FakeGit {
            hook_fails: true,
            ..FakeGit::new(target.clone())
        };

        assert!(run_hook_test(dir.path(), &config, &runner).is_err());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), ORIGINAL);
    }

    #[test]
    fn failing_git_add_restores_file_and_skips_hook() {
        let (dir, config, target) = setup();
        let runner = FakeGit {
            add_fails: true,
            ..FakeGit::new(target.clone())
        };

        let err = run_hook_test(dir.path(), &config, &runner).unwrap_err();

        assert!(matches!(err, DevkitError::CommandFailed { .. }));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), ORIGINAL);
        let calls = runner.calls();
        assert!(!calls.iter().any(|c| c.contains(".husky")));
        assert!(calls.last().unwrap().starts_with("git reset"));
    }

    #[test]
    fn staged_changes_block_the_test() {
        let (dir, config, target) = setup();
        let runner = FakeGit {
            staged: true,
            ..FakeGit::new(target.clone())
        };

        let err = run_hook_test(dir.path(), &config, &runner).unwrap_err();

        assert!(matches!(err, DevkitError::HookTest(msg) if msg.contains("staged changes")));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), ORIGINAL);
        assert_eq!(runner.calls().len(), 1, "only the index check may run");
    }

    #[test]
    fn guard_restores_file_when_unwinding() {
        let (dir, config, target) = setup();
        let runner = FakeGit::new(target.clone());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = RestoreGuard::new(dir.path(), &config.hook_test.file, &runner).unwrap();
            std::fs::write(&target, "broken").unwrap();
            panic!("hook crashed");
        }));

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), ORIGINAL);
        assert!(runner.calls().last().unwrap().starts_with("git reset"));
    }

    #[test]
    fn missing_target_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let runner = FakeGit::new(dir.path().join("nope"));
        let err = run_hook_test(dir.path(), &Config::default(), &runner).unwrap_err();
        assert!(matches!(err, DevkitError::HookTest(_)));
        assert!(!runner.calls().iter().any(|c| c.starts_with("git add")));
    }
}
