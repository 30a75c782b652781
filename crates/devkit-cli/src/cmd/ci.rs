use super::configured;
use crate::output::ConsoleReporter;
use devkit_core::runner::ProcessRunner;
use devkit_core::{ci, hook};
use std::path::Path;

/// Reinstall dependencies from scratch and run every check.
pub fn run(root: &Path) -> anyhow::Result<()> {
    let (config, driver) = configured(root)?;
    let reporter = ConsoleReporter::new(false);

    let report = ci::run_ci(root, &config, &driver, &reporter)?;

    println!("\nAll {} checks passed.", report.passed.len());
    Ok(())
}

/// Prove the pre-commit hook rewrites bad formatting.
pub fn hook_test(root: &Path) -> anyhow::Result<()> {
    let (config, _) = configured(root)?;
    println!("Testing pre-commit hook on {}...", config.hook_test.file);

    let report = hook::run_hook_test(root, &config, &ProcessRunner)?;

    println!("Pre-commit hook fixed {} and the file was restored.", report.file);
    Ok(())
}
