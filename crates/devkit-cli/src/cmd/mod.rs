pub mod ci;
pub mod clean;
pub mod config;
pub mod lifecycle;
pub mod role;
pub mod setup;
pub mod status;

use anyhow::Context;
use devkit_core::compose::ComposeDriver;
use devkit_core::config::Config;
use devkit_core::runner::ProcessRunner;
use std::path::Path;

/// Load the effective config and fail on error-level validation findings.
pub fn load_config(root: &Path) -> anyhow::Result<Config> {
    let config = Config::load_or_default(root).context("failed to load .devkit/config.yaml")?;
    config.ensure_valid()?;
    Ok(config)
}

pub fn compose_driver(root: &Path, config: &Config) -> anyhow::Result<ComposeDriver<ProcessRunner>> {
    Ok(ComposeDriver::new(ProcessRunner, &config.runtime, root)?)
}

/// Everything an environment-dependent command needs once the guard passed.
pub fn configured(root: &Path) -> anyhow::Result<(Config, ComposeDriver<ProcessRunner>)> {
    devkit_core::guard::check_configured(root)?;
    let config = load_config(root)?;
    let driver = compose_driver(root, &config)?;
    Ok((config, driver))
}
