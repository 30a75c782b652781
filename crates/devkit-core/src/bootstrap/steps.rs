//! The default bootstrap sequence for the Laravel/Next.js/PostgreSQL kit.

use super::step::{Check, Idempotency, Step, StepContext};
use crate::error::{DevkitError, Result};
use crate::probe::{self, WaitPolicy};
use crate::{io, paths};
use regex::Regex;

/// Steps 1-10 in their fixed order. The marker write that completes setup is
/// owned by the orchestrator, not by a step.
pub fn default_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(EnsureEnvFile),
        Box::new(EnsureDirectories),
        Box::new(BuildImages),
        Box::new(InstallDependencies::backend()),
        Box::new(InstallDependencies::frontend()),
        Box::new(StartServices),
        Box::new(WaitForDatabase),
        Box::new(FixPermissions),
        Box::new(EnsureAppKey),
        Box::new(RunMigrations),
    ]
}

/// Value of `key` in dotenv-formatted `content`, with surrounding quotes stripped.
/// Later assignments win, matching how dotenv loaders read the file.
pub fn env_value(content: &str, key: &str) -> Option<String> {
    let re = Regex::new(&format!(r"^\s*(?:export\s+)?{}\s*=\s*(.*?)\s*$", regex::escape(key)))
        .ok()?;
    content
        .lines()
        .filter_map(|line| re.captures(line))
        .last()
        .map(|caps| {
            let raw = caps.get(1).map_or("", |m| m.as_str());
            raw.trim_matches(|c| c == '"' || c == '\'').to_string()
        })
}

fn backend_service(ctx: &StepContext<'_>) -> Result<String> {
    let role = ctx.config.role(&ctx.config.bootstrap.backend_role)?;
    Ok(role.service.clone())
}

// ---------------------------------------------------------------------------
// 1. env-file
// ---------------------------------------------------------------------------

pub struct EnsureEnvFile;

impl Step for EnsureEnvFile {
    fn name(&self) -> &str {
        "env-file"
    }

    fn description(&self) -> &str {
        "Create the environment file from its template"
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::CreateIfMissing
    }

    fn check(&self, ctx: &StepContext<'_>) -> Result<Check> {
        let env = &ctx.config.env_file.path;
        if ctx.root.join(env).exists() {
            return Ok(Check::Satisfied(format!("{env} already exists")));
        }
        Ok(Check::Needed)
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        let template = ctx.root.join(&ctx.config.env_file.template);
        if !template.exists() {
            return Err(DevkitError::MissingTemplate(template));
        }
        let dest = ctx.root.join(&ctx.config.env_file.path);
        if io::copy_if_missing(&template, &dest)? {
            tracing::info!(path = %dest.display(), "created env file from template");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 2. directories
// ---------------------------------------------------------------------------

pub struct EnsureDirectories;

const IGNORED_STATE: [&str; 2] = [paths::SETUP_MARKER, paths::SETUP_LOCK];

impl Step for EnsureDirectories {
    fn name(&self) -> &str {
        "directories"
    }

    fn description(&self) -> &str {
        "Create local directories"
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::Converging
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        for dir in &ctx.config.directories {
            io::ensure_dir(&ctx.root.join(dir))?;
        }
        io::ensure_dir(&paths::devkit_dir(ctx.root))?;
        for entry in IGNORED_STATE {
            io::ensure_gitignore_entry(ctx.root, entry)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 3. build-images
// ---------------------------------------------------------------------------

pub struct BuildImages;

impl Step for BuildImages {
    fn name(&self) -> &str {
        "build-images"
    }

    fn description(&self) -> &str {
        "Build container images"
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::Always
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.driver.build()
    }
}

// ---------------------------------------------------------------------------
// 4-5. backend-deps / frontend-deps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Backend,
    Frontend,
}

pub struct InstallDependencies {
    side: Side,
}

impl InstallDependencies {
    pub fn backend() -> Self {
        Self {
            side: Side::Backend,
        }
    }

    pub fn frontend() -> Self {
        Self {
            side: Side::Frontend,
        }
    }
}

impl Step for InstallDependencies {
    fn name(&self) -> &str {
        match self.side {
            Side::Backend => "backend-deps",
            Side::Frontend => "frontend-deps",
        }
    }

    fn description(&self) -> &str {
        match self.side {
            Side::Backend => "Install backend dependencies",
            Side::Frontend => "Install frontend dependencies",
        }
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::Always
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        let bootstrap = &ctx.config.bootstrap;
        let (role, command) = match self.side {
            Side::Backend => (&bootstrap.backend_role, &bootstrap.backend_install),
            Side::Frontend => (&bootstrap.frontend_role, &bootstrap.frontend_install),
        };
        let service = &ctx.config.role(role)?.service;
        ctx.driver.run_once(service, command)
    }
}

// ---------------------------------------------------------------------------
// 6. start
// ---------------------------------------------------------------------------

pub struct StartServices;

impl Step for StartServices {
    fn name(&self) -> &str {
        "start"
    }

    fn description(&self) -> &str {
        "Start containers"
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::Converging
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.driver.up()
    }
}

// ---------------------------------------------------------------------------
// 7. wait-database
// ---------------------------------------------------------------------------

pub struct WaitForDatabase;

impl Step for WaitForDatabase {
    fn name(&self) -> &str {
        "wait-database"
    }

    fn description(&self) -> &str {
        "Wait for the database to accept connections"
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::Always
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        let policy = WaitPolicy::from(&ctx.config.probe);
        let outcome = probe::wait_ready(
            || probe::database_ready(ctx.config, ctx.driver),
            &policy,
            ctx.sleeper,
            |attempt| ctx.reporter.probe_retry(attempt),
        )?;
        ctx.record_probe_attempts(outcome.attempts);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 8. permissions
// ---------------------------------------------------------------------------

pub struct FixPermissions;

impl Step for FixPermissions {
    fn name(&self) -> &str {
        "permissions"
    }

    fn description(&self) -> &str {
        "Fix file ownership inside the backend container"
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::Converging
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        let ownership = &ctx.config.bootstrap.ownership;
        ctx.driver.exec(
            &backend_service(ctx)?,
            Some(&ownership.user),
            &ownership.command,
            false,
        )
    }
}

// ---------------------------------------------------------------------------
// 9. app-key
// ---------------------------------------------------------------------------

pub struct EnsureAppKey;

impl Step for EnsureAppKey {
    fn name(&self) -> &str {
        "app-key"
    }

    fn description(&self) -> &str {
        "Generate the application key"
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::CreateIfMissing
    }

    fn check(&self, ctx: &StepContext<'_>) -> Result<Check> {
        let env = &ctx.config.env_file;
        let path = ctx.root.join(&env.path);
        if !path.exists() {
            return Ok(Check::Needed);
        }
        let content = std::fs::read_to_string(&path)?;
        match env_value(&content, &env.key_var) {
            Some(v) if !v.is_empty() => Ok(Check::Satisfied(format!(
                "{} is already set in {}",
                env.key_var, env.path
            ))),
            _ => Ok(Check::Needed),
        }
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.driver.exec(
            &backend_service(ctx)?,
            None,
            &ctx.config.bootstrap.key_generate,
            false,
        )
    }
}

// ---------------------------------------------------------------------------
// 10. migrate
// ---------------------------------------------------------------------------

pub struct RunMigrations;

impl Step for RunMigrations {
    fn name(&self) -> &str {
        "migrate"
    }

    fn description(&self) -> &str {
        "Run database migrations"
    }

    fn idempotency(&self) -> Idempotency {
        Idempotency::Always
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.driver.exec(
            &backend_service(ctx)?,
            None,
            &ctx.config.bootstrap.migrate,
            false,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
