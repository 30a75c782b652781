//! Environment bootstrap orchestrator.
//!
//! `Orchestrator::setup` drives an ordered list of [`Step`]s to completion:
//! marker present → nothing happens; otherwise every step runs in order,
//! the first failure halts the sequence, and the setup marker is written only
//! after the last step succeeds. Re-running after a failure is safe because
//! each step checks its own precondition.

pub mod step;
pub mod steps;

pub use step::{Check, Idempotency, NullReporter, Reporter, Step, StepContext};
pub use steps::default_steps;

use crate::compose::ContainerDriver;
use crate::config::Config;
use crate::error::{DevkitError, Result};
use crate::lock::SetupLock;
use crate::probe::Sleeper;
use crate::state::{SetupRecord, SetupState, Transition};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum SetupOutcome {
    /// The marker was already present; no side effects were performed.
    AlreadyConfigured(SetupRecord),
    Completed {
        steps: Vec<String>,
        /// Readiness probe invocations, when the sequence included a probe step.
        probe_attempts: Option<u32>,
    },
}

pub struct Orchestrator<'a> {
    root: &'a Path,
    config: &'a Config,
    driver: &'a dyn ContainerDriver,
    sleeper: &'a dyn Sleeper,
    reporter: &'a dyn Reporter,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        root: &'a Path,
        config: &'a Config,
        driver: &'a dyn ContainerDriver,
        sleeper: &'a dyn Sleeper,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            root,
            config,
            driver,
            sleeper,
            reporter,
        }
    }

    pub fn setup(&self, steps: &[Box<dyn Step>]) -> Result<SetupOutcome> {
        self.setup_with_preflight(steps, || Ok(()))
    }

    /// Like [`setup`](Self::setup), running `preflight` once the marker check
    /// has established that work is needed (prerequisite checks go here so a
    /// configured environment spawns nothing).
    pub fn setup_with_preflight<F>(
        &self,
        steps: &[Box<dyn Step>],
        preflight: F,
    ) -> Result<SetupOutcome>
    where
        F: FnOnce() -> Result<()>,
    {
        if let SetupState::Configured(record) = SetupState::load(self.root)? {
            tracing::info!(completed_at = %record.completed_at, "already configured");
            return Ok(SetupOutcome::AlreadyConfigured(record));
        }

        preflight()?;
        let _lock = SetupLock::acquire(self.root)?;

        let ctx = StepContext::new(
            self.root,
            self.config,
            self.driver,
            self.sleeper,
            self.reporter,
        );
        let total = steps.len();
        let mut completed = Vec::with_capacity(total);

        for (index, step) in steps.iter().enumerate() {
            let name = step.name();
            self.reporter
                .step_started(index + 1, total, name, step.description());
            tracing::info!(
                step = name,
                idempotency = step.idempotency().as_str(),
                "step started"
            );

            if let Err(e) = run_step(step.as_ref(), &ctx) {
                self.reporter.step_failed(name, &e.to_string());
                tracing::warn!(step = name, error = %e, "step failed; setup halted");
                return Err(DevkitError::step_failed(name, e));
            }
            completed.push(name.to_string());
        }

        SetupState::transition(
            self.root,
            Transition::Complete {
                steps: completed.clone(),
            },
        )?;

        Ok(SetupOutcome::Completed {
            steps: completed,
            probe_attempts: ctx.probe_attempts(),
        })
    }
}

fn run_step(step: &dyn Step, ctx: &StepContext<'_>) -> Result<()> {
    match step.check(ctx)? {
        Check::Satisfied(reason) => {
            ctx.reporter.step_skipped(step.name(), &reason);
            tracing::info!(step = step.name(), %reason, "step already satisfied");
        }
        Check::Needed => {
            step.run(ctx)?;
            ctx.reporter.step_finished(step.name());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
