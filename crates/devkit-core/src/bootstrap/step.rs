use crate::compose::ContainerDriver;
use crate::config::Config;
use crate::error::Result;
use crate::probe::Sleeper;
use std::cell::Cell;
use std::path::Path;

// ---------------------------------------------------------------------------
// Idempotency / Check
// ---------------------------------------------------------------------------

/// How a step stays safe to re-run after an interrupted or failed setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Produces something only when it is missing; never overwrites.
    CreateIfMissing,
    /// Brings state to a target; repeat runs converge on the same result.
    Converging,
    /// Runs every time; the underlying tool is idempotent on its own.
    Always,
}

impl Idempotency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Idempotency::CreateIfMissing => "create_if_missing",
            Idempotency::Converging => "converging",
            Idempotency::Always => "always",
        }
    }
}

/// Result of a step's precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Needed,
    /// Already in the target state; the action is skipped.
    Satisfied(String),
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Progress sink for the orchestrator and CI runner.
pub trait Reporter {
    fn step_started(&self, index: usize, total: usize, name: &str, description: &str);
    fn step_skipped(&self, name: &str, reason: &str);
    fn step_finished(&self, name: &str);
    fn step_failed(&self, name: &str, error: &str);
    fn probe_retry(&self, attempt: u32);

    /// A dependency directory was removed ahead of a reinstall.
    fn dependency_wiped(&self, _dir: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn step_started(&self, _: usize, _: usize, _: &str, _: &str) {}
    fn step_skipped(&self, _: &str, _: &str) {}
    fn step_finished(&self, _: &str) {}
    fn step_failed(&self, _: &str, _: &str) {}
    fn probe_retry(&self, _: u32) {}
}

// ---------------------------------------------------------------------------
// StepContext
// ---------------------------------------------------------------------------

/// Everything a step may touch.
pub struct StepContext<'a> {
    pub root: &'a Path,
    pub config: &'a Config,
    pub driver: &'a dyn ContainerDriver,
    pub sleeper: &'a dyn Sleeper,
    pub reporter: &'a dyn Reporter,
    probe_attempts: Cell<Option<u32>>,
}

impl<'a> StepContext<'a> {
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
            probe_attempts: Cell::new(None),
        }
    }

    pub fn record_probe_attempts(&self, attempts: u32) {
        self.probe_attempts.set(Some(attempts));
    }

    pub fn probe_attempts(&self) -> Option<u32> {
        self.probe_attempts.get()
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One bootstrap step: a precondition check plus an action.
pub trait Step {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn idempotency(&self) -> Idempotency;

    fn check(&self, _ctx: &StepContext<'_>) -> Result<Check> {
        Ok(Check::Needed)
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<()>;
}
