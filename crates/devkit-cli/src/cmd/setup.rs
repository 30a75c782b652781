use super::{compose_driver, load_config};
use crate::output::{print_json, ConsoleReporter};
use devkit_core::bootstrap::{default_steps, Orchestrator, SetupOutcome};
use devkit_core::guard;
use devkit_core::probe::ThreadSleeper;
use std::path::Path;

/// Bring a fresh checkout to a runnable environment.
pub fn run(root: &Path, max_attempts: Option<u32>, json: bool) -> anyhow::Result<()> {
    let mut config = load_config(root)?;
    if max_attempts.is_some() {
        config.probe.max_attempts = max_attempts;
        config.ensure_valid()?;
    }
    let driver = compose_driver(root, &config)?;
    let reporter = ConsoleReporter::new(json);
    let steps = default_steps();

    let outcome = Orchestrator::new(root, &config, &driver, &ThreadSleeper, &reporter)
        .setup_with_preflight(&steps, || {
            if !json {
                println!("Checking prerequisites...");
            }
            guard::check_prerequisites(&config, &driver)
        })?;

    if json {
        let value = match &outcome {
            SetupOutcome::AlreadyConfigured(record) => serde_json::json!({
                "status": "already_configured",
                "completed_at": record.completed_at,
                "steps": record.steps,
            }),
            SetupOutcome::Completed {
                steps,
                probe_attempts,
            } => serde_json::json!({
                "status": "completed",
                "steps": steps,
                "probe_attempts": probe_attempts,
            }),
        };
        return print_json(&value);
    }

    match outcome {
        SetupOutcome::AlreadyConfigured(record) => {
            println!(
                "Environment already set up (completed {}).",
                record.completed_at.format("%Y-%m-%d %H:%M UTC")
            );
            println!("Run 'devkit up' to start it, or 'devkit clean' to start over.");
        }
        SetupOutcome::Completed { steps, .. } => {
            println!("\nEnvironment ready: {} steps completed.", steps.len());
            println!("Run 'devkit status' to see running services.");
        }
    }
    Ok(())
}
