use super::{compose_driver, load_config};
use crate::output::{print_json, print_table};
use devkit_core::compose::ContainerDriver;
use devkit_core::state::SetupState;
use std::path::Path;

/// Print setup state and roles, plus running services once configured.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = SetupState::load(root)?;
    let config = load_config(root)?;

    if json {
        let record = match &state {
            SetupState::Configured(record) => Some(record),
            SetupState::NotConfigured => None,
        };
        let roles: Vec<serde_json::Value> = config
            .roles
            .iter()
            .map(|(name, role)| {
                serde_json::json!({
                    "role": name,
                    "service": role.service,
                    "user": role.user,
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "state": state.as_str(),
            "configured": state.is_configured(),
            "completed_at": record.map(|r| r.completed_at),
            "steps": record.map(|r| &r.steps),
            "roles": roles,
        }));
    }

    println!("Project: {}", config.project.name);
    println!("Root:    {}", root.display());
    match &state {
        SetupState::Configured(record) => println!(
            "Setup:   configured ({} steps, {})",
            record.steps.len(),
            record.completed_at.format("%Y-%m-%d %H:%M UTC")
        ),
        SetupState::NotConfigured => println!("Setup:   not configured (run 'devkit setup')"),
    }

    println!();
    let rows = config
        .roles
        .iter()
        .map(|(name, role)| {
            vec![
                name.clone(),
                role.service.clone(),
                role.shell.clone(),
                role.user.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["ROLE", "SERVICE", "SHELL", "USER"], rows);

    if state.is_configured() {
        println!();
        compose_driver(root, &config)?.ps()?;
    }
    Ok(())
}
