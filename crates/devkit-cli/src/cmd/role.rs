use super::configured;
use devkit_core::compose::ContainerDriver;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    Shell,
    Exec,
    Test,
}

/// Split a `<role>-<action>` alias such as `backend-shell` or `queue-worker-exec`.
pub fn parse_alias(command: &str) -> Option<(&str, RoleAction)> {
    let (role, action) = command.rsplit_once('-')?;
    let action = match action {
        "shell" => RoleAction::Shell,
        "exec" => RoleAction::Exec,
        "test" => RoleAction::Test,
        _ => return None,
    };
    if role.is_empty() {
        return None;
    }
    Some((role, action))
}

/// Dispatch an external subcommand (`devkit backend-shell`, `devkit frontend-exec npm ls`).
pub fn run_alias(root: &Path, args: &[String]) -> anyhow::Result<()> {
    let Some((command, rest)) = args.split_first() else {
        anyhow::bail!("no command given; run 'devkit --help'");
    };
    let (role, action) = parse_alias(command).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown command '{command}'; role commands look like <role>-shell, <role>-exec, <role>-test"
        )
    })?;
    match action {
        RoleAction::Shell => shell(root, role),
        RoleAction::Exec => exec(root, role, rest),
        RoleAction::Test => test(root, role),
    }
}

pub fn shell(root: &Path, role: &str) -> anyhow::Result<()> {
    let (config, driver) = configured(root)?;
    let role_cfg = config.role(role)?;
    driver.exec(
        &role_cfg.service,
        role_cfg.user.as_deref(),
        std::slice::from_ref(&role_cfg.shell),
        true,
    )?;
    Ok(())
}

pub fn exec(root: &Path, role: &str, args: &[String]) -> anyhow::Result<()> {
    let (config, driver) = configured(root)?;
    let role_cfg = config.role(role)?;
    if args.is_empty() {
        anyhow::bail!("nothing to run: usage 'devkit exec {role} -- <command>...'");
    }
    driver.exec(&role_cfg.service, role_cfg.user.as_deref(), args, false)?;
    Ok(())
}

pub fn test(root: &Path, role: &str) -> anyhow::Result<()> {
    let (config, driver) = configured(root)?;
    let role_cfg = config.role(role)?;
    if role_cfg.test.is_empty() {
        anyhow::bail!("role '{role}' has no test command configured");
    }
    driver.exec(&role_cfg.service, role_cfg.user.as_deref(), &role_cfg.test, false)?;
    println!("Tests passed for '{role}'.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_aliases() {
        assert_eq!(parse_alias("backend-shell"), Some(("backend", RoleAction::Shell)));
        assert_eq!(parse_alias("frontend-test"), Some(("frontend", RoleAction::Test)));
        assert_eq!(
            parse_alias("queue-worker-exec"),
            Some(("queue-worker", RoleAction::Exec))
        );
    }

    #[test]
    fn rejects_non_role_commands() {
        assert_eq!(parse_alias("backend"), None);
        assert_eq!(parse_alias("backend-deploy"), None);
        assert_eq!(parse_alias("-shell"), None);
    }
}
