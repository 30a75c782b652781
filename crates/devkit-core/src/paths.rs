use crate::error::{DevkitError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEVKIT_DIR: &str = ".devkit";
pub const CONFIG_FILE: &str = ".devkit/config.yaml";
pub const SETUP_MARKER: &str = ".devkit/setup-complete.yaml";
pub const SETUP_LOCK: &str = ".devkit/setup.lock";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn devkit_dir(root: &Path) -> PathBuf {
    root.join(DEVKIT_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn marker_path(root: &Path) -> PathBuf {
    root.join(SETUP_MARKER)
}

pub fn lock_path(root: &Path) -> PathBuf {
    root.join(SETUP_LOCK)
}

// ---------------------------------------------------------------------------
// Role validation
// ---------------------------------------------------------------------------

static ROLE_RE: OnceLock<Regex> = OnceLock::new();

fn role_re() -> &'static Regex {
    ROLE_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").expect("static regex")
    })
}

pub fn validate_role(role: &str) -> Result<()> {
    if role.is_empty() || role.len() > 64 || !role_re().is_match(role) {
        return Err(DevkitError::InvalidRole(role.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_roles() {
        for role in ["backend", "frontend", "tools", "queue-worker", "x1"] {
            validate_role(role).unwrap_or_else(|_| panic!("expected valid: {role}"));
        }
    }

    #[test]
    fn invalid_roles() {
        for role in ["", "-backend", "backend-", "Backend", "has space", "a_b"] {
            assert!(validate_role(role).is_err(), "expected invalid: {role}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            marker_path(root),
            PathBuf::from("/tmp/proj/.devkit/setup-complete.yaml")
        );
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.devkit/config.yaml")
        );
        assert_eq!(lock_path(root), PathBuf::from("/tmp/proj/.devkit/setup.lock"));
    }
}
