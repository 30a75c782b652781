//! Persisted setup state.
//!
//! The environment is either `NotConfigured` or `Configured`. The marker file
//! at `.devkit/setup-complete.yaml` is the only persisted evidence: present
//! means configured. [`SetupState::transition`] is the single writer.

use crate::error::Result;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// SetupRecord
// ---------------------------------------------------------------------------

/// Contents of the setup marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupRecord {
    pub completed_at: DateTime<Utc>,
    /// Names of the bootstrap steps that ran (or were already satisfied).
    pub steps: Vec<String>,
    pub reason: String,
    #[serde(default)]
    pub devkit_version: String,
}

// ---------------------------------------------------------------------------
// SetupState / Transition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SetupState {
    NotConfigured,
    Configured(SetupRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Every bootstrap step succeeded.
    Complete { steps: Vec<String> },
    /// Explicit full reset.
    Reset { reason: String },
}

impl SetupState {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::marker_path(root);
        if !path.exists() {
            return Ok(SetupState::NotConfigured);
        }
        let data = std::fs::read_to_string(&path)?;
        let record: SetupRecord = serde_yaml::from_str(&data)?;
        Ok(SetupState::Configured(record))
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, SetupState::Configured(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SetupState::NotConfigured => "not_configured",
            SetupState::Configured(_) => "configured",
        }
    }

    /// Apply `transition` on disk and return the resulting state.
    pub fn transition(root: &Path, transition: Transition) -> Result<Self> {
        let path = paths::marker_path(root);
        match transition {
            Transition::Complete { steps } => {
                let record = SetupRecord {
                    completed_at: Utc::now(),
                    reason: format!("bootstrap completed ({} steps)", steps.len()),
                    steps,
                    devkit_version: env!("CARGO_PKG_VERSION").to_string(),
                };
                let data = serde_yaml::to_string(&record)?;
                crate::io::atomic_write(&path, data.as_bytes())?;
                tracing::info!(reason = %record.reason, "setup state -> configured");
                Ok(SetupState::Configured(record))
            }
            Transition::Reset { reason } => {
                let removed = crate::io::remove_file_if_exists(&path)?;
                tracing::info!(%reason, removed, "setup state -> not_configured");
                Ok(SetupState::NotConfigured)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
